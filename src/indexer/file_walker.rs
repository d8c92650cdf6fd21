//! File walking functionality for directory traversal

use super::language::detect_language;
use super::source_file::SourceFile;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::UNIX_EPOCH;

/// Outcome of one walk: readable files plus the paths that had to be skipped
#[derive(Debug, Default)]
pub struct WalkReport {
    pub files: Vec<SourceFile>,
    /// Files that could not be read (permissions, race-deleted, bad UTF-8);
    /// skipped for this build rather than aborting the run
    pub skipped: Vec<String>,
}

pub struct FileWalker {
    root: PathBuf,
    max_file_size: u64,
    excluded_dirs: Vec<String>,
    /// Optional cancellation flag - if set to true, walk() will exit early
    cancelled: Option<Arc<AtomicBool>>,
}

impl FileWalker {
    pub fn new(root: impl AsRef<Path>, max_file_size: u64) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_file_size,
            excluded_dirs: vec![],
            cancelled: None,
        }
    }

    /// Directory names to prune from the walk (matched against every path
    /// component, e.g. "node_modules", "target")
    pub fn with_excluded_dirs(mut self, excluded_dirs: Vec<String>) -> Self {
        self.excluded_dirs = excluded_dirs;
        self
    }

    /// Set a cancellation flag that will be checked during the walk.
    /// If the flag is set to true, the walk will exit early.
    pub fn with_cancellation_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(cancelled);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Walk the directory and collect all eligible text files
    pub fn walk(&self) -> Result<WalkReport> {
        if !self.root.exists() {
            anyhow::bail!("Root directory does not exist: {:?}", self.root);
        }
        if !self.root.is_dir() {
            anyhow::bail!("Root path is not a directory: {:?}", self.root);
        }

        let mut report = WalkReport::default();

        let excluded = self.excluded_dirs.clone();
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(true) // Respect .gitignore, .ignore, etc.
            .hidden(false) // Don't skip hidden files by default
            .git_ignore(true)
            .git_exclude(true)
            .git_global(true)
            .require_git(false) // Don't require a .git directory
            .filter_entry(move |entry| {
                let name = entry.file_name().to_string_lossy();
                !(entry.file_type().is_some_and(|t| t.is_dir())
                    && excluded.iter().any(|dir| dir == name.as_ref()))
            })
            .build();

        for entry in walker {
            if self.is_cancelled() {
                tracing::info!("File walk cancelled after {} files", report.files.len());
                anyhow::bail!("Indexing was cancelled");
            }

            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_dir() {
                continue;
            }

            // Explicitly skip .git directory contents
            if path.components().any(|c| c.as_os_str() == ".git") {
                continue;
            }

            let metadata = match fs::metadata(path) {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!("Skipping unreadable file {:?}: {e}", path);
                    report.skipped.push(path.display().to_string());
                    continue;
                }
            };

            if metadata.len() > self.max_file_size {
                tracing::debug!("Skipping large file: {:?}", path);
                continue;
            }

            match self.is_text_file(path) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!("Skipping binary file: {:?}", path);
                    continue;
                }
                Err(e) => {
                    tracing::debug!("Skipping unreadable file {:?}: {e}", path);
                    report.skipped.push(path.display().to_string());
                    continue;
                }
            }

            let content = match fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!("Skipping file that can't be read as UTF-8: {:?}: {e}", path);
                    report.skipped.push(path.display().to_string());
                    continue;
                }
            };

            let relative_path = path
                .strip_prefix(&self.root)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();

            let extension = path.extension().and_then(|e| e.to_str()).map(String::from);
            let language = extension.as_ref().and_then(|ext| detect_language(ext));

            let mtime_ms = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as i64)
                .unwrap_or(0);

            report.files.push(SourceFile {
                path: path.to_path_buf(),
                relative_path,
                extension,
                language,
                content,
                size: metadata.len(),
                mtime_ms,
            });
        }

        tracing::info!(
            "Found {} files to index ({} skipped)",
            report.files.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Check if a file is likely text (not binary)
    fn is_text_file(&self, path: &Path) -> Result<bool> {
        let content = fs::read(path).context("Failed to read file")?;
        if content.is_empty() {
            return Ok(true);
        }

        // Simple heuristic: if more than 30% of bytes are non-printable, it's binary
        let non_printable = content
            .iter()
            .filter(|&&b| b < 0x20 && b != b'\n' && b != b'\r' && b != b'\t')
            .count();

        Ok((non_printable as f64 / content.len() as f64) < 0.3)
    }
}
