//! Source file snapshot produced by the walker

use std::path::PathBuf;

/// A readable text file discovered during a walk, with the metadata the
/// index persists alongside its chunks
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub extension: Option<String>,
    pub language: Option<String>,
    pub content: String,
    /// Size in bytes at read time
    pub size: u64,
    /// Modification time, milliseconds since the epoch (0 if unavailable)
    pub mtime_ms: i64,
}
