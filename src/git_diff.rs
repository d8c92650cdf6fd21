//! Working-tree diff retrieval
//!
//! The review flow needs the change under review as unified diff text. This
//! compares the working tree (plus index) against HEAD; in a repository with
//! no commits yet, every tracked file shows as added.

use crate::error::GitError;
use anyhow::Result;
use git2::{DiffFormat, DiffOptions, Repository};
use std::path::Path;

/// Collect the unified diff of the working tree against HEAD
pub fn working_tree_diff(repo_path: &Path) -> Result<String> {
    let repo = Repository::discover(repo_path)
        .map_err(|_| GitError::RepoNotFound(repo_path.display().to_string()))?;

    let head_tree = repo
        .head()
        .ok()
        .and_then(|head| head.peel_to_tree().ok());

    let mut opts = DiffOptions::new();
    opts.context_lines(3)
        .include_untracked(true)
        .recurse_untracked_dirs(true)
        .show_untracked_content(true);

    let diff = repo
        .diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts))
        .map_err(|e| GitError::DiffFailed(e.to_string()))?;

    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        match line.origin() {
            '+' | '-' | ' ' => text.push(line.origin()),
            _ => {}
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(|e| GitError::DiffFailed(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(GitError::NoChanges.into());
    }

    Ok(text)
}
