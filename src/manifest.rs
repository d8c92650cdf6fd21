//! Persisted metadata describing how an index was built
//!
//! One manifest is written per index location, atomically, after a full
//! build completes. It is read at the start of the next build to decide
//! whether prior embeddings can be reused, and at query time to discover
//! the embedding model the index was built with.

use crate::error::ManifestError;
use crate::types::ChunkingMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Embedding model the vectors were produced with
    pub embedding_model: String,
    pub chunking_mode: ChunkingMode,
    /// Character budget per chunk
    pub chunk_size: usize,
    /// Line overlap between consecutive windowed chunks
    pub overlap_lines: usize,
    pub excluded_dirs: Vec<String>,
    pub files_indexed: usize,
    pub chunks_indexed: usize,
    /// RFC 3339 build timestamp
    pub built_at: String,
}

impl IndexManifest {
    /// Load a manifest, returning `None` when no index has been built yet
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|e| ManifestError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let manifest: IndexManifest = serde_json::from_str(&content)
            .map_err(|e| ManifestError::Corrupted(e.to_string()))?;

        Ok(Some(manifest))
    }

    /// Write the manifest atomically: serialize to a sibling temp file,
    /// then rename over the target
    pub fn store(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create manifest directory")?;
        }

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|e| ManifestError::WriteFailed {
            path: tmp.display().to_string(),
            reason: e.to_string(),
        })?;
        fs::rename(&tmp, path).map_err(|e| ManifestError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!("Wrote manifest to {:?}", path);
        Ok(())
    }

    /// Whether prior embeddings may be reused under the given configuration
    ///
    /// The reuse cache is consulted only when the embedding model and every
    /// chunking parameter are unchanged; chunk boundaries and vector
    /// semantics both depend on them.
    pub fn chunking_matches(
        &self,
        embedding_model: &str,
        mode: ChunkingMode,
        chunk_size: usize,
        overlap_lines: usize,
    ) -> bool {
        self.embedding_model == embedding_model
            && self.chunking_mode == mode
            && self.chunk_size == chunk_size
            && self.overlap_lines == overlap_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest() -> IndexManifest {
        IndexManifest {
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            chunking_mode: ChunkingMode::Structural,
            chunk_size: 1200,
            overlap_lines: 2,
            excluded_dirs: vec!["node_modules".to_string()],
            files_indexed: 10,
            chunks_indexed: 42,
            built_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_store_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");

        let m = manifest();
        m.store(&path).unwrap();

        let loaded = IndexManifest::load(&path).unwrap().unwrap();
        assert_eq!(loaded, m);

        // No temp file left behind
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let loaded = IndexManifest::load(&dir.path().join("manifest.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_corrupted_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(IndexManifest::load(&path).is_err());
    }

    #[test]
    fn test_chunking_matches() {
        let m = manifest();
        assert!(m.chunking_matches("all-MiniLM-L6-v2", ChunkingMode::Structural, 1200, 2));

        // Any changed parameter invalidates reuse
        assert!(!m.chunking_matches("bge-small-en-v1.5", ChunkingMode::Structural, 1200, 2));
        assert!(!m.chunking_matches("all-MiniLM-L6-v2", ChunkingMode::Windowed, 1200, 2));
        assert!(!m.chunking_matches("all-MiniLM-L6-v2", ChunkingMode::Structural, 800, 2));
        assert!(!m.chunking_matches("all-MiniLM-L6-v2", ChunkingMode::Structural, 1200, 3));
    }
}
