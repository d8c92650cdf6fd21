//! Chunk identity and cross-build embedding reuse
//!
//! A chunk's identity is the composite of its location, content digest and
//! chunking metadata. Two chunks are the same iff every field matches, so a
//! structural chunk that moves lines is new even when its body text is
//! byte-identical. The identity key is hashed field-by-field with explicit
//! length prefixes rather than joined with a separator, so a path containing
//! any particular character cannot collide with another key.

use crate::types::{ChunkPart, ChunkStrategy, IndexedChunk};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Number of digest bytes kept in a stable chunk id (32 hex chars)
const CHUNK_ID_BYTES: usize = 16;

/// SHA-256 digest of a text blob, lowercase hex
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The composite of fields that determines whether a chunk is "the same"
/// across rebuilds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkKey<'a> {
    pub path: &'a str,
    pub start_line: usize,
    pub end_line: usize,
    pub content_hash: &'a str,
    /// Empty string when the chunk has no node type
    pub node_type: &'a str,
    /// Empty string when the chunk has no symbol
    pub symbol: &'a str,
    pub strategy: ChunkStrategy,
}

impl<'a> ChunkKey<'a> {
    /// Build the key for a chunk part plus its file path and content digest
    pub fn for_part(path: &'a str, part: &'a ChunkPart, content_hash: &'a str) -> Self {
        Self {
            path,
            start_line: part.start_line,
            end_line: part.end_line,
            content_hash,
            node_type: part.node_type.as_deref().unwrap_or(""),
            symbol: part.symbol.as_deref().unwrap_or(""),
            strategy: part.strategy,
        }
    }

    /// Derive the stable, content-addressed chunk id: a truncated SHA-256
    /// of the length-prefix-framed key fields
    ///
    /// Deterministic across runs for unchanged chunks, so index contents can
    /// be diffed across rebuilds by id.
    pub fn stable_id(&self) -> String {
        let mut hasher = Sha256::new();

        let mut frame = |field: &[u8]| {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field);
        };

        frame(self.path.as_bytes());
        frame(&self.start_line.to_le_bytes());
        frame(&self.end_line.to_le_bytes());
        frame(self.content_hash.as_bytes());
        frame(self.node_type.as_bytes());
        frame(self.symbol.as_bytes());
        frame(self.strategy.as_str().as_bytes());

        let digest = hasher.finalize();
        digest[..CHUNK_ID_BYTES]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

/// Embeddings carried over from the previous build, keyed by stable chunk id
///
/// Built from the prior persisted index only when the chunking configuration
/// (model, mode, chunk size, overlap) is unchanged; otherwise starts empty
/// and every chunk is re-embedded.
#[derive(Debug, Default)]
pub struct ReuseCache {
    embeddings: HashMap<String, Vec<f32>>,
}

impl ReuseCache {
    /// An empty cache: every lookup misses
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the cache from the chunks of the previous build
    pub fn from_prior_index(prior: Vec<IndexedChunk>) -> Self {
        let embeddings = prior
            .into_iter()
            .map(|chunk| (chunk.id, chunk.embedding))
            .collect();
        Self { embeddings }
    }

    /// Look up a prior embedding by stable chunk id
    pub fn lookup(&self, id: &str) -> Option<&[f32]> {
        self.embeddings.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}
