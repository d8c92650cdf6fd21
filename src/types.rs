use serde::{Deserialize, Serialize};

/// How a chunk was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// Aligned to a parsed declaration boundary
    Structural,
    /// Greedy line accumulation against a character budget
    Windowed,
}

impl ChunkStrategy {
    /// Stable string form, used for persistence and identity hashing
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkStrategy::Structural => "structural",
            ChunkStrategy::Windowed => "windowed",
        }
    }

    /// Parse the persisted string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "structural" => Some(ChunkStrategy::Structural),
            "windowed" => Some(ChunkStrategy::Windowed),
            _ => None,
        }
    }
}

/// Chunking mode requested by configuration
///
/// `Structural` still falls back to windowed chunking for files whose
/// language has no parser; `Windowed` forces line-window chunking for
/// every file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingMode {
    Structural,
    Windowed,
}

impl ChunkingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkingMode::Structural => "structural",
            ChunkingMode::Windowed => "windowed",
        }
    }
}

/// One contiguous line range of a source file, ready for identity
/// resolution and embedding
///
/// Line numbers are 1-based and inclusive. `content` is the exact source
/// text for the range; structural chunks are trimmed of leading/trailing
/// whitespace. `node_type` and `symbol` are present only for structural
/// chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPart {
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    pub strategy: ChunkStrategy,
    pub node_type: Option<String>,
    pub symbol: Option<String>,
}

/// A chunk as persisted in the vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    /// Content-addressed identity (truncated digest of the identity key)
    pub id: String,
    /// File path relative to the indexed root
    pub path: String,
    /// Detected language tag, if any
    pub language: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    pub strategy: ChunkStrategy,
    pub node_type: Option<String>,
    pub symbol: Option<String>,
    /// Digest of `content`
    pub content_hash: String,
    /// Source file modification time, milliseconds since the epoch
    pub file_mtime_ms: i64,
    /// Source file size in bytes
    pub file_size: u64,
    pub embedding: Vec<f32>,
}

/// A chunk returned from a nearest-neighbor search, carrying the store's
/// native distance (smaller is closer)
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: IndexedChunk,
    pub distance: f32,
}

/// A single search result with a normalized similarity score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// File path relative to the indexed root
    pub path: String,
    /// The chunk content
    pub content: String,
    /// Similarity score, higher is closer
    pub score: f32,
    pub start_line: usize,
    pub end_line: usize,
    pub language: Option<String>,
    pub node_type: Option<String>,
    pub symbol: Option<String>,
}

/// Outcome of one index build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    /// Number of files chunked and indexed
    pub files_indexed: usize,
    /// Number of chunks in the final index
    pub chunks_created: usize,
    /// Chunks whose embedding was reused from the previous build
    pub embeddings_reused: usize,
    /// Chunks that required a fresh embedding call
    pub embeddings_generated: usize,
    /// Time taken in milliseconds
    pub duration_ms: u64,
    /// Non-fatal per-file errors (skipped files)
    #[serde(default)]
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_string_roundtrip() {
        for strategy in [ChunkStrategy::Structural, ChunkStrategy::Windowed] {
            assert_eq!(ChunkStrategy::parse(strategy.as_str()), Some(strategy));
        }
        assert_eq!(ChunkStrategy::parse("ast"), None);
    }

    #[test]
    fn test_strategy_serde_form() {
        let json = serde_json::to_string(&ChunkStrategy::Structural).unwrap();
        assert_eq!(json, "\"structural\"");
        let mode: ChunkingMode = serde_json::from_str("\"windowed\"").unwrap();
        assert_eq!(mode, ChunkingMode::Windowed);
    }

    #[test]
    fn test_indexed_chunk_serialization_roundtrip() {
        let chunk = IndexedChunk {
            id: "abc123".to_string(),
            path: "src/lib.rs".to_string(),
            language: Some("Rust".to_string()),
            start_line: 1,
            end_line: 12,
            content: "fn main() {}".to_string(),
            strategy: ChunkStrategy::Structural,
            node_type: Some("function_item".to_string()),
            symbol: Some("main".to_string()),
            content_hash: "deadbeef".to_string(),
            file_mtime_ms: 1_700_000_000_000,
            file_size: 512,
            embedding: vec![0.1, 0.2, 0.3],
        };

        let json = serde_json::to_string(&chunk).unwrap();
        let back: IndexedChunk = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, chunk.id);
        assert_eq!(back.start_line, 1);
        assert_eq!(back.embedding.len(), 3);
        assert_eq!(back.strategy, ChunkStrategy::Structural);
    }
}
