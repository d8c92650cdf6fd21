// LanceDB is the default embedded vector store (stable, no server required)
pub mod lance_store;
pub use lance_store::LanceStore;

// In-memory store: embedded fallback and test double
pub mod memory;
pub use memory::MemoryStore;

use crate::types::{IndexedChunk, ScoredChunk};
use anyhow::Result;

/// Trait for vector store operations
///
/// A build owns its collection exclusively: `replace_collection` swaps the
/// whole record set in one step from the caller's point of view, and
/// queries never observe a half-written collection.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Atomically replace the named collection with the given records.
    /// All embeddings must share one dimensionality, enforced here.
    /// Returns the number of records written.
    async fn replace_collection(&self, name: &str, records: Vec<IndexedChunk>) -> Result<usize>;

    /// Nearest-neighbor search; results carry the store's native distance
    /// (smaller is closer) and are ordered closest-first.
    async fn vector_search(
        &self,
        name: &str,
        query: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>>;

    /// Read every record in the collection; an absent collection reads as
    /// empty (the reuse cache treats that as a cold start).
    async fn read_all(&self, name: &str) -> Result<Vec<IndexedChunk>>;
}

/// Check that every record's embedding has the same dimensionality
pub(crate) fn check_dimensions(records: &[IndexedChunk]) -> Result<usize> {
    let expected = records
        .first()
        .map(|r| r.embedding.len())
        .unwrap_or_default();

    for record in records {
        if record.embedding.len() != expected {
            return Err(crate::error::StoreError::DimensionMismatch {
                expected,
                actual: record.embedding.len(),
            }
            .into());
        }
    }
    Ok(expected)
}
