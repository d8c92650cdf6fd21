//! In-memory vector store
//!
//! Holds collections in a map and answers searches with a cosine scan.
//! Reports `1 - cosine` as its distance so [`distance_to_score`] orders
//! results identically to the cosine-based ranking path.
//!
//! [`distance_to_score`]: crate::retrieval::distance_to_score

use super::VectorStore;
use crate::retrieval::cosine_similarity;
use crate::types::{IndexedChunk, ScoredChunk};
use anyhow::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<IndexedChunk>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl VectorStore for MemoryStore {
    async fn replace_collection(&self, name: &str, records: Vec<IndexedChunk>) -> Result<usize> {
        super::check_dimensions(&records)?;

        let count = records.len();
        let mut collections = self.collections.write().await;
        collections.insert(name.to_string(), records);

        tracing::debug!("Replaced in-memory collection '{name}' with {count} records");
        Ok(count)
    }

    async fn vector_search(
        &self,
        name: &str,
        query: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let collections = self.collections.read().await;
        let Some(records) = collections.get(name) else {
            return Ok(vec![]);
        };

        let mut scored: Vec<ScoredChunk> = records
            .iter()
            .map(|chunk| ScoredChunk {
                chunk: chunk.clone(),
                distance: 1.0 - cosine_similarity(&query, &chunk.embedding),
            })
            .collect();

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn read_all(&self, name: &str) -> Result<Vec<IndexedChunk>> {
        let collections = self.collections.read().await;
        Ok(collections.get(name).cloned().unwrap_or_default())
    }
}
