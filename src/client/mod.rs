//! Core library client for review-rag
//!
//! This module provides the main client interface for building a semantic
//! index over a source tree and querying it, as a library or behind the CLI.

mod fs_lock;
mod indexing;

pub(crate) use fs_lock::FsLockGuard;

use crate::config::Config;
use crate::embedding::{EmbeddingProvider, FastEmbedManager};
use crate::error::{EmbeddingError, ManifestError};
use crate::generation::GenerationProvider;
use crate::indexer::StructuralChunker;
use crate::manifest::IndexManifest;
use crate::retrieval::distance_to_score;
use crate::types::{BuildReport, SearchResult};
use crate::vector_store::{LanceStore, VectorStore};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Main client for building and querying a review-rag index
///
/// # Example
///
/// ```no_run
/// use review_rag::client::ReviewClient;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = ReviewClient::new().await?;
///
///     let report = client
///         .build_index("/path/to/code".as_ref(), CancellationToken::new())
///         .await?;
///     println!(
///         "{} chunks ({} reused)",
///         report.chunks_created, report.embeddings_reused
///     );
///
///     let results = client.search("/path/to/code".as_ref(), "parse config", None).await?;
///     for result in results {
///         println!("{}:{} {:.3}", result.path, result.start_line, result.score);
///     }
///     Ok(())
/// }
/// ```
pub struct ReviewClient {
    pub(crate) config: Arc<Config>,
    pub(crate) embedding: Arc<dyn EmbeddingProvider>,
    pub(crate) store: Arc<dyn VectorStore>,
    pub(crate) chunker: Arc<StructuralChunker>,
}

impl ReviewClient {
    /// Create a client with configuration from file/env and the default
    /// embedding and storage backends
    pub async fn new() -> Result<Self> {
        let config = Config::new()?;
        Self::with_config(config).await
    }

    /// Create a client with an explicit configuration
    pub async fn with_config(config: Config) -> Result<Self> {
        let embedding = Arc::new(FastEmbedManager::with_model_name(
            &config.embedding.model_name,
        )?);

        let db_path = crate::paths::db_path(&config.storage.data_dir);
        let store = Arc::new(
            LanceStore::with_path(&db_path.to_string_lossy())
                .await
                .context("Failed to open vector store")?,
        );

        Ok(Self::with_components(config, embedding, store))
    }

    /// Create a client from pre-built components (library embedders,
    /// alternative stores, test doubles)
    pub fn with_components(
        config: Config,
        embedding: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        let chunker = Arc::new(StructuralChunker::new(
            config.chunking.mode,
            config.chunking.chunk_size,
            config.chunking.overlap_lines,
        ));

        Self {
            config: Arc::new(config),
            embedding,
            store,
            chunker,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Canonicalize a root path for consistent collection/manifest lookups
    pub fn normalize_path(path: &Path) -> Result<String> {
        let canonical = std::fs::canonicalize(path)
            .with_context(|| format!("Failed to canonicalize path: {}", path.display()))?;
        Ok(canonical.to_string_lossy().to_string())
    }

    pub(crate) fn manifest_path(&self, normalized_root: &str) -> PathBuf {
        crate::paths::manifest_path_for_root(&self.config.storage.data_dir, normalized_root)
    }

    pub(crate) fn collection(&self, normalized_root: &str) -> String {
        crate::paths::collection_for_root(normalized_root)
    }

    /// Build (or rebuild) the index for a source tree
    ///
    /// The previous index for the same root is fully replaced; embeddings
    /// are reused wherever chunk identities match under an unchanged
    /// chunking configuration.
    pub async fn build_index(&self, root: &Path, cancel: CancellationToken) -> Result<BuildReport> {
        indexing::build_index(self, root, cancel).await
    }

    /// Search the index for a root with a text query
    pub async fn search(
        &self,
        root: &Path,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        let normalized = Self::normalize_path(root)?;
        let manifest = self.load_manifest_checked(&normalized)?;
        let top_k = top_k.unwrap_or(self.config.search.top_k);

        tracing::debug!(
            "Searching index for '{}' (model {}, top_k {})",
            normalized,
            manifest.embedding_model,
            top_k
        );

        let query_vector = self.embed_query(query).await?;
        let scored = self
            .store
            .vector_search(&self.collection(&normalized), query_vector, top_k)
            .await?;

        Ok(scored
            .into_iter()
            .map(|s| SearchResult {
                path: s.chunk.path,
                content: s.chunk.content,
                score: distance_to_score(s.distance),
                start_line: s.chunk.start_line,
                end_line: s.chunk.end_line,
                language: s.chunk.language,
                node_type: s.chunk.node_type,
                symbol: s.chunk.symbol,
            })
            .collect())
    }

    /// Review the working-tree changes of a repository using indexed
    /// context and a generation model
    pub async fn review(&self, root: &Path, generation: &dyn GenerationProvider) -> Result<String> {
        crate::review::review_changes(self, root, generation).await
    }

    /// Load the manifest for a root, failing with a precondition error when
    /// no index exists, and verifying the embedding model still matches
    pub(crate) fn load_manifest_checked(&self, normalized_root: &str) -> Result<IndexManifest> {
        let manifest_path = self.manifest_path(normalized_root);
        let manifest =
            IndexManifest::load(&manifest_path)?.ok_or_else(|| ManifestError::IndexMissing {
                location: manifest_path.display().to_string(),
            })?;

        if manifest.embedding_model != self.embedding.model_name() {
            return Err(EmbeddingError::ModelMismatch {
                indexed: manifest.embedding_model,
                configured: self.embedding.model_name().to_string(),
            }
            .into());
        }

        Ok(manifest)
    }

    /// Embed a single query text on a blocking thread, under the configured
    /// timeout
    pub(crate) async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let provider = self.embedding.clone();
        let text = text.to_string();
        let timeout_secs = self.config.embedding.timeout_secs;

        let embed_future = tokio::task::spawn_blocking(move || provider.embed(&text));
        match tokio::time::timeout(Duration::from_secs(timeout_secs), embed_future).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(EmbeddingError::GenerationFailed(format!(
                "embedding task panicked: {e}"
            ))
            .into()),
            Err(_) => Err(EmbeddingError::Timeout(timeout_secs).into()),
        }
    }

    /// Embed a batch of texts on a blocking thread, under the configured
    /// timeout
    pub(crate) async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let provider = self.embedding.clone();
        let timeout_secs = self.config.embedding.timeout_secs;

        let embed_future = tokio::task::spawn_blocking(move || provider.embed_batch(texts));
        match tokio::time::timeout(Duration::from_secs(timeout_secs), embed_future).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(EmbeddingError::GenerationFailed(format!(
                "embedding task panicked: {e}"
            ))
            .into()),
            Err(_) => Err(EmbeddingError::Timeout(timeout_secs).into()),
        }
    }
}
