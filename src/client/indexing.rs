//! Index build orchestration
//!
//! One build fully replaces the persisted collection for a root: walk,
//! chunk, resolve each chunk against the reuse cache, batch-embed the
//! misses, merge, sort, persist, then write the manifest. Nothing is
//! persisted if any embedding batch comes back misaligned.

use super::{FsLockGuard, ReviewClient};
use crate::error::{EmbeddingError, IndexingError};
use crate::identity::{ChunkKey, ReuseCache, content_hash};
use crate::indexer::{FileWalker, ParsedLanguage, SourceFile};
use crate::manifest::IndexManifest;
use crate::types::{BuildReport, ChunkPart, IndexedChunk};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Helper macro to check for cancellation and return early if cancelled
macro_rules! check_cancelled {
    ($cancel_token:expr) => {
        if $cancel_token.is_cancelled() {
            tracing::info!("Index build cancelled");
            return Err(IndexingError::Cancelled.into());
        }
    };
}

/// A chunk waiting for its embedding (reused or freshly generated)
struct PendingChunk {
    part: ChunkPart,
    path: String,
    language: Option<String>,
    file_mtime_ms: i64,
    file_size: u64,
    content_hash: String,
    id: String,
}

impl PendingChunk {
    fn for_file(file: &SourceFile, part: ChunkPart) -> Self {
        let hash = content_hash(&part.content);
        let id = ChunkKey::for_part(&file.relative_path, &part, &hash).stable_id();
        Self {
            path: file.relative_path.clone(),
            language: file.language.clone(),
            file_mtime_ms: file.mtime_ms,
            file_size: file.size,
            content_hash: hash,
            id,
            part,
        }
    }

    fn into_indexed(self, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk {
            id: self.id,
            path: self.path,
            language: self.language,
            start_line: self.part.start_line,
            end_line: self.part.end_line,
            content: self.part.content,
            strategy: self.part.strategy,
            node_type: self.part.node_type,
            symbol: self.part.symbol,
            content_hash: self.content_hash,
            file_mtime_ms: self.file_mtime_ms,
            file_size: self.file_size,
            embedding,
        }
    }
}

pub(crate) async fn build_index(
    client: &ReviewClient,
    root: &Path,
    cancel: CancellationToken,
) -> Result<BuildReport> {
    let start = Instant::now();
    let normalized = ReviewClient::normalize_path(root)?;

    // Cross-process exclusion: one build per index location
    let lock_target = normalized.clone();
    let _lock = tokio::task::spawn_blocking(move || FsLockGuard::try_acquire(&lock_target))
        .await
        .context("Lock task panicked")??
        .ok_or_else(|| IndexingError::BuildInProgress(normalized.clone()))?;

    // Walk the tree on a blocking thread; wire the cancellation token to the
    // walker's flag so a cancel interrupts the walk too
    let cancelled_flag = Arc::new(AtomicBool::new(false));
    let flag_for_watcher = cancelled_flag.clone();
    let token_for_watcher = cancel.clone();
    let _cancel_watcher = tokio::spawn(async move {
        token_for_watcher.cancelled().await;
        flag_for_watcher.store(true, Ordering::Relaxed);
    });

    let walker = FileWalker::new(&normalized, client.config.indexing.max_file_size)
        .with_excluded_dirs(client.config.indexing.excluded_dirs.clone())
        .with_cancellation_flag(cancelled_flag);

    let walk = tokio::task::spawn_blocking(move || walker.walk())
        .await
        .context("Failed to spawn file walker task")?
        .context("Failed to walk directory")?;

    check_cancelled!(cancel);

    let files_indexed = walk.files.len();
    let errors: Vec<String> = walk
        .skipped
        .iter()
        .map(|path| format!("Skipped unreadable file: {path}"))
        .collect();

    // Decide whether the previous build's embeddings can be reused
    let manifest_path = client.manifest_path(&normalized);
    let collection = client.collection(&normalized);
    let chunking = &client.config.chunking;

    let cache = match IndexManifest::load(&manifest_path)? {
        Some(prior)
            if prior.chunking_matches(
                client.embedding.model_name(),
                chunking.mode,
                chunking.chunk_size,
                chunking.overlap_lines,
            ) =>
        {
            match client.store.read_all(&collection).await {
                Ok(chunks) => {
                    tracing::info!("Loaded {} prior chunks for embedding reuse", chunks.len());
                    ReuseCache::from_prior_index(chunks)
                }
                Err(e) => {
                    tracing::warn!("Could not read prior index, re-embedding everything: {e}");
                    ReuseCache::empty()
                }
            }
        }
        Some(_) => {
            tracing::info!("Chunking configuration changed, re-embedding everything");
            ReuseCache::empty()
        }
        None => ReuseCache::empty(),
    };

    // Chunk every file and derive each chunk's identity
    let mut pending = Vec::new();
    for file in &walk.files {
        check_cancelled!(cancel);
        let language = file
            .extension
            .as_deref()
            .and_then(ParsedLanguage::from_extension);
        for part in client.chunker.chunk(&file.content, language) {
            pending.push(PendingChunk::for_file(file, part));
        }
    }
    let chunks_created = pending.len();

    // Resolve against the reuse cache
    let mut records = Vec::with_capacity(chunks_created);
    let mut misses = Vec::new();
    for chunk in pending {
        match cache.lookup(&chunk.id) {
            Some(embedding) => records.push(chunk.into_indexed(embedding.to_vec())),
            None => misses.push(chunk),
        }
    }
    let embeddings_reused = records.len();

    tracing::info!(
        "{} chunks total, {} reused, {} to embed",
        chunks_created,
        embeddings_reused,
        misses.len()
    );

    // Batch-embed the misses. Any count mismatch aborts the build before
    // anything is persisted: a misaligned chunk/vector pairing must never
    // reach the store.
    let batch_size = client.config.embedding.batch_size;
    let mut fresh_embeddings = Vec::with_capacity(misses.len());
    for batch in misses.chunks(batch_size) {
        check_cancelled!(cancel);

        let texts: Vec<String> = batch.iter().map(|c| c.part.content.clone()).collect();
        let requested = texts.len();

        let vectors = client.embed_batch(texts).await?;
        if vectors.len() != requested {
            return Err(EmbeddingError::CountMismatch {
                requested,
                returned: vectors.len(),
            }
            .into());
        }
        fresh_embeddings.extend(vectors);
    }
    let embeddings_generated = fresh_embeddings.len();

    for (chunk, embedding) in misses.into_iter().zip(fresh_embeddings) {
        records.push(chunk.into_indexed(embedding));
    }

    records.sort_by(|a, b| {
        (a.path.as_str(), a.start_line, a.end_line).cmp(&(b.path.as_str(), b.start_line, b.end_line))
    });

    check_cancelled!(cancel);

    client
        .store
        .replace_collection(&collection, records)
        .await
        .context("Failed to persist index")?;

    let manifest = IndexManifest {
        embedding_model: client.embedding.model_name().to_string(),
        chunking_mode: chunking.mode,
        chunk_size: chunking.chunk_size,
        overlap_lines: chunking.overlap_lines,
        excluded_dirs: client.config.indexing.excluded_dirs.clone(),
        files_indexed,
        chunks_indexed: chunks_created,
        built_at: chrono::Utc::now().to_rfc3339(),
    };
    manifest.store(&manifest_path)?;

    let report = BuildReport {
        files_indexed,
        chunks_created,
        embeddings_reused,
        embeddings_generated,
        duration_ms: start.elapsed().as_millis() as u64,
        errors,
    };

    tracing::info!(
        "Indexed {} files into {} chunks in {}ms ({} embeddings reused)",
        report.files_indexed,
        report.chunks_created,
        report.duration_ms,
        report.embeddings_reused
    );

    Ok(report)
}
