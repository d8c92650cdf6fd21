//! End-to-end pipeline tests with a deterministic embedder and the
//! in-memory vector store

use review_rag::client::ReviewClient;
use review_rag::config::Config;
use review_rag::embedding::EmbeddingProvider;
use review_rag::error::{EmbeddingError, ManifestError};
use review_rag::types::ChunkingMode;
use review_rag::vector_store::{MemoryStore, VectorStore};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Deterministic embedder that counts how many texts it was asked to embed
struct StubEmbedder {
    model: String,
    texts_embedded: AtomicUsize,
    /// When set, every batch returns one vector too few
    drop_one: bool,
}

impl StubEmbedder {
    fn new() -> Self {
        Self::named("stub-model")
    }

    fn named(model: &str) -> Self {
        Self {
            model: model.to_string(),
            texts_embedded: AtomicUsize::new(0),
            drop_one: false,
        }
    }

    fn broken() -> Self {
        Self {
            model: "stub-model".to_string(),
            texts_embedded: AtomicUsize::new(0),
            drop_one: true,
        }
    }

    fn total_texts(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for StubEmbedder {
    fn embed_batch(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);

        let mut vectors: Vec<Vec<f32>> = texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; 8];
                for (i, b) in text.bytes().enumerate() {
                    v[i % 8] += b as f32;
                }
                v
            })
            .collect();

        if self.drop_one {
            vectors.pop();
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        8
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn test_config(data_dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = data_dir.to_path_buf();
    config.chunking.chunk_size = 120;
    config.chunking.overlap_lines = 1;
    config
}

fn write_tree(root: &Path) {
    fs::write(
        root.join("app.ts"),
        r#"export function parse(input: string): number {
    return Number(input);
}

class Parser {
    parse(input: string): number {
        return parse(input);
    }
}
"#,
    )
    .unwrap();

    fs::write(
        root.join("notes.txt"),
        "first note line\nsecond note line\nthird note line\n",
    )
    .unwrap();
}

struct Harness {
    data_dir: TempDir,
    tree: TempDir,
    store: Arc<MemoryStore>,
    embedder: Arc<StubEmbedder>,
    client: ReviewClient,
}

fn harness_with(embedder: StubEmbedder, configure: impl FnOnce(&mut Config)) -> Harness {
    let data_dir = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    write_tree(tree.path());

    let mut config = test_config(data_dir.path());
    configure(&mut config);

    let store = Arc::new(MemoryStore::new());
    let embedder = Arc::new(embedder);
    let client = ReviewClient::with_components(
        config,
        embedder.clone() as Arc<dyn EmbeddingProvider>,
        store.clone() as Arc<dyn VectorStore>,
    );

    Harness {
        data_dir,
        tree,
        store,
        embedder,
        client,
    }
}

fn harness() -> Harness {
    harness_with(StubEmbedder::new(), |_| {})
}

impl Harness {
    /// A second client over the same store and manifests, with a possibly
    /// different configuration or embedder
    fn reconfigured(
        &self,
        embedder: StubEmbedder,
        configure: impl FnOnce(&mut Config),
    ) -> (Arc<StubEmbedder>, ReviewClient) {
        let mut config = test_config(self.data_dir.path());
        configure(&mut config);
        let embedder = Arc::new(embedder);
        let client = ReviewClient::with_components(
            config,
            embedder.clone() as Arc<dyn EmbeddingProvider>,
            self.store.clone() as Arc<dyn VectorStore>,
        );
        (embedder, client)
    }

    fn collection(&self) -> String {
        let normalized = ReviewClient::normalize_path(self.tree.path()).unwrap();
        review_rag::paths::collection_for_root(&normalized)
    }
}

#[tokio::test]
async fn test_build_then_identical_rebuild_reuses_everything() {
    let h = harness();

    let first = h
        .client
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.files_indexed, 2);
    assert!(first.chunks_created > 0);
    assert_eq!(first.embeddings_generated, first.chunks_created);
    assert_eq!(first.embeddings_reused, 0);

    let texts_after_first = h.embedder.total_texts();
    assert_eq!(texts_after_first, first.chunks_created);

    let second = h
        .client
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(second.chunks_created, first.chunks_created);
    assert_eq!(second.embeddings_reused, second.chunks_created);
    assert_eq!(second.embeddings_generated, 0);
    // Zero new embedding calls
    assert_eq!(h.embedder.total_texts(), texts_after_first);
}

#[tokio::test]
async fn test_modified_file_reembeds_only_its_chunks() {
    let h = harness();

    let first = h
        .client
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    fs::write(
        h.tree.path().join("notes.txt"),
        "first note line\nsecond note line\nthird note line\nfourth note line\n",
    )
    .unwrap();

    let second = h
        .client
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    assert!(second.embeddings_generated > 0, "edited file must re-embed");
    assert!(second.embeddings_reused > 0, "untouched file must reuse");
    assert_eq!(
        second.embeddings_reused + second.embeddings_generated,
        second.chunks_created
    );
    assert!(second.embeddings_reused < first.chunks_created);
}

#[tokio::test]
async fn test_mtime_change_alone_still_reuses() {
    let h = harness();

    h.client
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    // Touch without content change: identity keys do not include mtime
    let target = h.tree.path().join("app.ts");
    filetime::set_file_mtime(&target, filetime::FileTime::from_unix_time(2_000_000_000, 0))
        .unwrap();

    let second = h
        .client
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(second.embeddings_generated, 0);
    assert_eq!(second.embeddings_reused, second.chunks_created);
}

#[tokio::test]
async fn test_chunk_size_change_invalidates_whole_cache() {
    let h = harness();

    let first = h
        .client
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();
    assert!(first.chunks_created > 0);

    let (_, resized) = h.reconfigured(StubEmbedder::new(), |config| {
        config.chunking.chunk_size = 60;
    });

    let second = resized
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(second.embeddings_reused, 0);
    assert_eq!(second.embeddings_generated, second.chunks_created);
}

#[tokio::test]
async fn test_mode_change_invalidates_whole_cache() {
    let h = harness();

    h.client
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    let (_, windowed) = h.reconfigured(StubEmbedder::new(), |config| {
        config.chunking.mode = ChunkingMode::Windowed;
    });

    let second = windowed
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(second.embeddings_reused, 0);
    assert_eq!(second.embeddings_generated, second.chunks_created);
}

#[tokio::test]
async fn test_count_mismatch_aborts_without_persisting() {
    let h = harness();

    let first = h
        .client
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    let before = h.store.read_all(&h.collection()).await.unwrap();
    assert_eq!(before.len(), first.chunks_created);

    // Change a file so the next build has embedding misses, then make the
    // embedder return one vector too few
    fs::write(h.tree.path().join("notes.txt"), "entirely new content\n").unwrap();

    let (_, broken) = h.reconfigured(StubEmbedder::broken(), |_| {});
    let err = broken
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<EmbeddingError>(),
        Some(EmbeddingError::CountMismatch { .. })
    ));

    // The previous index survives untouched
    let after = h.store.read_all(&h.collection()).await.unwrap();
    assert_eq!(after.len(), before.len());
    let mut before_ids: Vec<_> = before.iter().map(|c| c.id.clone()).collect();
    let mut after_ids: Vec<_> = after.iter().map(|c| c.id.clone()).collect();
    before_ids.sort();
    after_ids.sort();
    assert_eq!(before_ids, after_ids);
}

#[tokio::test]
async fn test_persisted_records_are_sorted_by_path_and_line() {
    let h = harness();

    h.client
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    let records = h.store.read_all(&h.collection()).await.unwrap();
    for pair in records.windows(2) {
        assert!(
            (pair[0].path.as_str(), pair[0].start_line, pair[0].end_line)
                <= (pair[1].path.as_str(), pair[1].start_line, pair[1].end_line)
        );
    }
}

#[tokio::test]
async fn test_search_missing_index_is_precondition_failure() {
    let h = harness();

    let err = h
        .client
        .search(h.tree.path(), "anything", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ManifestError>(),
        Some(ManifestError::IndexMissing { .. })
    ));
}

#[tokio::test]
async fn test_search_respects_top_k() {
    let h = harness();

    h.client
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    let results = h
        .client
        .search(h.tree.path(), "parse a number", Some(2))
        .await
        .unwrap();
    assert!(results.len() <= 2);
    assert!(!results.is_empty());

    // Scores descend
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_search_with_different_model_fails() {
    let h = harness();

    h.client
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    let (_, other_model) = h.reconfigured(StubEmbedder::named("other-model"), |_| {});
    let err = other_model
        .search(h.tree.path(), "anything", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<EmbeddingError>(),
        Some(EmbeddingError::ModelMismatch { .. })
    ));
}

#[tokio::test]
async fn test_model_change_forces_full_reembedding() {
    let h = harness();

    h.client
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    let (embedder, other_model) = h.reconfigured(StubEmbedder::named("other-model"), |_| {});
    let report = other_model
        .build_index(h.tree.path(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.embeddings_reused, 0);
    assert_eq!(report.embeddings_generated, report.chunks_created);
    assert_eq!(embedder.total_texts(), report.chunks_created);
}
