//! LanceDB vector store (embedded, no server required)
//!
//! Each index location maps to one Lance table ("collection"). A build
//! replaces the whole table; queries run against the replaced table only
//! after the swap, which keeps half-written state invisible to readers.

use super::VectorStore;
use crate::error::StoreError;
use crate::types::{ChunkStrategy, IndexedChunk, ScoredChunk};
use anyhow::{Context, Result};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator,
    StringArray, UInt32Array, types::Float32Type,
};
use arrow_schema::{DataType, Field, Schema};
use futures::stream::TryStreamExt;
use lancedb::connection::Connection;
use lancedb::index::Index;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;

pub struct LanceStore {
    connection: Connection,
    db_path: String,
}

impl LanceStore {
    /// Open (or create) a Lance database at the given path
    pub async fn with_path(db_path: &str) -> Result<Self> {
        tracing::info!("Connecting to LanceDB at: {db_path}");

        let connection = lancedb::connect(db_path)
            .execute()
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            connection,
            db_path: db_path.to_string(),
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn schema(dimension: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dimension as i32,
                ),
                false,
            ),
            Field::new("id", DataType::Utf8, false),
            Field::new("path", DataType::Utf8, false),
            Field::new("language", DataType::Utf8, true),
            Field::new("start_line", DataType::UInt32, false),
            Field::new("end_line", DataType::UInt32, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("strategy", DataType::Utf8, false),
            Field::new("node_type", DataType::Utf8, true),
            Field::new("symbol", DataType::Utf8, true),
            Field::new("content_hash", DataType::Utf8, false),
            Field::new("file_mtime_ms", DataType::Int64, false),
            Field::new("file_size", DataType::Int64, false),
        ]))
    }

    fn record_batch(records: &[IndexedChunk], schema: Arc<Schema>) -> Result<RecordBatch> {
        let dimension = records[0].embedding.len();

        let embedding_array = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            records
                .iter()
                .map(|r| Some(r.embedding.iter().copied().map(Some))),
            dimension as i32,
        );

        let id_array = StringArray::from(records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>());
        let path_array =
            StringArray::from(records.iter().map(|r| r.path.as_str()).collect::<Vec<_>>());
        let language_array = StringArray::from(
            records
                .iter()
                .map(|r| r.language.as_deref())
                .collect::<Vec<_>>(),
        );
        let start_line_array = UInt32Array::from(
            records
                .iter()
                .map(|r| r.start_line as u32)
                .collect::<Vec<_>>(),
        );
        let end_line_array = UInt32Array::from(
            records
                .iter()
                .map(|r| r.end_line as u32)
                .collect::<Vec<_>>(),
        );
        let content_array = StringArray::from(
            records
                .iter()
                .map(|r| r.content.as_str())
                .collect::<Vec<_>>(),
        );
        let strategy_array = StringArray::from(
            records
                .iter()
                .map(|r| r.strategy.as_str())
                .collect::<Vec<_>>(),
        );
        let node_type_array = StringArray::from(
            records
                .iter()
                .map(|r| r.node_type.as_deref())
                .collect::<Vec<_>>(),
        );
        let symbol_array = StringArray::from(
            records
                .iter()
                .map(|r| r.symbol.as_deref())
                .collect::<Vec<_>>(),
        );
        let content_hash_array = StringArray::from(
            records
                .iter()
                .map(|r| r.content_hash.as_str())
                .collect::<Vec<_>>(),
        );
        let mtime_array =
            Int64Array::from(records.iter().map(|r| r.file_mtime_ms).collect::<Vec<_>>());
        let size_array = Int64Array::from(
            records
                .iter()
                .map(|r| r.file_size as i64)
                .collect::<Vec<_>>(),
        );

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(embedding_array),
                Arc::new(id_array),
                Arc::new(path_array),
                Arc::new(language_array),
                Arc::new(start_line_array),
                Arc::new(end_line_array),
                Arc::new(content_array),
                Arc::new(strategy_array),
                Arc::new(node_type_array),
                Arc::new(symbol_array),
                Arc::new(content_hash_array),
                Arc::new(mtime_array),
                Arc::new(size_array),
            ],
        )
        .context("Failed to create RecordBatch")
    }

    fn chunks_from_batch(batch: &RecordBatch) -> Result<Vec<IndexedChunk>> {
        fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
            batch
                .column_by_name(name)
                .with_context(|| format!("Missing {name} column"))?
                .as_any()
                .downcast_ref::<StringArray>()
                .with_context(|| format!("Invalid {name} type"))
        }

        fn u32_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array> {
            batch
                .column_by_name(name)
                .with_context(|| format!("Missing {name} column"))?
                .as_any()
                .downcast_ref::<UInt32Array>()
                .with_context(|| format!("Invalid {name} type"))
        }

        fn i64_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array> {
            batch
                .column_by_name(name)
                .with_context(|| format!("Missing {name} column"))?
                .as_any()
                .downcast_ref::<Int64Array>()
                .with_context(|| format!("Invalid {name} type"))
        }

        fn opt_string(array: &StringArray, i: usize) -> Option<String> {
            if array.is_null(i) {
                None
            } else {
                Some(array.value(i).to_string())
            }
        }

        let embedding_array = batch
            .column_by_name("embedding")
            .context("Missing embedding column")?
            .as_any()
            .downcast_ref::<FixedSizeListArray>()
            .context("Invalid embedding type")?;

        let id_array = string_col(batch, "id")?;
        let path_array = string_col(batch, "path")?;
        let language_array = string_col(batch, "language")?;
        let start_line_array = u32_col(batch, "start_line")?;
        let end_line_array = u32_col(batch, "end_line")?;
        let content_array = string_col(batch, "content")?;
        let strategy_array = string_col(batch, "strategy")?;
        let node_type_array = string_col(batch, "node_type")?;
        let symbol_array = string_col(batch, "symbol")?;
        let content_hash_array = string_col(batch, "content_hash")?;
        let mtime_array = i64_col(batch, "file_mtime_ms")?;
        let size_array = i64_col(batch, "file_size")?;

        let mut chunks = Vec::with_capacity(batch.num_rows());
        for i in 0..batch.num_rows() {
            let values = embedding_array.value(i);
            let floats = values
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("Invalid embedding element type")?;

            let strategy = ChunkStrategy::parse(strategy_array.value(i)).with_context(|| {
                format!("Unknown chunk strategy: {}", strategy_array.value(i))
            })?;

            chunks.push(IndexedChunk {
                id: id_array.value(i).to_string(),
                path: path_array.value(i).to_string(),
                language: opt_string(language_array, i),
                start_line: start_line_array.value(i) as usize,
                end_line: end_line_array.value(i) as usize,
                content: content_array.value(i).to_string(),
                strategy,
                node_type: opt_string(node_type_array, i),
                symbol: opt_string(symbol_array, i),
                content_hash: content_hash_array.value(i).to_string(),
                file_mtime_ms: mtime_array.value(i),
                file_size: size_array.value(i) as u64,
                embedding: floats.values().to_vec(),
            });
        }

        Ok(chunks)
    }

    async fn drop_if_exists(&self, name: &str) {
        if let Err(e) = self.connection.drop_table(name).await {
            tracing::debug!("Dropping table '{name}' before replace: {e}");
        }
    }
}

#[async_trait::async_trait]
impl VectorStore for LanceStore {
    async fn replace_collection(&self, name: &str, records: Vec<IndexedChunk>) -> Result<usize> {
        let dimension = super::check_dimensions(&records)?;

        if records.is_empty() {
            self.drop_if_exists(name).await;
            return Ok(0);
        }

        let schema = Self::schema(dimension);
        let batch = Self::record_batch(&records, schema.clone())?;
        let count = batch.num_rows();

        self.drop_if_exists(name).await;

        let batches = RecordBatchIterator::new(vec![batch].into_iter().map(Ok), schema);
        let table = self
            .connection
            .create_table(name, Box::new(batches))
            .execute()
            .await
            .map_err(|e| StoreError::ReplaceFailed {
                collection: name.to_string(),
                reason: e.to_string(),
            })?;

        // ANN index creation is best-effort: Lance falls back to a flat scan
        // when no index exists (small collections often cannot train one)
        if let Err(e) = table
            .create_index(&["embedding"], Index::Auto)
            .execute()
            .await
        {
            tracing::warn!("Failed to create vector index, queries will scan '{name}': {e}");
        }

        tracing::info!("Replaced collection '{name}' with {count} records");
        Ok(count)
    }

    async fn vector_search(
        &self,
        name: &str,
        query: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let table = self
            .connection
            .open_table(name)
            .execute()
            .await
            .map_err(|_| StoreError::CollectionNotFound(name.to_string()))?;

        let stream = table
            .vector_search(query)
            .map_err(|e| StoreError::SearchFailed {
                collection: name.to_string(),
                reason: e.to_string(),
            })?
            .limit(limit)
            .execute()
            .await
            .map_err(|e| StoreError::SearchFailed {
                collection: name.to_string(),
                reason: e.to_string(),
            })?;

        let batches: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .context("Failed to collect search results")?;

        let mut results = Vec::new();
        for batch in batches {
            let distance_array = batch
                .column_by_name("_distance")
                .context("Missing _distance column")?
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("Invalid _distance type")?;

            let chunks = Self::chunks_from_batch(&batch)?;
            for (i, chunk) in chunks.into_iter().enumerate() {
                results.push(ScoredChunk {
                    chunk,
                    distance: distance_array.value(i),
                });
            }
        }

        Ok(results)
    }

    async fn read_all(&self, name: &str) -> Result<Vec<IndexedChunk>> {
        let table = match self.connection.open_table(name).execute().await {
            Ok(table) => table,
            Err(e) => {
                tracing::debug!("Collection '{name}' not readable, treating as empty: {e}");
                return Ok(vec![]);
            }
        };

        let stream = table
            .query()
            .execute()
            .await
            .context("Failed to scan collection")?;

        let batches: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .context("Failed to collect records")?;

        let mut chunks = Vec::new();
        for batch in batches {
            chunks.extend(Self::chunks_from_batch(&batch)?);
        }
        Ok(chunks)
    }
}
