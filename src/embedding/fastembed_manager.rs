use super::EmbeddingProvider;
use crate::error::EmbeddingError;
use anyhow::{Context, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

/// FastEmbed-based embedding provider
///
/// The model is selected by name from the configuration; the name is also
/// what gets recorded in the index manifest, so a model change is visible
/// to the reuse cache.
pub struct FastEmbedManager {
    // fastembed's embed() needs &mut self; the provider trait is &self
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedManager {
    /// Create a manager with the default model (all-MiniLM-L6-v2)
    pub fn new() -> Result<Self> {
        Self::with_model_name("all-MiniLM-L6-v2")
    }

    /// Create a manager for a configured model name
    pub fn with_model_name(name: &str) -> Result<Self> {
        let (model, dimension) = Self::resolve_model(name)?;

        tracing::info!("Initializing FastEmbed model: {name}");

        let options = InitOptions::new(model).with_show_download_progress(true);
        let embedding_model = TextEmbedding::try_new(options).map_err(|e| {
            EmbeddingError::InitializationFailed {
                model: name.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            model: Mutex::new(embedding_model),
            model_name: name.to_string(),
            dimension,
        })
    }

    fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
        let resolved = match name {
            "all-MiniLM-L6-v2" => (EmbeddingModel::AllMiniLML6V2, 384),
            "all-MiniLM-L12-v2" => (EmbeddingModel::AllMiniLML12V2, 384),
            "bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
            "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
            _ => return Err(EmbeddingError::UnknownModel(name.to_string()).into()),
        };
        Ok(resolved)
    }
}

impl EmbeddingProvider for FastEmbedManager {
    fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let mut model = self
            .model
            .lock()
            .map_err(|e| EmbeddingError::GenerationFailed(format!("model lock poisoned: {e}")))?;

        model
            .embed(texts, None)
            .context("Failed to generate embeddings")
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
