mod fastembed_manager;

pub use fastembed_manager::FastEmbedManager;

use anyhow::Result;

/// Trait for embedding generation
///
/// A batch call must return exactly one vector per input text; the pipeline
/// treats any count mismatch as fatal rather than accepting a misaligned
/// chunk/vector pairing.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a batch of texts
    fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding for a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(vec![text.to_string()])?;
        match vectors.len() {
            1 => Ok(vectors.remove(0)),
            n => Err(crate::error::EmbeddingError::CountMismatch {
                requested: 1,
                returned: n,
            }
            .into()),
        }
    }

    /// Get the dimension of the embeddings
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}
