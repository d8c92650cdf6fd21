//! Generation service abstraction
//!
//! The review flow hands a prompt plus system instructions to a generation
//! model and returns its text. Failures surface as a single descriptive
//! error; retry policy is left to the caller.

mod ollama;

pub use ollama::OllamaGenerator;

use anyhow::Result;

/// Trait for text generation
#[async_trait::async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate text for a prompt under the given system instructions
    async fn generate(&self, prompt: &str, system: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}
