use super::GenerationProvider;
use crate::error::GenerationError;
use anyhow::Result;
use ollama_rs::Ollama;
use ollama_rs::generation::completion::request::GenerationRequest;

/// Ollama-backed generation provider
pub struct OllamaGenerator {
    client: Ollama,
    model: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: String) -> Self {
        let (host, port) = parse_host_port(base_url);
        Self {
            client: Ollama::new(host, port),
            model,
        }
    }
}

#[async_trait::async_trait]
impl GenerationProvider for OllamaGenerator {
    async fn generate(&self, prompt: &str, system: &str) -> Result<String> {
        tracing::debug!(
            "Requesting generation from model '{}' ({} prompt chars)",
            self.model,
            prompt.len()
        );

        let request = GenerationRequest::new(self.model.clone(), prompt.to_string())
            .system(system.to_string());

        let response = self
            .client
            .generate(request)
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        if response.response.trim().is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }

        Ok(response.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Split an endpoint URL into the host form and port ollama-rs expects
fn parse_host_port(base_url: &str) -> (String, u16) {
    let trimmed = base_url.trim_end_matches('/');

    let (scheme, rest) = match trimmed.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", trimmed),
    };

    match rest.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse().unwrap_or(11434);
            (format!("{scheme}://{host}"), port)
        }
        None => (format!("{scheme}://{rest}"), 11434),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_port() {
        assert_eq!(
            parse_host_port("http://localhost:11434"),
            ("http://localhost".to_string(), 11434)
        );
        assert_eq!(
            parse_host_port("http://gpu-box:8080/"),
            ("http://gpu-box".to_string(), 8080)
        );
        assert_eq!(
            parse_host_port("localhost"),
            ("http://localhost".to_string(), 11434)
        );
    }

    #[test]
    fn test_model_name() {
        let generator = OllamaGenerator::new("http://localhost:11434", "qwen2.5-coder".to_string());
        assert_eq!(generator.model_name(), "qwen2.5-coder");
    }
}
