/// Configuration system for review-rag
///
/// Supports loading from multiple sources with priority:
/// Environment variables > Config file > Defaults
use crate::error::{ConfigError, ReviewRagError};
use crate::types::ChunkingMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Indexing configuration
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Generation (review model) configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Storage locations
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name (e.g., "all-MiniLM-L6-v2", "bge-small-en-v1.5")
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Batch size for embedding generation
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Timeout in seconds for one embedding batch
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Chunking mode: structural falls back to windowed per file
    #[serde(default = "default_chunking_mode")]
    pub mode: ChunkingMode,

    /// Character budget per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Line overlap between consecutive windowed chunks
    #[serde(default = "default_overlap_lines")]
    pub overlap_lines: usize,
}

/// Indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Maximum file size to index (in bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Directory names pruned from the walk
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of results to retrieve
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Generation configuration for the review model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model served by the generation endpoint
    #[serde(default = "default_generation_model")]
    pub model_name: String,

    /// Ollama endpoint URL
    #[serde(default = "default_generation_url")]
    pub url: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the vector database and manifests
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

// Default value functions
fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_embedding_timeout() -> u64 {
    30
}

fn default_chunking_mode() -> ChunkingMode {
    ChunkingMode::Structural
}

fn default_chunk_size() -> usize {
    1200
}

fn default_overlap_lines() -> usize {
    2
}

fn default_max_file_size() -> u64 {
    1_048_576 // 1 MB
}

fn default_excluded_dirs() -> Vec<String> {
    vec![
        ".git".to_string(),
        "node_modules".to_string(),
        "target".to_string(),
        "dist".to_string(),
        "build".to_string(),
        "vendor".to_string(),
        ".venv".to_string(),
    ]
}

fn default_top_k() -> usize {
    8
}

fn default_generation_model() -> String {
    "qwen2.5-coder".to_string()
}

fn default_generation_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_data_dir() -> PathBuf {
    crate::paths::PlatformPaths::default_data_dir()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            batch_size: default_batch_size(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            mode: default_chunking_mode(),
            chunk_size: default_chunk_size(),
            overlap_lines: default_overlap_lines(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            excluded_dirs: default_excluded_dirs(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_name: default_generation_model(),
            url: default_generation_url(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, ReviewRagError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location, falling back to defaults
    pub fn load_or_default() -> Result<Self, ReviewRagError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ReviewRagError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ReviewRagError> {
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "embedding.batch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "chunking.chunk_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.indexing.max_file_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "indexing.max_file_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.search.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                key: "search.top_k".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("REVIEW_RAG_MODEL") {
            self.embedding.model_name = model;
        }

        if let Ok(batch_size) = std::env::var("REVIEW_RAG_BATCH_SIZE")
            && let Ok(size) = batch_size.parse()
        {
            self.embedding.batch_size = size;
        }

        if let Ok(chunk_size) = std::env::var("REVIEW_RAG_CHUNK_SIZE")
            && let Ok(size) = chunk_size.parse()
        {
            self.chunking.chunk_size = size;
        }

        if let Ok(top_k) = std::env::var("REVIEW_RAG_TOP_K")
            && let Ok(k) = top_k.parse()
        {
            self.search.top_k = k;
        }

        if let Ok(dir) = std::env::var("REVIEW_RAG_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }

        if let Ok(model) = std::env::var("REVIEW_RAG_GENERATION_MODEL") {
            self.generation.model_name = model;
        }

        if let Ok(url) = std::env::var("REVIEW_RAG_OLLAMA_URL") {
            self.generation.url = url;
        }
    }

    /// Create a new Config with defaults, file values, and environment overrides
    pub fn new() -> Result<Self, ReviewRagError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
