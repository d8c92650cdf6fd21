/// Centralized error types for review-rag using thiserror
///
/// Provides domain-specific error types for better error handling and user-facing messages.
use thiserror::Error;

/// Main error type for the review-rag system
#[derive(Error, Debug)]
pub enum ReviewRagError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector store error: {0}")]
    Store(#[from] StoreError),

    #[error("Indexing error: {0}")]
    Indexing(#[from] IndexingError),

    #[error("Chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors related to embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Failed to initialize embedding model '{model}': {reason}")]
    InitializationFailed { model: String, reason: String },

    #[error("Unknown embedding model: {0}")]
    UnknownModel(String),

    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),

    #[error("Embedding generation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Embedding batch returned {returned} vectors for {requested} texts")]
    CountMismatch { requested: usize, returned: usize },

    #[error(
        "Index was built with embedding model '{indexed}' but '{configured}' is configured; rebuild the index"
    )]
    ModelMismatch { indexed: String, configured: String },
}

/// Errors related to vector store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to connect to vector store: {0}")]
    ConnectionFailed(String),

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("Failed to replace collection '{collection}': {reason}")]
    ReplaceFailed { collection: String, reason: String },

    #[error("Failed to search collection '{collection}': {reason}")]
    SearchFailed { collection: String, reason: String },

    #[error("Embedding dimension mismatch within one collection: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors related to file indexing
#[derive(Error, Debug)]
pub enum IndexingError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Path is not a directory: {0}")]
    NotADirectory(String),

    #[error("Failed to walk directory: {0}")]
    WalkFailed(String),

    #[error("Another build is already running for: {0}")]
    BuildInProgress(String),

    #[error("Indexing was cancelled")]
    Cancelled,
}

/// Errors related to code chunking
#[derive(Error, Debug)]
pub enum ChunkingError {
    #[error("Failed to parse source: {0}")]
    ParseFailed(String),

    #[error("No parser available for language: {0}")]
    UnsupportedLanguage(String),
}

/// Errors related to the index manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("No index found at {location}; run `review-rag index` first")]
    IndexMissing { location: String },

    #[error("Failed to read manifest from '{path}': {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to write manifest to '{path}': {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Manifest is corrupted: {0}")]
    Corrupted(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to git diff retrieval
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git repository not found at: {0}")]
    RepoNotFound(String),

    #[error("Failed to compute diff: {0}")]
    DiffFailed(String),

    #[error("Working tree has no changes to review")]
    NoChanges,
}

/// Errors related to the generation service
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    RequestFailed(String),

    #[error("Generation model returned an empty response")]
    EmptyResponse,
}

// Conversion from anyhow::Error to ReviewRagError
impl From<anyhow::Error> for ReviewRagError {
    fn from(err: anyhow::Error) -> Self {
        ReviewRagError::Other(format!("{:#}", err))
    }
}

impl ReviewRagError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        ReviewRagError::Other(msg.into())
    }

    /// Check if this is a precondition failure (missing index, no changes)
    /// rather than a system error
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ReviewRagError::Manifest(ManifestError::IndexMissing { .. })
                | ReviewRagError::Git(GitError::NoChanges)
        )
    }
}
