//! # review-rag - Semantic Code Index and Review Context
//!
//! Builds a semantic index over a source-code tree and supplies relevant
//! snippets to a text-generation model when reviewing a change.
//!
//! ## Overview
//!
//! Source files are chunked along parsed declaration boundaries (with a
//! line-window fallback for every other file), embedded, and persisted to an
//! embedded vector store. Each chunk carries a stable, content-addressed
//! identity, so rebuilding an index reuses every embedding whose chunk did
//! not change. Queries embed a question or a git diff and rank the indexed
//! chunks by similarity; the review flow feeds diff plus retrieved context
//! to a generation model.
//!
//! ## Key Features
//!
//! - **Structural Chunking**: tree-sitter parsing for 12 programming
//!   languages, windowed chunking for everything else
//! - **Embedding Reuse**: identity-keyed cache skips re-embedding unchanged
//!   chunks across rebuilds
//! - **Local Embeddings**: FastEmbed (all-MiniLM-L6-v2 by default)
//! - **Embedded Vector Store**: LanceDB, no server required
//! - **Change Review**: working-tree diff + indexed context through an
//!   Ollama-served model
//!
//! ## Modules
//!
//! - [`client`]: High-level client (build, search, review)
//! - [`indexer`]: File walking, AST parsing, and chunking
//! - [`identity`]: Chunk identity keys and the embedding reuse cache
//! - [`embedding`]: Embedding generation using FastEmbed
//! - [`vector_store`]: Vector store abstraction (LanceDB and in-memory)
//! - [`retrieval`]: Similarity scoring and ranking
//! - [`generation`]: Generation service abstraction (Ollama)
//! - [`manifest`]: Persisted index build metadata
//! - [`git_diff`]: Working-tree diff retrieval
//! - [`config`]: Configuration management
//! - [`error`]: Error types
//! - [`types`]: Core data types
//! - [`paths`]: Platform paths and index locations
//!
//! ## Usage Example
//!
//! ```no_run
//! use review_rag::client::ReviewClient;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ReviewClient::new().await?;
//!     client
//!         .build_index("/path/to/code".as_ref(), CancellationToken::new())
//!         .await?;
//!     Ok(())
//! }
//! ```

/// Command-line interface
pub mod cli;

/// High-level client: build, search, review
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Embedding generation using FastEmbed
pub mod embedding;

/// Error types and utilities
pub mod error;

/// Generation service abstraction (Ollama)
pub mod generation;

/// Working-tree diff retrieval
pub mod git_diff;

/// Chunk identity keys and the embedding reuse cache
pub mod identity;

/// File walking, AST parsing, and chunking
pub mod indexer;

/// Persisted index build metadata
pub mod manifest;

/// Platform paths and index locations
pub mod paths;

/// Similarity scoring and ranking
pub mod retrieval;

/// Change review orchestration
pub mod review;

/// Core data types
pub mod types;

/// Vector store abstraction (LanceDB and in-memory)
pub mod vector_store;

pub use client::ReviewClient;
pub use error::ReviewRagError;
