//! File walking, language detection, and chunking
//!
//! Provides functionality to walk a source tree, detect languages, parse
//! syntax trees, and chunk files into retrievable units for embedding.

pub mod ast_parser;
mod chunker;
mod file_walker;
pub mod language;
mod source_file;

pub use chunker::StructuralChunker;
pub use file_walker::{FileWalker, WalkReport};
pub use language::{ParsedLanguage, detect_language};
pub use source_file::SourceFile;
