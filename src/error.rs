//! Error types for chunking configuration and document loading.
//!
//! Review gates have no error state: every input maps to a decision.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid chunking or gate parameters. Raised at call time, never clamped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("chunk_size must be > 0")]
    ZeroChunkSize,

    #[error("chunk_overlap ({overlap}) must be smaller than chunk_size ({size})")]
    OverlapTooLarge { overlap: usize, size: usize },

    #[error("unknown chunking strategy: '{0}'. Must be fixed_overlap or by_paragraph")]
    UnknownStrategy(String),

    #[error("confidence threshold must be in [0.0, 1.0], got {0}")]
    InvalidThreshold(f64),

    #[error("invalid hedging pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Failure to turn a file into document text.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported file type: '{0}'. Use .txt or .pdf")]
    Unsupported(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF extraction failed for {path}: {message}")]
    Pdf { path: PathBuf, message: String },
}
