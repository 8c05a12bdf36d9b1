use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Completion unavailable: {0}")]
    CompletionUnavailable(String),

    #[error("Cache corrupt at {}: {reason}", path.display())]
    CacheCorrupt { path: PathBuf, reason: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures that leave a query with nothing to rank.
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(self, Error::EmbeddingUnavailable(_) | Error::Timeout { .. } | Error::DimensionMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
