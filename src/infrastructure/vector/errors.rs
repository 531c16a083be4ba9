use thiserror::Error;

use crate::domain::errors::DomainError;

/// Errors raised while building, persisting or querying the handbook index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Invalid chunking configuration: {0}")]
    InvalidChunking(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Index I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<IndexError> for DomainError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::InvalidChunking(msg) => Self::ValidationFailed(msg),
            IndexError::Serialization(e) => Self::SerializationError(e.to_string()),
            other => Self::ExecutionFailed(other.to_string()),
        }
    }
}
