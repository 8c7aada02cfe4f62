//! Storage error types

use thiserror::Error;

/// Errors from a key-value store or the form repository
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error (file-backed stores)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored collection is not valid JSON of the expected shape
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store cannot be used (poisoned lock, bad key, ...)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
