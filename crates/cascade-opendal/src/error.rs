//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur against the object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage backend configuration is invalid.
    #[error("storage configuration error: {0}")]
    Config(String),

    /// The underlying operator rejected the operation.
    #[error("storage backend error: {0}")]
    Backend(#[from] opendal::Error),
}
