//! Storage layer error types.

use thiserror::Error;

/// Errors raised by the in-memory store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid record on line {line}: {source}")]
    InvalidRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
