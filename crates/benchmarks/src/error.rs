//! Errors of dump handling.

use benchtrack_storage::StoreError;
use thiserror::Error;

/// Errors that can occur while reading, writing or exporting dumps.
#[derive(Debug, Error)]
pub enum DumpError {
    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Store failure during export
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for dump operations.
pub type Result<T> = std::result::Result<T, DumpError>;
