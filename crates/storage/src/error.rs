// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Store error taxonomy.

use benchtrack_core::{SeriesKey, Unit, ValidationError};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record failed validation; nothing was written.
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] ValidationError),

    /// The commit was already ingested for this tool (or series).
    #[error("commit {commit_id} already recorded for {tool}")]
    DuplicateCommit {
        /// Tool name
        tool: String,
        /// Commit id
        commit_id: String,
    },

    /// The record's unit differs from the unit its series is recorded in.
    #[error("series {series} is recorded in {expected}, got {found}")]
    UnitMismatch {
        /// Series appended to
        series: SeriesKey,
        /// Unit of the stored series
        expected: Unit,
        /// Unit of the rejected record
        found: Unit,
    },

    /// Storage I/O failed or timed out; the caller may retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be decoded.
    #[error("corrupt stored data: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Corrupt(err.to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
