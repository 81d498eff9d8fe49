// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Query errors.

use benchtrack_storage::StoreError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned by queries.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Lower bound is after the upper bound
    #[error("invalid time range: {from} is after {to}")]
    InvalidRange {
        /// Lower bound
        from: DateTime<Utc>,
        /// Upper bound
        to: DateTime<Utc>,
    },
}

/// Result type for queries.
pub type Result<T> = std::result::Result<T, QueryError>;
