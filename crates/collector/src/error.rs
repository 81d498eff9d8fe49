// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ingestion errors.

use benchtrack_core::ValidationError;
use thiserror::Error;

/// Errors that fail a whole ingestion call.
///
/// Per-record failures never surface here; they are reported as outcomes in
/// the [`crate::IngestReport`].
#[derive(Debug, Error)]
pub enum IngestError {
    /// The run header (tool, commit, date) is invalid
    #[error("invalid run: {0}")]
    InvalidRun(#[from] ValidationError),
}

/// Result type for ingestion.
pub type Result<T> = std::result::Result<T, IngestError>;
