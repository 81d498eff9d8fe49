// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Analyzer errors.

use benchtrack_core::Unit;
use thiserror::Error;

/// Errors that can occur during regression analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyzerError {
    /// Values in different units were compared
    #[error("unit mismatch: expected {expected}, found {found}")]
    UnitMismatch {
        /// Unit of the baseline
        expected: Unit,
        /// Offending unit
        found: Unit,
    },

    /// The candidate commit is not part of the series
    #[error("commit {commit_id} not found in series {series}")]
    CandidateNotFound {
        /// Series key
        series: String,
        /// Commit id
        commit_id: String,
    },

    /// Threshold ratio is negative or not finite
    #[error("invalid threshold ratio {0}")]
    InvalidThreshold(f64),
}

/// Result type for analyzer operations.
pub type Result<T> = std::result::Result<T, AnalyzerError>;
