// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types shared across Benchtrack crates.

use thiserror::Error;

/// A measurement or run that failed validation at the ingestion boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Tool name is empty
    #[error("tool name must not be empty")]
    EmptyTool,

    /// Benchmark name is empty
    #[error("benchmark name must not be empty")]
    EmptyName,

    /// Commit id is empty
    #[error("commit id must not be empty")]
    MissingCommitId,

    /// Unit is missing or blank
    #[error("benchmark '{name}' has no unit")]
    MissingUnit {
        /// Benchmark name
        name: String,
    },

    /// Value is negative
    #[error("benchmark '{name}' has negative value {value}")]
    NegativeValue {
        /// Benchmark name
        name: String,
        /// Offending value
        value: f64,
    },

    /// Uncertainty is negative
    #[error("benchmark '{name}' has negative range {range}")]
    NegativeRange {
        /// Benchmark name
        name: String,
        /// Offending range
        range: f64,
    },

    /// Value or range is NaN or infinite
    #[error("benchmark '{name}' has a non-finite {field}")]
    NonFinite {
        /// Benchmark name
        name: String,
        /// `value` or `range`
        field: &'static str,
    },

    /// Range string could not be parsed
    #[error("malformed range '{0}'")]
    MalformedRange(String),

    /// Record belongs to another tool or commit than the batch
    #[error("record '{name}' does not belong to {tool}@{commit_id}")]
    ForeignRecord {
        /// Benchmark name
        name: String,
        /// Expected tool
        tool: String,
        /// Expected commit id
        commit_id: String,
    },

    /// The same benchmark appears twice in one batch
    #[error("benchmark '{0}' appears more than once in the batch")]
    DuplicateBenchmark(String),

    /// Run date is outside the representable range
    #[error("invalid run date {0}")]
    InvalidDate(i64),
}

/// Errors raised by core helpers (configuration, telemetry).
#[derive(Debug, Error)]
pub enum Error {
    /// Validation failure
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Logging could not be initialised
    #[error("telemetry error: {0}")]
    Telemetry(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
