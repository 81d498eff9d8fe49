// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Layered settings.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults,
//! 2. an optional configuration file (TOML, JSON or YAML),
//! 3. environment variables prefixed `BENCHTRACK__`, with `__` separating
//!    sections (`BENCHTRACK__STORAGE__DATABASE_URL`).
//!
//! A `.env` file in the working directory is loaded first when present.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "BENCHTRACK";

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// History store settings.
    pub storage: StorageSettings,
    /// Regression analyzer settings.
    pub analyzer: AnalyzerSettings,
    /// HTTP service settings.
    pub server: ServerSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// History store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite database URL.
    pub database_url: String,
    /// Upper bound for any single storage operation, in milliseconds.
    pub io_timeout_ms: u64,
    /// Connection pool size.
    pub max_connections: u32,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://benchtrack.db".to_string(),
            io_timeout_ms: 5_000,
            max_connections: 4,
        }
    }
}

impl StorageSettings {
    /// I/O timeout as a duration.
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

/// Central statistic of a baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    /// Mean and sample standard deviation.
    #[default]
    Mean,
    /// Median and median absolute deviation (outlier resistant).
    Median,
}

/// Per-benchmark override of the analyzer policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkPolicy {
    /// Threshold ratio override.
    pub threshold_ratio: Option<f64>,
    /// Window size override.
    pub window_size: Option<usize>,
    /// Statistic override.
    pub statistic: Option<Statistic>,
}

/// Regression analyzer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Number of preceding records in a baseline.
    pub window_size: usize,
    /// Fewer baseline samples than this yield `insufficient_history`.
    pub min_history: usize,
    /// Relative deviation tolerated before flagging (0.2 = 20%).
    pub threshold_ratio: f64,
    /// Central statistic.
    pub statistic: Statistic,
    /// Overrides keyed by `tool/name` or by benchmark name.
    pub overrides: HashMap<String, BenchmarkPolicy>,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            window_size: 5,
            min_history: 3,
            threshold_ratio: 0.2,
            statistic: Statistic::Mean,
            overrides: HashMap::new(),
        }
    }
}

/// HTTP service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to bind.
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
