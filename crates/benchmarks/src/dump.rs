//! The `data.js` benchmark dump.

use benchtrack_core::BenchmarkRun;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// JavaScript assignment wrapping the JSON document.
pub const ASSIGNMENT_PREFIX: &str = "window.BENCHMARK_DATA = ";

/// Suite name used when none is given.
pub const DEFAULT_SUITE: &str = "Rust Benchmark";

/// Whole benchmark history of a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkData {
    /// Time of the last update, epoch milliseconds.
    pub last_update: i64,
    /// Repository the history belongs to.
    pub repo_url: String,
    /// Runs per suite, oldest first.
    pub entries: BTreeMap<String, Vec<BenchmarkRun>>,
}

impl BenchmarkData {
    /// Empty history for `repo_url`.
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            last_update: 0,
            repo_url: repo_url.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Parse a dump, with or without the `window.BENCHMARK_DATA =` wrapper.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(strip_assignment(content))?)
    }

    /// Encode as `data.js`.
    pub fn to_data_js(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(self)?;
        Ok(format!("{ASSIGNMENT_PREFIX}{json}\n"))
    }

    /// All runs as `(suite, run)`, suites in name order, runs in file order.
    pub fn runs(&self) -> impl Iterator<Item = (&str, &BenchmarkRun)> {
        self.entries
            .iter()
            .flat_map(|(suite, runs)| runs.iter().map(move |run| (suite.as_str(), run)))
    }

    /// Number of runs over all suites.
    pub fn run_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

fn strip_assignment(content: &str) -> &str {
    let trimmed = content.trim();
    let body = match trimmed.strip_prefix("window.BENCHMARK_DATA") {
        Some(rest) => rest.trim_start().strip_prefix('=').unwrap_or(rest),
        None => trimmed,
    };
    body.trim().trim_end_matches(';').trim_end()
}
