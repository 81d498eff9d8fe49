// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Wire format of a benchmark run.
//!
//! CI reports one run per commit:
//!
//! ```json
//! {
//!   "tool": "cargo",
//!   "commit": { "id": "...", "author": {...}, "committer": {...},
//!               "timestamp": "2022-06-26T19:18:44+01:00",
//!               "tree_id": "...", "url": "..." },
//!   "date": 1656267896762,
//!   "benches": [
//!     { "name": "format date.lua", "value": 66599457, "range": "± 843350", "unit": "ns/iter" }
//!   ]
//! }
//! ```
//!
//! The loose bench entries are turned into validated [`MeasurementRecord`]s
//! one by one, so a single corrupt entry does not invalidate the run.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::commit::Commit;
use crate::error::ValidationError;
use crate::record::MeasurementRecord;
use crate::unit::Unit;

static RANGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:±|\+/-|\+-)?\s*([0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?)\s*$")
        .expect("range pattern is valid")
});

/// Extract the magnitude of a range such as `"± 843350"`.
///
/// Accepts `±`, `+/-` or no prefix at all; anything else is malformed.
pub fn parse_range(raw: &str) -> Result<f64, ValidationError> {
    let captures = RANGE_PATTERN
        .captures(raw)
        .ok_or_else(|| ValidationError::MalformedRange(raw.to_string()))?;
    captures[1]
        .parse::<f64>()
        .map_err(|_| ValidationError::MalformedRange(raw.to_string()))
}

/// Render a range the way benchmark dumps store it.
pub fn format_range(range: f64) -> String {
    format!("± {}", range)
}

/// One raw benchmark entry of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchPayload {
    /// Benchmark name.
    pub name: String,
    /// Measured value.
    pub value: f64,
    /// Range string, e.g. `"± 843350"`.
    pub range: String,
    /// Unit string, e.g. `"ns/iter"`.
    pub unit: String,
}

/// A benchmark run as reported by CI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    /// Tool that produced the run.
    pub tool: String,
    /// Commit measured.
    pub commit: Commit,
    /// Report time in epoch milliseconds.
    pub date: i64,
    /// Raw benchmark entries.
    pub benches: Vec<BenchPayload>,
}

/// A bench entry that could not be turned into a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedBench {
    /// Benchmark name as reported.
    pub name: String,
    /// Why it was rejected.
    pub error: ValidationError,
}

impl BenchmarkRun {
    /// Report time as a UTC timestamp.
    pub fn recorded_at(&self) -> Result<DateTime<Utc>, ValidationError> {
        Utc.timestamp_millis_opt(self.date)
            .single()
            .ok_or(ValidationError::InvalidDate(self.date))
    }

    /// Validate the run header (tool, commit, date).
    pub fn validate_header(&self) -> Result<(), ValidationError> {
        if self.tool.trim().is_empty() {
            return Err(ValidationError::EmptyTool);
        }
        self.commit.validate()?;
        self.recorded_at()?;
        Ok(())
    }

    /// Convert every bench entry, keeping failures per entry.
    ///
    /// Call [`BenchmarkRun::validate_header`] first; header failures are
    /// reported here against every entry.
    pub fn into_records(self) -> Vec<Result<MeasurementRecord, RejectedBench>> {
        let recorded_at = self.recorded_at();
        let tool = self.tool;
        let commit = self.commit;

        self.benches
            .into_iter()
            .map(|bench| {
                let reject = |error: ValidationError| RejectedBench {
                    name: bench.name.clone(),
                    error,
                };
                let recorded_at = recorded_at.clone().map_err(reject)?;
                let range = parse_range(&bench.range).map_err(reject)?;
                let unit: Unit = bench.unit.parse().map_err(|_| {
                    reject(ValidationError::MissingUnit {
                        name: bench.name.clone(),
                    })
                })?;

                let record = MeasurementRecord {
                    tool: tool.clone(),
                    commit: commit.clone(),
                    name: bench.name.clone(),
                    value: bench.value,
                    range,
                    unit,
                    recorded_at,
                };
                record.validate().map_err(reject)?;
                Ok(record)
            })
            .collect()
    }

    /// Build a run back from stored records of one commit.
    pub fn from_records(tool: &str, commit: Commit, records: &[MeasurementRecord]) -> Self {
        let date = records
            .iter()
            .map(|r| r.recorded_at.timestamp_millis())
            .max()
            .unwrap_or_else(|| commit.timestamp_millis());
        Self {
            tool: tool.to_string(),
            commit,
            date,
            benches: records
                .iter()
                .map(|r| BenchPayload {
                    name: r.name.clone(),
                    value: r.value,
                    range: format_range(r.range),
                    unit: r.unit.to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUN: &str = r#"{
        "commit": {
            "author": {"email": "johnnymorganz@outlook.com", "name": "JohnnyMorganz", "username": "JohnnyMorganz"},
            "committer": {"email": "johnnymorganz@outlook.com", "name": "JohnnyMorganz", "username": "JohnnyMorganz"},
            "distinct": true,
            "id": "8724ea2d302335e73595707c61a6ea4089b7aabf",
            "message": "Cleanup README contents",
            "timestamp": "2022-06-26T19:18:44+01:00",
            "tree_id": "d62e80f4d63a26eeefbce0772427d209df8ad2c1",
            "url": "https://github.com/JohnnyMorganz/StyLua/commit/8724ea2d302335e73595707c61a6ea4089b7aabf"
        },
        "date": 1656267896762,
        "tool": "cargo",
        "benches": [
            {"name": "format date.lua", "value": 66599457, "range": "± 843350", "unit": "ns/iter"},
            {"name": "format docgen.lua", "value": 2429474587, "range": "± 6726699", "unit": "ns/iter"},
            {"name": "format nested_tables.lua", "value": 48883980, "range": "garbage", "unit": "ns/iter"}
        ]
    }"#;

    #[test]
    fn test_parse_range_variants() {
        assert_eq!(parse_range("± 843350").unwrap(), 843350.0);
        assert_eq!(parse_range("±0.5").unwrap(), 0.5);
        assert_eq!(parse_range("+/- 12").unwrap(), 12.0);
        assert_eq!(parse_range("  42 ").unwrap(), 42.0);
        assert_eq!(parse_range("± 1e3").unwrap(), 1000.0);
    }

    #[test]
    fn test_parse_range_rejects_garbage() {
        assert!(parse_range("").is_err());
        assert!(parse_range("± ").is_err());
        assert!(parse_range("± -5").is_err());
        assert!(parse_range("about 5").is_err());
    }

    #[test]
    fn test_format_range_parses_back() {
        assert_eq!(parse_range(&format_range(843350.0)).unwrap(), 843350.0);
        assert_eq!(parse_range(&format_range(0.25)).unwrap(), 0.25);
    }

    #[test]
    fn test_run_into_records_keeps_failures_per_entry() {
        let run: BenchmarkRun = serde_json::from_str(RUN).unwrap();
        assert!(run.validate_header().is_ok());

        let results = run.into_records();
        assert_eq!(results.len(), 3);

        let first = results[0].as_ref().unwrap();
        assert_eq!(first.tool, "cargo");
        assert_eq!(first.value, 66599457.0);
        assert_eq!(first.range, 843350.0);
        assert_eq!(first.unit, Unit::NsPerIter);
        assert_eq!(first.recorded_at.timestamp_millis(), 1656267896762);

        assert!(results[1].is_ok());

        let rejected = results[2].as_ref().unwrap_err();
        assert_eq!(rejected.name, "format nested_tables.lua");
        assert!(matches!(rejected.error, ValidationError::MalformedRange(_)));
    }

    #[test]
    fn test_negative_value_rejected_per_entry() {
        let mut run: BenchmarkRun = serde_json::from_str(RUN).unwrap();
        run.benches[0].value = -3.0;
        let results = run.into_records();
        assert!(matches!(
            results[0].as_ref().unwrap_err().error,
            ValidationError::NegativeValue { .. }
        ));
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_empty_tool_fails_header() {
        let mut run: BenchmarkRun = serde_json::from_str(RUN).unwrap();
        run.tool = String::new();
        assert_eq!(run.validate_header(), Err(ValidationError::EmptyTool));
    }

    #[test]
    fn test_from_records_restores_payload() {
        let run: BenchmarkRun = serde_json::from_str(RUN).unwrap();
        let commit = run.commit.clone();
        let records: Vec<_> = run.clone().into_records().into_iter().flatten().collect();

        let rebuilt = BenchmarkRun::from_records("cargo", commit, &records);
        assert_eq!(rebuilt.date, run.date);
        assert_eq!(rebuilt.benches.len(), 2);
        assert_eq!(rebuilt.benches[0], run.benches[0]);
    }
}
