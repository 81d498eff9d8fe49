// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark history storage.
//!
//! A [`HistoryStore`] keeps one append-only series per (tool, benchmark
//! name). Appends to different series proceed independently; appends to
//! the same series are serialized by a per-series lock so duplicate
//! detection and the unit guard are compare-and-append.
//!
//! Two implementations are provided:
//!
//! - [`SqliteHistoryStore`] - durable store backed by SQLite
//! - [`MemoryHistoryStore`] - non-durable store for tests
//!
//! Every operation is bounded by an I/O timeout; exceeding it yields
//! [`StoreError::Unavailable`].

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod locks;
pub mod memory;
pub mod sqlite;

pub use error::{Result, StoreError};
pub use locks::SeriesLocks;
pub use memory::MemoryHistoryStore;
pub use sqlite::SqliteHistoryStore;

use async_trait::async_trait;
use benchtrack_core::{Commit, MeasurementRecord, Series, SeriesKey, Unit, ValidationError};
use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::time::Duration;

/// Outcome of a successful single-record append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReceipt {
    /// Series the record was appended to.
    pub key: SeriesKey,
    /// Series length after the append.
    pub series_len: usize,
    /// The record's commit is older than the series' latest commit.
    pub out_of_order: bool,
}

/// Append-only storage of benchmark series.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append all records of one commit atomically.
    ///
    /// Fails with [`StoreError::DuplicateCommit`] if the (tool, commit id)
    /// pair was already ingested, with [`StoreError::InvalidRecord`] if
    /// any record is invalid and with [`StoreError::UnitMismatch`] if a
    /// record's unit differs from its series. Nothing is written on failure.
    async fn append(
        &self,
        tool: &str,
        commit: &Commit,
        records: &[MeasurementRecord],
    ) -> Result<()>;

    /// Append one record to its series.
    ///
    /// Fails with [`StoreError::DuplicateCommit`] if the series already
    /// holds a record for the same commit and with
    /// [`StoreError::UnitMismatch`] if the series is recorded in another
    /// unit. Both checks run under the series lock.
    async fn append_record(&self, record: &MeasurementRecord) -> Result<AppendReceipt>;

    /// Snapshot of a series ordered by commit timestamp; empty if unknown.
    async fn series_for(&self, tool: &str, name: &str) -> Result<Series>;

    /// Names of all benchmarks recorded for `tool`.
    async fn all_benchmark_names(&self, tool: &str) -> Result<BTreeSet<String>>;

    /// All tools with at least one record.
    async fn tools(&self) -> Result<BTreeSet<String>>;

    /// Whether any record of `commit_id` exists for `tool`.
    async fn contains_commit(&self, tool: &str, commit_id: &str) -> Result<bool>;
}

/// Run `fut`, failing with [`StoreError::Unavailable`] after `timeout`.
pub async fn bounded<T, F>(timeout: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Unavailable(format!(
            "{operation} timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

/// Reject `record` if its series is already recorded in another unit.
pub(crate) fn ensure_unit(stored: Option<&Unit>, record: &MeasurementRecord) -> Result<()> {
    match stored {
        Some(unit) if *unit != record.unit => Err(StoreError::UnitMismatch {
            series: record.series_key(),
            expected: unit.clone(),
            found: record.unit.clone(),
        }),
        _ => Ok(()),
    }
}

/// Check a batch before any write.
pub(crate) fn validate_batch(
    tool: &str,
    commit: &Commit,
    records: &[MeasurementRecord],
) -> std::result::Result<(), ValidationError> {
    if tool.trim().is_empty() {
        return Err(ValidationError::EmptyTool);
    }
    commit.validate()?;

    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        record.validate()?;
        record.ensure_belongs_to(tool, &commit.id)?;
        if !seen.insert(record.name.as_str()) {
            return Err(ValidationError::DuplicateBenchmark(record.name.clone()));
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::{commit, record};
    use super::*;

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<()> = bounded(
            Duration::from_millis(10),
            "stalled read",
            std::future::pending(),
        )
        .await;
        assert!(matches!(result, Err(StoreError::Unavailable(msg)) if msg.contains("stalled read")));
    }

    #[test]
    fn test_validate_batch_rejects_repeated_names() {
        let c = commit("a", 0);
        let records = vec![record(&c, "x", 1.0), record(&c, "x", 2.0)];
        assert_eq!(
            validate_batch("cargo", &c, &records),
            Err(ValidationError::DuplicateBenchmark("x".to_string()))
        );
    }

    #[test]
    fn test_ensure_unit() {
        let c = commit("a", 0);
        let mut ms = record(&c, "x", 1.0);
        ms.unit = Unit::Milliseconds;

        assert!(ensure_unit(None, &ms).is_ok());
        assert!(ensure_unit(Some(&Unit::Milliseconds), &ms).is_ok());
        match ensure_unit(Some(&Unit::NsPerIter), &ms) {
            Err(StoreError::UnitMismatch { series, expected, found }) => {
                assert_eq!(series, SeriesKey::new("cargo", "x"));
                assert_eq!(expected, Unit::NsPerIter);
                assert_eq!(found, Unit::Milliseconds);
            }
            other => panic!("expected unit mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_batch_rejects_foreign_commit() {
        let c = commit("a", 0);
        let other = commit("b", 1);
        let records = vec![record(&other, "x", 1.0)];
        assert!(matches!(
            validate_batch("cargo", &c, &records),
            Err(ValidationError::ForeignRecord { .. })
        ));
    }
}
