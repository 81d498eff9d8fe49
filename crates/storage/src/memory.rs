// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-memory history store.
//!
//! Nothing survives the process; use it for tests only.

use async_trait::async_trait;
use benchtrack_core::{Commit, MeasurementRecord, Series, SeriesKey, Unit};
use dashmap::DashMap;
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::locks::SeriesLocks;
use crate::{ensure_unit, validate_batch, AppendReceipt, HistoryStore};

/// Default lock timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Non-durable [`HistoryStore`] keyed by series.
#[derive(Debug)]
pub struct MemoryHistoryStore {
    series: DashMap<SeriesKey, Vec<MeasurementRecord>>,
    commits: DashMap<String, HashSet<String>>,
    locks: SeriesLocks,
    timeout: Duration,
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHistoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create an empty store with a custom lock timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            series: DashMap::new(),
            commits: DashMap::new(),
            locks: SeriesLocks::new(),
            timeout,
        }
    }

    fn seen_commit(&self, tool: &str, commit_id: &str) -> bool {
        self.commits
            .get(tool)
            .map_or(false, |ids| ids.contains(commit_id))
    }

    /// Unit of the series' first record; read under the series lock.
    fn stored_unit(&self, key: &SeriesKey) -> Option<Unit> {
        self.series
            .get(key)
            .and_then(|records| records.first().map(|r| r.unit.clone()))
    }

    /// Mark `commit_id` as ingested unless it already was.
    fn claim_commit(&self, tool: &str, commit_id: &str) -> Result<()> {
        let mut ids = self.commits.entry(tool.to_string()).or_default();
        if !ids.insert(commit_id.to_string()) {
            return Err(StoreError::DuplicateCommit {
                tool: tool.to_string(),
                commit_id: commit_id.to_string(),
            });
        }
        Ok(())
    }

    fn mark_commit(&self, tool: &str, commit_id: &str) {
        self.commits
            .entry(tool.to_string())
            .or_default()
            .insert(commit_id.to_string());
    }

    /// Push under the caller-held series lock.
    fn push(&self, record: &MeasurementRecord) -> AppendReceipt {
        let key = record.series_key();
        let mut entry = self.series.entry(key.clone()).or_default();
        let out_of_order = entry
            .iter()
            .any(|existing| existing.timestamp() > record.timestamp());
        entry.push(record.clone());
        let series_len = entry.len();
        drop(entry);

        self.mark_commit(&record.tool, &record.commit.id);
        AppendReceipt {
            key,
            series_len,
            out_of_order,
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(
        &self,
        tool: &str,
        commit: &Commit,
        records: &[MeasurementRecord],
    ) -> Result<()> {
        validate_batch(tool, commit, records)?;

        let keys: Vec<SeriesKey> = records.iter().map(MeasurementRecord::series_key).collect();
        let _guards = self.locks.acquire_all(&keys, self.timeout).await?;

        for record in records {
            ensure_unit(self.stored_unit(&record.series_key()).as_ref(), record)?;
        }
        self.claim_commit(tool, &commit.id)?;

        for record in records {
            self.push(record);
        }
        debug!(tool, commit_id = %commit.id, records = records.len(), "Appended batch");
        Ok(())
    }

    async fn append_record(&self, record: &MeasurementRecord) -> Result<AppendReceipt> {
        record.validate()?;
        let key = record.series_key();
        let _guard = self.locks.acquire(&key, self.timeout).await?;

        let duplicate = self.series.get(&key).map_or(false, |records| {
            records.iter().any(|r| r.commit.id == record.commit.id)
        });
        if duplicate {
            return Err(StoreError::DuplicateCommit {
                tool: record.tool.clone(),
                commit_id: record.commit.id.clone(),
            });
        }
        ensure_unit(self.stored_unit(&key).as_ref(), record)?;

        let receipt = self.push(record);
        debug!(series = %key, len = receipt.series_len, "Appended record");
        Ok(receipt)
    }

    async fn series_for(&self, tool: &str, name: &str) -> Result<Series> {
        let key = SeriesKey::new(tool, name);
        let records = self.series.get(&key).map(|r| r.value().clone());
        Ok(match records {
            Some(records) => Series::from_records(key, records),
            None => Series::empty(key),
        })
    }

    async fn all_benchmark_names(&self, tool: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .series
            .iter()
            .filter(|entry| entry.key().tool == tool)
            .map(|entry| entry.key().name.clone())
            .collect())
    }

    async fn tools(&self) -> Result<BTreeSet<String>> {
        Ok(self.commits.iter().map(|entry| entry.key().clone()).collect())
    }

    async fn contains_commit(&self, tool: &str, commit_id: &str) -> Result<bool> {
        Ok(self.seen_commit(tool, commit_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{commit, record};
    use benchtrack_core::ValidationError;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_append_and_read_back() {
        let store = MemoryHistoryStore::new();
        let c = commit("a", 0);
        let records = vec![record(&c, "format date.lua", 1.0), record(&c, "format docgen.lua", 2.0)];

        store.append("cargo", &c, &records).await.unwrap();

        let series = store.series_for("cargo", "format date.lua").await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.latest().unwrap().value, 1.0);
        assert!(store.contains_commit("cargo", "a").await.unwrap());

        let names = store.all_benchmark_names("cargo").await.unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["format date.lua", "format docgen.lua"]);
        assert_eq!(store.tools().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_commit_rejected_and_history_unchanged() {
        let store = MemoryHistoryStore::new();
        let c = commit("a", 0);
        let records = vec![record(&c, "x", 1.0)];

        store.append("cargo", &c, &records).await.unwrap();
        let second = store.append("cargo", &c, &records).await;
        assert!(matches!(second, Err(StoreError::DuplicateCommit { .. })));
        assert_eq!(store.series_for("cargo", "x").await.unwrap().len(), 1);

        let single = store.append_record(&records[0]).await;
        assert!(matches!(single, Err(StoreError::DuplicateCommit { .. })));
    }

    #[tokio::test]
    async fn test_invalid_record_writes_nothing() {
        let store = MemoryHistoryStore::new();
        let c = commit("a", 0);
        let records = vec![record(&c, "ok", 1.0), record(&c, "bad", -1.0)];

        let result = store.append("cargo", &c, &records).await;
        assert!(matches!(
            result,
            Err(StoreError::InvalidRecord(ValidationError::NegativeValue { .. }))
        ));
        assert!(store.series_for("cargo", "ok").await.unwrap().is_empty());
        assert!(!store.contains_commit("cargo", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_out_of_order_is_flagged_and_corrected_on_read() {
        let store = MemoryHistoryStore::new();
        let late = commit("late", 30);
        let early = commit("early", 0);

        let first = store.append_record(&record(&late, "x", 2.0)).await.unwrap();
        assert!(!first.out_of_order);
        let second = store.append_record(&record(&early, "x", 1.0)).await.unwrap();
        assert!(second.out_of_order);
        assert_eq!(second.series_len, 2);

        let series = store.series_for("cargo", "x").await.unwrap();
        let ids: Vec<_> = series.iter().map(|r| r.commit.id.clone()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_unknown_series_is_empty() {
        let store = MemoryHistoryStore::new();
        let series = store.series_for("cargo", "missing").await.unwrap();
        assert!(series.is_empty());
        assert!(store.all_benchmark_names("cargo").await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_to_one_series() {
        let store = Arc::new(MemoryHistoryStore::new());
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let c = commit(&format!("c{i}"), i);
                    store.append_record(&record(&c, "x", i as f64)).await
                })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let series = store.series_for("cargo", "x").await.unwrap();
        assert_eq!(series.len(), 16);
        let values: Vec<f64> = series.iter().map(|r| r.value).collect();
        let expected: Vec<f64> = (0..16).map(|i| i as f64).collect();
        assert_eq!(values, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_batches_of_one_commit() {
        for _ in 0..50 {
            let store = Arc::new(MemoryHistoryStore::new());
            let c = commit("a", 0);
            let tasks: Vec<_> = ["x", "y"]
                .into_iter()
                .map(|name| {
                    let store = Arc::clone(&store);
                    let c = c.clone();
                    tokio::spawn(async move {
                        store.append("cargo", &c, &[record(&c, name, 1.0)]).await
                    })
                })
                .collect();

            let results: Vec<_> = futures::future::join_all(tasks)
                .await
                .into_iter()
                .map(|task| task.unwrap())
                .collect();
            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(results
                .iter()
                .any(|r| matches!(r, Err(StoreError::DuplicateCommit { .. }))));
        }
    }

    #[tokio::test]
    async fn test_unit_change_is_rejected() {
        let store = MemoryHistoryStore::new();
        let a = commit("a", 0);
        store.append_record(&record(&a, "x", 1.0)).await.unwrap();

        let b = commit("b", 1);
        let mut changed = record(&b, "x", 1.0);
        changed.unit = Unit::Milliseconds;
        assert!(matches!(
            store.append_record(&changed).await,
            Err(StoreError::UnitMismatch { .. })
        ));
        assert!(matches!(
            store.append("cargo", &b, &[changed]).await,
            Err(StoreError::UnitMismatch { .. })
        ));
        assert_eq!(store.series_for("cargo", "x").await.unwrap().len(), 1);
        assert!(!store.contains_commit("cargo", "b").await.unwrap());
    }

    #[tokio::test]
    async fn test_racing_units_on_new_series() {
        let store = MemoryHistoryStore::new();
        let ns = record(&commit("a", 0), "x", 1.0);
        let mut ms = record(&commit("b", 1), "x", 1.0);
        ms.unit = Unit::Milliseconds;

        let (first, second) = tokio::join!(store.append_record(&ns), store.append_record(&ms));
        assert!(first.is_ok());
        assert!(matches!(second, Err(StoreError::UnitMismatch { .. })));
        assert_eq!(store.series_for("cargo", "x").await.unwrap().len(), 1);
    }
}
