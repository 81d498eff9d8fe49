// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Durable history store backed by SQLite.
//!
//! All series share one `measurements` table keyed by
//! `(tool, name, commit_id)`. Rows are never updated or deleted. Series are
//! read ordered by commit timestamp, ties broken by insertion sequence.
//!
//! Write transactions start with `BEGIN IMMEDIATE` so they take the database
//! write lock before reading. A deferred transaction that reads first fails
//! with `SQLITE_BUSY_SNAPSHOT` when another series commits in between, and
//! the busy timeout does not apply to that error.

use async_trait::async_trait;
use benchtrack_core::config::StorageSettings;
use benchtrack_core::{Commit, MeasurementRecord, Series, SeriesKey, Unit};
use chrono::{TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, Transaction};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::locks::SeriesLocks;
use crate::{bounded, ensure_unit, validate_batch, AppendReceipt, HistoryStore};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS measurements (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        tool TEXT NOT NULL,
        name TEXT NOT NULL,
        commit_id TEXT NOT NULL,
        commit_ts_ms INTEGER NOT NULL,
        commit_json TEXT NOT NULL,
        recorded_at_ms INTEGER NOT NULL,
        value REAL NOT NULL,
        uncertainty REAL NOT NULL,
        unit TEXT NOT NULL,
        UNIQUE(tool, name, commit_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_measurements_series
        ON measurements(tool, name, commit_ts_ms, seq)",
    "CREATE INDEX IF NOT EXISTS idx_measurements_commit
        ON measurements(tool, commit_id)",
];

const SELECT_SERIES: &str = "SELECT tool, name, commit_json, recorded_at_ms, value, uncertainty, unit
     FROM measurements
     WHERE tool = ? AND name = ?
     ORDER BY commit_ts_ms ASC, seq ASC";

const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

const SELECT_SERIES_UNIT: &str = "SELECT unit FROM measurements
     WHERE tool = ? AND name = ?
     ORDER BY seq ASC LIMIT 1";

const INSERT: &str = "INSERT INTO measurements
     (tool, name, commit_id, commit_ts_ms, commit_json, recorded_at_ms, value, uncertainty, unit)
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

#[derive(Debug, FromRow)]
struct MeasurementRow {
    tool: String,
    name: String,
    commit_json: String,
    recorded_at_ms: i64,
    value: f64,
    uncertainty: f64,
    unit: String,
}

impl TryFrom<MeasurementRow> for MeasurementRecord {
    type Error = StoreError;

    fn try_from(row: MeasurementRow) -> Result<Self> {
        let commit: Commit = serde_json::from_str(&row.commit_json)
            .map_err(|e| StoreError::Corrupt(format!("commit metadata: {e}")))?;
        let unit = Unit::from_str(&row.unit).map_err(StoreError::Corrupt)?;
        let recorded_at = Utc
            .timestamp_millis_opt(row.recorded_at_ms)
            .single()
            .ok_or_else(|| StoreError::Corrupt(format!("recorded_at {}", row.recorded_at_ms)))?;

        Ok(MeasurementRecord {
            tool: row.tool,
            commit,
            name: row.name,
            value: row.value,
            range: row.uncertainty,
            unit,
            recorded_at,
        })
    }
}

/// [`HistoryStore`] persisted in a SQLite database (WAL journal).
#[derive(Debug, Clone)]
pub struct SqliteHistoryStore {
    pool: SqlitePool,
    locks: std::sync::Arc<SeriesLocks>,
    timeout: Duration,
}

impl SqliteHistoryStore {
    /// Open (creating if needed) the database named by `settings`.
    pub async fn connect(settings: &StorageSettings) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&settings.database_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid database url: {e}")))?;
        Self::connect_with(options, settings.max_connections, settings.io_timeout()).await
    }

    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>, timeout: Duration) -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(path.as_ref());
        Self::connect_with(options, 4, timeout).await
    }

    async fn connect_with(
        options: SqliteConnectOptions,
        max_connections: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(timeout)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            locks: std::sync::Arc::new(SeriesLocks::new()),
            timeout,
        };
        store.migrate().await?;
        info!(max_connections, "SQLite history store ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        bounded(self.timeout, "schema migration", async {
            for statement in SCHEMA {
                sqlx::query(statement).execute(&self.pool).await?;
            }
            Ok::<_, StoreError>(())
        })
        .await
    }

    /// Close the pool, waiting for in-flight operations.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn load_series(&self, key: &SeriesKey) -> Result<Series> {
        let rows: Vec<MeasurementRow> = sqlx::query_as(SELECT_SERIES)
            .bind(&key.tool)
            .bind(&key.name)
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .into_iter()
            .map(MeasurementRecord::try_from)
            .collect::<Result<Vec<_>>>()?;
        // rows arrive ordered; from_records keeps that order
        Ok(Series::from_records(key.clone(), records))
    }

    async fn stored_unit(tx: &mut Transaction<'_, Sqlite>, key: &SeriesKey) -> Result<Option<Unit>> {
        let unit: Option<String> = sqlx::query_scalar(SELECT_SERIES_UNIT)
            .bind(&key.tool)
            .bind(&key.name)
            .fetch_optional(&mut **tx)
            .await?;
        unit.map(|u| Unit::from_str(&u).map_err(StoreError::Corrupt))
            .transpose()
    }

    async fn insert(tx: &mut Transaction<'_, Sqlite>, record: &MeasurementRecord) -> Result<()> {
        let commit_json = serde_json::to_string(&record.commit)
            .map_err(|e| StoreError::Corrupt(format!("commit metadata: {e}")))?;

        let result = sqlx::query(INSERT)
            .bind(&record.tool)
            .bind(&record.name)
            .bind(&record.commit.id)
            .bind(record.commit.timestamp_millis())
            .bind(commit_json)
            .bind(record.recorded_at.timestamp_millis())
            .bind(record.value)
            .bind(record.range)
            .bind(record.unit.as_str())
            .execute(&mut **tx)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateCommit {
                    tool: record.tool.clone(),
                    commit_id: record.commit.id.clone(),
                })
            }
            Err(other) => Err(other.into()),
        }
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn append(
        &self,
        tool: &str,
        commit: &Commit,
        records: &[MeasurementRecord],
    ) -> Result<()> {
        validate_batch(tool, commit, records)?;

        let keys: Vec<SeriesKey> = records.iter().map(MeasurementRecord::series_key).collect();
        let _guards = self.locks.acquire_all(&keys, self.timeout).await?;

        bounded(self.timeout, "batch append", async {
            let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

            let existing: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM measurements WHERE tool = ? AND commit_id = ?",
            )
            .bind(tool)
            .bind(&commit.id)
            .fetch_one(&mut *tx)
            .await?;
            if existing > 0 {
                return Err(StoreError::DuplicateCommit {
                    tool: tool.to_string(),
                    commit_id: commit.id.clone(),
                });
            }

            for record in records {
                let stored = Self::stored_unit(&mut tx, &record.series_key()).await?;
                ensure_unit(stored.as_ref(), record)?;
            }
            for record in records {
                Self::insert(&mut tx, record).await?;
            }
            tx.commit().await?;
            Ok::<_, StoreError>(())
        })
        .await?;

        debug!(tool, commit_id = %commit.id, records = records.len(), "Appended batch");
        Ok(())
    }

    async fn append_record(&self, record: &MeasurementRecord) -> Result<AppendReceipt> {
        record.validate()?;
        let key = record.series_key();
        let _guard = self.locks.acquire(&key, self.timeout).await?;

        let receipt = bounded(self.timeout, "record append", async {
            let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

            let present: Option<i64> = sqlx::query_scalar(
                "SELECT 1 FROM measurements WHERE tool = ? AND name = ? AND commit_id = ?",
            )
            .bind(&record.tool)
            .bind(&record.name)
            .bind(&record.commit.id)
            .fetch_optional(&mut *tx)
            .await?;
            if present.is_some() {
                return Err(StoreError::DuplicateCommit {
                    tool: record.tool.clone(),
                    commit_id: record.commit.id.clone(),
                });
            }

            let stored = Self::stored_unit(&mut tx, &key).await?;
            ensure_unit(stored.as_ref(), record)?;

            let (newer, len): (i64, i64) = sqlx::query_as(
                "SELECT COALESCE(SUM(commit_ts_ms > ?), 0), COUNT(*)
                 FROM measurements WHERE tool = ? AND name = ?",
            )
            .bind(record.commit.timestamp_millis())
            .bind(&record.tool)
            .bind(&record.name)
            .fetch_one(&mut *tx)
            .await?;

            Self::insert(&mut tx, record).await?;
            tx.commit().await?;

            Ok::<_, StoreError>(AppendReceipt {
                key: key.clone(),
                series_len: len as usize + 1,
                out_of_order: newer > 0,
            })
        })
        .await?;

        debug!(series = %key, len = receipt.series_len, "Appended record");
        Ok(receipt)
    }

    async fn series_for(&self, tool: &str, name: &str) -> Result<Series> {
        let key = SeriesKey::new(tool, name);
        bounded(self.timeout, "series read", self.load_series(&key)).await
    }

    async fn all_benchmark_names(&self, tool: &str) -> Result<BTreeSet<String>> {
        bounded(self.timeout, "benchmark listing", async {
            let names: Vec<String> =
                sqlx::query_scalar("SELECT DISTINCT name FROM measurements WHERE tool = ?")
                    .bind(tool)
                    .fetch_all(&self.pool)
                    .await?;
            Ok::<_, StoreError>(names.into_iter().collect())
        })
        .await
    }

    async fn tools(&self) -> Result<BTreeSet<String>> {
        bounded(self.timeout, "tool listing", async {
            let tools: Vec<String> = sqlx::query_scalar("SELECT DISTINCT tool FROM measurements")
                .fetch_all(&self.pool)
                .await?;
            Ok::<_, StoreError>(tools.into_iter().collect())
        })
        .await
    }

    async fn contains_commit(&self, tool: &str, commit_id: &str) -> Result<bool> {
        bounded(self.timeout, "commit lookup", async {
            let found: Option<i64> = sqlx::query_scalar(
                "SELECT 1 FROM measurements WHERE tool = ? AND commit_id = ? LIMIT 1",
            )
            .bind(tool)
            .bind(commit_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok::<_, StoreError>(found.is_some())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{commit, record};
    use benchtrack_core::ValidationError;

    async fn open_store(dir: &tempfile::TempDir) -> SqliteHistoryStore {
        SqliteHistoryStore::open(dir.path().join("history.db"), Duration::from_secs(5))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let mut c = commit("a", 0);
        c.message = Some("Cleanup README contents".to_string());
        let records = vec![record(&c, "format date.lua", 66599457.0)];

        store.append("cargo", &c, &records).await.unwrap();

        let series = store.series_for("cargo", "format date.lua").await.unwrap();
        assert_eq!(series.len(), 1);
        let stored = series.latest().unwrap();
        assert_eq!(stored.commit, c);
        assert_eq!(stored.value, 66599457.0);
        assert_eq!(stored.range, 1000.0);
        assert_eq!(stored.unit, Unit::NsPerIter);
        assert_eq!(
            stored.recorded_at.timestamp_millis(),
            records[0].recorded_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open_store(&dir).await;
            let c = commit("a", 0);
            store.append("cargo", &c, &[record(&c, "x", 1.0)]).await.unwrap();
            store.close().await;
        }

        let reopened = open_store(&dir).await;
        assert_eq!(reopened.series_for("cargo", "x").await.unwrap().len(), 1);
        assert!(reopened.contains_commit("cargo", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_commit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let c = commit("a", 0);
        let records = vec![record(&c, "x", 1.0), record(&c, "y", 2.0)];

        store.append("cargo", &c, &records).await.unwrap();
        assert!(matches!(
            store.append("cargo", &c, &records).await,
            Err(StoreError::DuplicateCommit { .. })
        ));
        assert!(matches!(
            store.append_record(&records[1]).await,
            Err(StoreError::DuplicateCommit { .. })
        ));
        assert_eq!(store.series_for("cargo", "x").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let c = commit("a", 0);
        let mut bad = record(&c, "bad", 1.0);
        bad.range = -4.0;

        let result = store.append("cargo", &c, &[record(&c, "ok", 1.0), bad]).await;
        assert!(matches!(
            result,
            Err(StoreError::InvalidRecord(ValidationError::NegativeRange { .. }))
        ));
        assert!(store.all_benchmark_names("cargo").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_order_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let r1 = store.append_record(&record(&commit("b", 20), "x", 2.0)).await.unwrap();
        let r2 = store.append_record(&record(&commit("a", 10), "x", 1.0)).await.unwrap();
        let r3 = store.append_record(&record(&commit("c", 30), "x", 3.0)).await.unwrap();
        assert!(!r1.out_of_order);
        assert!(r2.out_of_order);
        assert!(!r3.out_of_order);
        assert_eq!(r3.series_len, 3);

        let values: Vec<f64> = store
            .series_for("cargo", "x")
            .await
            .unwrap()
            .iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_listing_and_empty_series() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let c = commit("a", 0);
        store
            .append("cargo", &c, &[record(&c, "b", 1.0), record(&c, "a", 1.0)])
            .await
            .unwrap();

        let names: Vec<String> = store.all_benchmark_names("cargo").await.unwrap().into_iter().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(store.tools().await.unwrap().into_iter().collect::<Vec<_>>(), vec!["cargo"]);
        assert!(store.series_for("cargo", "zzz").await.unwrap().is_empty());
        assert!(!store.contains_commit("criterion", "a").await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_same_series() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let later = record(&commit("later", 5), "x", 5.0);
        let earlier = record(&commit("earlier", 1), "x", 1.0);
        let (a, b) = tokio::join!(store.append_record(&later), store.append_record(&earlier));
        a.unwrap();
        b.unwrap();

        let series = store.series_for("cargo", "x").await.unwrap();
        let ids: Vec<_> = series.iter().map(|r| r.commit.id.clone()).collect();
        assert_eq!(ids, vec!["earlier", "later"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_to_distinct_series() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        for round in 0..20 {
            let c = commit(&format!("c{round}"), round);
            let records: Vec<_> = (0..8)
                .map(|i| record(&c, &format!("bench {i}"), 100.0 + round as f64))
                .collect();
            let results =
                futures::future::join_all(records.iter().map(|r| store.append_record(r))).await;
            for result in results {
                result.unwrap();
            }
        }

        for i in 0..8 {
            let series = store.series_for("cargo", &format!("bench {i}")).await.unwrap();
            assert_eq!(series.len(), 20);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_spawned_batches_on_shared_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(open_store(&dir).await);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let c = commit(&format!("c{i}"), i);
                    let records = vec![record(&c, "x", 1.0), record(&c, "y", 2.0)];
                    store.append("cargo", &c, &records).await
                })
            })
            .collect();
        for task in futures::future::join_all(tasks).await {
            task.unwrap().unwrap();
        }

        assert_eq!(store.series_for("cargo", "x").await.unwrap().len(), 8);
        assert_eq!(store.series_for("cargo", "y").await.unwrap().len(), 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_conflicting_units_keep_series_consistent() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let ns = record(&commit("a", 0), "x", 1.0);
        let mut ms = record(&commit("b", 1), "x", 1.0);
        ms.unit = Unit::Milliseconds;

        let (first, second) = tokio::join!(store.append_record(&ns), store.append_record(&ms));
        let mismatches = [&first, &second]
            .iter()
            .filter(|r| matches!(r, Err(StoreError::UnitMismatch { .. })))
            .count();
        assert_eq!(mismatches, 1);
        assert_eq!(first.is_ok() as usize + second.is_ok() as usize, 1);

        let series = store.series_for("cargo", "x").await.unwrap();
        assert_eq!(series.len(), 1);
        let unit = series.unit().unwrap().clone();
        let next = MeasurementRecord {
            unit: unit.clone(),
            ..record(&commit("c", 2), "x", 1.0)
        };
        store.append_record(&next).await.unwrap();
        assert!(store.series_for("cargo", "x").await.unwrap().iter().all(|r| r.unit == unit));
    }

    #[tokio::test]
    async fn test_repeated_commit_with_other_unit_is_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let c = commit("a", 0);
        store.append_record(&record(&c, "x", 1.0)).await.unwrap();

        let mut again = record(&c, "x", 1.0);
        again.unit = Unit::Milliseconds;
        assert!(matches!(
            store.append_record(&again).await,
            Err(StoreError::DuplicateCommit { .. })
        ));
    }

    #[tokio::test]
    async fn test_batch_with_changed_unit_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let a = commit("a", 0);
        store.append("cargo", &a, &[record(&a, "x", 1.0)]).await.unwrap();

        let b = commit("b", 1);
        let mut changed = record(&b, "x", 1.0);
        changed.unit = Unit::Milliseconds;
        let result = store
            .append("cargo", &b, &[record(&b, "y", 1.0), changed])
            .await;
        assert!(matches!(result, Err(StoreError::UnitMismatch { .. })));
        assert!(!store.contains_commit("cargo", "b").await.unwrap());
        assert!(store.series_for("cargo", "y").await.unwrap().is_empty());
    }
}
