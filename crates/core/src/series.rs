// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Series snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::record::MeasurementRecord;
use crate::unit::Unit;

/// Identifies one series: a (tool, benchmark name) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    /// Tool name.
    pub tool: String,
    /// Benchmark name.
    pub name: String,
}

impl SeriesKey {
    /// Create a key.
    pub fn new(tool: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tool, self.name)
    }
}

/// Immutable snapshot of one series, ordered by commit timestamp.
///
/// Records with equal timestamps keep the order they were appended in.
/// Cloning is cheap and iteration can be restarted any number of times.
#[derive(Debug, Clone)]
pub struct Series {
    key: SeriesKey,
    records: Arc<[MeasurementRecord]>,
}

impl Series {
    /// Build a snapshot from records in append order.
    pub fn from_records(key: SeriesKey, mut records: Vec<MeasurementRecord>) -> Self {
        // stable: equal timestamps keep append order
        records.sort_by_key(|r| r.timestamp());
        Self {
            key,
            records: records.into(),
        }
    }

    /// Empty series for `key`.
    pub fn empty(key: SeriesKey) -> Self {
        Self {
            key,
            records: Arc::from(Vec::new()),
        }
    }

    /// Key of this series.
    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record has been ingested.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in timestamp order.
    pub fn iter(&self) -> std::slice::Iter<'_, MeasurementRecord> {
        self.records.iter()
    }

    /// Records as a slice.
    pub fn as_slice(&self) -> &[MeasurementRecord] {
        &self.records
    }

    /// Record at `index`.
    pub fn get(&self, index: usize) -> Option<&MeasurementRecord> {
        self.records.get(index)
    }

    /// Most recent record by commit timestamp.
    pub fn latest(&self) -> Option<&MeasurementRecord> {
        self.records.last()
    }

    /// Unit of the series, taken from its first record.
    pub fn unit(&self) -> Option<&Unit> {
        self.records.first().map(|r| &r.unit)
    }

    /// Position of the record for `commit_id`.
    pub fn position_of(&self, commit_id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.commit.id == commit_id)
    }

    /// Up to `window` records strictly preceding `index`.
    pub fn window_before(&self, index: usize, window: usize) -> &[MeasurementRecord] {
        let end = index.min(self.records.len());
        let start = end.saturating_sub(window);
        &self.records[start..end]
    }

    /// Records whose commit timestamp falls in `[from, to]`; open bounds
    /// are unbounded.
    pub fn between(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> impl Iterator<Item = &MeasurementRecord> + '_ {
        self.records.iter().filter(move |r| {
            let ts = r.timestamp();
            from.map_or(true, |f| ts >= f) && to.map_or(true, |t| ts <= t)
        })
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a MeasurementRecord;
    type IntoIter = std::slice::Iter<'a, MeasurementRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::fixtures::commit;

    fn record(id: &str, minutes: i64, value: f64) -> MeasurementRecord {
        MeasurementRecord::new(
            "cargo",
            commit(id, minutes),
            "format date.lua",
            value,
            1.0,
            Unit::NsPerIter,
        )
    }

    #[test]
    fn test_out_of_order_records_are_sorted_on_read() {
        let series = Series::from_records(
            SeriesKey::new("cargo", "format date.lua"),
            vec![record("b", 10, 2.0), record("a", 0, 1.0), record("c", 20, 3.0)],
        );

        let ids: Vec<_> = series.iter().map(|r| r.commit.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(series.latest().unwrap().commit.id, "c");
        assert_eq!(series.position_of("b"), Some(1));
    }

    #[test]
    fn test_equal_timestamps_keep_append_order() {
        let series = Series::from_records(
            SeriesKey::new("cargo", "x"),
            vec![record("first", 5, 1.0), record("second", 5, 2.0)],
        );
        let ids: Vec<_> = series.iter().map(|r| r.commit.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_window_before() {
        let records = (0..6).map(|i| record(&i.to_string(), i, i as f64)).collect();
        let series = Series::from_records(SeriesKey::new("cargo", "x"), records);

        let window: Vec<f64> = series.window_before(5, 3).iter().map(|r| r.value).collect();
        assert_eq!(window, vec![2.0, 3.0, 4.0]);
        assert!(series.window_before(0, 3).is_empty());
        assert_eq!(series.window_before(2, 10).len(), 2);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let series = Series::from_records(
            SeriesKey::new("cargo", "x"),
            vec![record("a", 0, 1.0), record("b", 1, 2.0)],
        );
        assert_eq!(series.iter().count(), 2);
        assert_eq!(series.iter().count(), 2);
        assert!(Series::empty(SeriesKey::new("cargo", "y")).iter().next().is_none());
    }

    #[test]
    fn test_between_is_inclusive() {
        let series = Series::from_records(
            SeriesKey::new("cargo", "x"),
            (0..5).map(|i| record(&i.to_string(), i * 10, i as f64)).collect(),
        );
        let from = series.get(1).unwrap().timestamp();
        let to = series.get(3).unwrap().timestamp();

        let values: Vec<f64> = series.between(Some(from), Some(to)).map(|r| r.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.between(None, None).count(), 5);
    }
}
