// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Trend queries.

use benchtrack_core::{Commit, MeasurementRecord, Series, Unit};
use benchtrack_storage::HistoryStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::{QueryError, Result};

/// Inclusive commit-timestamp bounds; `None` is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Upper bound.
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// The unbounded range.
    pub fn all() -> Self {
        Self::default()
    }

    /// Range with both bounds.
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Fail if `from` is after `to`.
    pub fn validate(&self) -> Result<()> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(QueryError::InvalidRange { from, to }),
            _ => Ok(()),
        }
    }
}

/// One point of a trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Commit the value was measured at.
    pub commit: Commit,
    /// Measured value.
    pub value: f64,
    /// Uncertainty.
    pub range: f64,
    /// Unit.
    pub unit: Unit,
}

impl From<&MeasurementRecord> for TrendPoint {
    fn from(record: &MeasurementRecord) -> Self {
        Self {
            commit: record.commit.clone(),
            value: record.value,
            range: record.range,
            unit: record.unit.clone(),
        }
    }
}

/// Read-only view of a [`HistoryStore`].
#[derive(Clone)]
pub struct QueryApi {
    store: Arc<dyn HistoryStore>,
}

impl std::fmt::Debug for QueryApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryApi").finish_non_exhaustive()
    }
}

impl QueryApi {
    /// Wrap a store.
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// Points of one series within `range`, ascending by commit timestamp.
    ///
    /// An unknown series yields an empty vector.
    pub async fn trend(&self, tool: &str, name: &str, range: TimeRange) -> Result<Vec<TrendPoint>> {
        range.validate()?;
        let series = self.store.series_for(tool, name).await?;
        let points: Vec<TrendPoint> = series
            .between(range.from, range.to)
            .map(TrendPoint::from)
            .collect();
        debug!(tool, benchmark = name, points = points.len(), "trend query");
        Ok(points)
    }

    /// Most recent record of one series.
    pub async fn latest(&self, tool: &str, name: &str) -> Result<Option<MeasurementRecord>> {
        let series = self.store.series_for(tool, name).await?;
        Ok(series.latest().cloned())
    }

    /// Full series snapshot.
    pub async fn series(&self, tool: &str, name: &str) -> Result<Series> {
        Ok(self.store.series_for(tool, name).await?)
    }

    /// Benchmark names recorded for `tool`.
    pub async fn benchmarks(&self, tool: &str) -> Result<BTreeSet<String>> {
        Ok(self.store.all_benchmark_names(tool).await?)
    }

    /// All tools.
    pub async fn tools(&self) -> Result<BTreeSet<String>> {
        Ok(self.store.tools().await?)
    }
}
