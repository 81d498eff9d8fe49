// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! A single named benchmark result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::commit::Commit;
use crate::error::ValidationError;
use crate::series::SeriesKey;
use crate::unit::Unit;

/// One benchmark result tied to a commit and a tool.
///
/// # Invariants
///
/// A record accepted by [`MeasurementRecord::validate`] has a non-empty
/// tool and name, a commit with an id, and a finite, non-negative value
/// and range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Benchmark harness that produced the value (e.g. `cargo`).
    pub tool: String,
    /// Commit the run measured.
    pub commit: Commit,
    /// Benchmark name (e.g. `format date.lua`).
    pub name: String,
    /// Measured value.
    pub value: f64,
    /// Uncertainty of the value, same unit.
    pub range: f64,
    /// Unit of `value` and `range`.
    pub unit: Unit,
    /// When CI reported the run.
    pub recorded_at: DateTime<Utc>,
}

impl MeasurementRecord {
    /// Create a record reported now.
    pub fn new(
        tool: impl Into<String>,
        commit: Commit,
        name: impl Into<String>,
        value: f64,
        range: f64,
        unit: Unit,
    ) -> Self {
        Self {
            tool: tool.into(),
            commit,
            name: name.into(),
            value,
            range,
            unit,
            recorded_at: Utc::now(),
        }
    }

    /// Override the report date.
    pub fn with_recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = recorded_at;
        self
    }

    /// Series this record belongs to.
    pub fn series_key(&self) -> SeriesKey {
        SeriesKey::new(&self.tool, &self.name)
    }

    /// Commit timestamp in UTC, the series ordering key.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.commit.timestamp_utc()
    }

    /// Check the record invariants.
    ///
    /// Negative or non-finite values are rejected regardless of the other
    /// fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.value.is_finite() {
            return Err(ValidationError::NonFinite {
                name: self.name.clone(),
                field: "value",
            });
        }
        if !self.range.is_finite() {
            return Err(ValidationError::NonFinite {
                name: self.name.clone(),
                field: "range",
            });
        }
        if self.value < 0.0 {
            return Err(ValidationError::NegativeValue {
                name: self.name.clone(),
                value: self.value,
            });
        }
        if self.range < 0.0 {
            return Err(ValidationError::NegativeRange {
                name: self.name.clone(),
                range: self.range,
            });
        }
        if self.tool.trim().is_empty() {
            return Err(ValidationError::EmptyTool);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.unit.as_str().trim().is_empty() {
            return Err(ValidationError::MissingUnit {
                name: self.name.clone(),
            });
        }
        self.commit.validate()
    }

    /// Check the record belongs to the given tool and commit.
    pub fn ensure_belongs_to(&self, tool: &str, commit_id: &str) -> Result<(), ValidationError> {
        if self.tool != tool || self.commit.id != commit_id {
            return Err(ValidationError::ForeignRecord {
                name: self.name.clone(),
                tool: tool.to_string(),
                commit_id: commit_id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::fixtures::commit;

    fn record(value: f64, range: f64) -> MeasurementRecord {
        MeasurementRecord::new(
            "cargo",
            commit("abc", 0),
            "format date.lua",
            value,
            range,
            Unit::NsPerIter,
        )
    }

    #[test]
    fn test_valid_record() {
        assert!(record(66599457.0, 843350.0).validate().is_ok());
        assert!(record(0.0, 0.0).validate().is_ok());
    }

    #[test]
    fn test_negative_value_rejected() {
        assert!(matches!(
            record(-1.0, 10.0).validate(),
            Err(ValidationError::NegativeValue { .. })
        ));
    }

    #[test]
    fn test_negative_range_rejected() {
        assert!(matches!(
            record(10.0, -0.5).validate(),
            Err(ValidationError::NegativeRange { .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(
            record(f64::NAN, 1.0).validate(),
            Err(ValidationError::NonFinite { field: "value", .. })
        ));
        assert!(matches!(
            record(1.0, f64::INFINITY).validate(),
            Err(ValidationError::NonFinite { field: "range", .. })
        ));
    }

    #[test]
    fn test_foreign_record() {
        let r = record(1.0, 1.0);
        assert!(r.ensure_belongs_to("cargo", "abc").is_ok());
        assert!(r.ensure_belongs_to("criterion", "abc").is_err());
        assert!(r.ensure_belongs_to("cargo", "def").is_err());
    }
}
