// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Classification results.

use benchtrack_core::Unit;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::baseline::Baseline;

/// Outcome of comparing a candidate against its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Better than the baseline by more than the threshold.
    Improved,
    /// Within the threshold.
    Stable,
    /// Worse than the baseline by more than the threshold.
    Regressed,
}

impl Classification {
    /// Lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improved => "improved",
            Self::Stable => "stable",
            Self::Regressed => "regressed",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one candidate record.
///
/// Verdicts carry no wall-clock data: evaluating the same candidate against
/// the same history always yields an equal verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionVerdict {
    /// Tool of the series.
    pub tool: String,
    /// Benchmark name.
    pub benchmark: String,
    /// Commit of the candidate.
    pub commit_id: String,
    /// Candidate value.
    pub value: f64,
    /// Unit of the candidate.
    pub unit: Unit,
    /// Classification.
    pub classification: Classification,
    /// `(value - center) / center`, 0 when the center is 0.
    pub delta_ratio: f64,
    /// Threshold the candidate was judged against.
    pub threshold_ratio: f64,
    /// Baseline had fewer samples than the configured minimum.
    pub insufficient_history: bool,
    /// Standard score against the baseline spread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_score: Option<f64>,
    /// One-sided p-value of the standard score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    /// Baseline used.
    pub baseline: Baseline,
}

impl RegressionVerdict {
    /// Whether the candidate regressed.
    pub fn is_regressed(&self) -> bool {
        self.classification == Classification::Regressed
    }

    /// Whether the candidate improved.
    pub fn is_improved(&self) -> bool {
        self.classification == Classification::Improved
    }

    /// Relative change as a percentage.
    pub fn delta_percent(&self) -> f64 {
        self.delta_ratio * 100.0
    }
}

impl fmt::Display for RegressionVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} @ {}: {} ({:+.2}%, {} {} vs baseline {:.2})",
            self.tool,
            self.benchmark,
            self.commit_id,
            self.classification,
            self.delta_percent(),
            self.value,
            self.unit,
            self.baseline.center()
        )
    }
}
