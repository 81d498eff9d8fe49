// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! The regression analyzer.

use benchtrack_core::{AnalyzerSettings, Direction, MeasurementRecord, Series, Statistic};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use crate::baseline::Baseline;
use crate::error::{AnalyzerError, Result};
use crate::policy::ResolvedPolicy;
use crate::verdict::{Classification, RegressionVerdict};

/// Scale factor turning a median absolute deviation into a standard
/// deviation estimate for normally distributed data.
const MAD_SCALE: f64 = 1.4826;

/// Classifies new measurements against a rolling baseline.
///
/// The analyzer is stateless apart from its settings and never reads the
/// clock, so identical inputs produce identical verdicts.
#[derive(Debug, Clone)]
pub struct RegressionAnalyzer {
    settings: AnalyzerSettings,
    standard_normal: Option<Normal>,
}

impl Default for RegressionAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerSettings::default())
    }
}

impl RegressionAnalyzer {
    /// Create an analyzer with the given settings.
    pub fn new(settings: AnalyzerSettings) -> Self {
        Self {
            settings,
            standard_normal: Normal::new(0.0, 1.0).ok(),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Replace the settings.
    pub fn set_settings(&mut self, settings: AnalyzerSettings) {
        self.settings = settings;
    }

    /// Effective policy for a benchmark.
    pub fn policy_for(&self, tool: &str, name: &str) -> ResolvedPolicy {
        ResolvedPolicy::resolve(&self.settings, &benchtrack_core::SeriesKey::new(tool, name))
    }

    /// Baseline over the last `window_size` records of `series`, skipping
    /// the final `excluding_last` records.
    pub fn baseline(
        &self,
        series: &Series,
        window_size: usize,
        excluding_last: usize,
    ) -> Result<Baseline> {
        let index = series.len().saturating_sub(excluding_last);
        self.baseline_at(series, index, window_size)
    }

    /// Baseline over up to `window_size` records strictly before `index`.
    pub fn baseline_at(&self, series: &Series, index: usize, window_size: usize) -> Result<Baseline> {
        let key = series.key();
        let statistic = self.policy_for(&key.tool, &key.name).statistic;
        Baseline::from_records(series.window_before(index, window_size), statistic)
    }

    /// Classify `candidate` against `baseline` with the given threshold.
    pub fn evaluate(
        &self,
        candidate: &MeasurementRecord,
        baseline: &Baseline,
        threshold_ratio: f64,
    ) -> Result<RegressionVerdict> {
        if !threshold_ratio.is_finite() || threshold_ratio < 0.0 {
            return Err(AnalyzerError::InvalidThreshold(threshold_ratio));
        }
        if let Some(unit) = &baseline.unit {
            if *unit != candidate.unit {
                return Err(AnalyzerError::UnitMismatch {
                    expected: unit.clone(),
                    found: candidate.unit.clone(),
                });
            }
        }

        let min_history = self
            .policy_for(&candidate.tool, &candidate.name)
            .min_history;
        let insufficient_history = baseline.sample_size < min_history;

        let center = baseline.center();
        let delta_ratio = if center == 0.0 {
            0.0
        } else {
            (candidate.value - center) / center
        };

        let classification = if insufficient_history {
            Classification::Stable
        } else {
            classify(
                candidate.value,
                center,
                threshold_ratio,
                candidate.unit.direction(),
            )
        };

        let z_score = self.z_score(candidate.value, baseline);
        let p_value = z_score
            .zip(self.standard_normal.as_ref())
            .map(|(z, normal)| 1.0 - normal.cdf(z.abs()));

        debug!(
            tool = %candidate.tool,
            benchmark = %candidate.name,
            commit = %candidate.commit.id,
            value = candidate.value,
            center,
            delta_ratio,
            classification = %classification,
            insufficient_history,
            "evaluated candidate"
        );

        Ok(RegressionVerdict {
            tool: candidate.tool.clone(),
            benchmark: candidate.name.clone(),
            commit_id: candidate.commit.id.clone(),
            value: candidate.value,
            unit: candidate.unit.clone(),
            classification,
            delta_ratio,
            threshold_ratio,
            insufficient_history,
            z_score,
            p_value,
            baseline: baseline.clone(),
        })
    }

    /// Evaluate the record of `commit_id` in `series` against the records
    /// preceding it, using the benchmark's effective policy.
    pub fn assess(&self, series: &Series, commit_id: &str) -> Result<RegressionVerdict> {
        let key = series.key();
        let index = series
            .position_of(commit_id)
            .ok_or_else(|| AnalyzerError::CandidateNotFound {
                series: key.to_string(),
                commit_id: commit_id.to_string(),
            })?;
        let candidate = series
            .get(index)
            .ok_or_else(|| AnalyzerError::CandidateNotFound {
                series: key.to_string(),
                commit_id: commit_id.to_string(),
            })?;

        let policy = self.policy_for(&key.tool, &key.name);
        let baseline = self.baseline_at(series, index, policy.window_size)?;
        self.evaluate(candidate, &baseline, policy.threshold_ratio)
    }

    /// Evaluate the most recent record of `series`.
    pub fn assess_latest(&self, series: &Series) -> Result<Option<RegressionVerdict>> {
        match series.latest() {
            Some(latest) => self.assess(series, &latest.commit.id).map(Some),
            None => Ok(None),
        }
    }

    fn z_score(&self, value: f64, baseline: &Baseline) -> Option<f64> {
        let spread = match baseline.statistic {
            Statistic::Mean => baseline.std_dev,
            Statistic::Median => baseline.mad * MAD_SCALE,
        };
        if baseline.sample_size < 2 || spread <= 0.0 || !spread.is_finite() {
            return None;
        }
        Some((value - baseline.center()) / spread)
    }
}

/// Threshold comparison with strict boundaries.
fn classify(value: f64, center: f64, threshold_ratio: f64, direction: Direction) -> Classification {
    let upper = center * (1.0 + threshold_ratio);
    let lower = center * (1.0 - threshold_ratio);
    match direction {
        Direction::LowerIsBetter if value > upper => Classification::Regressed,
        Direction::LowerIsBetter if value < lower => Classification::Improved,
        Direction::HigherIsBetter if value < lower => Classification::Regressed,
        Direction::HigherIsBetter if value > upper => Classification::Improved,
        _ => Classification::Stable,
    }
}
