// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Rolling baseline statistics.

use benchtrack_core::{MeasurementRecord, Statistic, Unit};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

use crate::error::{AnalyzerError, Result};

/// Summary of the records preceding a candidate.
///
/// All four statistics are computed; [`Baseline::center`] and
/// [`Baseline::spread`] pick the pair selected by `statistic`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Statistic used for classification.
    pub statistic: Statistic,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (0 with fewer than two samples).
    pub std_dev: f64,
    /// Median.
    pub median: f64,
    /// Median absolute deviation.
    pub mad: f64,
    /// Number of records summarised.
    pub sample_size: usize,
    /// Unit shared by every summarised record; `None` for an empty window.
    pub unit: Option<Unit>,
}

impl Baseline {
    /// Summarise a window of records.
    ///
    /// Fails with [`AnalyzerError::UnitMismatch`] if the window mixes units.
    pub fn from_records(window: &[MeasurementRecord], statistic: Statistic) -> Result<Self> {
        let unit = match window.first() {
            Some(first) => {
                if let Some(other) = window.iter().find(|r| r.unit != first.unit) {
                    return Err(AnalyzerError::UnitMismatch {
                        expected: first.unit.clone(),
                        found: other.unit.clone(),
                    });
                }
                Some(first.unit.clone())
            }
            None => None,
        };

        let values: Vec<f64> = window.iter().map(|r| r.value).collect();
        Ok(Self::from_values(&values, unit, statistic))
    }

    /// Summarise raw values.
    pub fn from_values(values: &[f64], unit: Option<Unit>, statistic: Statistic) -> Self {
        let sample_size = values.len();
        if sample_size == 0 {
            return Self {
                statistic,
                mean: 0.0,
                std_dev: 0.0,
                median: 0.0,
                mad: 0.0,
                sample_size,
                unit,
            };
        }

        let mean = values.iter().mean();
        let std_dev = if sample_size > 1 {
            values.iter().std_dev()
        } else {
            0.0
        };
        let median = Data::new(values.to_vec()).median();
        let deviations: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
        let mad = Data::new(deviations).median();

        Self {
            statistic,
            mean,
            std_dev,
            median,
            mad,
            sample_size,
            unit,
        }
    }

    /// Central value used as the comparison point.
    pub fn center(&self) -> f64 {
        match self.statistic {
            Statistic::Mean => self.mean,
            Statistic::Median => self.median,
        }
    }

    /// Dispersion matching [`Baseline::center`].
    pub fn spread(&self) -> f64 {
        match self.statistic {
            Statistic::Mean => self.std_dev,
            Statistic::Median => self.mad,
        }
    }

    /// Whether the window was empty.
    pub fn is_empty(&self) -> bool {
        self.sample_size == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_and_std_dev() {
        let baseline = Baseline::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], None, Statistic::Mean);
        assert!(close(baseline.mean, 5.0));
        // sample standard deviation
        assert!(close(baseline.std_dev, (32.0_f64 / 7.0).sqrt()));
        assert!(close(baseline.center(), 5.0));
        assert_eq!(baseline.sample_size, 8);
    }

    #[test]
    fn test_median_and_mad_resist_outliers() {
        let baseline = Baseline::from_values(&[10.0, 11.0, 12.0, 11.0, 500.0], None, Statistic::Median);
        assert!(close(baseline.median, 11.0));
        assert!(close(baseline.mad, 1.0));
        assert!(close(baseline.center(), 11.0));
        assert!(baseline.mean > 100.0);
    }

    #[test]
    fn test_single_sample_has_zero_spread() {
        let baseline = Baseline::from_values(&[42.0], None, Statistic::Mean);
        assert!(close(baseline.mean, 42.0));
        assert_eq!(baseline.std_dev, 0.0);
        assert_eq!(baseline.mad, 0.0);
    }

    #[test]
    fn test_empty_window() {
        let baseline = Baseline::from_values(&[], None, Statistic::Mean);
        assert!(baseline.is_empty());
        assert_eq!(baseline.center(), 0.0);
    }
}
