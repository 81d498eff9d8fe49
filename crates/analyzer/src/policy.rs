// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-benchmark analysis policy.

use benchtrack_core::{AnalyzerSettings, SeriesKey, Statistic};
use serde::{Deserialize, Serialize};

/// Effective policy for one series after applying overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPolicy {
    /// Relative threshold.
    pub threshold_ratio: f64,
    /// Baseline window size.
    pub window_size: usize,
    /// Minimum baseline samples for a confident verdict.
    pub min_history: usize,
    /// Central statistic.
    pub statistic: Statistic,
}

impl ResolvedPolicy {
    /// Resolve the policy for `key`.
    ///
    /// Override lookup order: `tool/name`, `name`, then the lowercased forms
    /// of both (configuration sources may lowercase keys).
    pub fn resolve(settings: &AnalyzerSettings, key: &SeriesKey) -> Self {
        let qualified = key.to_string();
        let candidates = [
            qualified.clone(),
            key.name.clone(),
            qualified.to_lowercase(),
            key.name.to_lowercase(),
        ];
        let overrides = candidates
            .iter()
            .find_map(|candidate| settings.overrides.get(candidate));

        let mut policy = Self {
            threshold_ratio: settings.threshold_ratio,
            window_size: settings.window_size,
            min_history: settings.min_history,
            statistic: settings.statistic,
        };
        if let Some(o) = overrides {
            policy.threshold_ratio = o.threshold_ratio.unwrap_or(policy.threshold_ratio);
            policy.window_size = o.window_size.unwrap_or(policy.window_size);
            policy.statistic = o.statistic.unwrap_or(policy.statistic);
        }
        policy
    }
}
