// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-benchmark ingestion outcomes.

use benchtrack_analyzer::{Classification, RegressionVerdict};
use serde::{Deserialize, Serialize};

/// Why a record was not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// The record failed validation.
    InvalidRecord,
    /// The unit differs from the existing series.
    UnitMismatch,
    /// The benchmark name appeared earlier in the same batch.
    DuplicateInBatch,
}

/// What happened to one benchmark of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Stored and classified.
    Evaluated {
        /// Verdict against the trailing baseline.
        verdict: RegressionVerdict,
        /// The commit is older than the series' previous latest record.
        out_of_order: bool,
    },
    /// Already recorded for this commit; nothing was written.
    Duplicate,
    /// Not stored.
    Rejected {
        /// Rejection category.
        kind: RejectionKind,
        /// Human readable reason.
        reason: String,
    },
    /// The store failed; the record may be retried.
    StoreFailed {
        /// Store error message.
        reason: String,
    },
    /// Stored, but the verdict could not be computed.
    AnalysisFailed {
        /// Analyzer or store error message.
        reason: String,
    },
}

/// Outcome for one benchmark name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkOutcome {
    /// Benchmark name.
    pub benchmark: String,
    /// Outcome.
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl BenchmarkOutcome {
    /// Verdict, when the record was evaluated.
    pub fn verdict(&self) -> Option<&RegressionVerdict> {
        match &self.status {
            OutcomeStatus::Evaluated { verdict, .. } => Some(verdict),
            _ => None,
        }
    }
}

/// Counts per outcome category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Records stored and evaluated.
    pub evaluated: usize,
    /// Evaluated records classified as regressed.
    pub regressed: usize,
    /// Evaluated records classified as improved.
    pub improved: usize,
    /// Records already present.
    pub duplicate: usize,
    /// Records rejected.
    pub rejected: usize,
    /// Records hit by store failures.
    pub store_failed: usize,
    /// Records stored without a verdict.
    pub analysis_failed: usize,
}

impl std::ops::AddAssign for IngestSummary {
    fn add_assign(&mut self, other: Self) {
        self.evaluated += other.evaluated;
        self.regressed += other.regressed;
        self.improved += other.improved;
        self.duplicate += other.duplicate;
        self.rejected += other.rejected;
        self.store_failed += other.store_failed;
        self.analysis_failed += other.analysis_failed;
    }
}

/// Result of ingesting one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Tool of the run.
    pub tool: String,
    /// Commit of the run.
    pub commit_id: String,
    /// One outcome per benchmark, in input order.
    pub outcomes: Vec<BenchmarkOutcome>,
}

impl IngestReport {
    /// All verdicts, in input order.
    pub fn verdicts(&self) -> impl Iterator<Item = &RegressionVerdict> {
        self.outcomes.iter().filter_map(BenchmarkOutcome::verdict)
    }

    /// Regressed verdicts.
    pub fn regressions(&self) -> impl Iterator<Item = &RegressionVerdict> {
        self.verdicts().filter(|v| v.is_regressed())
    }

    /// Whether any benchmark regressed.
    pub fn has_regressions(&self) -> bool {
        self.regressions().next().is_some()
    }

    /// Whether the whole run was already recorded.
    pub fn is_duplicate(&self) -> bool {
        !self.outcomes.is_empty()
            && self
                .outcomes
                .iter()
                .all(|o| o.status == OutcomeStatus::Duplicate)
    }

    /// Outcome for `benchmark`.
    pub fn outcome(&self, benchmark: &str) -> Option<&BenchmarkOutcome> {
        self.outcomes.iter().find(|o| o.benchmark == benchmark)
    }

    /// Count outcomes per category.
    pub fn summary(&self) -> IngestSummary {
        let mut summary = IngestSummary::default();
        for outcome in &self.outcomes {
            match &outcome.status {
                OutcomeStatus::Evaluated { verdict, .. } => {
                    summary.evaluated += 1;
                    match verdict.classification {
                        Classification::Regressed => summary.regressed += 1,
                        Classification::Improved => summary.improved += 1,
                        Classification::Stable => {}
                    }
                }
                OutcomeStatus::Duplicate => summary.duplicate += 1,
                OutcomeStatus::Rejected { .. } => summary.rejected += 1,
                OutcomeStatus::StoreFailed { .. } => summary.store_failed += 1,
                OutcomeStatus::AnalysisFailed { .. } => summary.analysis_failed += 1,
            }
        }
        summary
    }
}
