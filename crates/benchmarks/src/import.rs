//! Replaying a dump through ingestion.

use benchtrack_collector::{IngestReport, IngestSummary, IngestionService};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dump::BenchmarkData;

/// A run that could not be ingested at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRun {
    /// Suite the run belongs to.
    pub suite: String,
    /// Commit of the run.
    pub commit_id: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Result of an import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Reports of ingested runs, in file order.
    pub reports: Vec<IngestReport>,
    /// Runs with an invalid header.
    pub skipped: Vec<SkippedRun>,
}

impl ImportSummary {
    /// Outcome counts over all runs.
    pub fn totals(&self) -> IngestSummary {
        let mut totals = IngestSummary::default();
        for report in &self.reports {
            totals += report.summary();
        }
        totals
    }

    /// Whether any run regressed.
    pub fn has_regressions(&self) -> bool {
        self.reports.iter().any(IngestReport::has_regressions)
    }
}

/// Ingest every run of `data`, suites in name order and runs in file order.
///
/// `on_run` is called after each run, e.g. to advance a progress bar.
/// Re-importing the same dump is a no-op: every record is reported as a
/// duplicate.
pub async fn import_dump<F>(service: &IngestionService, data: &BenchmarkData, mut on_run: F) -> ImportSummary
where
    F: FnMut(&IngestReport),
{
    let mut summary = ImportSummary::default();

    for (suite, run) in data.runs() {
        match service.ingest_run(run.clone()).await {
            Ok(report) => {
                on_run(&report);
                summary.reports.push(report);
            }
            Err(err) => {
                warn!(suite, commit = %run.commit.id, error = %err, "skipping run");
                summary.skipped.push(SkippedRun {
                    suite: suite.to_string(),
                    commit_id: run.commit.id.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    let totals = summary.totals();
    info!(
        repo = %data.repo_url,
        runs = summary.reports.len(),
        skipped = summary.skipped.len(),
        evaluated = totals.evaluated,
        duplicate = totals.duplicate,
        regressed = totals.regressed,
        "dump imported"
    );
    summary
}
