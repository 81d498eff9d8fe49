// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! The ingestion service.

use benchtrack_analyzer::RegressionAnalyzer;
use benchtrack_core::{BenchmarkRun, Commit, MeasurementRecord, RejectedBench, ValidationError};
use benchtrack_storage::{HistoryStore, StoreError};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::alert::{AlertSink, RegressionAlert, TracingAlertSink};
use crate::error::{IngestError, Result};
use crate::report::{BenchmarkOutcome, IngestReport, OutcomeStatus, RejectionKind};

/// Validated entry point for benchmark runs.
///
/// Each record is stored in its own series and evaluated against that
/// series' trailing baseline. Records of one batch are processed
/// concurrently and fail independently.
#[derive(Clone)]
pub struct IngestionService {
    store: Arc<dyn HistoryStore>,
    analyzer: Arc<RegressionAnalyzer>,
    sink: Arc<dyn AlertSink>,
}

impl std::fmt::Debug for IngestionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionService")
            .field("analyzer", &self.analyzer)
            .finish_non_exhaustive()
    }
}

impl IngestionService {
    /// Create a service that logs alerts through `tracing`.
    pub fn new(store: Arc<dyn HistoryStore>, analyzer: RegressionAnalyzer) -> Self {
        Self {
            store,
            analyzer: Arc::new(analyzer),
            sink: Arc::new(TracingAlertSink),
        }
    }

    /// Replace the alert sink.
    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn HistoryStore> {
        &self.store
    }

    /// The analyzer.
    pub fn analyzer(&self) -> &RegressionAnalyzer {
        &self.analyzer
    }

    /// Ingest the records of one commit.
    ///
    /// Fails only if `tool` or `commit` is invalid; every record gets its own
    /// outcome otherwise.
    pub async fn ingest(
        &self,
        tool: &str,
        commit: &Commit,
        records: Vec<MeasurementRecord>,
    ) -> Result<IngestReport> {
        if tool.trim().is_empty() {
            return Err(IngestError::InvalidRun(ValidationError::EmptyTool));
        }
        commit.validate()?;
        Ok(self
            .ingest_entries(tool, commit, records.into_iter().map(Ok).collect())
            .await)
    }

    /// Ingest a run in wire format.
    ///
    /// Benches whose range, unit or value fail to parse are rejected
    /// individually.
    pub async fn ingest_run(&self, run: BenchmarkRun) -> Result<IngestReport> {
        run.validate_header()?;
        let tool = run.tool.clone();
        let commit = run.commit.clone();
        let entries = run.into_records();
        Ok(self.ingest_entries(&tool, &commit, entries).await)
    }

    async fn ingest_entries(
        &self,
        tool: &str,
        commit: &Commit,
        entries: Vec<std::result::Result<MeasurementRecord, RejectedBench>>,
    ) -> IngestReport {
        let started = Instant::now();
        info!(tool, commit = %commit.id, benches = entries.len(), "ingesting run");

        let mut outcomes: Vec<Option<BenchmarkOutcome>> = Vec::with_capacity(entries.len());
        let mut pending = Vec::new();
        let mut seen = HashSet::new();

        for entry in entries {
            match entry {
                Err(rejected) => outcomes.push(Some(rejected_outcome(
                    rejected.name,
                    RejectionKind::InvalidRecord,
                    rejected.error.to_string(),
                ))),
                Ok(record) if !seen.insert(record.name.clone()) => {
                    outcomes.push(Some(rejected_outcome(
                        record.name.clone(),
                        RejectionKind::DuplicateInBatch,
                        format!("benchmark {} appears more than once in the run", record.name),
                    )))
                }
                Ok(record) => {
                    pending.push((outcomes.len(), record));
                    outcomes.push(None);
                }
            }
        }

        let results = join_all(
            pending
                .into_iter()
                .map(|(slot, record)| async move { (slot, self.ingest_record(tool, commit, record).await) }),
        )
        .await;
        for (slot, outcome) in results {
            outcomes[slot] = Some(outcome);
        }

        let report = IngestReport {
            tool: tool.to_string(),
            commit_id: commit.id.clone(),
            outcomes: outcomes.into_iter().flatten().collect(),
        };

        let summary = report.summary();
        let elapsed = started.elapsed();
        crate::metrics::record_ingest(tool, &summary, elapsed);
        info!(
            tool,
            commit = %commit.id,
            evaluated = summary.evaluated,
            regressed = summary.regressed,
            improved = summary.improved,
            duplicate = summary.duplicate,
            rejected = summary.rejected,
            store_failed = summary.store_failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "run ingested"
        );
        report
    }

    async fn ingest_record(
        &self,
        tool: &str,
        commit: &Commit,
        record: MeasurementRecord,
    ) -> BenchmarkOutcome {
        let name = record.name.clone();

        if let Err(err) = record
            .validate()
            .and_then(|_| record.ensure_belongs_to(tool, &commit.id))
        {
            return rejected_outcome(name, RejectionKind::InvalidRecord, err.to_string());
        }

        let receipt = match self.store.append_record(&record).await {
            Ok(receipt) => receipt,
            Err(StoreError::DuplicateCommit { .. }) => {
                debug!(tool, benchmark = %name, commit = %commit.id, "record already present");
                return BenchmarkOutcome {
                    benchmark: name,
                    status: OutcomeStatus::Duplicate,
                };
            }
            Err(StoreError::InvalidRecord(err)) => {
                return rejected_outcome(name, RejectionKind::InvalidRecord, err.to_string())
            }
            Err(err @ StoreError::UnitMismatch { .. }) => {
                return rejected_outcome(name, RejectionKind::UnitMismatch, err.to_string())
            }
            Err(err) => return store_failed(name, &err),
        };

        if receipt.out_of_order {
            warn!(
                tool,
                benchmark = %name,
                commit = %commit.id,
                "record is older than the latest record of its series"
            );
        }

        let series = match self.store.series_for(tool, &name).await {
            Ok(series) => series,
            Err(err) => {
                return BenchmarkOutcome {
                    benchmark: name,
                    status: OutcomeStatus::AnalysisFailed {
                        reason: err.to_string(),
                    },
                }
            }
        };

        match self.analyzer.assess(&series, &commit.id) {
            Ok(verdict) => {
                if verdict.is_regressed() {
                    self.sink
                        .notify(&RegressionAlert::new(verdict.clone(), commit.url.clone()));
                }
                BenchmarkOutcome {
                    benchmark: name,
                    status: OutcomeStatus::Evaluated {
                        verdict,
                        out_of_order: receipt.out_of_order,
                    },
                }
            }
            Err(err) => {
                warn!(tool, benchmark = %name, error = %err, "analysis failed");
                BenchmarkOutcome {
                    benchmark: name,
                    status: OutcomeStatus::AnalysisFailed {
                        reason: err.to_string(),
                    },
                }
            }
        }
    }
}

fn rejected_outcome(benchmark: String, kind: RejectionKind, reason: String) -> BenchmarkOutcome {
    debug!(benchmark = %benchmark, ?kind, %reason, "record rejected");
    BenchmarkOutcome {
        benchmark,
        status: OutcomeStatus::Rejected { kind, reason },
    }
}

fn store_failed(benchmark: String, err: &StoreError) -> BenchmarkOutcome {
    warn!(benchmark = %benchmark, error = %err, "store failure");
    BenchmarkOutcome {
        benchmark,
        status: OutcomeStatus::StoreFailed {
            reason: err.to_string(),
        },
    }
}
