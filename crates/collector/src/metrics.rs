// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ingestion metrics.
//!
//! Recorded through the `metrics` facade; without an installed recorder the
//! calls are no-ops.

use crate::report::IngestSummary;
use std::time::Duration;

/// Records stored and evaluated.
pub const RECORDS_INGESTED: &str = "benchtrack_records_ingested_total";
/// Records skipped as already present.
pub const RECORDS_DUPLICATE: &str = "benchtrack_records_duplicate_total";
/// Records rejected by validation.
pub const RECORDS_REJECTED: &str = "benchtrack_records_rejected_total";
/// Records hit by store failures.
pub const STORE_FAILURES: &str = "benchtrack_store_failures_total";
/// Regressed verdicts.
pub const REGRESSIONS: &str = "benchtrack_regressions_total";
/// Wall time of one ingestion call, in seconds.
pub const INGEST_DURATION: &str = "benchtrack_ingest_duration_seconds";

/// Register metric descriptions with the installed recorder.
pub fn describe() {
    metrics::describe_counter!(RECORDS_INGESTED, "Benchmark records stored and evaluated");
    metrics::describe_counter!(RECORDS_DUPLICATE, "Benchmark records already present");
    metrics::describe_counter!(RECORDS_REJECTED, "Benchmark records rejected by validation");
    metrics::describe_counter!(STORE_FAILURES, "Benchmark records hit by store failures");
    metrics::describe_counter!(REGRESSIONS, "Regressed benchmark verdicts");
    metrics::describe_histogram!(
        INGEST_DURATION,
        metrics::Unit::Seconds,
        "Wall time of one ingestion call"
    );
}

pub(crate) fn record_ingest(tool: &str, summary: &IngestSummary, elapsed: Duration) {
    let tool = tool.to_string();
    metrics::counter!(RECORDS_INGESTED, "tool" => tool.clone())
        .increment((summary.evaluated + summary.analysis_failed) as u64);
    metrics::counter!(RECORDS_DUPLICATE, "tool" => tool.clone()).increment(summary.duplicate as u64);
    metrics::counter!(RECORDS_REJECTED, "tool" => tool.clone()).increment(summary.rejected as u64);
    metrics::counter!(STORE_FAILURES, "tool" => tool.clone()).increment(summary.store_failed as u64);
    metrics::counter!(REGRESSIONS, "tool" => tool.clone()).increment(summary.regressed as u64);
    metrics::histogram!(INGEST_DURATION, "tool" => tool).record(elapsed.as_secs_f64());
}
