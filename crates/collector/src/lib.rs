// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark run ingestion.
//!
//! [`IngestionService`] is the validated entry point for CI-reported runs.
//! For every record it
//!
//! 1. validates the record and rejects it individually if malformed,
//! 2. appends it to its series (a repeated commit is an idempotent no-op,
//!    a unit differing from the series is rejected),
//! 3. evaluates it against the series' trailing baseline,
//! 4. notifies the [`AlertSink`] on regressions.
//!
//! # Example
//!
//! ```ignore
//! use benchtrack_collector::IngestionService;
//!
//! let service = IngestionService::new(store, RegressionAnalyzer::new(settings.analyzer));
//! let report = service.ingest_run(run).await?;
//! for verdict in report.regressions() {
//!     eprintln!("{verdict}");
//! }
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod alert;
pub mod error;
pub mod metrics;
pub mod report;
pub mod service;

pub use alert::{AlertSink, ChannelAlertSink, NoopAlertSink, RegressionAlert, TracingAlertSink};
pub use error::{IngestError, Result};
pub use report::{BenchmarkOutcome, IngestReport, IngestSummary, OutcomeStatus, RejectionKind};
pub use service::IngestionService;
