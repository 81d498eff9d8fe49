// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types for Benchtrack.
//!
//! This crate holds the data model shared by every other Benchtrack crate:
//! commits, measurement records, units and series snapshots, together with
//! the validated ingestion payloads, configuration loading and logging
//! initialisation.
//!
//! # Modules
//!
//! - [`commit`] - Commit and person metadata
//! - [`unit`] - Measurement units and their direction
//! - [`record`] - The `MeasurementRecord` type and its invariants
//! - [`series`] - Ordered, immutable series snapshots
//! - [`payload`] - Wire format of a benchmark run
//! - [`config`] - Layered settings
//! - [`telemetry`] - `tracing` subscriber setup

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod commit;
pub mod config;
pub mod error;
pub mod payload;
pub mod record;
pub mod series;
pub mod telemetry;
pub mod unit;

pub use commit::{Commit, Person};
pub use config::{AnalyzerSettings, BenchmarkPolicy, Settings, Statistic};
pub use error::{Error, Result, ValidationError};
pub use payload::{BenchPayload, BenchmarkRun, RejectedBench};
pub use record::MeasurementRecord;
pub use series::{Series, SeriesKey};
pub use unit::{Direction, Unit};
