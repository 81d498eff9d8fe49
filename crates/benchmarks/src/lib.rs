//! Benchmark dump interchange for Benchtrack.
//!
//! CI pipelines built on `github-action-benchmark` keep their whole history
//! in a single `data.js` file:
//!
//! ```text
//! window.BENCHMARK_DATA = {
//!   "lastUpdate": 1657132677520,
//!   "repoUrl": "https://github.com/JohnnyMorganz/StyLua",
//!   "entries": { "Rust Benchmark": [ { "commit": ..., "date": ..., "tool": "cargo", "benches": [...] } ] }
//! }
//! ```
//!
//! This crate reads and writes that format, replays a dump into an
//! [`IngestionService`](benchtrack_collector::IngestionService), rebuilds a
//! dump from a store, and renders markdown reports.
//!
//! # Modules
//!
//! - [`dump`] - The `BenchmarkData` document and its `data.js` encoding
//! - [`io`] - Reading and writing dumps, runs and reports
//! - [`import`] - Replaying a dump through ingestion
//! - [`export`] - Rebuilding a dump from stored history
//! - [`markdown`] - Markdown report generation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod dump;
pub mod error;
pub mod export;
pub mod import;
pub mod io;
pub mod markdown;

pub use dump::BenchmarkData;
pub use error::{DumpError, Result};
pub use export::export_history;
pub use import::{import_dump, ImportSummary};
