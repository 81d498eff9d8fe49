// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Regression detection over benchmark series.
//!
//! The analyzer summarises the records preceding a candidate into a
//! [`Baseline`] and compares the candidate against it with a relative
//! threshold:
//!
//! ```text
//! regressed  if value > center * (1 + threshold)
//! improved   if value < center * (1 - threshold)
//! stable     otherwise
//! ```
//!
//! (reversed for higher-is-better units such as `ops/s`). Window size,
//! threshold and central statistic are tunable globally and per benchmark.
//!
//! # Example
//!
//! ```ignore
//! use benchtrack_analyzer::RegressionAnalyzer;
//!
//! let analyzer = RegressionAnalyzer::new(settings.analyzer.clone());
//! let series = store.series_for("cargo", "format date.lua").await?;
//! let verdict = analyzer.assess(&series, commit_id)?;
//! if verdict.is_regressed() {
//!     println!("{} regressed by {:.1}%", verdict.benchmark, verdict.delta_ratio * 100.0);
//! }
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analyzer;
pub mod baseline;
pub mod error;
pub mod policy;
pub mod verdict;

pub use analyzer::RegressionAnalyzer;
pub use baseline::Baseline;
pub use error::{AnalyzerError, Result};
pub use policy::ResolvedPolicy;
pub use verdict::{Classification, RegressionVerdict};
