// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Read-only access to benchmark history.
//!
//! [`QueryApi`] serves the trend data external reporting tools render:
//! points ordered by commit timestamp, optionally bounded by a time range.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod query;

pub use error::{QueryError, Result};
pub use query::{QueryApi, TimeRange, TrendPoint};
