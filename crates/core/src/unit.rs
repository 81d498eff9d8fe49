// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Measurement units.
//!
//! Units are compared verbatim: two records are only comparable when their
//! units are equal. No conversion between units is ever attempted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit of a measurement value and its range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    /// Nanoseconds per iteration (`cargo bench` / libtest).
    NsPerIter,
    /// Nanoseconds.
    Nanoseconds,
    /// Microseconds.
    Microseconds,
    /// Milliseconds.
    Milliseconds,
    /// Seconds.
    Seconds,
    /// Bytes.
    Bytes,
    /// Operations per second.
    OpsPerSec,
    /// Any other unit string, kept verbatim.
    Other(String),
}

/// Which way a value has to move to count as an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Smaller values are better (durations, sizes).
    LowerIsBetter,
    /// Larger values are better (throughput).
    HigherIsBetter,
}

impl Unit {
    /// Canonical string form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::NsPerIter => "ns/iter",
            Self::Nanoseconds => "ns",
            Self::Microseconds => "us",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Bytes => "bytes",
            Self::OpsPerSec => "ops/s",
            Self::Other(s) => s,
        }
    }

    /// Direction of improvement for values in this unit.
    pub fn direction(&self) -> Direction {
        match self {
            Self::OpsPerSec => Direction::HigherIsBetter,
            Self::Other(s) if s.ends_with("/s") || s.ends_with("/sec") => {
                Direction::HigherIsBetter
            }
            _ => Direction::LowerIsBetter,
        }
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unit = match trimmed {
            "" => return Err("unit must not be empty".to_string()),
            "ns/iter" => Self::NsPerIter,
            "ns" => Self::Nanoseconds,
            "us" | "µs" => Self::Microseconds,
            "ms" => Self::Milliseconds,
            "s" => Self::Seconds,
            "bytes" | "B" => Self::Bytes,
            "ops/s" | "ops/sec" => Self::OpsPerSec,
            other => Self::Other(other.to_string()),
        };
        Ok(unit)
    }
}

impl TryFrom<String> for Unit {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.as_str().to_string()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
