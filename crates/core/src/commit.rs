// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Commit metadata as reported by CI.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Author or committer of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Display name.
    pub name: String,
    /// E-mail address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Forge username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Person {
    /// Create a person with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            username: None,
        }
    }
}

/// The code version a benchmark run was measured against.
///
/// Commits are immutable once recorded; the store keeps the exact metadata
/// it received so exports reproduce it byte-for-byte in meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit hash.
    pub id: String,
    /// Author.
    pub author: Person,
    /// Committer.
    pub committer: Person,
    /// Commit timestamp, keeping the author's offset.
    pub timestamp: DateTime<FixedOffset>,
    /// Tree hash.
    pub tree_id: String,
    /// Link to the commit.
    pub url: String,
    /// Commit message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether the commit was distinct in its push.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
}

impl Commit {
    /// Timestamp normalised to UTC, used for ordering.
    pub fn timestamp_utc(&self) -> DateTime<Utc> {
        self.timestamp.with_timezone(&Utc)
    }

    /// Timestamp in epoch milliseconds.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Check the fields ingestion relies on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingCommitId);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Commit with the given id at `2022-06-26T19:00:00+01:00 + minutes`.
    pub fn commit(id: &str, minutes: i64) -> Commit {
        let base = DateTime::parse_from_rfc3339("2022-06-26T19:00:00+01:00").unwrap();
        Commit {
            id: id.to_string(),
            author: Person::new("JohnnyMorganz"),
            committer: Person::new("GitHub"),
            timestamp: base + chrono::Duration::minutes(minutes),
            tree_id: format!("tree-{id}"),
            url: format!("https://example.invalid/commit/{id}"),
            message: None,
            distinct: Some(true),
        }
    }
}
