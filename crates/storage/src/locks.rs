// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-series write locks.

use benchtrack_core::SeriesKey;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{Result, StoreError};

/// One async mutex per series, created on first use.
///
/// Only writers take these locks; readers work on snapshots.
#[derive(Debug, Default)]
pub struct SeriesLocks {
    locks: DashMap<SeriesKey, Arc<Mutex<()>>>,
}

impl SeriesLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the series for `key`, waiting at most `timeout`.
    pub async fn acquire(&self, key: &SeriesKey, timeout: Duration) -> Result<OwnedMutexGuard<()>> {
        // Clone the Arc out so the shard guard is released before awaiting.
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        tokio::time::timeout(timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                StoreError::Unavailable(format!(
                    "timed out after {}ms waiting for series {key}",
                    timeout.as_millis()
                ))
            })
    }

    /// Lock several series in key order, so concurrent batches cannot
    /// deadlock.
    pub async fn acquire_all(
        &self,
        keys: &[SeriesKey],
        timeout: Duration,
    ) -> Result<Vec<OwnedMutexGuard<()>>> {
        let mut sorted: Vec<&SeriesKey> = keys.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in sorted {
            guards.push(self.acquire(key, timeout).await?);
        }
        Ok(guards)
    }

    /// Number of series seen so far.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no series has been locked yet.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_series_is_exclusive() {
        let locks = SeriesLocks::new();
        let key = SeriesKey::new("cargo", "format date.lua");

        let _held = locks.acquire(&key, Duration::from_secs(1)).await.unwrap();
        let second = locks.acquire(&key, Duration::from_millis(20)).await;
        assert!(matches!(second, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_different_series_are_independent() {
        let locks = SeriesLocks::new();
        let a = SeriesKey::new("cargo", "a");
        let b = SeriesKey::new("cargo", "b");

        let _held = locks.acquire(&a, Duration::from_secs(1)).await.unwrap();
        assert!(locks.acquire(&b, Duration::from_millis(20)).await.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_acquire_all_dedups_keys() {
        let locks = SeriesLocks::new();
        let a = SeriesKey::new("cargo", "a");
        let guards = locks
            .acquire_all(&[a.clone(), a], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(guards.len(), 1);
    }
}
