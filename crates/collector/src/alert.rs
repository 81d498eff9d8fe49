// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Regression notifications.
//!
//! The ingestion service hands every `regressed` verdict to an
//! [`AlertSink`]. Delivery to chat, e-mail or issue trackers is left to the
//! consumer of [`ChannelAlertSink`].

use benchtrack_analyzer::RegressionVerdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Notification event for one regressed benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionAlert {
    /// Unique alert id.
    pub id: Uuid,
    /// Link to the offending commit.
    pub commit_url: String,
    /// When the alert was raised.
    pub raised_at: DateTime<Utc>,
    /// The verdict that triggered the alert.
    pub verdict: RegressionVerdict,
}

impl RegressionAlert {
    /// Create an alert for `verdict`.
    pub fn new(verdict: RegressionVerdict, commit_url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            commit_url: commit_url.into(),
            raised_at: Utc::now(),
            verdict,
        }
    }
}

/// Receives regression alerts.
///
/// Implementations must not block; ingestion calls `notify` inline.
#[cfg_attr(test, mockall::automock)]
pub trait AlertSink: Send + Sync {
    /// Deliver one alert.
    fn notify(&self, alert: &RegressionAlert);
}

/// Logs alerts as structured `warn!` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn notify(&self, alert: &RegressionAlert) {
        let v = &alert.verdict;
        warn!(
            alert_id = %alert.id,
            tool = %v.tool,
            benchmark = %v.benchmark,
            commit = %v.commit_id,
            url = %alert.commit_url,
            value = v.value,
            baseline = v.baseline.center(),
            delta_pct = v.delta_percent(),
            threshold_pct = v.threshold_ratio * 100.0,
            "benchmark regression detected"
        );
    }
}

/// Forwards alerts to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    tx: mpsc::UnboundedSender<RegressionAlert>,
}

impl ChannelAlertSink {
    /// Create a sink and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RegressionAlert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AlertSink for ChannelAlertSink {
    fn notify(&self, alert: &RegressionAlert) {
        if self.tx.send(alert.clone()).is_err() {
            debug!(alert_id = %alert.id, "alert receiver dropped");
        }
    }
}

/// Discards alerts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAlertSink;

impl AlertSink for NoopAlertSink {
    fn notify(&self, _alert: &RegressionAlert) {}
}
