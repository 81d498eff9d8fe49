// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchtrack HTTP service.
//!
//! Configuration comes from the file named by `BENCHTRACK_CONFIG` (optional)
//! and `BENCHTRACK__*` environment overrides.

use anyhow::Context;
use benchtrack_core::{telemetry::init_tracing, Settings};
use benchtrack_storage::SqliteHistoryStore;
use history_api::{app, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os("BENCHTRACK_CONFIG").map(PathBuf::from);
    let settings =
        Settings::load(config_path.as_deref()).context("failed to load configuration")?;
    init_tracing(&settings.logging)?;

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;
    benchtrack_collector::metrics::describe();

    let store = Arc::new(
        SqliteHistoryStore::connect(&settings.storage)
            .await
            .context("failed to open history store")?,
    );
    let state = AppState::new(store.clone(), settings.analyzer.clone()).with_metrics(metrics);

    let listener = TcpListener::bind(&settings.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.bind_addr))?;
    info!(addr = %settings.server.bind_addr, "History API listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("History API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}
