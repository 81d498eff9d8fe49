// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! `tracing` subscriber setup shared by the CLI and the HTTP service.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;
use crate::error::{Error, Result};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `settings.level`. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(settings: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| Error::Telemetry(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| Error::Telemetry(e.to_string()))
}
