// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

use benchtrack_analyzer::RegressionAnalyzer;
use benchtrack_api::QueryApi;
use benchtrack_collector::IngestionService;
use benchtrack_core::AnalyzerSettings;
use benchtrack_storage::HistoryStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared state of all handlers.
#[derive(Clone)]
pub struct AppState {
    pub ingestion: IngestionService,
    pub query: QueryApi,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(store: Arc<dyn HistoryStore>, analyzer: AnalyzerSettings) -> Self {
        Self {
            ingestion: IngestionService::new(store.clone(), RegressionAnalyzer::new(analyzer)),
            query: QueryApi::new(store),
            metrics: None,
        }
    }

    pub fn with_ingestion(mut self, ingestion: IngestionService) -> Self {
        self.ingestion = ingestion;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
