use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, routing::post, Json, Router};
use benchtrack_collector::IngestReport;
use benchtrack_core::BenchmarkRun;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::RequestId;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/v1/runs", post(ingest_run))
}

async fn ingest_run(
    State(state): State<Arc<AppState>>,
    request_id: RequestId,
    payload: Result<Json<BenchmarkRun>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestReport>), ApiError> {
    let Json(run) = payload?;
    info!(
        request_id = %request_id.0,
        tool = %run.tool,
        commit = %run.commit.id,
        benches = run.benches.len(),
        "Benchmark run received"
    );

    let report = state.ingestion.ingest_run(run).await?;
    Ok((StatusCode::ACCEPTED, Json(report)))
}
