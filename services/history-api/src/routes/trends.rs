use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use benchtrack_api::{TimeRange, TrendPoint};
use benchtrack_core::MeasurementRecord;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ToolParams {
    pub tool: String,
}

#[derive(Debug, Deserialize)]
pub struct SeriesParams {
    pub tool: String,
    pub benchmark: String,
}

#[derive(Debug, Deserialize)]
pub struct TrendParams {
    pub tool: String,
    pub benchmark: String,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/tools", get(list_tools))
        .route("/api/v1/benchmarks", get(list_benchmarks))
        .route("/api/v1/trend", get(trend))
        .route("/api/v1/latest", get(latest))
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Result<Json<BTreeSet<String>>, ApiError> {
    Ok(Json(state.query.tools().await?))
}

async fn list_benchmarks(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ToolParams>, QueryRejection>,
) -> Result<Json<BTreeSet<String>>, ApiError> {
    let Query(params) = params?;
    Ok(Json(state.query.benchmarks(&params.tool).await?))
}

async fn trend(
    State(state): State<Arc<AppState>>,
    params: Result<Query<TrendParams>, QueryRejection>,
) -> Result<Json<Vec<TrendPoint>>, ApiError> {
    let Query(params) = params?;
    let range = TimeRange {
        from: params.from,
        to: params.to,
    };
    let points = state
        .query
        .trend(&params.tool, &params.benchmark, range)
        .await?;
    debug!(tool = %params.tool, benchmark = %params.benchmark, points = points.len(), "Trend served");
    Ok(Json(points))
}

async fn latest(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SeriesParams>, QueryRejection>,
) -> Result<Json<MeasurementRecord>, ApiError> {
    let Query(params) = params?;
    state
        .query
        .latest(&params.tool, &params.benchmark)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::not_found(format!(
                "no records for {}/{}",
                params.tool, params.benchmark
            ))
        })
}
