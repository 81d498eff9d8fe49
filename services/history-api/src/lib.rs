// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP service for Benchtrack.
//!
//! Routes:
//!
//! - `POST /api/v1/runs` - ingest one benchmark run (202 with the report)
//! - `GET /api/v1/tools` - tools with recorded history
//! - `GET /api/v1/benchmarks?tool=` - benchmark names of a tool
//! - `GET /api/v1/trend?tool=&benchmark=&from=&to=` - trend points
//! - `GET /api/v1/latest?tool=&benchmark=` - latest record (404 if none)
//! - `GET /health`, `GET /metrics`

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::runs::routes())
        .merge(routes::trends::routes())
        .merge(routes::health::routes())
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use benchtrack_core::AnalyzerSettings;
    use benchtrack_storage::MemoryHistoryStore;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        app(AppState::new(
            Arc::new(MemoryHistoryStore::new()),
            AnalyzerSettings::default(),
        ))
    }

    fn run(id: &str, timestamp: &str, value: f64) -> Value {
        json!({
            "tool": "cargo",
            "commit": {
                "id": id,
                "author": {"name": "JohnnyMorganz", "username": "JohnnyMorganz"},
                "committer": {"name": "GitHub", "username": "web-flow"},
                "timestamp": timestamp,
                "tree_id": format!("tree-{id}"),
                "url": format!("https://github.com/JohnnyMorganz/StyLua/commit/{id}")
            },
            "date": 1656267896762_i64,
            "benches": [
                {"name": "format date.lua", "value": value, "range": "± 843350", "unit": "ns/iter"}
            ]
        })
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_run_is_accepted() {
        let app = test_app();
        let response = app
            .oneshot(post_json("/api/v1/runs", &run("a", "2022-06-26T19:18:44+01:00", 66599457.0)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["tool"], "cargo");
        assert_eq!(body["commit_id"], "a");
        assert_eq!(body["outcomes"][0]["benchmark"], "format date.lua");
        assert_eq!(body["outcomes"][0]["status"], "evaluated");
    }

    #[tokio::test]
    async fn test_repeated_run_reports_duplicates() {
        let app = test_app();
        let payload = run("a", "2022-06-26T19:18:44+01:00", 1.0);
        app.clone().oneshot(post_json("/api/v1/runs", &payload)).await.unwrap();

        let response = app.oneshot(post_json("/api/v1/runs", &payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["outcomes"][0]["status"], "duplicate");
    }

    #[tokio::test]
    async fn test_malformed_payload_uses_error_shape() {
        let response = test_app()
            .oneshot(post_json("/api/v1/runs", &json!({"tool": "cargo"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INVALID_PAYLOAD");
        assert!(body["error"]["message"].is_string());
        assert!(body["meta"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_empty_tool_is_invalid_run() {
        let mut payload = run("a", "2022-06-26T19:18:44+01:00", 1.0);
        payload["tool"] = json!("");
        let response = test_app().oneshot(post_json("/api/v1/runs", &payload)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_RUN");
    }

    #[tokio::test]
    async fn test_trend_after_ingest() {
        let app = test_app();
        for (id, ts, value) in [
            ("b", "2022-06-26T20:00:00+01:00", 2.0),
            ("a", "2022-06-26T19:00:00+01:00", 1.0),
        ] {
            app.clone()
                .oneshot(post_json("/api/v1/runs", &run(id, ts, value)))
                .await
                .unwrap();
        }

        let response = app
            .clone()
            .oneshot(get("/api/v1/trend?tool=cargo&benchmark=format%20date.lua"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let ids: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["commit"]["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(body[0]["range"], 843350.0);

        let response = app
            .clone()
            .oneshot(get(
                "/api/v1/trend?tool=cargo&benchmark=format%20date.lua&from=2022-06-26T18:30:00Z",
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

        let response = app
            .oneshot(get("/api/v1/latest?tool=cargo&benchmark=format%20date.lua"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["commit"]["id"], "b");
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let response = test_app()
            .oneshot(get(
                "/api/v1/trend?tool=cargo&benchmark=x&from=2022-06-27T00:00:00Z&to=2022-06-26T00:00:00Z",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_RANGE");
    }

    #[tokio::test]
    async fn test_empty_series() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(get("/api/v1/trend?tool=cargo&benchmark=nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));

        let response = app
            .oneshot(get("/api/v1/latest?tool=cargo&benchmark=nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_missing_query_parameter() {
        let response = test_app().oneshot(get("/api/v1/benchmarks")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_QUERY");
    }

    #[tokio::test]
    async fn test_listing() {
        let app = test_app();
        app.clone()
            .oneshot(post_json("/api/v1/runs", &run("a", "2022-06-26T19:18:44+01:00", 1.0)))
            .await
            .unwrap();

        let tools = body_json(app.clone().oneshot(get("/api/v1/tools")).await.unwrap()).await;
        assert_eq!(tools, json!(["cargo"]));

        let names = body_json(app.oneshot(get("/api/v1/benchmarks?tool=cargo")).await.unwrap()).await;
        assert_eq!(names, json!(["format date.lua"]));
    }

    #[tokio::test]
    async fn test_health_and_request_id() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(middleware::X_REQUEST_ID, "ci-1234")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[middleware::X_REQUEST_ID], "ci-1234");
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_generated_request_id() {
        let response = test_app().oneshot(get("/api/v1/tools")).await.unwrap();
        let id = response.headers()[middleware::X_REQUEST_ID].to_str().unwrap();
        assert_eq!(id.len(), 36);
    }

    #[tokio::test]
    async fn test_metrics_without_exporter() {
        let response = test_app().oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
