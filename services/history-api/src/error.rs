// Copyright 2025 Benchtrack Contributors
// SPDX-License-Identifier: Apache-2.0

//! JSON error responses.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use benchtrack_api::QueryError;
use benchtrack_collector::IngestError;
use benchtrack_storage::StoreError;
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error returned by every handler.
///
/// Rendered as `{"error": {"code", "message"}, "meta": {"timestamp"}}`.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, message = %self.message, "request failed");
        }
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            },
            "meta": {
                "timestamp": Utc::now().to_rfc3339(),
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE", err.to_string())
            }
            StoreError::InvalidRecord(_) => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_RECORD", err.to_string())
            }
            StoreError::DuplicateCommit { .. } => {
                Self::new(StatusCode::CONFLICT, "DUPLICATE_COMMIT", err.to_string())
            }
            StoreError::UnitMismatch { .. } => {
                Self::new(StatusCode::CONFLICT, "UNIT_MISMATCH", err.to_string())
            }
            StoreError::Corrupt(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "STORE_CORRUPT", err.to_string())
            }
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Store(store) => store.into(),
            QueryError::InvalidRange { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_RANGE", err.to_string())
            }
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidRun(_) => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_RUN", err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_PAYLOAD", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_QUERY", rejection.body_text())
    }
}
