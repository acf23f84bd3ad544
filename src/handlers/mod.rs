use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::backend::BackendError;

pub mod chat;
pub mod models;
pub mod version;

// Custom error types for API handling
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Backend error: {0}")]
    BackendError(#[from] BackendError),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // A non-success answer from the backend keeps its status and
            // body so the caller sees exactly what the backend said.
            ApiError::BackendError(BackendError::ApiError { status, body }) => {
                (status, body).into_response()
            }
            ApiError::BackendError(BackendError::Timeout(_)) => (
                StatusCode::GATEWAY_TIMEOUT,
                Json(json!({ "error": "Backend request timed out" })),
            )
                .into_response(),
            ApiError::BackendError(e) => (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": format!("Backend error: {}", e) })),
            )
                .into_response(),
            ApiError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": msg }))).into_response()
            }
        }
    }
}
