use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Request-level failure. Every endpoint reports it the same way: HTTP 500
/// with a `detail` message naming the operation.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{operation} failed: {cause}")]
    Failed {
        operation: &'static str,
        cause: String,
    },
}

impl ApiError {
    pub fn failed(operation: &'static str, cause: impl std::fmt::Display) -> Self {
        ApiError::Failed {
            operation,
            cause: cause.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        let body = Json(json!({ "detail": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
