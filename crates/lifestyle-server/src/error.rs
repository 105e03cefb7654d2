//! Application error types and Axum response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application-level errors with HTTP status code mapping.
#[derive(Debug)]
pub enum AppError {
    /// The request body is not a JSON object.
    InvalidPayload(serde_json::Error),
    /// A required artifact is not loaded.
    ServiceUnavailable(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidPayload(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidPayload(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Invalid JSON object: {}", err),
            ),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { detail: message })).into_response()
    }
}
