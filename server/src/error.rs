use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::ingestion::SubmitError;
use crate::store::StoreError;

/// Handler-level error, rendered as `{ "error": <category>, "message": <text> }`
#[derive(Debug)]
pub enum AppError {
    Submit(SubmitError),
    /// Malformed request body
    InvalidRequest(String),
    /// Logged, returned to the user as a generic 500
    Internal(anyhow::Error),
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        AppError::Submit(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.into())
    }
}

fn server_error(err: &anyhow::Error, message: &'static str) -> Response {
    tracing::error!("internal error: {:?}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "server_error", "message": message })),
    )
        .into_response()
}

fn invalid_data(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "invalid_data", "message": message })),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Submit(SubmitError::RateLimited { retry_after }) => {
                // round up so clients never retry a moment too early
                let seconds = retry_after.as_millis().div_ceil(1000) as u64;
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({
                        "error": "rate_limited",
                        "message": "Please wait before posting again.",
                        "retry_after_seconds": seconds,
                    })),
                )
                    .into_response()
            }
            AppError::Submit(SubmitError::ContentRejected(reason)) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "content_rejected",
                    "reason": reason.code(),
                    "message": reason.message(),
                })),
            )
                .into_response(),
            AppError::Submit(SubmitError::InvalidData(details)) => {
                tracing::debug!(%details, "invalid message data");
                invalid_data("Invalid message data".to_string())
            }
            AppError::Submit(SubmitError::StorageFailure(err)) => {
                server_error(&err, "Failed to save message")
            }
            AppError::InvalidRequest(message) => invalid_data(message),
            AppError::Internal(err) => server_error(&err, "Internal server error"),
        }
    }
}
