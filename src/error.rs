use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Error taxonomy shared by both services. Every handler failure is one of
/// these; the boundary translates it to a status code and the wire shape
/// `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing input (400).
    #[error("{0}")]
    Validation(String),
    /// Duplicate email on registration (409).
    #[error("{0}")]
    Conflict(String),
    /// Bad credentials or invalid/expired token (401). Messages stay generic
    /// so the caller cannot tell which check failed.
    #[error("{0}")]
    Auth(String),
    /// Unknown model name (400).
    #[error("{0}")]
    Model(String),
    /// Model weights could not be fetched or the backend failed to build (500).
    #[error("{0}")]
    ModelLoad(String),
    /// The upscaling transform or result encoding failed (500).
    #[error("{0}")]
    Enhancement(String),
    /// Anything unexpected. Logged with detail server-side, reported
    /// generically to the caller.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Model(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::ModelLoad(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::Enhancement(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::Internal(e) => {
                error!(error = %e, "unexpected internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
