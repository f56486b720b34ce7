// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Machine-readable error code for speech failures.
pub const CODE_SERVICE_NOT_CONFIGURED: &str = "SERVICE_NOT_CONFIGURED";
/// Machine-readable error code for TTS provider failures.
pub const CODE_TTS_ERROR: &str = "TTS_ERROR";

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Chat provider failure. Collapses to a generic 500 for clients;
    /// the upstream detail is only logged.
    #[error("Chat service error: {0}")]
    ChatApi(String),

    #[error("Text-to-speech service not configured")]
    SpeechNotConfigured,

    #[error("Voice service authentication failed")]
    SpeechAuth,

    #[error("Voice service rate limit exceeded")]
    SpeechRateLimited,

    #[error("Voice service quota exceeded")]
    SpeechQuota,

    #[error("Voice service unavailable: {0}")]
    SpeechUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, code) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token".to_string(),
                None,
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::ChatApi(msg) => {
                tracing::error!(error = %msg, "Chat service error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process chat message".to_string(),
                    None,
                )
            }
            AppError::SpeechNotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Text-to-speech service not configured".to_string(),
                Some(CODE_SERVICE_NOT_CONFIGURED),
            ),
            AppError::SpeechAuth => (
                StatusCode::UNAUTHORIZED,
                "Voice service authentication failed".to_string(),
                Some(CODE_TTS_ERROR),
            ),
            AppError::SpeechRateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Voice service rate limit exceeded".to_string(),
                Some(CODE_TTS_ERROR),
            ),
            AppError::SpeechQuota => (
                StatusCode::PAYMENT_REQUIRED,
                "Voice service quota exceeded".to_string(),
                Some(CODE_TTS_ERROR),
            ),
            AppError::SpeechUnavailable(msg) => {
                tracing::error!(error = %msg, "Voice service error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Text-to-speech service temporarily unavailable".to_string(),
                    Some(CODE_TTS_ERROR),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error".to_string(),
                    None,
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            message,
            code,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
