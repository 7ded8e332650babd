//! Error types for tronwatch

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation error (bad query params, malformed ingest payload)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transaction classification error
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for API
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_response) = match &self {
            AppError::Config(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    status: "error",
                    reason: "configuration_error".to_string(),
                    details: Some(e.to_string()),
                },
            ),
            AppError::Database(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    status: "error",
                    reason: "database_error".to_string(),
                    details: Some(e.to_string()),
                },
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    status: "rejected",
                    reason: "validation_failed".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    status: "rejected",
                    reason: "not_found".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            AppError::Transaction(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    status: "rejected",
                    reason: "invalid_transaction".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    status: "error",
                    reason: "internal_error".to_string(),
                    details: Some(msg.clone()),
                },
            ),
        };

        tracing::error!(
            error_type = %self,
            status_code = %status_code,
            "Request error"
        );

        (status_code, Json(json!(error_response))).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
