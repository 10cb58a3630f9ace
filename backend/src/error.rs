//! Error handling for Lotkeeper
//!
//! Every stock operation either commits completely or fails with one of these
//! variants and leaves the three stock counters untouched.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Stock rule rejections
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { available: i32, requested: i32 },

    #[error(
        "Insufficient stock in version {version}: requested {requested}, available {available}"
    )]
    InsufficientVersionStock {
        version: i32,
        available: i32,
        requested: i32,
    },

    #[error("No single version lot holds {requested} units")]
    NoAvailableVersion { requested: i32 },

    #[error("Shared purchase exceeds available stock: requested {requested}, available {available}")]
    ExceedsAvailableStock { available: i32, requested: i64 },

    // A checked mutation lost a race with another transaction
    #[error("Concurrent modification: {0}")]
    Concurrency(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Validation failure on a single input field
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
}

impl ErrorDetail {
    fn new(code: &str, message: String) -> Self {
        Self {
            code: code.to_string(),
            message,
            field: None,
            available: None,
        }
    }

    fn with_available(mut self, available: i32) -> Self {
        self.available = Some(i64::from(available));
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new("VALIDATION_ERROR", message.clone())
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", msg.clone()),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InsufficientStock { available, .. } => (
                StatusCode::CONFLICT,
                ErrorDetail::new("INSUFFICIENT_STOCK", self.to_string()).with_available(*available),
            ),
            AppError::InsufficientVersionStock { available, .. } => (
                StatusCode::CONFLICT,
                ErrorDetail::new("INSUFFICIENT_VERSION_STOCK", self.to_string())
                    .with_available(*available),
            ),
            AppError::NoAvailableVersion { .. } => (
                StatusCode::CONFLICT,
                ErrorDetail::new("NO_AVAILABLE_VERSION", self.to_string()),
            ),
            AppError::ExceedsAvailableStock { available, .. } => (
                StatusCode::CONFLICT,
                ErrorDetail::new("EXCEEDS_AVAILABLE_STOCK", self.to_string())
                    .with_available(*available),
            ),
            AppError::Concurrency(_) => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "CONCURRENCY_CONFLICT",
                    "Stock changed while the request was processed. Please retry.".to_string(),
                ),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred".to_string()),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                ),
            ),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for services and handlers
pub type AppResult<T> = Result<T, AppError>;
