//! Unified error types for the Taleteller API
//!
//! This module defines error types for each layer:
//! - `DomainError`: Core lifecycle errors returned by the story service
//! - `GenerationError`: Image generation backend errors
//! - `ConfigError`: Startup configuration errors
//! - `AppError`: Boundary errors (wraps domain errors for HTTP responses)

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Domain layer errors - returned by every lifecycle operation
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image generation failed: {0}")]
    Generation(String),

    #[error("Image generation cancelled: {0}")]
    Cancelled(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Image generation backend errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Backend returned no images")]
    EmptyResult,

    #[error("Backend returned duplicate image reference: {0}")]
    DuplicateReference(String),
}

impl GenerationError {
    /// Whether retrying the same request can never succeed.
    ///
    /// The backend rejecting the request outright (4xx) is permanent; timeouts,
    /// throttling, transport and server failures are transient.
    pub fn is_permanent(&self) -> bool {
        match self {
            GenerationError::Api { status, .. } => {
                (400..500).contains(status) && *status != 408 && *status != 429
            }
            _ => false,
        }
    }
}

/// Configuration errors raised while building `Config`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Boundary errors - used by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error response body for JSON responses
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    error_code: &'static str,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Domain(DomainError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Domain(DomainError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone())
            }
            AppError::Domain(DomainError::InvalidState(msg)) => {
                (StatusCode::BAD_REQUEST, "INVALID_STATE", msg.clone())
            }
            AppError::Domain(DomainError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::Domain(DomainError::Storage(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "Internal server error".to_string(),
            ),
            AppError::Domain(DomainError::Generation(msg)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "GENERATION_ERROR",
                format!("Image generation failed: {}", msg),
            ),
            AppError::Domain(DomainError::Cancelled(msg)) => (
                StatusCode::GATEWAY_TIMEOUT,
                "GENERATION_CANCELLED",
                msg.clone(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = self.parts();

        if status.is_server_error() {
            tracing::error!(error_code = code, "{}", self);
        } else {
            tracing::warn!(error_code = code, "{}", self);
        }

        let body = Json(ErrorResponse {
            error,
            error_code: code,
        });

        (status, body).into_response()
    }
}
