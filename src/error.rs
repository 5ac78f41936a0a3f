//! Error handling module
//!
//! Provides the error taxonomy shared by the stores, the orchestrators and
//! the RPC layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Application-wide error type
///
/// Every layer adds exactly one fixed prefix through [`AppError::context`]
/// and keeps the variant, so the outermost message reads from the operation
/// down to the underlying cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Caller input failed a precondition checked before any I/O.
    #[error("{0}")]
    Validation(String),

    /// A store operation failed (constraint, connection, no rows).
    #[error("{0}")]
    Persistence(String),

    /// The identity service call failed or found no such user.
    #[error("{0}")]
    RemoteService(String),

    #[error("{0}")]
    Config(String),
}

impl AppError {
    /// Prepend `"{prefix}: "` to the message, keeping the error kind.
    pub fn context(self, prefix: &str) -> Self {
        match self {
            AppError::Validation(msg) => AppError::Validation(format!("{}: {}", prefix, msg)),
            AppError::Persistence(msg) => AppError::Persistence(format!("{}: {}", prefix, msg)),
            AppError::RemoteService(msg) => {
                AppError::RemoteService(format!("{}: {}", prefix, msg))
            }
            AppError::Config(msg) => AppError::Config(format!("{}: {}", prefix, msg)),
        }
    }

    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::RemoteService(_) => "REMOTE_SERVICE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<tokio_postgres::Error> for AppError {
    fn from(e: tokio_postgres::Error) -> Self {
        // Display on a server error is only "db error"; the server text lives in DbError.
        match e.as_db_error() {
            Some(db) => {
                let mut message = db.message().to_string();
                if let Some(detail) = db.detail() {
                    message.push_str(&format!(" ({})", detail));
                }
                AppError::Persistence(message)
            }
            None => AppError::Persistence(e.to_string()),
        }
    }
}

impl From<deadpool_postgres::PoolError> for AppError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        AppError::Persistence(format!("database pool error: {}", e))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(msg) => {
                warn!("Validation error: {}", msg);
                StatusCode::BAD_REQUEST
            }
            AppError::Persistence(msg) => {
                error!("Persistence error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::RemoteService(msg) => {
                error!("Remote service error: {}", msg);
                StatusCode::BAD_GATEWAY
            }
            AppError::Config(msg) => {
                error!("Configuration error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message: self.to_string(),
            code: Some(self.code().to_string()),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}
