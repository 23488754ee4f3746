pub mod middleware_handling;
mod macros;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),
    #[error("Server error: {0}")]
    ServerError(anyhow::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
    #[error("Authorization error: {0}")]
    AuthorizationError(String),
    #[error("Resource exists: {0}")]
    ResourceExistsError(String),
}

impl AppError {
    // User-friendly authentication errors
    pub fn invalid_credentials() -> Self {
        Self::AuthenticationError("Invalid email or password".to_string())
    }

    pub fn token_expired() -> Self {
        Self::AuthenticationError(
            "Your session has expired. Please log in again to continue.".to_string(),
        )
    }

    pub fn token_invalid() -> Self {
        Self::AuthenticationError("Invalid authentication token. Please log in again.".to_string())
    }

    pub fn missing_token() -> Self {
        Self::AuthenticationError("Not authenticated".to_string())
    }

    // Resource errors
    pub fn resource_exists(resource_type: &str, identifier: &str) -> Self {
        Self::ResourceExistsError(format!(
            "{} with identifier '{}' already exists.",
            resource_type, identifier
        ))
    }

    pub fn database_operation_failed(operation: &str, resource: &str) -> Self {
        Self::DatabaseError(anyhow::anyhow!(
            "Database operation '{}' failed on resource '{}'",
            operation,
            resource
        ))
    }

    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFoundError(_) => StatusCode::NOT_FOUND,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::AuthorizationError(_) => StatusCode::FORBIDDEN,
            Self::ResourceExistsError(_) => StatusCode::CONFLICT,
            Self::ConfigError(_) | Self::DatabaseError(_) | Self::ServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::ServerError(error)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_message, error_code, help_text) = match &self {
            Self::ConfigError(_) => ("System configuration error", "CONFIG_ERROR", None),
            Self::DatabaseError(_) => ("Database operation failed", "DB_ERROR", None),
            Self::ServerError(_) => ("Internal server error", "SERVER_ERROR", None),
            Self::ValidationError(msg) => (
                msg.as_str(),
                "VALIDATION_ERROR",
                Some("Please review your input and try again."),
            ),
            Self::NotFoundError(msg) => (
                msg.as_str(),
                "NOT_FOUND",
                Some("The requested resource was not found."),
            ),
            Self::AuthenticationError(msg) => (
                msg.as_str(),
                "AUTH_ERROR",
                Some("Please log in to access this resource."),
            ),
            Self::AuthorizationError(msg) => (
                msg.as_str(),
                "FORBIDDEN",
                Some("You don't have permission to access this resource."),
            ),
            Self::ResourceExistsError(msg) => (
                msg.as_str(),
                "CONFLICT",
                Some("Choose a different value and try again."),
            ),
        };

        let log_message = format!("[{}] {}: {}", error_code, status, self);
        if status.is_server_error() {
            tracing::error!(
                error_code = error_code,
                status_code = %status.as_u16(),
                %error_message,
                "{}",
                log_message
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                status_code = %status.as_u16(),
                %error_message,
                "{}",
                log_message
            );
        }

        let body = Json(ErrorResponse {
            status: status.to_string(),
            message: error_message.to_string(),
            code: error_code.to_string(),
            // Don't expose internal error details to clients
            details: if status.is_server_error() {
                None
            } else {
                Some(self.to_string())
            },
            help: help_text.map(String::from),
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

pub type AppResult<T> = Result<T, AppError>;

// Extension trait to wrap anyhow errors with specific context
pub trait AppErrorExt<T> {
    fn config_err(self) -> AppResult<T>;
    fn db_err(self) -> AppResult<T>;
}

impl<T, E> AppErrorExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn config_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::ConfigError(e.into()))
    }

    fn db_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::DatabaseError(e.into()))
    }
}
