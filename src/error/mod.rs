//! Error handling module
//!
//! `AppError` covers everything that can fail a request or a startup step.
//! Field-level form validation is *not* an `AppError`: rejected submissions
//! are an ordinary outcome of the settings service (see `settings::types`).
//!
//! Responses follow RFC 7807 Problem Details.

pub mod types;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

/// Standard error response format following RFC 7807 Problem Details
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub error_type: String,

    /// A short, human-readable summary of the problem type
    pub title: String,

    /// The HTTP status code
    pub status: u16,

    /// A human-readable explanation specific to this occurrence
    pub detail: String,

    /// A URI reference that identifies the specific occurrence
    pub instance: String,

    /// Request ID for tracing
    pub request_id: Option<String>,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String, line: Option<usize> },

    // Storage errors
    #[error("Redis connection failed: {message}")]
    RedisConnection { message: String },

    #[error("Redis operation failed: {operation} - {message}")]
    RedisOperation { operation: String, message: String },

    #[error("Storage persistence failed: {message}")]
    StoragePersistence { message: String },

    // Request errors
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Request body too large: {size} bytes (max: {max_size})")]
    RequestTooLarge { size: usize, max_size: usize },

    // Authentication and authorization
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("CSRF token missing or mismatched")]
    Csrf,

    #[error("Rate limit exceeded: {limit} requests per {window}")]
    RateLimit { limit: u32, window: String },

    // System errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("IO operation failed: {operation} - {message}")]
    Io { operation: String, message: String },
}

impl AppError {
    /// Create a new configuration validation error
    pub fn config_validation(message: impl Into<String>, field: Option<impl Into<String>>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
            field: field.map(Into::into),
        }
    }

    /// Create a new internal error with context
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            Self::ConfigParse { .. } | Self::InvalidRequest { .. } | Self::Serialization { .. } => {
                StatusCode::BAD_REQUEST
            }

            // 401 Unauthorized
            Self::Authentication { .. } => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::Csrf => StatusCode::FORBIDDEN,

            // 404 Not Found
            Self::ConfigNotFound { .. } => StatusCode::NOT_FOUND,

            // 413 Payload Too Large
            Self::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,

            // 429 Too Many Requests
            Self::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            Self::ConfigValidation { .. }
            | Self::Internal { .. }
            | Self::StoragePersistence { .. }
            | Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,

            // 503 Service Unavailable
            Self::RedisConnection { .. } | Self::RedisOperation { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// Get the error type URI for RFC 7807 compliance
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::ConfigValidation { .. } | Self::ConfigNotFound { .. } | Self::ConfigParse { .. } => {
                "/problems/configuration"
            }
            Self::RedisConnection { .. }
            | Self::RedisOperation { .. }
            | Self::StoragePersistence { .. } => "/problems/storage",
            Self::Authentication { .. } | Self::Csrf => "/problems/authentication",
            Self::RateLimit { .. } => "/problems/rate-limit",
            Self::InvalidRequest { .. } | Self::RequestTooLarge { .. } => "/problems/request",
            _ => "/problems/internal",
        }
    }

    /// Get a human-readable title for the error
    pub fn title(&self) -> &'static str {
        match self {
            Self::ConfigValidation { .. } | Self::ConfigNotFound { .. } | Self::ConfigParse { .. } => {
                "Configuration Error"
            }
            Self::RedisConnection { .. }
            | Self::RedisOperation { .. }
            | Self::StoragePersistence { .. } => "Storage Error",
            Self::Authentication { .. } => "Authentication Error",
            Self::Csrf => "Forbidden",
            Self::RateLimit { .. } => "Rate Limit Exceeded",
            Self::InvalidRequest { .. } | Self::RequestTooLarge { .. } => "Invalid Request",
            _ => "Internal Server Error",
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self, request_id: Option<&str>) {
        let request_id = request_id.unwrap_or("unknown");

        if self.status_code().is_server_error() {
            error!(
                error = %self,
                request_id = request_id,
                error_type = self.error_type(),
                "Application error occurred"
            );
        } else {
            warn!(
                error = %self,
                request_id = request_id,
                error_type = self.error_type(),
                "Client error occurred"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();

        self.log(Some(&request_id));

        let status = self.status_code();
        // Storage and internal failures keep their details in the log only.
        let detail = if status.is_server_error() {
            self.title().to_string()
        } else {
            self.to_string()
        };
        let error_response = ErrorResponse {
            error_type: self.error_type().to_string(),
            title: self.title().to_string(),
            status: status.as_u16(),
            detail,
            instance: format!("/errors/{request_id}"),
            request_id: Some(request_id),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
