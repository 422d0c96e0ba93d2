//! Error types for report-dispatch
//!
//! This module provides the error taxonomy for the orchestrator:
//! - Local validation errors that block a request before any network call
//! - Transport errors for whole-batch failures against external services
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//!
//! Per-entity failures inside a batch are *not* errors; they are returned as
//! data (see [`crate::types::GenerationResult`] and [`crate::types::EmailResult`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for report-dispatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for report-dispatch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "backend.base_url")
        key: Option<String>,
    },

    /// Request rejected locally before any external call was made
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A whole batch call against an external service failed
    #[error("transport error: {0}")]
    Transport(String),

    /// Artifact, student, or other resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Mail message could not be built or the mail transport could not be set up
    #[error("mail error: {0}")]
    Mail(String),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Validation failures detected locally, before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The resolved selection set is empty
    #[error("no entities selected")]
    NoEntitiesSelected,

    /// One or more email addresses are malformed
    #[error("invalid email address(es): {}", addresses.join(", "))]
    InvalidAddresses {
        /// Every offending address, in the order it was supplied
        addresses: Vec<String>,
    },

    /// A required field is missing or blank
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the missing field (e.g., "term", "to")
        field: String,
    },
}

impl ValidationError {
    /// Create a missing-field error
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "invalid_addresses",
///     "message": "validation error: invalid email address(es): bad@",
///     "details": {
///       "addresses": ["bad@"]
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "no_entities_selected")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::Mail(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Transport(_) => 502,
            Error::Network(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(e) => match e {
                ValidationError::NoEntitiesSelected => "no_entities_selected",
                ValidationError::InvalidAddresses { .. } => "invalid_addresses",
                ValidationError::MissingField { .. } => "missing_field",
            },
            Error::Transport(_) => "transport_error",
            Error::NotFound(_) => "not_found",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
            Error::Mail(_) => "mail_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Validation(ValidationError::InvalidAddresses { addresses }) => {
                Some(serde_json::json!({
                    "addresses": addresses,
                }))
            }
            Error::Validation(ValidationError::MissingField { field }) => {
                Some(serde_json::json!({
                    "field": field,
                }))
            }
            Error::Config {
                key: Some(key), ..
            } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
