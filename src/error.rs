//! Error types for the study tracker.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Errors surfaced by topic operations and their HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum TopicError {
    #[error("{0}")]
    Validation(String),

    #[error("Topic {id} not found")]
    NotFound { id: String },

    #[error("time data '{input}' does not match format '%Y-%m-%d': {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("Unknown review action: {0}")]
    UnknownAction(String),

    #[error("Storage error: {0}")]
    Storage(DatabaseError),
}

impl From<DatabaseError> for TopicError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Validation(msg) => TopicError::Validation(msg),
            DatabaseError::NotFound { id, .. } => TopicError::NotFound { id },
            other => TopicError::Storage(other),
        }
    }
}

impl TopicError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            TopicError::Validation(_) | TopicError::UnknownAction(_) => StatusCode::BAD_REQUEST,
            TopicError::NotFound { .. } => StatusCode::NOT_FOUND,
            TopicError::InvalidDate { .. } | TopicError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for TopicError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            TopicError::Storage(e) => {
                error!(error = %e, "Storage fault while handling request");
                "Error: the topic store is unavailable".to_string()
            }
            other => format!("Error: {other}"),
        };
        (status, body).into_response()
    }
}
