//! Error types for the Formgate Server
//!
//! This module contains the error types used throughout the server.

use formgate_session_store::SessionStoreError;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Required submission identifiers missing from the request
    #[error("session_id or flow_id or transaction_id not found in submission url")]
    MissingIdentifiers,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Session document missing for an operation that requires one
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Session store error
    #[error("Session store error: {0}")]
    StoreError(String),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Catalog document parsing error
    #[error("Catalog parse error: {0}")]
    CatalogParseError(#[from] serde_yaml::Error),

    /// Downstream notification error
    #[error("Notification error: {0}")]
    NotificationError(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

// Implement conversions from other error types
impl From<SessionStoreError> for ServerError {
    fn from(err: SessionStoreError) -> Self {
        ServerError::StoreError(format!("{}", err))
    }
}

impl From<reqwest::Error> for ServerError {
    fn from(err: reqwest::Error) -> Self {
        ServerError::NotificationError(format!("HTTP request error: {}", err))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::InternalError(format!("IO error: {}", err))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::InternalError(format!("Error: {}", err))
    }
}

impl ServerError {
    /// Check if the error is a client-facing not-found
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServerError::NotFound(_))
    }

    /// Check if the error is the missing-identifiers validation failure
    pub fn is_missing_identifiers(&self) -> bool {
        matches!(self, ServerError::MissingIdentifiers)
    }
}
