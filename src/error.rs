//! Error types for DocChat
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for DocChat operations
///
/// Covers configuration loading, backend API failures, authentication,
/// local validation, and local state persistence.
#[derive(Error, Debug)]
pub enum DocchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend answered with a non-success status
    #[error("API error ({status}): {detail}")]
    Api {
        /// HTTP status code returned by the backend
        status: u16,
        /// The backend's `detail` message, or the status reason
        detail: String,
    },

    /// The stored token was rejected by the backend (HTTP 401)
    #[error("Session expired. Please login again.")]
    SessionExpired,

    /// Authentication errors (missing token, bad credentials)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The current user lacks the role required for a route
    #[error("Not authorized: {0}")]
    Forbidden(String),

    /// Client-side input validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// A send is already in flight for this chat view
    #[error("A message is already being sent; wait for the answer first")]
    Busy,

    /// A referenced entity does not exist locally
    #[error("Not found: {0}")]
    NotFound(String),

    /// Local state file errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl DocchatError {
    /// Returns `true` when the error means the stored token is no longer valid.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, DocchatError::SessionExpired)
    }
}

/// Returns `true` if `err` is a [`DocchatError::SessionExpired`].
pub fn is_session_expired(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DocchatError>()
        .map(DocchatError::is_session_expired)
        .unwrap_or(false)
}

/// Result type alias for DocChat operations
///
/// Uses `anyhow::Error` so command handlers can attach context while
/// domain code returns [`DocchatError`] values.
pub type Result<T> = anyhow::Result<T>;
