//! Error types for the crosscheck-link client library.

use thiserror::Error;

/// Errors that can occur in crosscheck-link operations.
#[derive(Error, Debug)]
pub enum CrossCheckLinkError {
    /// Invalid or missing client configuration (bad base URL, missing fields).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// WebSocket transport failure (handshake, send, or receive).
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// An operation exceeded its configured timeout.
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// HTTP transport failure from the underlying client.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The backend answered with a non-success status code.
    #[error("Server error ({status_code}): {message}")]
    ServerError {
        /// HTTP status code returned by the backend.
        status_code: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// Payload could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Authentication was rejected or is required but missing.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Internal invariant violation (channel closed, task died).
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type for crosscheck-link operations.
pub type Result<T> = std::result::Result<T, CrossCheckLinkError>;
