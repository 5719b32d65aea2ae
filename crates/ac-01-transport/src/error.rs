//! Error types for the transport subsystem.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Dial to {endpoint} failed: {reason}")]
    Dial { endpoint: String, reason: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("No Tokio runtime available to drive the connection")]
    NoRuntime,
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
