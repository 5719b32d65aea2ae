//! # Error Types
//!
//! Errors raised while decoding inbound frames and vote payloads.

use thiserror::Error;

/// Errors that can occur while decoding wire data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Frame is not valid JSON.
    #[error("Malformed frame: {0}")]
    MalformedJson(String),

    /// Frame is JSON but not an object.
    #[error("Frame is not a JSON object")]
    NotAnObject,

    /// Frame has no string `type` field.
    #[error("Frame is missing the `type` tag")]
    MissingType,

    /// Payload does not match the canonical vote schema.
    #[error("Invalid vote payload: {0}")]
    InvalidVote(String),

    /// A vote field failed normalization.
    #[error("Invalid vote field `{field}`: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}
