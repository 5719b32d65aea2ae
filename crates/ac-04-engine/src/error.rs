//! Error types for the engine facade.

use crate::config::ConfigError;
use ac_01_transport::TransportError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
