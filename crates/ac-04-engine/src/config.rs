//! Engine configuration.
//!
//! Sources, lowest precedence first: defaults, TOML file, environment.
//! Command-line overrides are applied by the binary on top.
//!
//! ```toml
//! endpoint = "ws://localhost:3000/ws"
//! decision_round = 2
//! dedup_capacity = 10000
//!
//! [quorum]
//! numerator = 2
//! denominator = 3
//!
//! [reconnect]
//! base_delay_ms = 1000
//! max_attempts = 5
//! ```

use ac_01_transport::ReconnectConfig;
use ac_03_consensus::{PolicyError, QuorumPolicy};
use serde::{Deserialize, Serialize};
use shared_types::RoundIndex;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:3000/ws";
pub const DEFAULT_DECISION_ROUND: RoundIndex = 2;

pub const ENV_WS_URL: &str = "AC_WS_URL";
pub const ENV_DECISION_ROUND: &str = "AC_DECISION_ROUND";
pub const ENV_RECONNECT_BASE_DELAY_MS: &str = "AC_RECONNECT_BASE_DELAY_MS";
pub const ENV_RECONNECT_MAX_ATTEMPTS: &str = "AC_RECONNECT_MAX_ATTEMPTS";
pub const ENV_DEDUP_CAPACITY: &str = "AC_DEDUP_CAPACITY";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value {value:?} for {key}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Endpoint must not be empty")]
    EmptyEndpoint,

    #[error("Invalid quorum policy: {0}")]
    Quorum(#[from] PolicyError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Real-time feed URL.
    pub endpoint: String,
    /// Round whose vote set drives the verdict.
    pub decision_round: RoundIndex,
    pub quorum: QuorumPolicy,
    pub reconnect: ReconnectConfig,
    /// Bound on remembered vote keys; unbounded when `None`.
    pub dedup_capacity: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            decision_round: DEFAULT_DECISION_ROUND,
            quorum: QuorumPolicy::default(),
            reconnect: ReconnectConfig::default(),
            dedup_capacity: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by the environment.
    ///
    /// # Environment Variables
    ///
    /// - `AC_WS_URL`: feed endpoint (default: ws://localhost:3000/ws)
    /// - `AC_DECISION_ROUND`: decision round (default: 2)
    /// - `AC_RECONNECT_BASE_DELAY_MS`: backoff unit (default: 1000)
    /// - `AC_RECONNECT_MAX_ATTEMPTS`: reconnect budget (default: 5)
    /// - `AC_DEDUP_CAPACITY`: dedup bound (default: unbounded)
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnv`] when a set variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse from a TOML string.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed TOML or mistyped values.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Override fields from process environment variables.
    ///
    /// # Errors
    ///
    /// See [`EngineConfig::from_env`].
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| env::var(key).ok())
    }

    /// Override fields from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`EngineConfig::from_env`].
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_WS_URL) {
            self.endpoint = url;
        }
        if let Some(round) = parse_var(&lookup, ENV_DECISION_ROUND)? {
            self.decision_round = round;
        }
        if let Some(delay) = parse_var(&lookup, ENV_RECONNECT_BASE_DELAY_MS)? {
            self.reconnect.base_delay_ms = delay;
        }
        if let Some(attempts) = parse_var(&lookup, ENV_RECONNECT_MAX_ATTEMPTS)? {
            self.reconnect.max_attempts = attempts;
        }
        if let Some(capacity) = parse_var(&lookup, ENV_DEDUP_CAPACITY)? {
            self.dedup_capacity = Some(capacity);
        }
        Ok(())
    }

    /// Reject values the engine cannot run with.
    ///
    /// `reconnect.max_attempts == 0` is valid and disables reconnection.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyEndpoint`] or [`ConfigError::Quorum`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        self.quorum.validate()?;
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value }),
    }
}
