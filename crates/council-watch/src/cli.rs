//! Command-line flags.

use ac_04_engine::EngineConfig;
use anyhow::{Context, Result};
use clap::Parser;
use shared_types::ThreadContext;
use std::env;
use std::path::PathBuf;

const ENV_LOG_LEVEL: &str = "AC_LOG_LEVEL";
const ENV_JSON_LOGS: &str = "AC_JSON_LOGS";

/// Watch a validator discussion thread and log its verdict as it forms.
#[derive(Parser, Debug, Clone)]
#[command(name = "council-watch")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Real-time feed URL (overrides the config file and AC_WS_URL)
    #[arg(long)]
    pub ws_url: Option<String>,

    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Chain tag the thread belongs to
    #[arg(long, default_value = "default")]
    pub chain: String,

    /// Discussion thread identifier
    #[arg(long)]
    pub thread: String,

    /// Transaction under discussion
    #[arg(long)]
    pub tx_hash: Option<String>,

    /// Round whose votes decide the verdict
    #[arg(long)]
    pub decision_round: Option<u32>,

    /// Emit JSON log lines (also AC_JSON_LOGS=true)
    #[arg(long)]
    pub json_logs: bool,

    /// Log filter when RUST_LOG is unset (also AC_LOG_LEVEL)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Defaults, then `--config`, then `AC_*` variables, then flags.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed config file, unparsable environment values,
    /// or a configuration that fails validation.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => EngineConfig::default(),
        };

        config
            .apply_env()
            .context("Invalid AC_* environment variable")?;

        if let Some(url) = &self.ws_url {
            config.endpoint = url.clone();
        }
        if let Some(round) = self.decision_round {
            config.decision_round = round;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    #[must_use]
    pub fn thread_context(&self) -> ThreadContext {
        let thread = ThreadContext::new(self.chain.clone(), self.thread.clone());
        match &self.tx_hash {
            Some(hash) => thread.with_tx_hash(hash.clone()),
            None => thread,
        }
    }

    #[must_use]
    pub fn json_logs(&self) -> bool {
        self.json_logs
            || env::var(ENV_JSON_LOGS)
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false)
    }

    #[must_use]
    pub fn log_level(&self) -> String {
        self.log_level
            .clone()
            .or_else(|| env::var(ENV_LOG_LEVEL).ok())
            .unwrap_or_else(|| "info".to_string())
    }
}
