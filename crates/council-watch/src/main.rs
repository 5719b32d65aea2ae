//! # council-watch
//!
//! Headless viewer for one validator discussion thread.
//!
//! ## Usage
//!
//! ```bash
//! # Local broadcaster (default ws://localhost:3000/ws)
//! council-watch --thread 7f3c
//!
//! # Remote feed, JSON logs, custom decision round
//! council-watch --ws-url wss://council.example/ws --thread 7f3c \
//!     --decision-round 3 --json-logs
//! ```
//!
//! Exits non-zero when the transport gives up reconnecting.

use ac_01_transport::WsConnector;
use ac_04_engine::ConsensusEngine;
use anyhow::{bail, Context, Result};
use clap::Parser;
use council_watch::{attach_log_observers, logging, run_until, Args, WatchExit};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing(args.json_logs(), &args.log_level())?;

    let config = args.engine_config()?;
    let thread = args.thread_context();
    let session_id = Uuid::new_v4();

    let span = info_span!("watch", session = %session_id, thread_id = %thread.thread_id);
    async move {
        info!(endpoint = %config.endpoint, chain_id = %thread.chain_id, "council-watch starting");

        let engine = ConsensusEngine::new(WsConnector::new(config.endpoint.clone()), config)
            .context("Failed to build engine")?;
        attach_log_observers(&engine);

        info!("Watching. Press Ctrl+C to stop.");
        let summary = run_until(&engine, thread, wait_for_ctrl_c())
            .await
            .context("Failed to start engine")?;

        if summary.exit == WatchExit::GaveUp {
            bail!("Transport gave up reconnecting to the feed");
        }
        Ok::<(), anyhow::Error>(())
    }
    .instrument(span)
    .await
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl+C handler unavailable; running until the feed gives up");
        std::future::pending::<()>().await;
    }
}
