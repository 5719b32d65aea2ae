//! Session runner: attaches logging observers and drives one engine until it
//! is interrupted or the transport gives up.

use ac_01_transport::Connector;
use ac_04_engine::{ConsensusEngine, EngineError};
use shared_bus::ListenerId;
use shared_types::{ConnectionState, RoundIndex, ThreadContext, Verdict};
use std::future::Future;
use tracing::{info, warn};

/// Why the watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    Interrupted,
    GaveUp,
}

/// Engine state captured just before teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSummary {
    pub exit: WatchExit,
    pub verdict: Option<Verdict>,
    pub current_round: RoundIndex,
    pub total_votes: usize,
}

/// Log every round advance, verdict, terminal verdict and connection change.
pub fn attach_log_observers<C: Connector>(engine: &ConsensusEngine<C>) -> Vec<ListenerId> {
    vec![
        engine.on_round_advanced(|round| info!(round = *round, "Discussion advanced")),
        engine.on_verdict_changed(|verdict| {
            info!(
                support = verdict.support_count,
                oppose = verdict.oppose_count,
                accepted = verdict.accepted,
                reason = %verdict.reason,
                "Verdict"
            );
        }),
        engine.on_terminal_verdict(|payload| info!(payload = %payload, "Terminal verdict")),
        engine.on_connection_state(|state| match state {
            ConnectionState::GivenUp => warn!(state = %state, "Connection abandoned"),
            _ => info!(state = %state, "Connection"),
        }),
    ]
}

/// Start `thread` and block until `shutdown` resolves or the connection
/// reaches `GivenUp`. The engine is stopped before returning.
///
/// # Errors
///
/// Propagates [`EngineError`] from `start`.
pub async fn run_until<C, F>(
    engine: &ConsensusEngine<C>,
    thread: ThreadContext,
    shutdown: F,
) -> Result<WatchSummary, EngineError>
where
    C: Connector,
    F: Future<Output = ()>,
{
    let mut updates = engine.connection_updates();
    engine.start(thread)?;

    let exit = tokio::select! {
        () = shutdown => WatchExit::Interrupted,
        _ = updates.wait_for(|state| *state == ConnectionState::GivenUp) => WatchExit::GaveUp,
    };

    let summary = WatchSummary {
        exit,
        verdict: engine.current_verdict(),
        current_round: engine.current_round(),
        total_votes: engine.total_votes(),
    };
    info!(
        exit = ?summary.exit,
        round = summary.current_round,
        votes = summary.total_votes,
        accepted = summary.verdict.as_ref().map(|v| v.accepted),
        "Watch finished"
    );

    engine.stop();
    Ok(summary)
}
