//! Per-thread session state and the ingestion path.
//!
//! Everything here is synchronous; the facade wires it to the transport.
//! Observers are always notified after the state lock is released, so an
//! observer may query or stop the engine.

use crate::domain::{EnginePhase, IngestOutcome};
use ac_02_vote_tally::{RoundCounts, RoundTally, VoteDeduplicator};
use ac_03_consensus::ConsensusEvaluator;
use parking_lot::Mutex;
use serde_json::Value;
use shared_bus::{HandlerError, ListenerId, ListenerSet};
use shared_types::{
    decode_vote, ConnectionState, EventTag, RoundIndex, ThreadContext, Verdict, Vote,
};
use tracing::{debug, info};

pub(crate) struct Observers {
    pub verdict: ListenerSet<Verdict>,
    pub terminal: ListenerSet<Value>,
    pub round: ListenerSet<RoundIndex>,
    pub connection: ListenerSet<ConnectionState>,
}

impl Observers {
    fn new() -> Self {
        Self {
            verdict: ListenerSet::new("verdict"),
            terminal: ListenerSet::new("terminal-verdict"),
            round: ListenerSet::new("round"),
            connection: ListenerSet::new("connection-state"),
        }
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        self.verdict.remove(id)
            | self.terminal.remove(id)
            | self.round.remove(id)
            | self.connection.remove(id)
    }
}

struct SessionState {
    phase: EnginePhase,
    thread: Option<ThreadContext>,
    dedup: VoteDeduplicator,
    tally: RoundTally,
    verdict: Option<Verdict>,
    terminal: Option<Value>,
}

pub(crate) struct Session {
    decision_round: RoundIndex,
    evaluator: ConsensusEvaluator,
    dedup_capacity: Option<usize>,
    state: Mutex<SessionState>,
    pub observers: Observers,
}

impl Session {
    pub fn new(
        decision_round: RoundIndex,
        evaluator: ConsensusEvaluator,
        dedup_capacity: Option<usize>,
    ) -> Self {
        Self {
            decision_round,
            evaluator,
            dedup_capacity,
            state: Mutex::new(SessionState {
                phase: EnginePhase::Idle,
                thread: None,
                dedup: Self::fresh_dedup(dedup_capacity),
                tally: RoundTally::new(),
                verdict: None,
                terminal: None,
            }),
            observers: Observers::new(),
        }
    }

    fn fresh_dedup(capacity: Option<usize>) -> VoteDeduplicator {
        capacity.map_or_else(VoteDeduplicator::new, VoteDeduplicator::with_capacity)
    }

    /// Clear all votes and verdicts, then enter `phase`.
    pub fn reset(&self, thread: Option<ThreadContext>, phase: EnginePhase) {
        let mut state = self.state.lock();
        state.phase = phase;
        state.thread = thread;
        state.dedup = Self::fresh_dedup(self.dedup_capacity);
        state.tally.clear();
        state.verdict = None;
        state.terminal = None;
    }

    /// Deduplicate, tally, and re-evaluate when the vote lands in the
    /// decision round.
    pub fn ingest(&self, vote: Vote) -> IngestOutcome {
        let (outcome, advanced_to, fresh_verdict) = {
            let mut state = self.state.lock();
            if state.phase == EnginePhase::Idle {
                return IngestOutcome::Ignored;
            }
            if !state.dedup.accept(&vote) {
                return IngestOutcome::Duplicate;
            }

            debug!(
                validator_id = %vote.validator_id,
                round = vote.round,
                approval = vote.approval,
                "Vote recorded"
            );
            let record = state.tally.record(vote);
            if state.phase == EnginePhase::Listening {
                state.phase = EnginePhase::Tallying;
            }

            let mut fresh_verdict = None;
            if record.round == self.decision_round {
                let verdict = self
                    .evaluator
                    .evaluate(state.tally.round_slice(self.decision_round));
                if let Some(verdict) = verdict {
                    if state.verdict.as_ref() != Some(&verdict) {
                        fresh_verdict = Some(verdict.clone());
                    }
                    state.verdict = Some(verdict);
                    state.phase = EnginePhase::Finalized;
                }
            }

            let outcome = IngestOutcome::Recorded {
                round: record.round,
                verdict_changed: fresh_verdict.is_some(),
            };
            (outcome, record.advanced.then_some(record.round), fresh_verdict)
        };

        if let Some(round) = advanced_to {
            self.observers.round.notify(&round);
        }
        if let Some(verdict) = fresh_verdict {
            info!(
                support = verdict.support_count,
                oppose = verdict.oppose_count,
                accepted = verdict.accepted,
                reason = %verdict.reason,
                "Verdict updated"
            );
            self.observers.verdict.notify(&verdict);
        }
        outcome
    }

    /// Store an out-of-band terminal verdict as received.
    pub fn record_terminal(&self, payload: &Value) -> bool {
        {
            let mut state = self.state.lock();
            if state.phase == EnginePhase::Idle {
                return false;
            }
            state.terminal = Some(payload.clone());
        }
        info!("Terminal verdict received");
        self.observers.terminal.notify(payload);
        true
    }

    /// Registry callback for `AGENT_VOTE`.
    pub fn on_vote_event(&self, tag: &EventTag, payload: &Value) -> Result<(), HandlerError> {
        let vote = decode_vote(payload)
            .map_err(|e| HandlerError::Rejected(format!("{tag} payload: {e}")))?;
        self.ingest(vote);
        Ok(())
    }

    /// Registry callback for `BLOCK_VERDICT`.
    pub fn on_terminal_event(&self, _tag: &EventTag, payload: &Value) -> Result<(), HandlerError> {
        self.record_terminal(payload);
        Ok(())
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn decision_round(&self) -> RoundIndex {
        self.decision_round
    }

    pub fn phase(&self) -> EnginePhase {
        self.state.lock().phase
    }

    pub fn thread(&self) -> Option<ThreadContext> {
        self.state.lock().thread.clone()
    }

    pub fn current_verdict(&self) -> Option<Verdict> {
        self.state.lock().verdict.clone()
    }

    pub fn terminal_verdict(&self) -> Option<Value> {
        self.state.lock().terminal.clone()
    }

    pub fn current_round(&self) -> RoundIndex {
        self.state.lock().tally.current_round()
    }

    pub fn votes_for(&self, round: RoundIndex) -> Vec<Vote> {
        self.state.lock().tally.votes_in_round(round)
    }

    pub fn counts(&self, round: RoundIndex) -> RoundCounts {
        self.state.lock().tally.counts(round)
    }

    pub fn total_votes(&self) -> usize {
        self.state.lock().tally.total_votes()
    }
}
