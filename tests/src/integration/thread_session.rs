//! # Thread Session Flows
//!
//! One discussion thread end to end:
//!
//! 1. **Verdict formation**: decision-round votes over the wire produce the
//!    quorum verdict
//! 2. **Redelivery**: replayed frames never change the outcome
//! 3. **Round pointer**: stray late votes never move the current round back
//! 4. **Isolation**: foreign handlers and bad frames cannot break the engine
//! 5. **Teardown**: stop/start leaves nothing behind

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use rand::seq::SliceRandom;
    use serde_json::json;

    use ac_01_transport::{MemoryConnector, MemoryLink};
    use ac_04_engine::{ConsensusEngine, EngineConfig, EnginePhase};
    use shared_bus::Handler;
    use shared_types::{ConnectionState, EventTag, ThreadContext, Verdict, Vote, WireEvent};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Harness {
        connector: MemoryConnector,
        engine: ConsensusEngine<MemoryConnector>,
    }

    impl Harness {
        fn new() -> Self {
            let connector = MemoryConnector::new();
            let engine =
                ConsensusEngine::new(connector.clone(), EngineConfig::default()).unwrap();
            Self { connector, engine }
        }

        /// Start the engine on a fresh link and wait until it is open.
        async fn open(&self, thread_id: &str) -> MemoryLink {
            let link = self.connector.accept_next();
            let mut updates = self.engine.connection_updates();
            self.engine
                .start(ThreadContext::new("chain-a", thread_id))
                .unwrap();
            updates
                .wait_for(|s| *s == ConnectionState::Connected)
                .await
                .unwrap();
            link
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    fn vote(id: &str, round: u32, approval: bool, ts: i64) -> Vote {
        Vote::new(id, round, approval, format!("{id} round {round}"), ts)
    }

    // =============================================================================
    // VERDICT FORMATION
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_two_of_three_accepted_over_the_wire() {
        let h = Harness::new();
        let verdicts = Arc::new(Mutex::new(Vec::<Verdict>::new()));
        {
            let verdicts = Arc::clone(&verdicts);
            h.engine
                .on_verdict_changed(move |v| verdicts.lock().push(v.clone()));
        }
        let link = h.open("t-accept").await;

        // earlier rounds do not produce verdicts
        link.send_vote(&vote("alice", 0, true, 1));
        link.send_vote(&vote("bob", 1, false, 2));
        settle().await;
        assert_eq!(h.engine.current_verdict(), None);
        assert_eq!(h.engine.phase(), EnginePhase::Tallying);

        link.send_vote(&vote("alice", 2, true, 3));
        link.send_vote(&vote("bob", 2, false, 4));
        link.send_vote(&vote("carol", 2, true, 5));
        settle().await;

        let verdict = h.engine.current_verdict().unwrap();
        assert!(verdict.accepted);
        assert_eq!((verdict.support_count, verdict.oppose_count), (2, 1));
        assert!(verdict.reason.contains("67%"));
        assert_eq!(h.engine.phase(), EnginePhase::Finalized);

        // one recomputation per decision-round vote
        let seen = verdicts.lock();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.last(), Some(&verdict));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_of_three_rejected_over_the_wire() {
        let h = Harness::new();
        let link = h.open("t-reject").await;

        link.send_vote(&vote("alice", 2, false, 1));
        link.send_vote(&vote("bob", 2, true, 2));
        link.send_vote(&vote("carol", 2, false, 3));
        settle().await;

        let verdict = h.engine.current_verdict().unwrap();
        assert!(!verdict.accepted);
        assert_eq!((verdict.support_count, verdict.oppose_count), (1, 2));
        assert!(verdict.reason.contains("33%"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_votes_after_verdict_are_kept() {
        let h = Harness::new();
        let link = h.open("t-late").await;

        link.send_vote(&vote("alice", 2, true, 1));
        link.send_vote(&vote("dave", 3, false, 2));
        settle().await;

        assert_eq!(h.engine.current_round(), 3);
        assert_eq!(h.engine.votes_for(3).len(), 1);
        // round 3 never touches the decision-round verdict
        assert_eq!(h.engine.current_verdict().unwrap().total(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_string_timestamps_normalized() {
        let h = Harness::new();
        let link = h.open("t-strings").await;

        link.send_text(
            json!({
                "type": "AGENT_VOTE",
                "payload": {
                    "validatorId": "agent-1",
                    "validatorName": "Sentinel",
                    "message": "approve",
                    "timestamp": "1700000000123",
                    "type": "support",
                    "round": 2,
                    "approval": true
                }
            })
            .to_string(),
        );
        settle().await;

        let votes = h.engine.votes_for(2);
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].timestamp, 1_700_000_000_123);
        assert_eq!(votes[0].validator_name.as_deref(), Some("Sentinel"));
    }

    // =============================================================================
    // REDELIVERY
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_shuffled_redelivery_matches_single_delivery() {
        let votes: Vec<Vote> = (0..9)
            .map(|i| vote(&format!("v{i}"), 2, i % 3 != 0, 100 + i64::from(i)))
            .collect();

        let reference = Harness::new();
        let link = reference.open("t-ref").await;
        for v in &votes {
            link.send_vote(v);
        }
        settle().await;
        let expected = reference.engine.current_verdict().unwrap();

        let mut rng = rand::thread_rng();
        for _ in 0..5 {
            let mut replay: Vec<Vote> = votes.iter().chain(votes.iter()).cloned().collect();
            replay.shuffle(&mut rng);

            let h = Harness::new();
            let link = h.open("t-replay").await;
            for v in &replay {
                link.send_vote(v);
            }
            settle().await;

            let verdict = h.engine.current_verdict().unwrap();
            assert_eq!(verdict.support_count, expected.support_count);
            assert_eq!(verdict.oppose_count, expected.oppose_count);
            assert_eq!(verdict.accepted, expected.accepted);
            assert_eq!(h.engine.votes_for(2).len(), votes.len());
        }
    }

    // =============================================================================
    // ROUND POINTER
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_round_pointer_never_decreases() {
        let h = Harness::new();
        let rounds = Arc::new(Mutex::new(Vec::new()));
        {
            let rounds = Arc::clone(&rounds);
            h.engine.on_round_advanced(move |r| rounds.lock().push(*r));
        }
        let link = h.open("t-rounds").await;

        let mut observed = Vec::new();
        for (ts, round) in (0i64..).zip([0u32, 1, 2, 1, 0, 2]) {
            link.send_vote(&vote("v", round, true, ts));
            settle().await;
            observed.push(h.engine.current_round());
        }

        assert_eq!(observed, vec![0, 1, 2, 2, 2, 2]);
        assert_eq!(*rounds.lock(), vec![1, 2]);
        assert_eq!(h.engine.votes_for(1).len(), 2);
    }

    // =============================================================================
    // ISOLATION
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_foreign_handlers_cannot_break_the_engine() {
        let h = Harness::new();
        h.engine.registry().subscribe(
            EventTag::AgentVote,
            &Handler::new("panicky-ui", |_, _| panic!("render failed")),
        );
        let registrations = Arc::new(Mutex::new(0));
        {
            let registrations = Arc::clone(&registrations);
            h.engine.registry().subscribe(
                EventTag::AgentRegistered,
                &Handler::new("roster", move |_, _| {
                    *registrations.lock() += 1;
                    Ok(())
                }),
            );
        }
        let link = h.open("t-isolation").await;

        link.send_text("definitely not json");
        link.send_text(r#"{"type": 42}"#);
        link.send_text(r#"{"type":"AGENT_VOTE","payload":{"validatorId":""}}"#);
        link.send_event(&WireEvent::new(
            EventTag::AgentRegistered,
            json!({"validatorId": "v7"}),
        ));
        link.send_vote(&vote("alice", 2, true, 1));
        settle().await;

        assert_eq!(h.engine.connection_state(), ConnectionState::Connected);
        assert_eq!(*registrations.lock(), 1);
        assert_eq!(h.engine.votes_for(2).len(), 1);
        assert_eq!(h.engine.transport().stats().frames_dropped, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_verdict_does_not_override_quorum() {
        let h = Harness::new();
        let link = h.open("t-terminal").await;

        link.send_vote(&vote("alice", 2, true, 1));
        let payload = json!({"verdict": "REJECT", "by": "external-finalizer"});
        link.send_event(&WireEvent::new(EventTag::BlockVerdict, payload.clone()));
        settle().await;

        assert_eq!(h.engine.terminal_verdict(), Some(payload));
        assert!(h.engine.current_verdict().unwrap().accepted);
    }

    // =============================================================================
    // TEARDOWN
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_stop_start_leaves_no_residue() {
        let h = Harness::new();
        let link = h.open("t-first").await;
        link.send_vote(&vote("alice", 2, true, 1));
        link.send_vote(&vote("bob", 3, true, 2));
        settle().await;
        assert_eq!(h.engine.total_votes(), 2);

        h.engine.stop();
        // frames on the old link no longer reach anything
        link.send_vote(&vote("carol", 2, true, 3));
        settle().await;

        let second = h.open("t-second").await;
        assert_eq!(h.engine.current_round(), 0);
        assert_eq!(h.engine.total_votes(), 0);
        assert_eq!(h.engine.current_verdict(), None);

        // the same vote is new to the fresh session
        second.send_vote(&vote("alice", 2, true, 1));
        settle().await;
        assert_eq!(h.engine.votes_for(2).len(), 1);
        assert_eq!(h.engine.thread().unwrap().thread_id, "t-second");
    }
}
