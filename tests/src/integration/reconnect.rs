//! # Reconnect Flows
//!
//! Connection loss in the middle of a discussion:
//!
//! - votes survive a reconnect and replayed frames are absorbed by dedup
//! - retry delays grow linearly from the configured base
//! - exhaustion is surfaced as `GivenUp` to observers
//! - `stop` during a backoff wait cancels the pending dial

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use ac_01_transport::{MemoryConnector, ReconnectConfig};
    use ac_04_engine::{ConsensusEngine, EngineConfig};
    use shared_types::{ConnectionState, ThreadContext, Vote};

    fn engine_with(
        connector: &MemoryConnector,
        reconnect: ReconnectConfig,
    ) -> ConsensusEngine<MemoryConnector> {
        let config = EngineConfig {
            reconnect,
            ..EngineConfig::default()
        };
        ConsensusEngine::new(connector.clone(), config).unwrap()
    }

    fn thread() -> ThreadContext {
        ThreadContext::new("chain-a", "t-reconnect")
    }

    fn millis_since(origin: tokio::time::Instant, times: &[tokio::time::Instant]) -> Vec<u128> {
        times.iter().map(|t| (*t - origin).as_millis()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_votes_survive_reconnect_without_duplicates() {
        let connector = MemoryConnector::new();
        let first = connector.accept_next();
        let second = connector.accept_next();
        let engine = engine_with(&connector, ReconnectConfig::default());

        let mut updates = engine.connection_updates();
        engine.start(thread()).unwrap();
        updates
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();

        let alice = Vote::new("alice", 2, true, "ship it", 10);
        let bob = Vote::new("bob", 2, false, "not yet", 11);
        first.send_vote(&alice);
        first.send_vote(&bob);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(engine.total_votes(), 2);

        first.close();
        updates
            .wait_for(|s| *s == ConnectionState::Reconnecting)
            .await
            .unwrap();
        // state is kept while the link is down
        assert_eq!(engine.total_votes(), 2);

        updates
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();

        // the server replays its backlog on the new link
        second.send_vote(&alice);
        second.send_vote(&bob);
        second.send_vote(&Vote::new("carol", 2, true, "agree", 12));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(engine.total_votes(), 3);
        let verdict = engine.current_verdict().unwrap();
        assert_eq!((verdict.support_count, verdict.oppose_count), (2, 1));
        assert!(verdict.accepted);
        assert_eq!(connector.dial_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_linear_in_attempt() {
        let connector = MemoryConnector::new();
        connector.refuse_next("feed offline");
        connector.refuse_next("feed offline");
        connector.refuse_next("feed offline");
        let link = connector.accept_next();
        let engine = engine_with(&connector, ReconnectConfig::new(200, 5));

        let origin = tokio::time::Instant::now();
        let mut updates = engine.connection_updates();
        engine.start(thread()).unwrap();
        updates
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();

        // 0, +200, +400, +600
        assert_eq!(
            millis_since(origin, &connector.dial_times()),
            vec![0, 200, 600, 1200]
        );

        link.send_vote(&Vote::new("alice", 2, true, "", 1));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(engine.total_votes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reaches_observers() {
        let connector = MemoryConnector::new();
        let link = connector.accept_next();
        let engine = engine_with(&connector, ReconnectConfig::new(100, 2));

        let states = Arc::new(Mutex::new(Vec::new()));
        {
            let states = Arc::clone(&states);
            engine.on_connection_state(move |s| states.lock().push(*s));
        }

        let mut updates = engine.connection_updates();
        engine.start(thread()).unwrap();
        updates
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();
        link.send_vote(&Vote::new("alice", 2, true, "", 1));
        tokio::time::sleep(Duration::from_millis(10)).await;
        link.close();

        updates
            .wait_for(|s| *s == ConnectionState::GivenUp)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // one good dial, then two refused retries
        assert_eq!(connector.dial_count(), 3);
        assert_eq!(states.lock().last(), Some(&ConnectionState::GivenUp));
        // tallied state outlives the connection
        assert_eq!(engine.total_votes(), 1);
        assert!(engine.current_verdict().unwrap().accepted);

        // no further dials once given up
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(connector.dial_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_backoff_cancels_dial() {
        let connector = MemoryConnector::new();
        connector.refuse_next("feed offline");
        let engine = engine_with(&connector, ReconnectConfig::new(1_000, 5));

        let mut updates = engine.connection_updates();
        engine.start(thread()).unwrap();
        updates
            .wait_for(|s| *s == ConnectionState::Reconnecting)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        engine.stop();
        assert_eq!(engine.connection_state(), ConnectionState::Disconnected);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(connector.dial_count(), 1);
        assert_eq!(engine.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_giving_up() {
        let connector = MemoryConnector::new();
        let engine = engine_with(&connector, ReconnectConfig::new(50, 1));

        let mut updates = engine.connection_updates();
        engine.start(thread()).unwrap();
        updates
            .wait_for(|s| *s == ConnectionState::GivenUp)
            .await
            .unwrap();
        assert_eq!(connector.dial_count(), 2);

        let link = connector.accept_next();
        engine.start(thread()).unwrap();
        updates
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();

        link.send_vote(&Vote::new("bob", 2, false, "", 1));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!engine.current_verdict().unwrap().accepted);
    }
}
