//! # Consensus Engine
//!
//! One engine per open discussion thread. The engine owns its transport and
//! registry; dropping it releases both.

use crate::config::EngineConfig;
use crate::domain::{EnginePhase, IngestOutcome};
use crate::error::EngineResult;
use crate::session::Session;
use ac_01_transport::{Connector, TransportAdapter, TransportError};
use ac_02_vote_tally::RoundCounts;
use ac_03_consensus::ConsensusEvaluator;
use parking_lot::Mutex;
use serde_json::Value;
use shared_bus::{Handler, ListenerId, SubscriberRegistry};
use shared_types::{ConnectionState, EventTag, RoundIndex, ThreadContext, Verdict, Vote};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

pub struct ConsensusEngine<C: Connector> {
    config: EngineConfig,
    session: Arc<Session>,
    registry: Arc<SubscriberRegistry>,
    transport: TransportAdapter<C>,
    vote_handler: Handler,
    terminal_handler: Handler,
    /// Forwards transport state changes to connection observers.
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Connector> ConsensusEngine<C> {
    /// # Errors
    ///
    /// [`EngineError::Config`](crate::EngineError::Config) when `config` fails validation.
    pub fn new(connector: C, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        let session = Arc::new(Session::new(
            config.decision_round,
            ConsensusEvaluator::new(config.quorum),
            config.dedup_capacity,
        ));
        let registry = Arc::new(SubscriberRegistry::new());
        let transport = TransportAdapter::new(connector, Arc::clone(&registry), config.reconnect);

        let vote_handler = {
            let session = Arc::clone(&session);
            Handler::new("engine-vote", move |tag, payload| {
                session.on_vote_event(tag, payload)
            })
        };
        let terminal_handler = {
            let session = Arc::clone(&session);
            Handler::new("engine-terminal-verdict", move |tag, payload| {
                session.on_terminal_event(tag, payload)
            })
        };

        Ok(Self {
            config,
            session,
            registry,
            transport,
            vote_handler,
            terminal_handler,
            forwarder: Mutex::new(None),
        })
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Open a session for `thread`.
    ///
    /// Resets all votes and verdicts, registers the event handlers and starts
    /// the transport in the background. Starting an active engine restarts
    /// the session.
    ///
    /// # Errors
    ///
    /// [`EngineError::Transport`](crate::EngineError::Transport) when no Tokio runtime is available; the
    /// engine is left idle.
    pub fn start(&self, thread: ThreadContext) -> EngineResult<()> {
        if self.session.phase().is_active() {
            info!("Engine already started; restarting session");
            self.stop();
        }

        let runtime = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;

        self.session.reset(Some(thread.clone()), EnginePhase::Listening);
        self.registry.subscribe(EventTag::AgentVote, &self.vote_handler);
        self.registry.subscribe(EventTag::BlockVerdict, &self.terminal_handler);

        if let Err(e) = self.transport.connect() {
            self.detach_handlers();
            self.session.reset(None, EnginePhase::Idle);
            return Err(e.into());
        }

        let mut states = self.transport.subscribe_state();
        let session = Arc::clone(&self.session);
        let forwarder = runtime.spawn(async move {
            loop {
                let state = *states.borrow_and_update();
                session.observers.connection.notify(&state);
                if states.changed().await.is_err() {
                    break;
                }
            }
        });
        if let Some(stale) = self.forwarder.lock().replace(forwarder) {
            stale.abort();
        }

        info!(
            chain_id = %thread.chain_id,
            thread_id = %thread.thread_id,
            endpoint = %self.config.endpoint,
            decision_round = self.config.decision_round,
            "Engine started"
        );
        Ok(())
    }

    /// Tear down the session: unregister handlers, close the transport and
    /// clear every vote. Safe to call at any time, including mid-reconnect.
    pub fn stop(&self) {
        let was_active = self.session.phase().is_active();

        self.detach_handlers();
        if let Some(forwarder) = self.forwarder.lock().take() {
            forwarder.abort();
        }
        self.transport.close();
        self.session.reset(None, EnginePhase::Idle);

        if was_active {
            self.session
                .observers
                .connection
                .notify(&ConnectionState::Disconnected);
            info!("Engine stopped");
        }
    }

    fn detach_handlers(&self) {
        self.registry.unsubscribe(&EventTag::AgentVote, &self.vote_handler);
        self.registry.unsubscribe(&EventTag::BlockVerdict, &self.terminal_handler);
    }

    /// Feed a vote directly, bypassing the transport.
    ///
    /// Same path inbound `AGENT_VOTE` events take.
    pub fn ingest(&self, vote: Vote) -> IngestOutcome {
        self.session.ingest(vote)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Latest decision-round verdict; `None` until that round has a vote.
    #[must_use]
    pub fn current_verdict(&self) -> Option<Verdict> {
        self.session.current_verdict()
    }

    /// Highest round seen; never decreases within a session.
    #[must_use]
    pub fn current_round(&self) -> RoundIndex {
        self.session.current_round()
    }

    /// Snapshot of a round's votes in arrival order.
    #[must_use]
    pub fn votes_for(&self, round: RoundIndex) -> Vec<Vote> {
        self.session.votes_for(round)
    }

    #[must_use]
    pub fn counts(&self, round: RoundIndex) -> RoundCounts {
        self.session.counts(round)
    }

    /// Accepted votes across all rounds of this session.
    #[must_use]
    pub fn total_votes(&self) -> usize {
        self.session.total_votes()
    }

    /// Out-of-band verdict payload, exactly as received.
    #[must_use]
    pub fn terminal_verdict(&self) -> Option<Value> {
        self.session.terminal_verdict()
    }

    #[must_use]
    pub fn phase(&self) -> EnginePhase {
        self.session.phase()
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// Watch channel over the transport's connection state.
    #[must_use]
    pub fn connection_updates(&self) -> watch::Receiver<ConnectionState> {
        self.transport.subscribe_state()
    }

    #[must_use]
    pub fn thread(&self) -> Option<ThreadContext> {
        self.session.thread()
    }

    #[must_use]
    pub fn decision_round(&self) -> RoundIndex {
        self.session.decision_round()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn transport(&self) -> &TransportAdapter<C> {
        &self.transport
    }

    /// Registry fed by this engine's transport. Other layers may subscribe
    /// their own handlers for any tag on the same connection.
    #[must_use]
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    // =========================================================================
    // OBSERVERS
    // =========================================================================
    //
    // Observers survive stop/start and run on the task delivering events.
    // They must not block.

    /// Called with every new decision-round verdict.
    pub fn on_verdict_changed<F>(&self, observer: F) -> ListenerId
    where
        F: Fn(&Verdict) + Send + Sync + 'static,
    {
        self.session.observers.verdict.add(observer)
    }

    /// Called with each out-of-band terminal verdict payload.
    pub fn on_terminal_verdict<F>(&self, observer: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.session.observers.terminal.add(observer)
    }

    /// Called whenever the current round moves forward.
    pub fn on_round_advanced<F>(&self, observer: F) -> ListenerId
    where
        F: Fn(&RoundIndex) + Send + Sync + 'static,
    {
        self.session.observers.round.add(observer)
    }

    /// Called with connection state changes, including `GivenUp`.
    pub fn on_connection_state<F>(&self, observer: F) -> ListenerId
    where
        F: Fn(&ConnectionState) + Send + Sync + 'static,
    {
        self.session.observers.connection.add(observer)
    }

    /// Returns `false` when `id` is not registered.
    pub fn remove_observer(&self, id: ListenerId) -> bool {
        self.session.observers.remove(id)
    }
}

impl<C: Connector> fmt::Debug for ConsensusEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsensusEngine")
            .field("endpoint", &self.config.endpoint)
            .field("phase", &self.phase())
            .field("connection", &self.connection_state())
            .field("current_round", &self.current_round())
            .finish()
    }
}

impl<C: Connector> Drop for ConsensusEngine<C> {
    fn drop(&mut self) {
        if let Some(forwarder) = self.forwarder.lock().take() {
            forwarder.abort();
        }
        self.detach_handlers();
        self.transport.close();
    }
}
