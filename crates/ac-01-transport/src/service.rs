//! # Transport Adapter
//!
//! Maintains one connection, decodes inbound frames and hands them to the
//! [`SubscriberRegistry`]. Connection loss triggers linear-backoff
//! reconnection until the attempt budget is spent.

use crate::config::ReconnectConfig;
use crate::error::{TransportError, TransportResult};
use crate::ports::{Connector, FrameSource};
use parking_lot::Mutex;
use shared_bus::SubscriberRegistry;
use shared_types::{ConnectionState, WireEvent};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Frame counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    pub dials: u64,
    pub frames_dispatched: u64,
    pub frames_dropped: u64,
}

/// Why a single open connection ended.
enum StreamEnd {
    Shutdown,
    Closed,
    Failed(TransportError),
}

struct Shared<C> {
    connector: C,
    registry: Arc<SubscriberRegistry>,
    config: ReconnectConfig,
    /// Cleared by `close()`; checked before every redial.
    wanted: AtomicBool,
    /// Bumped on every connect/close so a superseded task cannot publish.
    generation: AtomicU64,
    state_tx: watch::Sender<ConnectionState>,
    dials: AtomicU64,
    frames_dispatched: AtomicU64,
    frames_dropped: AtomicU64,
}

struct ConnectionTask {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

/// Owns the connection lifecycle for one connector.
pub struct TransportAdapter<C: Connector> {
    shared: Arc<Shared<C>>,
    task: Mutex<Option<ConnectionTask>>,
}

impl<C: Connector> TransportAdapter<C> {
    pub fn new(connector: C, registry: Arc<SubscriberRegistry>, config: ReconnectConfig) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                connector,
                registry,
                config,
                wanted: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                state_tx,
                dials: AtomicU64::new(0),
                frames_dispatched: AtomicU64::new(0),
                frames_dropped: AtomicU64::new(0),
            }),
            task: Mutex::new(None),
        }
    }

    /// Start connecting in the background.
    ///
    /// A no-op while a connection task is already running. After `close()`
    /// or `GivenUp` a fresh task starts with a zeroed attempt counter.
    ///
    /// # Errors
    ///
    /// [`TransportError::NoRuntime`] when called outside a Tokio runtime.
    pub fn connect(&self) -> TransportResult<()> {
        let runtime = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;

        let mut slot = self.task.lock();
        if let Some(task) = slot.as_ref() {
            let running = !task.handle.is_finished()
                && self.shared.wanted.load(Ordering::SeqCst)
                && self.state() != ConnectionState::GivenUp;
            if running {
                debug!("Connect requested while already connecting; ignoring");
                return Ok(());
            }
        }
        if let Some(stale) = slot.take() {
            stale.handle.abort();
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.wanted.store(true, Ordering::SeqCst);
        self.shared.state_tx.send_replace(ConnectionState::Connecting);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = runtime.spawn(connection_loop(
            Arc::clone(&self.shared),
            generation,
            shutdown_rx,
        ));
        *slot = Some(ConnectionTask {
            handle,
            shutdown_tx,
        });

        info!(
            endpoint = %self.shared.connector.endpoint(),
            generation,
            "Transport connecting"
        );
        Ok(())
    }

    /// Stop the connection and cancel any pending reconnect.
    pub fn close(&self) {
        self.shared.wanted.store(false, Ordering::SeqCst);
        self.shared.generation.fetch_add(1, Ordering::SeqCst);

        if let Some(task) = self.task.lock().take() {
            let _ = task.shutdown_tx.send(true);
            task.handle.abort();
            info!(endpoint = %self.shared.connector.endpoint(), "Transport closed");
        }
        self.shared
            .state_tx
            .send_replace(ConnectionState::Disconnected);
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state_tx.borrow()
    }

    /// Receiver that observes every state the adapter publishes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.shared.registry
    }

    #[must_use]
    pub fn config(&self) -> ReconnectConfig {
        self.shared.config
    }

    #[must_use]
    pub fn stats(&self) -> TransportStats {
        TransportStats {
            dials: self.shared.dials.load(Ordering::Relaxed),
            frames_dispatched: self.shared.frames_dispatched.load(Ordering::Relaxed),
            frames_dropped: self.shared.frames_dropped.load(Ordering::Relaxed),
        }
    }
}

impl<C: Connector> Drop for TransportAdapter<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C> Shared<C> {
    fn still_wanted(&self, generation: u64) -> bool {
        self.wanted.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Checked under the channel's write lock: `close()` clears the wanted
    /// flag before it publishes `Disconnected`, so a stale task can never
    /// overwrite it.
    fn publish(&self, generation: u64, state: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            if !self.still_wanted(generation) || *current == state {
                return false;
            }
            *current = state;
            true
        });
    }

    fn handle_frame(&self, generation: u64, text: &str) {
        if !self.still_wanted(generation) {
            return;
        }
        match WireEvent::decode(text) {
            Ok(event) => {
                let report = self.registry.dispatch(&event.tag, &event.payload);
                self.frames_dispatched.fetch_add(1, Ordering::Relaxed);
                debug!(
                    tag = %event.tag,
                    delivered = report.delivered,
                    failed = report.failed,
                    "Frame dispatched"
                );
            }
            Err(e) => {
                self.frames_dropped.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, len = text.len(), "Dropping malformed frame");
            }
        }
    }

    async fn pump(
        &self,
        generation: u64,
        source: &mut Box<dyn FrameSource>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> StreamEnd {
        loop {
            let next = tokio::select! {
                frame = source.next_frame() => frame,
                _ = shutdown.changed() => return StreamEnd::Shutdown,
            };
            match next {
                Some(Ok(text)) => self.handle_frame(generation, &text),
                Some(Err(e)) => return StreamEnd::Failed(e),
                None => return StreamEnd::Closed,
            }
        }
    }
}

async fn connection_loop<C: Connector>(
    shared: Arc<Shared<C>>,
    generation: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let endpoint = shared.connector.endpoint();
    let mut attempts: u32 = 0;

    loop {
        if !shared.still_wanted(generation) {
            return;
        }
        let dialing = if attempts == 0 {
            ConnectionState::Connecting
        } else {
            ConnectionState::Reconnecting
        };
        shared.publish(generation, dialing);
        shared.dials.fetch_add(1, Ordering::Relaxed);

        let dialed = tokio::select! {
            result = shared.connector.dial() => result,
            _ = shutdown.changed() => return,
        };

        match dialed {
            Ok(mut source) => {
                attempts = 0;
                shared.publish(generation, ConnectionState::Connected);
                info!(endpoint = %endpoint, "Connection open");

                match shared.pump(generation, &mut source, &mut shutdown).await {
                    StreamEnd::Shutdown => return,
                    StreamEnd::Closed => info!(endpoint = %endpoint, "Connection closed by peer"),
                    StreamEnd::Failed(e) => warn!(endpoint = %endpoint, error = %e, "Connection failed"),
                }
            }
            Err(e) => {
                warn!(endpoint = %endpoint, attempt = attempts, error = %e, "Dial failed");
            }
        }

        if !shared.still_wanted(generation) {
            return;
        }
        if attempts >= shared.config.max_attempts {
            warn!(
                endpoint = %endpoint,
                max_attempts = shared.config.max_attempts,
                "Reconnect attempts exhausted; giving up"
            );
            shared.publish(generation, ConnectionState::GivenUp);
            return;
        }

        attempts += 1;
        let delay = shared.config.delay_for(attempts);
        shared.publish(generation, ConnectionState::Reconnecting);
        info!(
            endpoint = %endpoint,
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            "Scheduling reconnect"
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => return,
        }
    }
}
