//! # In-Memory Connector
//!
//! Each dial consumes one scripted outcome: either an open link driven by a
//! [`MemoryLink`] handle, or a refusal. With nothing scripted, dials are
//! refused. Dropping the [`MemoryLink`] closes the connection once buffered
//! frames are drained.

use crate::error::{TransportError, TransportResult};
use crate::ports::{Connector, FrameSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Vote, WireEvent};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

const MEMORY_ENDPOINT: &str = "memory://scripted";

#[derive(Debug)]
enum LinkFrame {
    Text(String),
    Fail(String),
}

enum Scripted {
    Accept(mpsc::UnboundedReceiver<LinkFrame>),
    Refuse(String),
}

#[derive(Default)]
struct Script {
    outcomes: VecDeque<Scripted>,
    dial_times: Vec<Instant>,
}

/// Connector whose dial outcomes are queued by the test.
///
/// Clones share the same script, so a test can hand one clone to the engine
/// and keep driving the other.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    script: Arc<Mutex<Script>>,
}

impl MemoryConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful dial and return the handle that feeds it.
    pub fn accept_next(&self) -> MemoryLink {
        let (tx, rx) = mpsc::unbounded_channel();
        self.script.lock().outcomes.push_back(Scripted::Accept(rx));
        MemoryLink { tx }
    }

    /// Queue a refused dial.
    pub fn refuse_next(&self, reason: impl Into<String>) {
        self.script
            .lock()
            .outcomes
            .push_back(Scripted::Refuse(reason.into()));
    }

    #[must_use]
    pub fn dial_count(&self) -> usize {
        self.script.lock().dial_times.len()
    }

    /// Tokio instants of every dial so far (respects a paused clock).
    #[must_use]
    pub fn dial_times(&self) -> Vec<Instant> {
        self.script.lock().dial_times.clone()
    }

    #[must_use]
    pub fn pending_outcomes(&self) -> usize {
        self.script.lock().outcomes.len()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn dial(&self) -> TransportResult<Box<dyn FrameSource>> {
        let outcome = {
            let mut script = self.script.lock();
            script.dial_times.push(Instant::now());
            script.outcomes.pop_front()
        };

        match outcome {
            Some(Scripted::Accept(rx)) => Ok(Box::new(MemorySource { rx })),
            Some(Scripted::Refuse(reason)) => Err(TransportError::Dial {
                endpoint: MEMORY_ENDPOINT.to_string(),
                reason,
            }),
            None => Err(TransportError::Dial {
                endpoint: MEMORY_ENDPOINT.to_string(),
                reason: "no scripted link".to_string(),
            }),
        }
    }

    fn endpoint(&self) -> String {
        MEMORY_ENDPOINT.to_string()
    }
}

/// Server side of one scripted link.
#[derive(Debug, Clone)]
pub struct MemoryLink {
    tx: mpsc::UnboundedSender<LinkFrame>,
}

impl MemoryLink {
    /// Push a raw text frame. Returns `false` once the connection is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.tx.send(LinkFrame::Text(text.into())).is_ok()
    }

    pub fn send_event(&self, event: &WireEvent) -> bool {
        self.send_text(event.encode())
    }

    pub fn send_vote(&self, vote: &Vote) -> bool {
        self.send_event(&WireEvent::vote(vote))
    }

    /// Fail the connection with a stream error.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.tx.send(LinkFrame::Fail(reason.into())).is_ok()
    }

    /// Close from the server side after buffered frames are delivered.
    pub fn close(self) {}

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

struct MemorySource {
    rx: mpsc::UnboundedReceiver<LinkFrame>,
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn next_frame(&mut self) -> Option<TransportResult<String>> {
        match self.rx.recv().await? {
            LinkFrame::Text(text) => Some(Ok(text)),
            LinkFrame::Fail(reason) => Some(Err(TransportError::Stream(reason))),
        }
    }
}
