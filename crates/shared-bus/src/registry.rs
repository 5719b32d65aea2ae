//! # Subscriber Registry
//!
//! Maps event tags to handler sets. Mutation is serialized against
//! dispatch snapshots by a single `RwLock`; no handler ever runs while the
//! lock is held.

use crate::handler::Handler;
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::EventTag;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

impl DispatchReport {
    /// Total handlers invoked.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Tag-keyed handler sets with snapshot dispatch.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    handlers: RwLock<HashMap<EventTag, Vec<Handler>>>,
}

impl SubscriberRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `tag`.
    ///
    /// Returns `false` if that handler was already registered for the tag.
    pub fn subscribe(&self, tag: EventTag, handler: &Handler) -> bool {
        let mut handlers = self.handlers.write();
        let set = handlers.entry(tag.clone()).or_default();
        if set.iter().any(|h| h.id() == handler.id()) {
            debug!(%tag, handler = %handler.id(), "Handler already subscribed");
            return false;
        }
        set.push(handler.clone());
        debug!(%tag, handler = %handler.id(), name = handler.name(), "Handler subscribed");
        true
    }

    /// Remove `handler` from `tag`.
    ///
    /// Returns `false` when the handler was not registered; that is not an
    /// error.
    pub fn unsubscribe(&self, tag: &EventTag, handler: &Handler) -> bool {
        let mut handlers = self.handlers.write();
        let Some(set) = handlers.get_mut(tag) else {
            return false;
        };
        let before = set.len();
        set.retain(|h| h.id() != handler.id());
        let removed = set.len() != before;
        if set.is_empty() {
            handlers.remove(tag);
        }
        if removed {
            debug!(%tag, handler = %handler.id(), "Handler unsubscribed");
        }
        removed
    }

    /// Remove `handler` from every tag. Returns how many registrations were dropped.
    pub fn unsubscribe_all(&self, handler: &Handler) -> usize {
        let mut handlers = self.handlers.write();
        let mut removed = 0;
        handlers.retain(|_, set| {
            let before = set.len();
            set.retain(|h| h.id() != handler.id());
            removed += before - set.len();
            !set.is_empty()
        });
        removed
    }

    /// Deliver `payload` to every handler registered for `tag` at the time of
    /// the call.
    pub fn dispatch(&self, tag: &EventTag, payload: &Value) -> DispatchReport {
        let snapshot: Vec<Handler> = match self.handlers.read().get(tag) {
            Some(set) => set.clone(),
            None => {
                debug!(%tag, "No handlers for tag");
                return DispatchReport::default();
            }
        };

        let mut report = DispatchReport::default();
        for handler in &snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| handler.call(tag, payload))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(%tag, handler = %handler.id(), name = handler.name(), error = %e, "Handler failed");
                }
                Err(_) => {
                    report.failed += 1;
                    error!(%tag, handler = %handler.id(), name = handler.name(), "Handler panicked");
                }
            }
        }
        report
    }

    /// Number of handlers registered for `tag`.
    #[must_use]
    pub fn handler_count(&self, tag: &EventTag) -> usize {
        self.handlers.read().get(tag).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.handlers.write().clear();
    }
}
