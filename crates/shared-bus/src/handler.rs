//! # Event Handlers
//!
//! A [`Handler`] is a cloneable callable with a stable identity.

use serde_json::Value;
use shared_types::EventTag;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors a handler may report back to the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The payload could not be interpreted by this handler.
    #[error("Rejected payload: {0}")]
    Rejected(String),

    /// The handler's owner is gone or no longer accepting events.
    #[error("Handler unavailable: {0}")]
    Unavailable(String),
}

/// Process-unique identity of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

type HandlerFn = dyn Fn(&EventTag, &Value) -> Result<(), HandlerError> + Send + Sync;

/// A subscribed callback.
///
/// Cloning keeps the identity, so a clone can be used to unsubscribe the
/// original.
#[derive(Clone)]
pub struct Handler {
    id: HandlerId,
    name: Arc<str>,
    callback: Arc<HandlerFn>,
}

impl Handler {
    /// Wrap a callback under a fresh identity.
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&EventTag, &Value) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self {
            id: HandlerId::next(),
            name: Arc::from(name.into()),
            callback: Arc::new(callback),
        }
    }

    #[must_use]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Name used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the callback.
    pub fn call(&self, tag: &EventTag, payload: &Value) -> Result<(), HandlerError> {
        (self.callback)(tag, payload)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handler {}
