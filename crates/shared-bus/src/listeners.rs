//! # Typed Listener Sets
//!
//! Observer lists for already-decoded values (verdicts, rounds, connection
//! states). Same snapshot and isolation rules as the registry.

use crate::registry::DispatchReport;
use parking_lot::RwLock;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::error;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a registered listener, used to remove it.
///
/// Unique across every set in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A set of callbacks notified with `&T`.
pub struct ListenerSet<T> {
    name: &'static str,
    listeners: RwLock<Vec<(ListenerId, Listener<T>)>>,
}

impl<T> ListenerSet<T> {
    /// `name` shows up in logs when a listener panics.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn add<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` when `id` is not registered here.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Call every listener registered at the time of the call.
    pub fn notify(&self, value: &T) -> DispatchReport {
        let snapshot: Vec<(ListenerId, Listener<T>)> = self.listeners.read().clone();

        let mut report = DispatchReport::default();
        for (id, listener) in &snapshot {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(value))).is_ok() {
                report.delivered += 1;
            } else {
                report.failed += 1;
                error!(set = self.name, listener = %id, "Listener panicked");
            }
        }
        report
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    pub fn clear(&self) {
        self.listeners.write().clear();
    }
}

impl<T> fmt::Debug for ListenerSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}
