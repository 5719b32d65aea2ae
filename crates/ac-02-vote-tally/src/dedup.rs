//! # Vote Deduplicator
//!
//! Seen-set of vote identity keys. Re-delivered votes (reconnect replays,
//! broadcaster retries) carry the same key and are rejected.
//!
//! Unbounded by default; [`VoteDeduplicator::with_capacity`] evicts the oldest
//! key first once the bound is reached.

use shared_types::{Vote, VoteKey};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

#[derive(Debug, Default)]
pub struct VoteDeduplicator {
    seen: HashSet<VoteKey>,
    /// Insertion order, kept only when bounded.
    order: VecDeque<VoteKey>,
    capacity: Option<usize>,
    evicted: u64,
}

impl VoteDeduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounded variant. A capacity of zero is treated as one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }

    /// Record the vote's key. Returns `false` when it was already seen.
    pub fn accept(&mut self, vote: &Vote) -> bool {
        let key = vote.key();
        if self.seen.contains(&key) {
            debug!(key = %key, "Duplicate vote discarded");
            return false;
        }

        if let Some(capacity) = self.capacity {
            while self.seen.len() >= capacity {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.seen.remove(&oldest);
                self.evicted += 1;
            }
            self.order.push_back(key.clone());
        }
        self.seen.insert(key);
        true
    }

    #[must_use]
    pub fn contains(&self, key: &VoteKey) -> bool {
        self.seen.contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Keys dropped by the capacity bound since construction.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Forget every key. Capacity is kept.
    pub fn clear(&mut self) {
        self.seen.clear();
        self.order.clear();
    }
}
