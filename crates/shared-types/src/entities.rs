//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Discussion**: `Vote`, `VoteKey`, `VoteKind`
//! - **Outcome**: `Verdict`
//! - **Session**: `ThreadContext`, `ChainTag`, `ConnectionState`

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: DISCUSSION
// =============================================================================

/// Index of a discussion round. Rounds start at 0.
pub type RoundIndex = u32;

/// Stance a validator attached to its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Support,
    Oppose,
    Question,
}

impl VoteKind {
    /// Wire spelling of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Support => "support",
            Self::Oppose => "oppose",
            Self::Question => "question",
        }
    }

    /// Parse the wire spelling; `None` for anything else.
    #[must_use]
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "support" => Some(Self::Support),
            "oppose" => Some(Self::Oppose),
            "question" => Some(Self::Question),
            _ => None,
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validator vote for one discussion round.
///
/// Immutable once received. Only `approval` counts toward the verdict;
/// `kind` and `message` are carried for observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Opaque validator identifier.
    pub validator_id: String,
    /// Display name, when the feed provides one.
    pub validator_name: Option<String>,
    /// Round this vote belongs to.
    pub round: RoundIndex,
    /// Whether the validator approves the transaction.
    pub approval: bool,
    /// Stance attached to the message.
    pub kind: VoteKind,
    /// Free-form discussion text.
    pub message: String,
    /// Epoch milliseconds assigned by the producer.
    pub timestamp: i64,
}

impl Vote {
    /// Build a vote whose kind follows its approval flag.
    pub fn new(
        validator_id: impl Into<String>,
        round: RoundIndex,
        approval: bool,
        message: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            validator_id: validator_id.into(),
            validator_name: None,
            round,
            approval,
            kind: if approval {
                VoteKind::Support
            } else {
                VoteKind::Oppose
            },
            message: message.into(),
            timestamp,
        }
    }

    /// Identity key used for deduplication.
    #[must_use]
    pub fn key(&self) -> VoteKey {
        VoteKey {
            validator_id: self.validator_id.clone(),
            timestamp: self.timestamp,
            round: self.round,
        }
    }
}

/// Stable identity of a vote: `(validator_id, timestamp, round)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoteKey {
    pub validator_id: String,
    pub timestamp: i64,
    pub round: RoundIndex,
}

impl fmt::Display for VoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.validator_id, self.timestamp, self.round)
    }
}

// =============================================================================
// CLUSTER B: OUTCOME
// =============================================================================

/// Outcome of the decision round.
///
/// Derived from the round's vote set; every recomputation yields a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Votes with `approval == true`.
    pub support_count: usize,
    /// Remaining votes of the round.
    pub oppose_count: usize,
    /// Whether the quorum was met.
    pub accepted: bool,
    /// Human-readable summary including the ratio and percentage.
    pub reason: String,
}

impl Verdict {
    /// Number of votes the verdict was computed from.
    #[must_use]
    pub fn total(&self) -> usize {
        self.support_count + self.oppose_count
    }

    /// Share of approvals in `[0, 1]`.
    #[must_use]
    pub fn approval_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.support_count as f64 / total as f64,
        }
    }
}

// =============================================================================
// CLUSTER C: SESSION
// =============================================================================

/// Opaque chain identifier, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChainTag(pub String);

impl ChainTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The discussion thread an engine session is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThreadContext {
    /// Chain the thread lives on.
    pub chain_id: ChainTag,
    /// Thread identifier.
    pub thread_id: String,
    /// Hash of the transaction under discussion, if known.
    pub tx_hash: Option<String>,
}

impl ThreadContext {
    pub fn new(chain_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            chain_id: ChainTag::new(chain_id),
            thread_id: thread_id.into(),
            tx_hash: None,
        }
    }

    #[must_use]
    pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.tx_hash = Some(tx_hash.into());
        self
    }
}

/// Lifecycle of the real-time connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Retry budget exhausted; only an explicit connect restarts dialing.
    GivenUp,
}

impl ConnectionState {
    /// A connection task is alive (dialing, open, or waiting to redial).
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected | Self::Reconnecting)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::GivenUp => "given-up",
        };
        f.write_str(s)
    }
}
