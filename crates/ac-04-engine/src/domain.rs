//! Engine phase and ingestion outcomes.

use shared_types::RoundIndex;
use std::fmt;

/// Lifecycle of one engine session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EnginePhase {
    /// No session; inbound events are ignored.
    #[default]
    Idle,
    /// Started, no vote accepted yet.
    Listening,
    /// At least one vote accepted, no verdict yet.
    Tallying,
    /// A decision-round verdict exists. Votes are still accepted.
    Finalized,
}

impl EnginePhase {
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Tallying => "tallying",
            Self::Finalized => "finalized",
        })
    }
}

/// What happened to a vote handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The engine is idle.
    Ignored,
    /// Same identity key as an earlier vote; nothing changed.
    Duplicate,
    Recorded {
        round: RoundIndex,
        /// A new verdict was computed and differs from the previous one.
        verdict_changed: bool,
    },
}

impl IngestOutcome {
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}
