//! # ac-04-engine
//!
//! Engine facade: composes the transport, registry, deduplicator, tally and
//! evaluator into one stateful object per discussion thread.
//!
//! ## Data flow
//!
//! ```text
//! TransportAdapter ──AGENT_VOTE──→ decode_vote ──→ VoteDeduplicator ──→ RoundTally
//!        │                                                                │
//!        │                                               round == decision_round?
//!        │                                                                ↓
//!        └──BLOCK_VERDICT──→ stored verbatim              ConsensusEvaluator ──→ observers
//! ```
//!
//! ## State machine
//!
//! `Idle → Listening → Tallying → Finalized`. `stop()` returns to `Idle` from
//! any state and clears every vote. A verdict does not lock the tally: late
//! votes keep arriving and any vote for the decision round recomputes the
//! verdict.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
mod session;

pub use config::{ConfigError, EngineConfig};
pub use domain::{EnginePhase, IngestOutcome};
pub use engine::ConsensusEngine;
pub use error::{EngineError, EngineResult};
