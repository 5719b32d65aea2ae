//! # ac-02-vote-tally
//!
//! Accumulation side of the engine:
//!
//! - [`VoteDeduplicator`]: at most one accepted vote per
//!   `(validator_id, timestamp, round)` key
//! - [`RoundTally`]: per-round buckets in arrival order with running
//!   support/oppose counts
//!
//! Neither structure knows which round decides the verdict; that policy lives
//! in `ac-03-consensus` and the engine.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod dedup;
pub mod tally;

pub use dedup::VoteDeduplicator;
pub use tally::{RecordOutcome, RoundCounts, RoundTally};
