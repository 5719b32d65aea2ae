//! # ac-03-consensus
//!
//! Turns the decision round's vote set into a [`Verdict`].
//!
//! ## Quorum rule
//!
//! `accepted = support >= n × numerator / denominator`, compared as real
//! numbers. With the default 2/3 policy, 2 approvals out of 3 votes meet the
//! threshold exactly (`2 >= 2.0`) and are accepted.
//!
//! Evaluation is a pure function of the vote slice: the same votes always
//! produce an equal verdict, and an empty slice produces none.
//!
//! [`Verdict`]: shared_types::Verdict

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod evaluator;
pub mod policy;

pub use evaluator::{evaluate, ConsensusEvaluator};
pub use policy::{PolicyError, QuorumPolicy};
