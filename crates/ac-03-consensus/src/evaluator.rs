//! # Consensus Evaluator
//!
//! Pure verdict computation over one round's votes.

use crate::policy::QuorumPolicy;
use shared_types::{Verdict, Vote};
use tracing::trace;

/// Applies a [`QuorumPolicy`] to a vote set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsensusEvaluator {
    policy: QuorumPolicy,
}

impl ConsensusEvaluator {
    #[must_use]
    pub fn new(policy: QuorumPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> QuorumPolicy {
        self.policy
    }

    /// `None` for an empty vote set.
    #[must_use]
    pub fn evaluate(&self, votes: &[Vote]) -> Option<Verdict> {
        evaluate(votes, &self.policy)
    }
}

/// Compute the verdict for `votes` under `policy`.
#[must_use]
pub fn evaluate(votes: &[Vote], policy: &QuorumPolicy) -> Option<Verdict> {
    if votes.is_empty() {
        return None;
    }

    let total = votes.len();
    let support = votes.iter().filter(|vote| vote.approval).count();
    let oppose = total - support;
    let accepted = policy.is_met(support, total);
    let percent = approval_percent(support, total);

    let reason = if accepted {
        format!("{support}/{total} validators approved ({percent}%)")
    } else {
        format!("Insufficient approvals: {support}/{total} ({percent}%)")
    };

    trace!(support, oppose, accepted, "Verdict evaluated");

    Some(Verdict {
        support_count: support,
        oppose_count: oppose,
        accepted,
        reason,
    })
}

/// Nearest integer percentage, halves rounded up.
fn approval_percent(support: usize, total: usize) -> u64 {
    ((support as f64 / total as f64) * 100.0).round() as u64
}
