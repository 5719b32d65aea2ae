//! # Round Tally
//!
//! Per-round vote buckets in arrival order. Pure accumulation: the tally has
//! no notion of a decision round.

use serde::Serialize;
use shared_types::{RoundIndex, Vote};
use std::collections::BTreeMap;
use tracing::debug;

/// Running counts for one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoundCounts {
    pub support: usize,
    pub oppose: usize,
}

impl RoundCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.support + self.oppose
    }
}

/// What [`RoundTally::record`] did with a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Round the vote was filed under.
    pub round: RoundIndex,
    /// The current-round pointer moved forward.
    pub advanced: bool,
    /// Zero-based arrival position within the round.
    pub position: usize,
}

#[derive(Debug, Default)]
struct RoundBucket {
    votes: Vec<Vote>,
    counts: RoundCounts,
}

#[derive(Debug, Default)]
pub struct RoundTally {
    rounds: BTreeMap<RoundIndex, RoundBucket>,
    current_round: RoundIndex,
}

impl RoundTally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vote to its round.
    ///
    /// Late votes for earlier rounds are filed normally; the current-round
    /// pointer only ever moves forward.
    pub fn record(&mut self, vote: Vote) -> RecordOutcome {
        let round = vote.round;
        let bucket = self.rounds.entry(round).or_default();

        if vote.approval {
            bucket.counts.support += 1;
        } else {
            bucket.counts.oppose += 1;
        }
        let position = bucket.votes.len();
        bucket.votes.push(vote);

        let advanced = round > self.current_round;
        if advanced {
            debug!(from = self.current_round, to = round, "Round advanced");
            self.current_round = round;
        }

        RecordOutcome {
            round,
            advanced,
            position,
        }
    }

    /// Highest round seen so far, `0` before any vote.
    #[must_use]
    pub fn current_round(&self) -> RoundIndex {
        self.current_round
    }

    /// Snapshot of a round's votes in arrival order.
    #[must_use]
    pub fn votes_in_round(&self, round: RoundIndex) -> Vec<Vote> {
        self.rounds
            .get(&round)
            .map(|bucket| bucket.votes.clone())
            .unwrap_or_default()
    }

    /// Borrowing variant of [`Self::votes_in_round`].
    #[must_use]
    pub fn round_slice(&self, round: RoundIndex) -> &[Vote] {
        self.rounds
            .get(&round)
            .map_or(&[][..], |bucket| bucket.votes.as_slice())
    }

    #[must_use]
    pub fn counts(&self, round: RoundIndex) -> RoundCounts {
        self.rounds
            .get(&round)
            .map(|bucket| bucket.counts)
            .unwrap_or_default()
    }

    /// Rounds holding at least one vote, ascending.
    #[must_use]
    pub fn rounds(&self) -> Vec<RoundIndex> {
        self.rounds.keys().copied().collect()
    }

    #[must_use]
    pub fn total_votes(&self) -> usize {
        self.rounds.values().map(|bucket| bucket.votes.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Drop every vote and reset the current round to `0`.
    pub fn clear(&mut self) {
        self.rounds.clear();
        self.current_round = 0;
    }
}
