//! Quorum policy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Quorum denominator must be non-zero")]
    ZeroDenominator,

    #[error("Quorum fraction {numerator}/{denominator} exceeds 1")]
    FractionAboveOne { numerator: u32, denominator: u32 },
}

/// Fraction of cast votes that must approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuorumPolicy {
    pub numerator: u32,
    pub denominator: u32,
}

impl Default for QuorumPolicy {
    fn default() -> Self {
        Self::two_thirds()
    }
}

impl QuorumPolicy {
    #[must_use]
    pub const fn two_thirds() -> Self {
        Self {
            numerator: 2,
            denominator: 3,
        }
    }

    /// # Errors
    ///
    /// Returns [`PolicyError`] for a zero denominator or a fraction above one.
    pub fn new(numerator: u32, denominator: u32) -> Result<Self, PolicyError> {
        let policy = Self {
            numerator,
            denominator,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// # Errors
    ///
    /// See [`QuorumPolicy::new`].
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.denominator == 0 {
            return Err(PolicyError::ZeroDenominator);
        }
        if self.numerator > self.denominator {
            return Err(PolicyError::FractionAboveOne {
                numerator: self.numerator,
                denominator: self.denominator,
            });
        }
        Ok(())
    }

    /// Approvals required out of `total` votes, as a real number.
    #[must_use]
    pub fn threshold(&self, total: usize) -> f64 {
        (total as f64 * f64::from(self.numerator)) / f64::from(self.denominator)
    }

    /// Non-strict comparison against the real threshold.
    #[must_use]
    pub fn is_met(&self, support: usize, total: usize) -> bool {
        support as f64 >= self.threshold(total)
    }
}
