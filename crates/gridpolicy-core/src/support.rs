//! Political support score.
//!
//! Support is a fraction in [0, 1]. A turn's contributions (policy,
//! shocks, standing drift) are summed by the caller and committed with a
//! single [`SupportTracker::update`], so no intermediate over- or underflow
//! is ever stored. A score of zero is terminal for the game.

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::fixed::{Fixed64, clamp_unit, saturating_sum};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportTracker {
    score: Fixed64,
    /// Per-turn deltas registered by persistent support shocks.
    drift: Vec<Fixed64>,
    /// Score after every committed update, starting value first.
    history: Vec<Fixed64>,
}

impl SupportTracker {
    /// Start tracking at `initial`, which must lie in [0, 1].
    pub fn new(initial: Fixed64) -> Result<Self, GridError> {
        if initial < Fixed64::ZERO || initial > Fixed64::ONE {
            return Err(GridError::InvalidValue {
                field: "starting_support",
                detail: format!("{initial} outside [0, 1]"),
            });
        }
        Ok(Self {
            score: initial,
            drift: Vec::new(),
            history: vec![initial],
        })
    }

    pub fn score(&self) -> Fixed64 {
        self.score
    }

    /// Apply the combined delta of a turn, clamp, and commit.
    pub fn update(&mut self, delta: Fixed64) -> Fixed64 {
        self.score = clamp_unit(self.score.saturating_add(delta));
        self.history.push(self.score);
        self.score
    }

    /// Register a standing per-turn delta.
    pub fn add_drift(&mut self, delta: Fixed64) {
        self.drift.push(delta);
    }

    /// Total standing per-turn delta.
    pub fn drift(&self) -> Fixed64 {
        saturating_sum(self.drift.iter().copied())
    }

    /// Whether support has collapsed to zero.
    pub fn is_collapsed(&self) -> bool {
        self.score == Fixed64::ZERO
    }

    /// Lowest score seen so far.
    pub fn lowest(&self) -> Fixed64 {
        self.history.iter().copied().min().unwrap_or(self.score)
    }

    pub fn history(&self) -> &[Fixed64] {
        &self.history
    }
}
