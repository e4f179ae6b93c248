//! Error taxonomy for the simulation core.
//!
//! Every [`GridError`] is either a malformed argument or a call made in the
//! wrong game phase; [`GridError::kind`] exposes which. Recoverable gameplay
//! outcomes (a rejected policy, a shock whose target is gone) are not errors
//! and are reported through [`crate::policy::PolicyOutcome`] and
//! [`crate::shock::ShockOutcome`] instead.

use crate::fixed::Turn;
use crate::id::{PlantId, PolicyId};
use crate::sim::GamePhase;

/// Coarse classification of a [`GridError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A malformed season, plant, policy or value was supplied.
    InvalidArgument,
    /// The operation is not allowed in the current game phase.
    InvalidState,
}

/// Errors returned by simulation operations. Any call that returns one of
/// these has left the game untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("unknown season '{name}'")]
    UnknownSeason { name: String },

    #[error("unknown plant type '{name}'")]
    UnknownPlantType { name: String },

    #[error("no plant with id {0}")]
    UnknownPlant(PlantId),

    #[error("no plant named '{name}'")]
    UnknownPlantName { name: String },

    #[error("no policy with id {0}")]
    UnknownPolicy(PolicyId),

    #[error("invalid value for {field}: {detail}")]
    InvalidValue { field: &'static str, detail: String },

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("game has not been started")]
    NotStarted,

    #[error("game is already {phase:?}")]
    AlreadyStarted { phase: GamePhase },

    #[error("game has ended at turn {turn}")]
    GameEnded { turn: Turn },

    #[error("a policy was already applied in turn {turn}")]
    PolicyAlreadyApplied { turn: Turn },
}

impl GridError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GridError::UnknownSeason { .. }
            | GridError::UnknownPlantType { .. }
            | GridError::UnknownPlant(_)
            | GridError::UnknownPlantName { .. }
            | GridError::UnknownPolicy(_)
            | GridError::InvalidValue { .. }
            | GridError::DuplicateName { .. } => ErrorKind::InvalidArgument,
            GridError::NotStarted
            | GridError::AlreadyStarted { .. }
            | GridError::GameEnded { .. }
            | GridError::PolicyAlreadyApplied { .. } => ErrorKind::InvalidState,
        }
    }
}
