//! Replay recording and playback.
//!
//! A [`ReplayLog`] holds a save of the starting game plus every policy
//! choice made afterwards, with the state hash after each turn. Playing it
//! back re-runs the choices from the save and reports the first turn whose
//! hash differs, which pins down where two runs diverged.

use crate::error::GridError;
use crate::game::Game;
use crate::id::PolicyId;
use crate::serialize::{DeserializeError, SerializeError};

/// Details about where replay verification failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayMismatch {
    /// Index of the recorded choice after which hashes diverged.
    pub choice_index: usize,
    pub expected_hash: u64,
    pub actual_hash: u64,
}

/// Errors that stop a replay from running to completion.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("initial save could not be loaded: {0}")]
    Load(#[from] DeserializeError),
    #[error("choice {index} failed: {source}")]
    Turn { index: usize, source: GridError },
}

/// A recorded sequence of policy choices starting from a save.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReplayLog {
    pub initial_save: Vec<u8>,
    /// Policy passed to each `advance_turn`, in order.
    pub choices: Vec<Option<PolicyId>>,
    /// State hash after each choice, parallel to `choices`.
    pub hashes: Vec<u64>,
}

/// The result of replaying a log.
#[derive(Debug)]
pub struct ReplayResult {
    pub choices_replayed: usize,
    /// First divergence, if any. Playback stops there.
    pub mismatch: Option<ReplayMismatch>,
    /// The game as it stands after playback.
    pub game: Game,
}

impl ReplayResult {
    pub fn is_verified(&self) -> bool {
        self.mismatch.is_none()
    }
}

impl ReplayLog {
    /// Start recording from the current state of `game`.
    pub fn new(game: &Game) -> Result<Self, SerializeError> {
        Ok(Self {
            initial_save: game.save()?,
            choices: Vec::new(),
            hashes: Vec::new(),
        })
    }

    /// Play a turn on `game` and record the choice and resulting hash.
    pub fn advance(
        &mut self,
        game: &mut Game,
        policy: Option<PolicyId>,
    ) -> Result<crate::game::TurnResult, GridError> {
        let result = game.advance_turn(policy)?;
        self.choices.push(policy);
        self.hashes.push(game.state_hash());
        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Serialize the log with bitcode.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        bitcode::serialize(self).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))
    }

    /// Re-run every choice from the initial save, checking hashes.
    pub fn replay(&self) -> Result<ReplayResult, ReplayError> {
        let mut game = Game::load(&self.initial_save)?;
        for (index, &choice) in self.choices.iter().enumerate() {
            game.advance_turn(choice)
                .map_err(|source| ReplayError::Turn { index, source })?;
            let actual_hash = game.state_hash();
            let expected = self.hashes.get(index).copied();
            if let Some(expected_hash) = expected.filter(|&h| h != actual_hash) {
                log::warn!("replay diverged after choice {index}");
                return Ok(ReplayResult {
                    choices_replayed: index + 1,
                    mismatch: Some(ReplayMismatch {
                        choice_index: index,
                        expected_hash,
                        actual_hash,
                    }),
                    game,
                });
            }
        }
        Ok(ReplayResult {
            choices_replayed: self.choices.len(),
            mismatch: None,
            game,
        })
    }
}
