//! Save and load support.
//!
//! A save is the full [`Game`] (shock RNG state included) encoded with
//! `bitcode` behind a versioned header, so loading a save and continuing
//! evolves exactly like the game that produced it.

use serde::{Deserialize, Serialize};

use crate::fixed::Turn;
use crate::game::Game;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a gridpolicy save.
pub const SAVE_MAGIC: u32 = 0x6721_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SAVE_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("save from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Header prepended to every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveHeader {
    pub magic: u32,
    pub version: u32,
    /// Turn at which the save was taken.
    pub turn: Turn,
}

impl SaveHeader {
    /// Create a header for the current format version.
    pub fn new(turn: Turn) -> Self {
        Self {
            magic: SAVE_MAGIC,
            version: FORMAT_VERSION,
            turn,
        }
    }

    /// Validate the header. Returns `Ok(())` if valid.
    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SAVE_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveFile {
    header: SaveHeader,
    game: Game,
}

/// Borrowing twin of [`SaveFile`] so saving does not clone the game.
#[derive(Serialize)]
struct SaveFileRef<'a> {
    header: SaveHeader,
    game: &'a Game,
}

/// Read just the header of a save, e.g. to show its turn in a load menu.
///
/// bitcode cannot decode partially, so this decodes the whole save.
pub fn read_save_header(data: &[u8]) -> Result<SaveHeader, DeserializeError> {
    let save: SaveFile =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(save.header)
}

impl Game {
    /// Encode the full game state.
    pub fn save(&self) -> Result<Vec<u8>, SerializeError> {
        let file = SaveFileRef {
            header: SaveHeader::new(self.turn()),
            game: self,
        };
        bitcode::serialize(&file).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Restore a game from [`Game::save`] output.
    pub fn load(data: &[u8]) -> Result<Self, DeserializeError> {
        let file: SaveFile =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        file.header.validate()?;
        log::debug!("loaded save taken at turn {}", file.header.turn);
        Ok(file.game)
    }
}
