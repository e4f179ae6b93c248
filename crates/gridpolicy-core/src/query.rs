//! Read-only views of game state for renderers and UI.
//!
//! All types are owned copies; nothing here borrows into the game, so a
//! consumer can hold a snapshot across turns without affecting the core.

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, Turn};
use crate::id::PlantId;
use crate::plant::PlantType;
use crate::season::{Season, SeasonMap};
use crate::sim::{EndReason, GamePhase};

/// Demand against supply for one season of one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeasonBalance {
    pub demand: Fixed64,
    pub supply: Fixed64,
}

impl SeasonBalance {
    /// `supply - demand`. Negative means unmet demand.
    pub fn margin(&self) -> Fixed64 {
        self.supply.saturating_sub(self.demand)
    }

    /// Demand left unserved, zero when supply covers it.
    pub fn shortfall(&self) -> Fixed64 {
        self.demand.saturating_sub(self.supply).max(Fixed64::ZERO)
    }
}

/// The season with the smallest margin; earlier seasons win ties.
pub fn critical_season(balance: &SeasonMap<SeasonBalance>) -> Season {
    balance
        .iter()
        .fold(None::<(Season, Fixed64)>, |best, (season, b)| match best {
            Some((_, margin)) if margin <= b.margin() => best,
            _ => Some((season, b.margin())),
        })
        .map(|(season, _)| season)
        .unwrap_or(Season::Winter)
}

/// One plant's contribution to supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantSupply {
    pub id: PlantId,
    pub name: String,
    pub plant_type: PlantType,
    pub capacity: Fixed64,
    pub output: SeasonMap<Fixed64>,
    pub active: bool,
}

/// Everything a renderer needs to redraw, for the current turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub turn: Turn,
    pub horizon: Turn,
    /// The season with the tightest supply margin this turn.
    pub season: Season,
    pub phase: GamePhase,
    pub end_reason: Option<EndReason>,
    pub support: Fixed64,
    /// Realized demand per season, one-off deltas included.
    pub demand: SeasonMap<Fixed64>,
    /// Supply per plant, in commissioning order.
    pub supply: Vec<PlantSupply>,
    pub total_supply: SeasonMap<Fixed64>,
    pub balance: SeasonMap<SeasonBalance>,
}
