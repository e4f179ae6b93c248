//! Game configuration: everything needed to set up a new game.
//!
//! Values are already in fixed-point. Loading from data files (with `f64`
//! values and string tags) lives in the `gridpolicy-data` crate, which
//! resolves into this type.

use serde::{Deserialize, Serialize};

use crate::demand::SeasonDemand;
use crate::error::GridError;
use crate::fixed::{Fixed64, Turn};
use crate::plant::PlantSpec;
use crate::policy::PolicySpec;
use crate::season::SeasonMap;
use crate::shock::{ScheduledShock, ShockTemplate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of turns in a full game.
    pub horizon: Turn,
    pub starting_support: Fixed64,
    /// Seed for the shock engine's RNG.
    pub seed: u64,
    /// Cap on randomly drawn shocks per turn. Scheduled shocks don't count.
    pub max_shocks_per_turn: u32,
    /// Initial plant roster.
    pub plants: Vec<PlantSpec>,
    pub demand: SeasonMap<SeasonDemand>,
    /// Policy catalogue, in menu order.
    pub policies: Vec<PolicySpec>,
    /// Random shock pool, in draw order.
    pub shocks: Vec<ShockTemplate>,
    pub scheduled_shocks: Vec<ScheduledShock>,
}

impl GameConfig {
    pub const DEFAULT_HORIZON: Turn = 10;
    pub const DEFAULT_MAX_SHOCKS_PER_TURN: u32 = 1;

    /// A config with the given demand, default horizon and shock cap, half
    /// support, and nothing else.
    pub fn new(demand: SeasonMap<SeasonDemand>) -> Self {
        Self {
            horizon: Self::DEFAULT_HORIZON,
            starting_support: Fixed64::from_num(0.5),
            seed: 0,
            max_shocks_per_turn: Self::DEFAULT_MAX_SHOCKS_PER_TURN,
            plants: Vec::new(),
            demand,
            policies: Vec::new(),
            shocks: Vec::new(),
            scheduled_shocks: Vec::new(),
        }
    }

    pub fn with_horizon(mut self, horizon: Turn) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_starting_support(mut self, support: Fixed64) -> Self {
        self.starting_support = support;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_shocks_per_turn(mut self, max: u32) -> Self {
        self.max_shocks_per_turn = max;
        self
    }

    pub fn with_plant(mut self, plant: PlantSpec) -> Self {
        self.plants.push(plant);
        self
    }

    pub fn with_policy(mut self, policy: PolicySpec) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn with_shock(mut self, shock: ShockTemplate) -> Self {
        self.shocks.push(shock);
        self
    }

    pub fn with_scheduled_shock(mut self, turn: Turn, template: ShockTemplate) -> Self {
        self.scheduled_shocks.push(ScheduledShock { turn, template });
        self
    }

    /// Check the top-level settings and the plant roster. Policies, shocks
    /// and demand are checked by the components that own them.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.horizon == 0 {
            return Err(GridError::InvalidValue {
                field: "horizon",
                detail: "horizon must be at least one turn".to_string(),
            });
        }
        if self.starting_support < Fixed64::ZERO || self.starting_support > Fixed64::ONE {
            return Err(GridError::InvalidValue {
                field: "starting_support",
                detail: format!("{} outside [0, 1]", self.starting_support),
            });
        }
        for (i, plant) in self.plants.iter().enumerate() {
            plant.validate()?;
            if self.plants[..i].iter().any(|p| p.name == plant.name) {
                return Err(GridError::DuplicateName {
                    kind: "plant",
                    name: plant.name.clone(),
                });
            }
        }
        Ok(())
    }
}
