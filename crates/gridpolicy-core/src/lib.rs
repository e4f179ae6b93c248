//! Gridpolicy Core -- the simulation engine for a turn-based energy-policy
//! game.
//!
//! A player runs a national grid across a fixed horizon of turns. Each turn
//! they may enact one policy; random and scheduled shocks hit plants, demand
//! and public support; and the grid's two seasons (winter and summer) are
//! balanced against a growing demand curve. The game ends at the horizon or
//! as soon as public support reaches zero.
//!
//! # Turn Pipeline
//!
//! Each call to [`game::Game::advance_turn`] checks the chosen policy's
//! eligibility and then plays the turn. A rejected policy contributes no
//! effects.
//!
//! 1. **Shocks** -- Fire scheduled shocks, then draw random ones.
//! 2. **Policy** -- Apply the policy's effect vector to fleet and demand.
//! 3. **Support** -- Commit the summed support delta, clamped to [0, 1].
//! 4. **Balance** -- Record realized demand and supply for each season.
//! 5. **Bookkeeping** -- Increment the turn and check end conditions.
//!
//! # Key Types
//!
//! - [`game::Game`] -- Owns every component and sequences the turn.
//! - [`plant::Fleet`] -- The power plants and their audit trail.
//! - [`demand::DemandCurve`] -- Seasonal demand with persistent shifts.
//! - [`shock::ShockEngine`] -- Seeded shock draws and routing.
//! - [`policy::PolicyResolver`] -- Policy catalogue and eligibility.
//! - [`support::SupportTracker`] -- The public support score.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`serialize`] -- Versioned saves via bitcode.

pub mod config;
pub mod demand;
pub mod error;
pub mod fixed;
pub mod game;
pub mod id;
pub mod plant;
pub mod policy;
pub mod query;
pub mod replay;
pub mod rng;
pub mod season;
pub mod serialize;
pub mod shock;
pub mod sim;
pub mod support;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::GameConfig;
pub use error::{ErrorKind, GridError};
pub use fixed::{Fixed64, Turn};
pub use game::{Game, GameReport, TurnResult, start_game};
pub use query::GameSnapshot;
pub use season::{Season, SeasonMap};
