//! Serde data file structs for game definitions.
//!
//! These structs define the on-disk format of a game: horizon and support,
//! seasonal demand, the starting plant roster, the policy catalogue, and
//! the shock templates. They are deserialized from RON, JSON, or TOML and
//! then resolved into a core `GameConfig` by [`crate::resolve`].
//!
//! Numbers are plain `f64` on disk; seasons, plant types and durations are
//! string tags so typos surface as unresolved references rather than
//! parse errors.

use serde::Deserialize;
use std::collections::BTreeMap;

// ===========================================================================
// Game
// ===========================================================================

/// The top-level game definition in `game.{ron,toml,json}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GameData {
    #[serde(default = "default_horizon")]
    pub horizon: u32,
    #[serde(default = "default_support")]
    pub starting_support: f64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_max_shocks")]
    pub max_shocks_per_turn: u32,
    /// Keyed by season tag.
    pub demand: BTreeMap<String, DemandData>,
    #[serde(default)]
    pub plants: Vec<PlantData>,
    #[serde(default)]
    pub policies: Vec<PolicyData>,
    #[serde(default)]
    pub shocks: Vec<ShockData>,
    #[serde(default)]
    pub scheduled: Vec<ScheduledData>,
}

fn default_horizon() -> u32 {
    10
}

fn default_support() -> f64 {
    0.5
}

fn default_max_shocks() -> u32 {
    1
}

// ===========================================================================
// Demand
// ===========================================================================

/// Baseline and per-turn increment of one season.
#[derive(Debug, Clone, Deserialize)]
pub struct DemandData {
    pub baseline: f64,
    #[serde(default)]
    pub increment: f64,
}

// ===========================================================================
// Plants
// ===========================================================================

/// A plant definition, used for the starting roster and for policy builds.
#[derive(Debug, Clone, Deserialize)]
pub struct PlantData {
    pub name: String,
    #[serde(rename = "type")]
    pub plant_type: String,
    pub capacity: f64,
    pub availability: AvailabilityData,
}

/// Availability either as one value for every season or per season tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AvailabilityData {
    Uniform(f64),
    Seasonal(BTreeMap<String, f64>),
}

// ===========================================================================
// Policies
// ===========================================================================

/// A policy definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub support: f64,
    /// `(plant type, delta)` pairs.
    #[serde(default)]
    pub availability: Vec<(String, f64)>,
    #[serde(default)]
    pub demand: Vec<DemandEffectData>,
    #[serde(default)]
    pub build: Vec<PlantData>,
    /// Plant type tags.
    #[serde(default)]
    pub decommission: Vec<String>,
    #[serde(default)]
    pub min_support: Option<f64>,
    #[serde(default)]
    pub max_support: Option<f64>,
}

/// A policy's change to one season's demand.
#[derive(Debug, Clone, Deserialize)]
pub struct DemandEffectData {
    pub season: String,
    pub delta: f64,
    #[serde(default = "default_duration")]
    pub duration: String,
}

fn default_duration() -> String {
    "persistent".to_string()
}

// ===========================================================================
// Shocks
// ===========================================================================

/// A shock template in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ShockData {
    pub name: String,
    pub target: TargetData,
    pub magnitude: f64,
    #[serde(default = "default_shock_duration")]
    pub duration: String,
    /// Chance per turn of a random draw. Zero makes a scheduled-only shock.
    #[serde(default)]
    pub probability: f64,
    #[serde(default)]
    pub min_turn: u32,
    #[serde(default = "default_true")]
    pub repeatable: bool,
}

fn default_shock_duration() -> String {
    "one_off".to_string()
}

fn default_true() -> bool {
    true
}

/// What a shock acts on.
#[derive(Debug, Clone, Deserialize)]
pub enum TargetData {
    /// A plant, by name.
    Plant(String),
    /// Every active plant of a type tag.
    PlantType(String),
    /// Demand of a season tag.
    Demand(String),
    Support,
}

/// A shock that fires on a fixed turn, referencing a template by name.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledData {
    pub turn: u32,
    pub shock: String,
}
