//! Power plants and the fleet that owns them.
//!
//! A plant's realized output for a season is `capacity * availability`.
//! Plants are never removed once commissioned: retiring one sets a
//! decommission turn, so a [`PlantId`] stays valid for the whole game and
//! chart series keyed by it never break.
//!
//! Every mutation goes through [`Fleet`] and leaves a [`PlantChange`] entry,
//! giving an audit trail per plant of what changed, when, and why.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::fixed::{Fixed64, Turn, clamp_unit, saturating_sum};
use crate::id::{PlantId, PolicyId, ShockId};
use crate::season::{Season, SeasonMap};

// ---------------------------------------------------------------------------
// Plant type
// ---------------------------------------------------------------------------

/// Generation technology tag. Policies and shocks can target all plants of
/// one type at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlantType {
    Coal,
    Gas,
    Nuclear,
    Hydro,
    Wind,
    Solar,
    Biomass,
}

impl PlantType {
    pub const ALL: [PlantType; 7] = [
        PlantType::Coal,
        PlantType::Gas,
        PlantType::Nuclear,
        PlantType::Hydro,
        PlantType::Wind,
        PlantType::Solar,
        PlantType::Biomass,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlantType::Coal => "coal",
            PlantType::Gas => "gas",
            PlantType::Nuclear => "nuclear",
            PlantType::Hydro => "hydro",
            PlantType::Wind => "wind",
            PlantType::Solar => "solar",
            PlantType::Biomass => "biomass",
        }
    }
}

impl FromStr for PlantType {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        PlantType::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| GridError::UnknownPlantType { name: s.to_string() })
    }
}

impl std::fmt::Display for PlantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Plant spec and plant
// ---------------------------------------------------------------------------

/// Blueprint for a plant, used by the initial roster and by build policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantSpec {
    pub name: String,
    pub plant_type: PlantType,
    /// Rated capacity in energy units. Must be >= 0.
    pub capacity: Fixed64,
    /// Seasonal availability factor, each in [0, 1].
    pub availability: SeasonMap<Fixed64>,
}

impl PlantSpec {
    pub fn new(
        name: impl Into<String>,
        plant_type: PlantType,
        capacity: Fixed64,
        availability: SeasonMap<Fixed64>,
    ) -> Self {
        Self {
            name: name.into(),
            plant_type,
            capacity,
            availability,
        }
    }

    /// Check capacity and availability ranges.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.capacity < Fixed64::ZERO {
            return Err(GridError::InvalidValue {
                field: "capacity",
                detail: format!("plant '{}' has negative capacity {}", self.name, self.capacity),
            });
        }
        for (season, &value) in self.availability.iter() {
            if value < Fixed64::ZERO || value > Fixed64::ONE {
                return Err(GridError::InvalidValue {
                    field: "availability",
                    detail: format!(
                        "plant '{}' has {season} availability {value} outside [0, 1]",
                        self.name
                    ),
                });
            }
        }
        Ok(())
    }
}

/// One generation asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerPlant {
    id: PlantId,
    name: String,
    plant_type: PlantType,
    capacity: Fixed64,
    availability: SeasonMap<Fixed64>,
    commissioned: Turn,
    decommissioned: Option<Turn>,
}

impl PowerPlant {
    pub fn id(&self) -> PlantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plant_type(&self) -> PlantType {
        self.plant_type
    }

    /// Rated capacity.
    pub fn capacity(&self) -> Fixed64 {
        self.capacity
    }

    /// Stored seasonal availability factor.
    pub fn availability(&self, season: Season) -> Fixed64 {
        self.availability[season]
    }

    /// Like [`availability`](Self::availability), for a season given as text.
    pub fn availability_for(&self, season: &str) -> Result<Fixed64, GridError> {
        Ok(self.availability(season.parse()?))
    }

    /// `capacity * availability(season)`, or zero once decommissioned.
    pub fn realized_output(&self, season: Season) -> Fixed64 {
        if self.decommissioned.is_some() {
            return Fixed64::ZERO;
        }
        self.capacity.saturating_mul(self.availability[season])
    }

    pub fn commissioned_turn(&self) -> Turn {
        self.commissioned
    }

    pub fn decommissioned_turn(&self) -> Option<Turn> {
        self.decommissioned
    }

    /// Whether the plant is generating.
    pub fn is_active(&self) -> bool {
        self.decommissioned.is_none()
    }

    /// Whether the plant was generating during `turn`.
    pub fn is_active_at(&self, turn: Turn) -> bool {
        self.commissioned <= turn && self.decommissioned.is_none_or(|d| turn < d)
    }
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

/// What caused a plant mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeCause {
    /// Part of the initial roster or added before the game started.
    Setup,
    Policy(PolicyId),
    Shock(ShockId),
}

/// The kind of mutation applied to a plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlantChangeKind {
    Commissioned,
    Decommissioned,
    /// Stored availability of every season shifted by `delta` (then clamped).
    AvailabilityShift { delta: Fixed64 },
    /// Availability changed by `delta` for the recorded turn only.
    OneOffAvailability { delta: Fixed64 },
}

/// A single audited plant mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantChange {
    pub plant: PlantId,
    pub turn: Turn,
    pub kind: PlantChangeKind,
    pub cause: ChangeCause,
}

// ---------------------------------------------------------------------------
// Fleet
// ---------------------------------------------------------------------------

/// Every plant in the game, in commissioning order, plus the audit log and
/// any availability deltas that apply to a single turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fleet {
    plants: Vec<PowerPlant>,
    one_off: BTreeMap<(PlantId, Turn), Fixed64>,
    changes: Vec<PlantChange>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plant built from `spec`. Names must be unique across the fleet,
    /// decommissioned plants included.
    pub fn commission(
        &mut self,
        spec: &PlantSpec,
        turn: Turn,
        cause: ChangeCause,
    ) -> Result<PlantId, GridError> {
        spec.validate()?;
        if self.by_name(&spec.name).is_some() {
            return Err(GridError::DuplicateName {
                kind: "plant",
                name: spec.name.clone(),
            });
        }
        let id = PlantId(self.plants.len() as u32);
        self.plants.push(PowerPlant {
            id,
            name: spec.name.clone(),
            plant_type: spec.plant_type,
            capacity: spec.capacity,
            availability: spec.availability,
            commissioned: turn,
            decommissioned: None,
        });
        self.record(id, turn, PlantChangeKind::Commissioned, cause);
        Ok(id)
    }

    /// Number of plants ever commissioned.
    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }

    pub fn get(&self, id: PlantId) -> Result<&PowerPlant, GridError> {
        self.plants
            .get(id.0 as usize)
            .ok_or(GridError::UnknownPlant(id))
    }

    fn get_mut(&mut self, id: PlantId) -> Result<&mut PowerPlant, GridError> {
        self.plants
            .get_mut(id.0 as usize)
            .ok_or(GridError::UnknownPlant(id))
    }

    pub fn by_name(&self, name: &str) -> Option<&PowerPlant> {
        self.plants.iter().find(|p| p.name == name)
    }

    /// Like [`Fleet::by_name`], but an unknown name is an error.
    pub fn find(&self, name: &str) -> Result<&PowerPlant, GridError> {
        self.by_name(name).ok_or_else(|| GridError::UnknownPlantName {
            name: name.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PowerPlant> {
        self.plants.iter()
    }

    /// Ids of the plants of `plant_type` that are still generating.
    pub fn active_of_type(&self, plant_type: PlantType) -> Vec<PlantId> {
        self.plants
            .iter()
            .filter(|p| p.plant_type == plant_type && p.is_active())
            .map(|p| p.id)
            .collect()
    }

    /// Permanently shift a plant's availability in every season, clamping
    /// each to [0, 1].
    pub fn shift_availability(
        &mut self,
        id: PlantId,
        delta: Fixed64,
        turn: Turn,
        cause: ChangeCause,
    ) -> Result<(), GridError> {
        let plant = self.get_mut(id)?;
        for (_, value) in plant.availability.iter_mut() {
            *value = clamp_unit(value.saturating_add(delta));
        }
        self.record(id, turn, PlantChangeKind::AvailabilityShift { delta }, cause);
        Ok(())
    }

    /// Adjust a plant's availability for `turn` only. Stored availability
    /// is untouched.
    pub fn add_one_off_availability(
        &mut self,
        id: PlantId,
        delta: Fixed64,
        turn: Turn,
        cause: ChangeCause,
    ) -> Result<(), GridError> {
        self.get(id)?;
        let entry = self.one_off.entry((id, turn)).or_insert(Fixed64::ZERO);
        *entry = entry.saturating_add(delta);
        self.record(id, turn, PlantChangeKind::OneOffAvailability { delta }, cause);
        Ok(())
    }

    /// Retire a plant. Returns `false` if it was already decommissioned.
    pub fn decommission(
        &mut self,
        id: PlantId,
        turn: Turn,
        cause: ChangeCause,
    ) -> Result<bool, GridError> {
        let plant = self.get_mut(id)?;
        if plant.decommissioned.is_some() {
            return Ok(false);
        }
        plant.decommissioned = Some(turn);
        self.record(id, turn, PlantChangeKind::Decommissioned, cause);
        Ok(true)
    }

    /// Effective availability during `turn`, one-off deltas included.
    pub fn availability_at(
        &self,
        id: PlantId,
        season: Season,
        turn: Turn,
    ) -> Result<Fixed64, GridError> {
        let plant = self.get(id)?;
        let one_off = self.one_off.get(&(id, turn)).copied().unwrap_or(Fixed64::ZERO);
        Ok(clamp_unit(plant.availability[season].saturating_add(one_off)))
    }

    /// Output of a plant during `turn`. Zero when the plant was not active.
    pub fn realized_output(
        &self,
        id: PlantId,
        season: Season,
        turn: Turn,
    ) -> Result<Fixed64, GridError> {
        let plant = self.get(id)?;
        if !plant.is_active_at(turn) {
            return Ok(Fixed64::ZERO);
        }
        let availability = self.availability_at(id, season, turn)?;
        Ok(plant.capacity.saturating_mul(availability))
    }

    /// Sum of realized output over all plants during `turn`.
    pub fn total_supply(&self, season: Season, turn: Turn) -> Fixed64 {
        saturating_sum(
            self.plants
                .iter()
                .filter_map(|p| self.realized_output(p.id, season, turn).ok()),
        )
    }

    /// Every audited change, oldest first.
    pub fn changes(&self) -> &[PlantChange] {
        &self.changes
    }

    /// Audited changes for one plant.
    pub fn changes_for(&self, id: PlantId) -> impl Iterator<Item = &PlantChange> {
        self.changes.iter().filter(move |c| c.plant == id)
    }

    fn record(&mut self, plant: PlantId, turn: Turn, kind: PlantChangeKind, cause: ChangeCause) {
        self.changes.push(PlantChange {
            plant,
            turn,
            kind,
            cause,
        });
    }
}
