//! Shock engine: scheduled and randomly drawn perturbations.
//!
//! At the start of each turn the engine fires every shock scheduled for that
//! turn, then walks its template pool in order, drawing once per eligible
//! template until `max_per_turn` random shocks have fired. The RNG is owned
//! by the engine and seeded explicitly, so the same seed, config and turn
//! sequence always yield the same shock history.
//!
//! A fired shock is routed straight to its target. When the target is gone
//! (unknown or decommissioned plant, no active plant of a type) the shock is
//! recorded as [`ShockOutcome::TargetMissing`] and the turn carries on.

use serde::{Deserialize, Serialize};

use crate::demand::DemandCurve;
use crate::error::GridError;
use crate::fixed::{Fixed64, Turn};
use crate::id::{PlantId, ShockId};
use crate::plant::{ChangeCause, Fleet, PlantType};
use crate::rng::SimRng;
use crate::season::Season;
use crate::support::SupportTracker;

/// How long an effect lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationClass {
    /// Affects the realized values of the trigger turn only.
    OneOff,
    /// Shifts the underlying rate or level from the trigger turn onward.
    Persistent,
}

/// What a shock acts on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShockTarget {
    /// Availability of a single plant, by name.
    Plant { name: String },
    /// Availability of every active plant of a type.
    PlantType { plant_type: PlantType },
    /// Demand of one season.
    Demand { season: Season },
    /// Political support.
    Support,
}

/// A shock that may fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShockTemplate {
    pub name: String,
    pub target: ShockTarget,
    /// Signed delta applied to the target.
    pub magnitude: Fixed64,
    pub duration: DurationClass,
    /// Chance of firing on an eligible turn, in [0, 1].
    pub probability: Fixed64,
    /// Earliest turn at which the shock may fire.
    pub min_turn: Turn,
    /// Whether the shock may fire more than once per game.
    pub repeatable: bool,
}

impl ShockTemplate {
    pub fn new(
        name: impl Into<String>,
        target: ShockTarget,
        magnitude: Fixed64,
        duration: DurationClass,
        probability: Fixed64,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            magnitude,
            duration,
            probability,
            min_turn: 0,
            repeatable: true,
        }
    }
}

/// A shock that fires deterministically at `turn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledShock {
    pub turn: Turn,
    pub template: ShockTemplate,
}

/// What happened when a shock fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShockOutcome {
    /// The effect was applied. Lists affected plants for plant targets.
    Applied { plants: Vec<PlantId> },
    /// The target no longer exists; the shock was dropped.
    TargetMissing,
}

/// Immutable record of a fired shock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shock {
    pub id: ShockId,
    pub name: String,
    pub turn: Turn,
    pub target: ShockTarget,
    pub magnitude: Fixed64,
    pub duration: DurationClass,
    pub scheduled: bool,
    pub outcome: ShockOutcome,
}

impl Shock {
    pub fn was_applied(&self) -> bool {
        matches!(self.outcome, ShockOutcome::Applied { .. })
    }
}

/// Shocks fired in one turn plus the one-off support delta they carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiredShocks {
    pub shocks: Vec<Shock>,
    /// Sum of one-off support shocks. Persistent support shocks are
    /// registered as drift on the tracker instead.
    pub support_delta: Fixed64,
}

/// Per-template bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct TemplateState {
    times_fired: u32,
    /// A persistent effect from this template is in force.
    active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShockEngine {
    rng: SimRng,
    max_per_turn: u32,
    templates: Vec<ShockTemplate>,
    states: Vec<TemplateState>,
    scheduled: Vec<ScheduledShock>,
    history: Vec<Shock>,
}

impl ShockEngine {
    /// Build an engine seeded with `seed`. Probabilities must lie in [0, 1]
    /// and template names must be unique.
    pub fn new(
        seed: u64,
        max_per_turn: u32,
        templates: Vec<ShockTemplate>,
        scheduled: Vec<ScheduledShock>,
    ) -> Result<Self, GridError> {
        for (i, t) in templates.iter().enumerate() {
            if templates[..i].iter().any(|o| o.name == t.name) {
                return Err(GridError::DuplicateName {
                    kind: "shock",
                    name: t.name.clone(),
                });
            }
        }
        for t in templates.iter().chain(scheduled.iter().map(|s| &s.template)) {
            if t.probability < Fixed64::ZERO || t.probability > Fixed64::ONE {
                return Err(GridError::InvalidValue {
                    field: "probability",
                    detail: format!("shock '{}' probability {} outside [0, 1]", t.name, t.probability),
                });
            }
        }
        Ok(Self {
            rng: SimRng::new(seed),
            max_per_turn,
            states: vec![TemplateState::default(); templates.len()],
            templates,
            scheduled,
            history: Vec::new(),
        })
    }

    pub fn templates(&self) -> &[ShockTemplate] {
        &self.templates
    }

    /// Every shock fired so far, oldest first.
    pub fn history(&self) -> &[Shock] {
        &self.history
    }

    /// Shocks fired during `turn`.
    pub fn fired_in(&self, turn: Turn) -> impl Iterator<Item = &Shock> {
        self.history.iter().filter(move |s| s.turn == turn)
    }

    pub fn rng_state(&self) -> u64 {
        self.rng.state()
    }

    fn is_eligible(&self, index: usize, turn: Turn) -> bool {
        let template = &self.templates[index];
        let state = self.states[index];
        turn >= template.min_turn
            && !(template.duration == DurationClass::Persistent && state.active)
            && (template.repeatable || state.times_fired == 0)
    }

    /// Select the templates to fire this turn. Consumes RNG draws.
    fn draw(&mut self, turn: Turn) -> Vec<usize> {
        let mut picked = Vec::new();
        for index in 0..self.templates.len() {
            if picked.len() as u32 >= self.max_per_turn {
                break;
            }
            if !self.is_eligible(index, turn) {
                continue;
            }
            if self.rng.chance(self.templates[index].probability) {
                picked.push(index);
            }
        }
        picked
    }

    /// Fire this turn's shocks and route each to its target.
    pub fn fire(
        &mut self,
        turn: Turn,
        fleet: &mut Fleet,
        demand: &mut DemandCurve,
        support: &mut SupportTracker,
    ) -> FiredShocks {
        let mut fired = FiredShocks::default();

        let scheduled: Vec<ShockTemplate> = self
            .scheduled
            .iter()
            .filter(|s| s.turn == turn)
            .map(|s| s.template.clone())
            .collect();
        for template in &scheduled {
            let shock = self.apply(template, true, turn, fleet, demand, support, &mut fired);
            fired.shocks.push(shock);
        }

        for index in self.draw(turn) {
            let template = self.templates[index].clone();
            let shock = self.apply(&template, false, turn, fleet, demand, support, &mut fired);
            let state = &mut self.states[index];
            state.times_fired += 1;
            if shock.was_applied() && template.duration == DurationClass::Persistent {
                state.active = true;
            }
            fired.shocks.push(shock);
        }

        self.history.extend(fired.shocks.iter().cloned());
        fired
    }

    #[allow(clippy::too_many_arguments)]
    fn apply(
        &mut self,
        template: &ShockTemplate,
        scheduled: bool,
        turn: Turn,
        fleet: &mut Fleet,
        demand: &mut DemandCurve,
        support: &mut SupportTracker,
        fired: &mut FiredShocks,
    ) -> Shock {
        let id = ShockId((self.history.len() + fired.shocks.len()) as u32);
        let cause = ChangeCause::Shock(id);
        let magnitude = template.magnitude;

        let outcome = match &template.target {
            ShockTarget::Plant { name } => {
                let plants: Vec<PlantId> = match fleet.find(name) {
                    Ok(plant) if plant.is_active() => vec![plant.id()],
                    Ok(_) => Vec::new(),
                    Err(err) => {
                        log::debug!("turn {turn}: {err}");
                        Vec::new()
                    }
                };
                apply_to_plants(fleet, plants, template.duration, magnitude, turn, cause)
            }
            ShockTarget::PlantType { plant_type } => {
                let plants = fleet.active_of_type(*plant_type);
                apply_to_plants(fleet, plants, template.duration, magnitude, turn, cause)
            }
            ShockTarget::Demand { season } => {
                match template.duration {
                    DurationClass::OneOff => demand.apply_one_off_delta(*season, turn, magnitude),
                    DurationClass::Persistent => {
                        demand.apply_persistent_shift(*season, turn, magnitude)
                    }
                }
                ShockOutcome::Applied { plants: Vec::new() }
            }
            ShockTarget::Support => {
                match template.duration {
                    DurationClass::OneOff => {
                        fired.support_delta = fired.support_delta.saturating_add(magnitude)
                    }
                    DurationClass::Persistent => support.add_drift(magnitude),
                }
                ShockOutcome::Applied { plants: Vec::new() }
            }
        };

        match outcome {
            ShockOutcome::TargetMissing => log::warn!(
                "turn {turn}: shock '{}' dropped, target {:?} no longer exists",
                template.name,
                template.target
            ),
            ShockOutcome::Applied { .. } => log::debug!(
                "turn {turn}: shock '{}' fired ({:?}, magnitude {magnitude})",
                template.name,
                template.duration
            ),
        }

        Shock {
            id,
            name: template.name.clone(),
            turn,
            target: template.target.clone(),
            magnitude,
            duration: template.duration,
            scheduled,
            outcome,
        }
    }
}

fn apply_to_plants(
    fleet: &mut Fleet,
    plants: Vec<PlantId>,
    duration: DurationClass,
    magnitude: Fixed64,
    turn: Turn,
    cause: ChangeCause,
) -> ShockOutcome {
    if plants.is_empty() {
        return ShockOutcome::TargetMissing;
    }
    let mut applied = Vec::with_capacity(plants.len());
    for id in plants {
        let result = match duration {
            DurationClass::OneOff => fleet.add_one_off_availability(id, magnitude, turn, cause),
            DurationClass::Persistent => fleet.shift_availability(id, magnitude, turn, cause),
        };
        if result.is_ok() {
            applied.push(id);
        }
    }
    if applied.is_empty() {
        ShockOutcome::TargetMissing
    } else {
        ShockOutcome::Applied { plants: applied }
    }
}
