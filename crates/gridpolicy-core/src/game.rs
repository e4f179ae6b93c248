//! The game orchestrator: owns every component and sequences them once per
//! turn.
//!
//! # Architecture
//!
//! A [`Game`] exclusively owns:
//! - the [`Fleet`] of power plants
//! - the [`DemandCurve`]
//! - the [`SupportTracker`]
//! - the [`ShockEngine`] (and its seeded RNG)
//! - the [`PolicyResolver`] and its catalogue
//! - the ordered [`TurnRecord`] history
//!
//! Consumers get owned [`GameSnapshot`]s and [`TurnResult`]s, never references
//! they could mutate.
//!
//! # Turn pipeline
//!
//! Each [`Game::advance_turn`] runs, after all preconditions pass:
//! 1. **Shocks** -- fire scheduled and drawn shocks, routed to their targets
//! 2. **Policy** -- apply the chosen policy's effect vector
//! 3. **Support** -- sum policy, shock and drift deltas; clamp and commit once
//! 4. **Balance** -- record realized demand and supply for the turn
//! 5. **Bookkeeping** -- increment the turn; end the game at the horizon or
//!    when support hits zero
//!
//! Eligibility is judged before step 1, on the support level the player saw
//! when choosing. A rejected policy contributes no effects; the rest of the
//! turn is played as if no policy had been chosen.

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::demand::DemandCurve;
use crate::error::GridError;
use crate::fixed::{Fixed64, Turn, saturating_sum};
use crate::id::{PlantId, PolicyId, ShockId};
use crate::plant::{ChangeCause, Fleet, PlantChangeKind, PlantSpec};
use crate::policy::{EffectVector, Policy, PolicyAvailability, PolicyOutcome, PolicyResolver};
use crate::query::{GameSnapshot, PlantSupply, SeasonBalance, critical_season};
use crate::season::{Season, SeasonMap};
use crate::shock::{DurationClass, Shock, ShockEngine};
use crate::sim::{EndReason, GamePhase, StateHash};
use crate::support::SupportTracker;

// ---------------------------------------------------------------------------
// Turn results and history
// ---------------------------------------------------------------------------

/// What one `advance_turn` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    /// The turn that was played.
    pub turn: Turn,
    pub applied_policy: PolicyOutcome,
    pub fired_shocks: Vec<Shock>,
    pub new_support: Fixed64,
    pub new_phase: GamePhase,
    pub end_reason: Option<EndReason>,
    /// Realized demand and supply of the played turn.
    pub balance: SeasonMap<SeasonBalance>,
}

impl TurnResult {
    /// Whether the chosen policy's effects were applied this turn.
    pub fn policy_applied(&self) -> bool {
        matches!(self.applied_policy, PolicyOutcome::Applied { .. })
    }
}

/// A played turn, kept for charts and audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn: Turn,
    pub policy: PolicyOutcome,
    pub shocks: Vec<ShockId>,
    /// Combined delta committed to support this turn, before clamping.
    pub support_delta: Fixed64,
    pub support: Fixed64,
    pub balance: SeasonMap<SeasonBalance>,
}

/// End-of-game figures for the reporting screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameReport {
    pub turns_played: Turn,
    pub phase: GamePhase,
    pub end_reason: Option<EndReason>,
    pub final_support: Fixed64,
    pub lowest_support: Fixed64,
    pub policies_applied: usize,
    pub shocks_fired: usize,
    pub shocks_dropped: usize,
    /// Sum over played turns and seasons of unserved demand.
    pub total_shortfall: Fixed64,
    pub plants_built: usize,
    pub plants_decommissioned: usize,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    horizon: Turn,
    turn: Turn,
    phase: GamePhase,
    end_reason: Option<EndReason>,
    fleet: Fleet,
    demand: DemandCurve,
    support: SupportTracker,
    shocks: ShockEngine,
    policies: PolicyResolver,
    /// Policy chosen ahead of `advance_turn` for the current turn.
    staged: Option<PolicyId>,
    history: Vec<TurnRecord>,
}

/// Create a game from `config` and start it.
pub fn start_game(config: &GameConfig) -> Result<Game, GridError> {
    let mut game = Game::new(config)?;
    game.start()?;
    Ok(game)
}

impl Game {
    /// Build a game in the `Setup` phase.
    pub fn new(config: &GameConfig) -> Result<Self, GridError> {
        config.validate()?;

        let mut fleet = Fleet::new();
        for spec in &config.plants {
            fleet.commission(spec, 0, ChangeCause::Setup)?;
        }

        Ok(Self {
            horizon: config.horizon,
            turn: 0,
            phase: GamePhase::Setup,
            end_reason: None,
            fleet,
            demand: DemandCurve::new(&config.demand)?,
            support: SupportTracker::new(config.starting_support)?,
            shocks: ShockEngine::new(
                config.seed,
                config.max_shocks_per_turn,
                config.shocks.clone(),
                config.scheduled_shocks.clone(),
            )?,
            policies: PolicyResolver::new(&config.policies)?,
            staged: None,
            history: Vec::new(),
        })
    }

    /// Move from `Setup` to `InProgress`. A game that starts with zero
    /// support ends immediately.
    pub fn start(&mut self) -> Result<(), GridError> {
        if self.phase != GamePhase::Setup {
            return Err(GridError::AlreadyStarted { phase: self.phase });
        }
        self.phase = GamePhase::InProgress;
        log::info!(
            "game started: {} plants, horizon {}, support {}",
            self.fleet.len(),
            self.horizon,
            self.support.score()
        );
        if self.support.is_collapsed() {
            self.end(EndReason::SupportCollapsed);
        }
        Ok(())
    }

    /// Add a plant to the starting roster. Only allowed during `Setup`.
    pub fn add_plant(&mut self, spec: &PlantSpec) -> Result<PlantId, GridError> {
        if self.phase != GamePhase::Setup {
            return Err(GridError::AlreadyStarted { phase: self.phase });
        }
        self.fleet.commission(spec, 0, ChangeCause::Setup)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn horizon(&self) -> Turn {
        self.horizon
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn support(&self) -> Fixed64 {
        self.support.score()
    }

    pub fn support_tracker(&self) -> &SupportTracker {
        &self.support
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn demand(&self) -> &DemandCurve {
        &self.demand
    }

    /// Every shock fired so far.
    pub fn shock_history(&self) -> &[Shock] {
        self.shocks.history()
    }

    /// Every played turn, oldest first.
    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    pub fn policies(&self) -> &[Policy] {
        self.policies.policies()
    }

    pub fn staged_policy(&self) -> Option<PolicyId> {
        self.staged
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The policy menu, in configured order, with current eligibility.
    pub fn available_policies(&self) -> Vec<PolicyAvailability> {
        self.policies.available(self.support.score(), &self.fleet)
    }

    /// Realized demand and supply for `turn`.
    pub fn balance_at(&self, turn: Turn) -> SeasonMap<SeasonBalance> {
        SeasonMap::from_fn(|season| SeasonBalance {
            demand: self.demand.realized_demand(season, turn),
            supply: self.fleet.total_supply(season, turn),
        })
    }

    /// Owned view of the current turn.
    pub fn snapshot(&self) -> GameSnapshot {
        let turn = self.turn;
        let supply: Vec<PlantSupply> = self
            .fleet
            .iter()
            .map(|plant| PlantSupply {
                id: plant.id(),
                name: plant.name().to_string(),
                plant_type: plant.plant_type(),
                capacity: plant.capacity(),
                output: SeasonMap::from_fn(|season| {
                    self.fleet
                        .realized_output(plant.id(), season, turn)
                        .unwrap_or(Fixed64::ZERO)
                }),
                active: plant.is_active_at(turn),
            })
            .collect();
        let balance = self.balance_at(turn);

        GameSnapshot {
            turn,
            horizon: self.horizon,
            season: critical_season(&balance),
            phase: self.phase,
            end_reason: self.end_reason,
            support: self.support.score(),
            demand: balance.map(|_, b| b.demand),
            total_supply: balance.map(|_, b| b.supply),
            supply,
            balance,
        }
    }

    // -----------------------------------------------------------------------
    // Turn advancement
    // -----------------------------------------------------------------------

    fn ensure_in_progress(&self) -> Result<(), GridError> {
        match self.phase {
            GamePhase::Setup => Err(GridError::NotStarted),
            GamePhase::InProgress => Ok(()),
            GamePhase::Ended => Err(GridError::GameEnded { turn: self.turn }),
        }
    }

    /// Choose the policy for the current turn ahead of `advance_turn`.
    /// Only one policy can be staged per turn.
    pub fn stage_policy(&mut self, id: PolicyId) -> Result<(), GridError> {
        self.ensure_in_progress()?;
        if self.staged.is_some() {
            return Err(GridError::PolicyAlreadyApplied { turn: self.turn });
        }
        self.policies.get(id)?;
        self.staged = Some(id);
        Ok(())
    }

    /// Play one turn with `policy`, or with the staged policy when `None`.
    ///
    /// Errors leave the game untouched. A rejected policy is not an error:
    /// the turn is played without its effects and the result carries
    /// [`PolicyOutcome::Rejected`].
    pub fn advance_turn(&mut self, policy: Option<PolicyId>) -> Result<TurnResult, GridError> {
        self.ensure_in_progress()?;
        let turn = self.turn;
        let choice = match (policy, self.staged) {
            (Some(_), Some(_)) => return Err(GridError::PolicyAlreadyApplied { turn }),
            (Some(id), None) | (None, Some(id)) => Some(id),
            (None, None) => None,
        };

        let outcome = match choice {
            Some(id) => self
                .policies
                .resolve(id, self.support.score(), &self.fleet, turn)?,
            None => PolicyOutcome::NoPolicy,
        };
        self.staged = None;

        if let PolicyOutcome::Rejected { policy, reason } = &outcome {
            log::warn!("turn {turn}: policy {policy} rejected: {reason:?}");
        }

        // 1. Shocks.
        let fired = self
            .shocks
            .fire(turn, &mut self.fleet, &mut self.demand, &mut self.support);

        // 2. Policy effects.
        if let PolicyOutcome::Applied { policy, effects } = &outcome {
            self.apply_effects(*policy, effects, turn);
        }

        // 3. Support: one clamp-and-commit for the whole turn.
        let support_delta = saturating_sum([
            outcome.support_delta(),
            fired.support_delta,
            self.support.drift(),
        ]);
        let new_support = self.support.update(support_delta);

        // 4. Balance.
        let balance = self.balance_at(turn);

        self.history.push(TurnRecord {
            turn,
            policy: outcome.clone(),
            shocks: fired.shocks.iter().map(|s| s.id).collect(),
            support_delta,
            support: new_support,
            balance,
        });

        // 5. Bookkeeping.
        self.turn += 1;
        log::debug!(
            "turn {turn} played: support {new_support}, {} shocks",
            fired.shocks.len()
        );
        if self.support.is_collapsed() {
            self.end(EndReason::SupportCollapsed);
        } else if self.turn >= self.horizon {
            self.end(EndReason::HorizonReached);
        }

        Ok(TurnResult {
            turn,
            applied_policy: outcome,
            fired_shocks: fired.shocks,
            new_support,
            new_phase: self.phase,
            end_reason: self.end_reason,
            balance,
        })
    }

    /// Route a policy's effects. Decommissions run before builds so a policy
    /// can replace one technology with another, and availability shifts
    /// apply to the plants active after both.
    fn apply_effects(&mut self, policy: PolicyId, effects: &EffectVector, turn: Turn) {
        let cause = ChangeCause::Policy(policy);

        for &plant_type in &effects.decommission {
            for id in self.fleet.active_of_type(plant_type) {
                if let Err(err) = self.fleet.decommission(id, turn, cause) {
                    log::warn!("turn {turn}: decommission of {id} failed: {err}");
                }
            }
        }

        for spec in &effects.build {
            match self.fleet.commission(spec, turn, cause) {
                Ok(id) => log::debug!("turn {turn}: commissioned '{}' as {id}", spec.name),
                Err(err) => log::warn!("turn {turn}: build of '{}' failed: {err}", spec.name),
            }
        }

        for &(plant_type, delta) in &effects.availability {
            for id in self.fleet.active_of_type(plant_type) {
                if let Err(err) = self.fleet.shift_availability(id, delta, turn, cause) {
                    log::warn!("turn {turn}: availability shift of {id} failed: {err}");
                }
            }
        }

        for effect in &effects.demand {
            match effect.duration {
                DurationClass::OneOff => {
                    self.demand
                        .apply_one_off_delta(effect.season, turn, effect.delta)
                }
                DurationClass::Persistent => {
                    self.demand
                        .apply_persistent_shift(effect.season, turn, effect.delta)
                }
            }
        }
    }

    fn end(&mut self, reason: EndReason) {
        self.phase = GamePhase::Ended;
        self.end_reason = Some(reason);
        log::info!(
            "game ended at turn {}: {reason:?}, support {}",
            self.turn,
            self.support.score()
        );
    }

    // -----------------------------------------------------------------------
    // Reporting and hashing
    // -----------------------------------------------------------------------

    /// Figures for the end-of-game screen. Usable at any point.
    pub fn report(&self) -> GameReport {
        let shocks = self.shocks.history();
        let changes = self.fleet.changes();
        GameReport {
            turns_played: self.history.len() as Turn,
            phase: self.phase,
            end_reason: self.end_reason,
            final_support: self.support.score(),
            lowest_support: self.support.lowest(),
            policies_applied: self
                .history
                .iter()
                .filter(|r| matches!(r.policy, PolicyOutcome::Applied { .. }))
                .count(),
            shocks_fired: shocks.iter().filter(|s| s.was_applied()).count(),
            shocks_dropped: shocks.iter().filter(|s| !s.was_applied()).count(),
            total_shortfall: saturating_sum(
                self.history
                    .iter()
                    .flat_map(|r| r.balance.iter().map(|(_, b)| b.shortfall())),
            ),
            plants_built: changes
                .iter()
                .filter(|c| {
                    c.kind == PlantChangeKind::Commissioned
                        && matches!(c.cause, ChangeCause::Policy(_))
                })
                .count(),
            plants_decommissioned: changes
                .iter()
                .filter(|c| c.kind == PlantChangeKind::Decommissioned)
                .count(),
        }
    }

    /// Deterministic hash of the simulation state.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_u32(self.turn);
        h.write_u32(self.horizon);
        h.write_u32(self.phase as u32);
        h.write_u32(self.end_reason.map_or(0, |r| r as u32 + 1));
        h.write_u32(self.staged.map_or(u32::MAX, |p| p.0));

        h.write_fixed64(self.support.score());
        h.write_fixed64(self.support.drift());

        h.write_u64(self.fleet.len() as u64);
        for plant in self.fleet.iter() {
            h.write_str(plant.name());
            h.write_fixed64(plant.capacity());
            for season in Season::ALL {
                h.write_fixed64(plant.availability(season));
            }
            h.write_u32(plant.commissioned_turn());
            h.write_u32(plant.decommissioned_turn().map_or(u32::MAX, |t| t));
        }
        h.write_u64(self.fleet.changes().len() as u64);

        for season in Season::ALL {
            h.write_fixed64(self.demand.realized_demand(season, self.turn));
            h.write_fixed64(self.demand.increment_at(season, self.turn));
            h.write_u64(self.demand.shifts(season).len() as u64);
        }

        h.write_u64(self.shocks.rng_state());
        h.write_u64(self.shocks.history().len() as u64);
        h.write_u64(self.history.len() as u64);
        h.finish()
    }
}
