//! Policies and the effect resolver.
//!
//! A policy carries a fixed [`EffectVector`]. Resolving it against the
//! current support level and fleet either yields that vector or a
//! [`PolicyOutcome::Rejected`] the UI can show to the player. At most one
//! policy is applied per turn.

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::fixed::{Fixed64, Turn};
use crate::id::PolicyId;
use crate::plant::{Fleet, PlantSpec, PlantType};
use crate::season::Season;
use crate::shock::DurationClass;

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// A change to seasonal demand caused by a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandEffect {
    pub season: Season,
    pub delta: Fixed64,
    /// One-off changes this turn's demand; persistent changes the increment.
    pub duration: DurationClass,
}

/// Everything a policy does when applied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectVector {
    /// Added to this turn's support delta.
    pub support: Fixed64,
    /// Persistent availability shift for every active plant of a type.
    pub availability: Vec<(PlantType, Fixed64)>,
    pub demand: Vec<DemandEffect>,
    /// Plants commissioned this turn.
    pub build: Vec<PlantSpec>,
    /// Plant types whose active plants are decommissioned this turn.
    pub decommission: Vec<PlantType>,
}

impl EffectVector {
    /// An effect that only moves support.
    pub fn support_only(delta: Fixed64) -> Self {
        Self {
            support: delta,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// A policy definition as configured, before it is given an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySpec {
    pub name: String,
    pub description: String,
    pub effects: EffectVector,
    /// Support must be at least this for the policy to be eligible.
    pub min_support: Option<Fixed64>,
    /// Support must be at most this for the policy to be eligible.
    pub max_support: Option<Fixed64>,
}

impl PolicySpec {
    pub fn new(name: impl Into<String>, effects: EffectVector) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            effects,
            min_support: None,
            max_support: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_support_band(mut self, min: Option<Fixed64>, max: Option<Fixed64>) -> Self {
        self.min_support = min;
        self.max_support = max;
        self
    }
}

/// A catalogued policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub name: String,
    pub description: String,
    pub effects: EffectVector,
    pub min_support: Option<Fixed64>,
    pub max_support: Option<Fixed64>,
}

/// Why a policy could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    SupportTooLow { required: Fixed64, actual: Fixed64 },
    SupportTooHigh { limit: Fixed64, actual: Fixed64 },
    /// The policy would build a plant whose name is already taken.
    AlreadyBuilt { name: String },
}

impl Policy {
    /// Check the policy against current support and fleet.
    pub fn check_eligibility(&self, support: Fixed64, fleet: &Fleet) -> Result<(), RejectReason> {
        if let Some(required) = self.min_support.filter(|&r| support < r) {
            return Err(RejectReason::SupportTooLow {
                required,
                actual: support,
            });
        }
        if let Some(limit) = self.max_support.filter(|&l| support > l) {
            return Err(RejectReason::SupportTooHigh {
                limit,
                actual: support,
            });
        }
        if let Some(spec) = self
            .effects
            .build
            .iter()
            .find(|spec| fleet.by_name(&spec.name).is_some())
        {
            return Err(RejectReason::AlreadyBuilt {
                name: spec.name.clone(),
            });
        }
        Ok(())
    }
}

/// Result of resolving a policy for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyOutcome {
    /// The player chose no policy.
    NoPolicy,
    Applied {
        policy: PolicyId,
        effects: EffectVector,
    },
    Rejected {
        policy: PolicyId,
        reason: RejectReason,
    },
}

impl PolicyOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, PolicyOutcome::Rejected { .. })
    }

    /// Support delta contributed by this outcome.
    pub fn support_delta(&self) -> Fixed64 {
        match self {
            PolicyOutcome::Applied { effects, .. } => effects.support,
            _ => Fixed64::ZERO,
        }
    }
}

/// A policy as listed for the menu, with its current eligibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyAvailability {
    pub id: PolicyId,
    pub name: String,
    pub description: String,
    pub eligible: bool,
    pub reason: Option<RejectReason>,
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Owns the policy catalogue and enforces one application per turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyResolver {
    catalogue: Vec<Policy>,
    last_applied: Option<Turn>,
}

impl PolicyResolver {
    /// Catalogue `specs` in order. Names must be unique, support bounds
    /// must lie in [0, 1], and a policy cannot build two plants of one name.
    pub fn new(specs: &[PolicySpec]) -> Result<Self, GridError> {
        let mut catalogue: Vec<Policy> = Vec::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            if catalogue.iter().any(|p| p.name == spec.name) {
                return Err(GridError::DuplicateName {
                    kind: "policy",
                    name: spec.name.clone(),
                });
            }
            for bound in [spec.min_support, spec.max_support].into_iter().flatten() {
                if bound < Fixed64::ZERO || bound > Fixed64::ONE {
                    return Err(GridError::InvalidValue {
                        field: "support_band",
                        detail: format!("policy '{}' bound {bound} outside [0, 1]", spec.name),
                    });
                }
            }
            let builds = &spec.effects.build;
            for (i, plant) in builds.iter().enumerate() {
                plant.validate()?;
                if builds[..i].iter().any(|p| p.name == plant.name) {
                    return Err(GridError::DuplicateName {
                        kind: "plant",
                        name: plant.name.clone(),
                    });
                }
            }
            catalogue.push(Policy {
                id: PolicyId(index as u32),
                name: spec.name.clone(),
                description: spec.description.clone(),
                effects: spec.effects.clone(),
                min_support: spec.min_support,
                max_support: spec.max_support,
            });
        }
        Ok(Self {
            catalogue,
            last_applied: None,
        })
    }

    pub fn get(&self, id: PolicyId) -> Result<&Policy, GridError> {
        self.catalogue
            .get(id.0 as usize)
            .ok_or(GridError::UnknownPolicy(id))
    }

    pub fn by_name(&self, name: &str) -> Option<&Policy> {
        self.catalogue.iter().find(|p| p.name == name)
    }

    /// Every policy in configured order.
    pub fn policies(&self) -> &[Policy] {
        &self.catalogue
    }

    /// Every policy with its eligibility under the given state.
    pub fn available(&self, support: Fixed64, fleet: &Fleet) -> Vec<PolicyAvailability> {
        self.catalogue
            .iter()
            .map(|p| {
                let reason = p.check_eligibility(support, fleet).err();
                PolicyAvailability {
                    id: p.id,
                    name: p.name.clone(),
                    description: p.description.clone(),
                    eligible: reason.is_none(),
                    reason,
                }
            })
            .collect()
    }

    /// Whether a policy has already been applied in `turn`.
    pub fn applied_in(&self, turn: Turn) -> bool {
        self.last_applied == Some(turn)
    }

    /// Resolve `id` for `turn`. An applied outcome marks the turn as used;
    /// a rejection does not.
    pub fn resolve(
        &mut self,
        id: PolicyId,
        support: Fixed64,
        fleet: &Fleet,
        turn: Turn,
    ) -> Result<PolicyOutcome, GridError> {
        if self.applied_in(turn) {
            return Err(GridError::PolicyAlreadyApplied { turn });
        }
        let policy = self.get(id)?;
        let outcome = match policy.check_eligibility(support, fleet) {
            Ok(()) => PolicyOutcome::Applied {
                policy: id,
                effects: policy.effects.clone(),
            },
            Err(reason) => PolicyOutcome::Rejected { policy: id, reason },
        };
        if !outcome.is_rejected() {
            self.last_applied = Some(turn);
        }
        Ok(outcome)
    }
}
