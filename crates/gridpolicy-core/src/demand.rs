//! Seasonal demand curve.
//!
//! Each season has a baseline and a yearly increment. Persistent shifts
//! change the increment from a given turn onward without rewriting earlier
//! turns; one-off deltas are kept per turn and only touch the realized value
//! of that turn. Both are append-only, so every read is idempotent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::fixed::{Fixed64, Turn, floor_zero};
use crate::season::{Season, SeasonMap};

/// Starting demand parameters for one season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeasonDemand {
    /// Demand at turn 0, in energy units. Must be >= 0.
    pub baseline: Fixed64,
    /// Demand growth per turn, in energy units.
    pub increment: Fixed64,
}

impl SeasonDemand {
    pub fn new(baseline: Fixed64, increment: Fixed64) -> Self {
        Self {
            baseline,
            increment,
        }
    }
}

/// A change to a season's increment taking effect from `from_turn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementShift {
    pub from_turn: Turn,
    pub delta: Fixed64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
struct SeasonCurve {
    baseline: Fixed64,
    increment: Fixed64,
    shifts: Vec<IncrementShift>,
    one_off: BTreeMap<Turn, Fixed64>,
}

/// Demand for every season across the game.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DemandCurve {
    seasons: SeasonMap<SeasonCurve>,
}

impl DemandCurve {
    /// Build a curve from starting parameters. Baselines must be >= 0.
    pub fn new(params: &SeasonMap<SeasonDemand>) -> Result<Self, GridError> {
        for (season, p) in params.iter() {
            if p.baseline < Fixed64::ZERO {
                return Err(GridError::InvalidValue {
                    field: "baseline",
                    detail: format!("{season} baseline {} is negative", p.baseline),
                });
            }
        }
        Ok(Self {
            seasons: params.map(|_, p| SeasonCurve {
                baseline: p.baseline,
                increment: p.increment,
                ..SeasonCurve::default()
            }),
        })
    }

    pub fn baseline(&self, season: Season) -> Fixed64 {
        self.seasons[season].baseline
    }

    /// The increment configured at game start.
    pub fn base_increment(&self, season: Season) -> Fixed64 {
        self.seasons[season].increment
    }

    /// The increment applied between `turn` and `turn + 1`, persistent
    /// shifts included.
    pub fn increment_at(&self, season: Season, turn: Turn) -> Fixed64 {
        let curve = &self.seasons[season];
        curve
            .shifts
            .iter()
            .filter(|s| s.from_turn <= turn)
            .fold(curve.increment, |acc, s| acc.saturating_add(s.delta))
    }

    /// `baseline + increment * turn`, with each persistent shift contributing
    /// only for the turns after it took effect. Never negative.
    pub fn projected_demand(&self, season: Season, turn: Turn) -> Fixed64 {
        let curve = &self.seasons[season];
        let base = curve
            .baseline
            .saturating_add(curve.increment.saturating_mul_int(i64::from(turn)));
        let shifted = curve
            .shifts
            .iter()
            .filter(|s| s.from_turn < turn)
            .fold(base, |acc, s| {
                acc.saturating_add(s.delta.saturating_mul_int(i64::from(turn - s.from_turn)))
            });
        floor_zero(shifted)
    }

    /// Projected demand plus any one-off delta registered for `turn`.
    pub fn realized_demand(&self, season: Season, turn: Turn) -> Fixed64 {
        let one_off = self.one_off_delta(season, turn);
        floor_zero(self.projected_demand(season, turn).saturating_add(one_off))
    }

    /// Sum of one-off deltas registered for `(season, turn)`.
    pub fn one_off_delta(&self, season: Season, turn: Turn) -> Fixed64 {
        self.seasons[season]
            .one_off
            .get(&turn)
            .copied()
            .unwrap_or(Fixed64::ZERO)
    }

    /// Change the season's increment from `from_turn` onward.
    pub fn apply_persistent_shift(&mut self, season: Season, from_turn: Turn, delta: Fixed64) {
        self.seasons[season].shifts.push(IncrementShift { from_turn, delta });
    }

    /// Adjust the realized demand of a single turn. Baseline and increment
    /// are untouched.
    pub fn apply_one_off_delta(&mut self, season: Season, turn: Turn, delta: Fixed64) {
        let entry = self.seasons[season]
            .one_off
            .entry(turn)
            .or_insert(Fixed64::ZERO);
        *entry = entry.saturating_add(delta);
    }

    /// Persistent shifts recorded for a season, oldest first.
    pub fn shifts(&self, season: Season) -> &[IncrementShift] {
        &self.seasons[season].shifts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    fn curve(winter: (f64, f64), summer: (f64, f64)) -> DemandCurve {
        DemandCurve::new(&SeasonMap::new(
            SeasonDemand::new(fixed(winter.0), fixed(winter.1)),
            SeasonDemand::new(fixed(summer.0), fixed(summer.1)),
        ))
        .unwrap()
    }

    #[test]
    fn projected_demand_is_linear() {
        let demand = curve((50.0, 5.0), (30.0, 2.0));
        assert_eq!(demand.projected_demand(Season::Winter, 3), fixed(65.0));
        assert_eq!(demand.projected_demand(Season::Summer, 0), fixed(30.0));
        assert_eq!(demand.projected_demand(Season::Summer, 10), fixed(50.0));
    }

    #[test]
    fn negative_baseline_is_rejected() {
        let params = SeasonMap::uniform(SeasonDemand::new(fixed(-1.0), fixed(0.0)));
        assert!(matches!(
            DemandCurve::new(&params),
            Err(GridError::InvalidValue { field: "baseline", .. })
        ));
    }

    #[test]
    fn persistent_shift_only_changes_future_turns() {
        let mut demand = curve((50.0, 5.0), (30.0, 2.0));
        let before: Vec<Fixed64> = (0..=4)
            .map(|t| demand.projected_demand(Season::Winter, t))
            .collect();

        demand.apply_persistent_shift(Season::Winter, 4, fixed(3.0));

        for t in 0..=4 {
            assert_eq!(demand.projected_demand(Season::Winter, t), before[t as usize]);
        }
        assert_eq!(demand.increment_at(Season::Winter, 3), fixed(5.0));
        assert_eq!(demand.increment_at(Season::Winter, 4), fixed(8.0));
        // 70 at turn 4, then +8 per turn.
        assert_eq!(demand.projected_demand(Season::Winter, 5), fixed(78.0));
        assert_eq!(demand.projected_demand(Season::Winter, 6), fixed(86.0));
        // Summer untouched.
        assert_eq!(demand.projected_demand(Season::Summer, 6), fixed(42.0));
        assert_eq!(demand.base_increment(Season::Winter), fixed(5.0));
    }

    #[test]
    fn one_off_delta_affects_single_turn() {
        let mut demand = curve((50.0, 5.0), (30.0, 2.0));
        demand.apply_one_off_delta(Season::Summer, 2, fixed(10.0));

        assert_eq!(demand.realized_demand(Season::Summer, 2), fixed(44.0));
        assert_eq!(demand.realized_demand(Season::Summer, 2), fixed(44.0));
        assert_eq!(demand.projected_demand(Season::Summer, 2), fixed(34.0));
        assert_eq!(demand.realized_demand(Season::Summer, 3), fixed(36.0));
        assert_eq!(demand.baseline(Season::Summer), fixed(30.0));
    }

    #[test]
    fn one_off_deltas_accumulate() {
        let mut demand = curve((10.0, 0.0), (10.0, 0.0));
        demand.apply_one_off_delta(Season::Winter, 1, fixed(2.0));
        demand.apply_one_off_delta(Season::Winter, 1, fixed(3.0));
        assert_eq!(demand.one_off_delta(Season::Winter, 1), fixed(5.0));
    }

    #[test]
    fn demand_never_goes_negative() {
        let mut demand = curve((10.0, -4.0), (5.0, 0.0));
        assert_eq!(demand.projected_demand(Season::Winter, 5), Fixed64::ZERO);
        demand.apply_one_off_delta(Season::Summer, 0, fixed(-20.0));
        assert_eq!(demand.realized_demand(Season::Summer, 0), Fixed64::ZERO);
    }
}
