//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so the helpers
//! are available to benchmarks and other crates through the `test-utils`
//! feature.

use crate::config::GameConfig;
use crate::demand::SeasonDemand;
use crate::fixed::{Fixed64, Turn};
use crate::game::{Game, start_game};
use crate::plant::{PlantSpec, PlantType};
use crate::policy::{DemandEffect, EffectVector, PolicySpec};
use crate::season::{Season, SeasonMap};
use crate::shock::{DurationClass, ShockTarget, ShockTemplate};
use crate::sim::GamePhase;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Plants
// ===========================================================================

pub fn coal_plant() -> PlantSpec {
    PlantSpec::new("Drax", PlantType::Coal, fixed(100.0), SeasonMap::uniform(fixed(0.8)))
}

pub fn nuclear_plant() -> PlantSpec {
    PlantSpec::new(
        "Sizewell",
        PlantType::Nuclear,
        fixed(120.0),
        SeasonMap::new(fixed(0.9), fixed(0.75)),
    )
}

pub fn solar_farm() -> PlantSpec {
    PlantSpec::new(
        "Cleve Hill",
        PlantType::Solar,
        fixed(40.0),
        SeasonMap::new(fixed(0.25), fixed(0.75)),
    )
}

pub fn wind_farm(name: &str) -> PlantSpec {
    PlantSpec::new(
        name,
        PlantType::Wind,
        fixed(60.0),
        SeasonMap::new(fixed(0.5), fixed(0.25)),
    )
}

// ===========================================================================
// Configs
// ===========================================================================

pub fn sample_demand() -> SeasonMap<SeasonDemand> {
    SeasonMap::new(
        SeasonDemand::new(fixed(200.0), fixed(5.0)),
        SeasonDemand::new(fixed(150.0), fixed(3.0)),
    )
}

/// A config with no shocks and no policies.
pub fn quiet_config() -> GameConfig {
    GameConfig::new(sample_demand())
        .with_starting_support(fixed(0.6))
        .with_plant(coal_plant())
        .with_plant(nuclear_plant())
}

/// A full config with policies and random shocks, seeded with `seed`.
///
/// Policy 0 ("subsidy") is always eligible and stays eligible on repeat.
pub fn sample_config(seed: u64) -> GameConfig {
    quiet_config()
        .with_horizon(12)
        .with_starting_support(fixed(0.7))
        .with_seed(seed)
        .with_max_shocks_per_turn(2)
        .with_plant(solar_farm())
        .with_policy(PolicySpec::new(
            "subsidy",
            EffectVector {
                support: fixed(0.02),
                availability: vec![(PlantType::Solar, fixed(0.0625))],
                ..EffectVector::default()
            },
        ))
        .with_policy(
            PolicySpec::new(
                "offshore_wind",
                EffectVector {
                    support: fixed(-0.05),
                    build: vec![wind_farm("Hornsea")],
                    ..EffectVector::default()
                },
            )
            .with_support_band(Some(fixed(0.4)), None),
        )
        .with_policy(
            PolicySpec::new(
                "insulation",
                EffectVector {
                    support: fixed(-0.03),
                    demand: vec![DemandEffect {
                        season: Season::Winter,
                        delta: fixed(-2.0),
                        duration: DurationClass::Persistent,
                    }],
                    ..EffectVector::default()
                },
            )
            .with_description("Retrofit homes to cut winter demand growth"),
        )
        .with_shock(ShockTemplate::new(
            "heatwave",
            ShockTarget::Demand { season: Season::Summer },
            fixed(15.0),
            DurationClass::OneOff,
            fixed(0.3),
        ))
        .with_shock(ShockTemplate::new(
            "reactor_fault",
            ShockTarget::Plant { name: "Sizewell".into() },
            fixed(-0.25),
            DurationClass::OneOff,
            fixed(0.2),
        ))
        .with_shock(ShockTemplate::new(
            "price_spike",
            ShockTarget::Support,
            fixed(-0.04),
            DurationClass::OneOff,
            fixed(0.25),
        ))
}

/// A started game built from [`sample_config`].
pub fn sample_game(seed: u64) -> Game {
    start_game(&sample_config(seed)).expect("sample config is valid")
}

/// Advance `n` turns with no policy, stopping early if the game ends.
pub fn advance_n(game: &mut Game, n: Turn) {
    for _ in 0..n {
        if game.phase() != GamePhase::InProgress {
            break;
        }
        game.advance_turn(None).expect("game is in progress");
    }
}
