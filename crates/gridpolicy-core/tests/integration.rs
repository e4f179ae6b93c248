//! Integration tests for the gridpolicy simulation engine.
//!
//! These tests drive whole games through the public API: configuration,
//! turn advancement, shocks, policies, snapshots, saves and determinism.

use gridpolicy_core::ErrorKind;
use gridpolicy_core::demand::{DemandCurve, SeasonDemand};
use gridpolicy_core::fixed::Fixed64;
use gridpolicy_core::game::{Game, start_game};
use gridpolicy_core::id::{PlantId, PolicyId};
use gridpolicy_core::plant::{ChangeCause, Fleet, PlantType};
use gridpolicy_core::policy::{EffectVector, PolicyOutcome, PolicySpec};
use gridpolicy_core::season::{Season, SeasonMap};
use gridpolicy_core::shock::{DurationClass, ShockOutcome, ShockTarget, ShockTemplate};
use gridpolicy_core::sim::{EndReason, GamePhase};
use gridpolicy_core::test_utils::*;

// ===========================================================================
// Test 1: Realized output
// ===========================================================================

#[test]
fn capacity_times_availability_is_output() {
    let mut fleet = Fleet::new();
    let id = fleet.commission(&coal_plant(), 0, ChangeCause::Setup).unwrap();
    let output = fleet.realized_output(id, Season::Winter, 0).unwrap();
    // 0.8 is not exact in Q32.32.
    assert!((output - fixed(80.0)).abs() < fixed(1e-6));
}

// ===========================================================================
// Test 2: Demand projection
// ===========================================================================

#[test]
fn winter_demand_grows_linearly() {
    let curve = DemandCurve::new(&SeasonMap::new(
        SeasonDemand::new(fixed(50.0), fixed(5.0)),
        SeasonDemand::new(fixed(30.0), fixed(2.0)),
    ))
    .unwrap();
    assert_eq!(curve.projected_demand(Season::Winter, 3), fixed(65.0));
    assert_eq!(curve.projected_demand(Season::Summer, 3), fixed(36.0));

    let game = start_game(&quiet_config()).unwrap();
    assert_eq!(game.demand().projected_demand(Season::Winter, 2), fixed(210.0));
}

// ===========================================================================
// Test 3: Support collapse
// ===========================================================================

#[test]
fn support_collapse_clamps_and_ends_the_game() {
    let config = quiet_config()
        .with_starting_support(fixed(0.6))
        .with_policy(PolicySpec::new("carbon_tax", EffectVector::support_only(fixed(-0.1))))
        .with_scheduled_shock(
            0,
            ShockTemplate::new(
                "blackout_scandal",
                ShockTarget::Support,
                fixed(-0.6),
                DurationClass::OneOff,
                Fixed64::ONE,
            ),
        );
    let mut game = start_game(&config).unwrap();

    let result = game.advance_turn(Some(PolicyId(0))).unwrap();
    assert_eq!(result.new_support, Fixed64::ZERO);
    assert_eq!(result.fired_shocks.len(), 1);
    assert_eq!(result.new_phase, GamePhase::Ended);
    assert_eq!(game.end_reason(), Some(EndReason::SupportCollapsed));
    // The summed delta is recorded unclamped.
    assert_eq!(game.history()[0].support_delta, fixed(-0.1) + fixed(-0.6));
}

// ===========================================================================
// Test 4: Ended games refuse to advance
// ===========================================================================

#[test]
fn ended_game_rejects_advance_and_keeps_turn() {
    let mut game = start_game(&quiet_config().with_horizon(2)).unwrap();
    advance_n(&mut game, 5);
    assert_eq!(game.phase(), GamePhase::Ended);
    assert_eq!(game.turn(), 2);

    let err = game.advance_turn(None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(game.turn(), 2);
    assert_eq!(game.snapshot().phase, GamePhase::Ended);
}

// ===========================================================================
// Test 5: Snapshots are pure reads
// ===========================================================================

#[test]
fn snapshot_is_idempotent() {
    let mut game = sample_game(3);
    advance_n(&mut game, 4);
    let hash = game.state_hash();
    let first = game.snapshot();
    let second = game.snapshot();
    assert_eq!(first, second);
    assert_eq!(game.state_hash(), hash);
    assert_eq!(first.turn, game.turn());
    assert_eq!(first.supply.len(), game.fleet().len());
}

#[test]
fn snapshot_season_is_the_tightest() {
    // Solar makes summer supply larger; winter demand is larger too.
    let game = start_game(&quiet_config().with_plant(solar_farm())).unwrap();
    let snap = game.snapshot();
    let winter = snap.balance[Season::Winter].margin();
    let summer = snap.balance[Season::Summer].margin();
    let expected = if summer < winter { Season::Summer } else { Season::Winter };
    assert_eq!(snap.season, expected);
}

// ===========================================================================
// Test 6: Invalid input never mutates
// ===========================================================================

#[test]
fn failed_operations_leave_state_untouched() {
    let mut game = sample_game(8);
    advance_n(&mut game, 2);
    let hash = game.state_hash();

    assert_eq!(
        game.advance_turn(Some(PolicyId(42))).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(game.stage_policy(PolicyId(42)).unwrap_err().kind(), ErrorKind::InvalidArgument);
    assert!(game.start().is_err());
    assert!(game.add_plant(&wind_farm("late")).is_err());
    assert_eq!(game.state_hash(), hash);
}

#[test]
fn invalid_configs_are_rejected() {
    let err = start_game(&quiet_config().with_starting_support(fixed(1.5))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = start_game(&quiet_config().with_horizon(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = start_game(&quiet_config().with_plant(coal_plant())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

// ===========================================================================
// Test 7: Shocks
// ===========================================================================

#[test]
fn shock_on_missing_plant_is_dropped_not_fatal() {
    let retire = PolicySpec::new(
        "coal_exit",
        EffectVector {
            decommission: vec![PlantType::Coal],
            ..EffectVector::default()
        },
    );
    let config = quiet_config().with_policy(retire).with_scheduled_shock(
        1,
        ShockTemplate::new(
            "boiler_fire",
            ShockTarget::Plant { name: "Drax".into() },
            fixed(-0.5),
            DurationClass::OneOff,
            Fixed64::ONE,
        ),
    );
    let mut game = start_game(&config).unwrap();
    game.advance_turn(Some(PolicyId(0))).unwrap();
    let result = game.advance_turn(None).unwrap();

    assert_eq!(result.fired_shocks.len(), 1);
    assert_eq!(result.fired_shocks[0].outcome, ShockOutcome::TargetMissing);
    assert_eq!(game.phase(), GamePhase::InProgress);
    assert_eq!(game.report().shocks_dropped, 1);
}

#[test]
fn one_off_plant_shock_only_affects_its_turn() {
    let config = quiet_config().with_scheduled_shock(
        1,
        ShockTemplate::new(
            "outage",
            ShockTarget::PlantType { plant_type: PlantType::Nuclear },
            fixed(-0.5),
            DurationClass::OneOff,
            Fixed64::ONE,
        ),
    );
    let mut game = start_game(&config).unwrap();
    let normal = game.advance_turn(None).unwrap().balance[Season::Winter].supply;
    let hit = game.advance_turn(None).unwrap().balance[Season::Winter].supply;
    let after = game.advance_turn(None).unwrap().balance[Season::Winter].supply;

    assert_eq!(normal, after);
    assert!(hit < normal);
    // Stored availability is untouched.
    assert_eq!(game.fleet().get(PlantId(1)).unwrap().availability(Season::Winter), fixed(0.9));
}

#[test]
fn persistent_demand_shock_changes_growth_from_then_on() {
    let config = quiet_config().with_scheduled_shock(
        2,
        ShockTemplate::new(
            "data_centres",
            ShockTarget::Demand { season: Season::Summer },
            fixed(4.0),
            DurationClass::Persistent,
            Fixed64::ONE,
        ),
    );
    let mut game = start_game(&config).unwrap();
    advance_n(&mut game, 4);
    let demand = game.demand();
    assert_eq!(demand.projected_demand(Season::Summer, 2), fixed(156.0));
    assert_eq!(demand.projected_demand(Season::Summer, 4), fixed(150.0 + 12.0 + 8.0));
    assert_eq!(demand.increment_at(Season::Summer, 1), fixed(3.0));
}

// ===========================================================================
// Test 8: Policy eligibility
// ===========================================================================

#[test]
fn policy_menu_follows_support_band() {
    let mut game = start_game(&sample_config(1).with_starting_support(fixed(0.3))).unwrap();
    let menu = game.available_policies();
    let names: Vec<&str> = menu.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["subsidy", "offshore_wind", "insulation"]);
    assert!(menu[0].eligible);
    assert!(!menu[1].eligible);
    assert!(menu[1].reason.is_some());

    let turn = game.turn();
    let result = game.advance_turn(Some(PolicyId(1))).unwrap();
    assert!(result.applied_policy.is_rejected());
    assert_eq!(game.turn(), turn + 1);
    assert!(game.history()[0].policy.is_rejected());
    assert!(game.fleet().by_name("Hornsea").is_none());
}

#[test]
fn built_plant_is_not_rebuilt() {
    let mut game = sample_game(2);
    let first = game.advance_turn(Some(PolicyId(1))).unwrap();
    assert!(matches!(first.applied_policy, PolicyOutcome::Applied { .. }));
    assert!(game.fleet().by_name("Hornsea").is_some());

    let second = game.advance_turn(Some(PolicyId(1))).unwrap();
    assert!(second.applied_policy.is_rejected());
}

// ===========================================================================
// Test 9: Determinism
// ===========================================================================

fn play(seed: u64) -> Game {
    let mut game = sample_game(seed);
    let mut turn = 0;
    while game.phase() == GamePhase::InProgress {
        let choice = (turn % 3 == 0).then_some(PolicyId(0));
        game.advance_turn(choice).unwrap();
        turn += 1;
    }
    game
}

#[test]
fn same_seed_same_game() {
    let a = play(1234);
    let b = play(1234);
    assert_eq!(a, b);
    assert_eq!(a.state_hash(), b.state_hash());
    assert_eq!(a.report(), b.report());
}

#[test]
fn full_game_report_is_consistent() {
    let game = play(99);
    let report = game.report();
    assert_eq!(report.phase, GamePhase::Ended);
    assert_eq!(report.turns_played as usize, game.history().len());
    assert!(report.lowest_support <= report.final_support);
    assert_eq!(
        report.shocks_fired + report.shocks_dropped,
        game.shock_history().len()
    );
}

// ===========================================================================
// Test 10: Save and resume
// ===========================================================================

#[test]
fn save_resume_matches_uninterrupted_game() {
    let mut straight = sample_game(77);
    advance_n(&mut straight, 3);
    let save = straight.save().unwrap();
    advance_n(&mut straight, 4);

    let mut resumed = Game::load(&save).unwrap();
    advance_n(&mut resumed, 4);
    assert_eq!(resumed.state_hash(), straight.state_hash());
}
