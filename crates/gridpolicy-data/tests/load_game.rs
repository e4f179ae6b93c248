//! End-to-end loading tests: write a game file in each format, load it,
//! and play the resulting game.

use gridpolicy_core::fixed::Fixed64;
use gridpolicy_core::game::start_game;
use gridpolicy_core::id::PolicyId;
use gridpolicy_core::plant::PlantType;
use gridpolicy_core::policy::PolicyOutcome;
use gridpolicy_core::season::Season;
use gridpolicy_core::shock::{DurationClass, ShockTarget};
use gridpolicy_core::test_utils::fixed;
use gridpolicy_data::{DataLoadError, load_game_config};
use std::fs;
use std::path::{Path, PathBuf};

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "gridpolicy_load_test_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn cleanup(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}

const GAME_RON: &str = r#"(
    horizon: 5,
    starting_support: 0.6,
    seed: 42,
    demand: {
        "winter": (baseline: 50.0, increment: 5.0),
        "summer": (baseline: 30.0, increment: 2.0),
    },
    plants: [
        (name: "Drax", type: "coal", capacity: 100.0, availability: 0.8),
        (name: "Cleve Hill", type: "solar", capacity: 40.0,
         availability: {"winter": 0.25, "summer": 0.75}),
    ],
    policies: [
        (
            name: "coal_exit",
            description: "Close every coal plant",
            support: -0.1,
            decommission: ["coal"],
            build: [(name: "Hornsea", type: "wind", capacity: 120.0, availability: 0.5)],
            demand: [(season: "winter", delta: -1.0)],
            min_support: Some(0.3),
        ),
    ],
    shocks: [
        (name: "heatwave", target: Demand("summer"), magnitude: 10.0, probability: 0.25),
        (name: "scandal", target: Support, magnitude: -0.6),
    ],
    scheduled: [(turn: 0, shock: "scandal")],
)"#;

const GAME_TOML: &str = r#"
horizon = 5
starting_support = 0.6

[demand.winter]
baseline = 50
increment = 5

[demand.summer]
baseline = 30
increment = 2

[[plants]]
name = "Drax"
type = "coal"
capacity = 100
availability = 0.8

[[policies]]
name = "efficiency"
support = 0.05
availability = [["coal", 0.1]]

[[shocks]]
name = "boiler_fire"
target = { Plant = "Drax" }
magnitude = -0.5
probability = 0.1
min_turn = 2
repeatable = false
"#;

const GAME_JSON: &str = r#"{
    "demand": {
        "winter": {"baseline": 50.0, "increment": 5.0},
        "summer": {"baseline": 30.0}
    },
    "plants": [
        {"name": "Sizewell", "type": "nuclear", "capacity": 120.0,
         "availability": {"winter": 0.9, "summer": 0.75}}
    ],
    "shocks": [
        {"name": "cold_snap", "target": {"PlantType": "nuclear"}, "magnitude": -0.25,
         "duration": "persistent", "probability": 0.5}
    ]
}"#;

#[test]
fn ron_game_loads_and_plays() {
    let dir = make_test_dir("ron");
    fs::write(dir.join("game.ron"), GAME_RON).unwrap();

    let config = load_game_config(&dir).unwrap();
    assert_eq!(config.horizon, 5);
    assert_eq!(config.seed, 42);
    assert_eq!(config.plants.len(), 2);
    assert_eq!(config.plants[1].availability[Season::Summer], fixed(0.75));
    assert_eq!(config.policies[0].effects.decommission, vec![PlantType::Coal]);
    assert_eq!(config.policies[0].effects.demand[0].duration, DurationClass::Persistent);
    assert_eq!(config.shocks[1].probability, Fixed64::ZERO);
    assert_eq!(config.scheduled_shocks.len(), 1);
    assert_eq!(config.scheduled_shocks[0].template.target, ShockTarget::Support);

    // The scheduled scandal plus the policy collapse support in turn 0.
    let mut game = start_game(&config).unwrap();
    let result = game.advance_turn(Some(PolicyId(0))).unwrap();
    assert!(matches!(result.applied_policy, PolicyOutcome::Applied { .. }));
    assert_eq!(result.new_support, Fixed64::ZERO);
    assert!(game.fleet().by_name("Hornsea").is_some());

    cleanup(&dir);
}

#[test]
fn toml_game_loads() {
    let dir = make_test_dir("toml");
    fs::write(dir.join("game.toml"), GAME_TOML).unwrap();

    let config = load_game_config(&dir).unwrap();
    assert_eq!(config.demand[Season::Winter].baseline, fixed(50.0));
    assert_eq!(config.policies[0].effects.availability, vec![(PlantType::Coal, fixed(0.1))]);
    let shock = &config.shocks[0];
    assert_eq!(shock.target, ShockTarget::Plant { name: "Drax".into() });
    assert_eq!(shock.min_turn, 2);
    assert!(!shock.repeatable);
    assert!(start_game(&config).is_ok());

    cleanup(&dir);
}

#[test]
fn json_game_uses_defaults() {
    let dir = make_test_dir("json");
    fs::write(dir.join("game.json"), GAME_JSON).unwrap();

    let config = load_game_config(&dir).unwrap();
    assert_eq!(config.horizon, 10);
    assert_eq!(config.max_shocks_per_turn, 1);
    assert_eq!(config.starting_support, fixed(0.5));
    assert_eq!(config.demand[Season::Summer].increment, Fixed64::ZERO);
    assert_eq!(config.shocks[0].duration, DurationClass::Persistent);

    cleanup(&dir);
}

#[test]
fn unknown_tags_are_unresolved_refs() {
    let dir = make_test_dir("bad_tags");
    let bad = GAME_RON.replace(r#""summer": (baseline"#, r#""autumn": (baseline"#);
    fs::write(dir.join("game.ron"), bad).unwrap();
    assert!(matches!(
        load_game_config(&dir),
        Err(DataLoadError::UnresolvedRef { expected_kind: "season", .. })
    ));

    let bad = GAME_RON.replace(r#"type: "solar""#, r#"type: "fusion""#);
    fs::write(dir.join("game.ron"), bad).unwrap();
    assert!(matches!(
        load_game_config(&dir),
        Err(DataLoadError::UnresolvedRef { expected_kind: "plant type", .. })
    ));

    let bad = GAME_RON.replace(r#"shock: "scandal""#, r#"shock: "riot""#);
    fs::write(dir.join("game.ron"), bad).unwrap();
    assert!(matches!(
        load_game_config(&dir),
        Err(DataLoadError::UnresolvedRef { expected_kind: "shock", .. })
    ));

    cleanup(&dir);
}

#[test]
fn core_validation_failures_are_invalid_config() {
    let dir = make_test_dir("invalid");
    let bad = GAME_RON.replace("starting_support: 0.6", "starting_support: 1.5");
    fs::write(dir.join("game.ron"), bad).unwrap();
    assert!(matches!(
        load_game_config(&dir),
        Err(DataLoadError::InvalidConfig { .. })
    ));

    let bad = GAME_RON.replace("probability: 0.25", "probability: 2.0");
    fs::write(dir.join("game.ron"), bad).unwrap();
    assert!(matches!(
        load_game_config(&dir),
        Err(DataLoadError::InvalidConfig { .. })
    ));

    cleanup(&dir);
}

#[test]
fn duplicate_shock_names_are_rejected() {
    let dir = make_test_dir("dup_shock");
    let bad = GAME_RON.replace(r#"name: "scandal""#, r#"name: "heatwave""#);
    fs::write(dir.join("game.ron"), bad).unwrap();
    assert!(matches!(
        load_game_config(&dir),
        Err(DataLoadError::DuplicateName { .. })
    ));
    cleanup(&dir);
}

#[test]
fn season_tags_are_case_insensitive() {
    let dir = make_test_dir("missing_season");
    let bad = GAME_JSON.replace(r#""summer": {"baseline": 30.0}"#, r#""Winter": {"baseline": 1.0}"#);
    fs::write(dir.join("game.json"), bad).unwrap();
    // "Winter" and "winter" name the same season.
    assert!(matches!(
        load_game_config(&dir),
        Err(DataLoadError::DuplicateName { .. })
    ));
    cleanup(&dir);
}

#[test]
fn missing_season_is_invalid() {
    let dir = make_test_dir("missing_season");
    let game = r#"{"demand": {"winter": {"baseline": 50.0}}}"#;
    fs::write(dir.join("game.json"), game).unwrap();
    assert!(matches!(
        load_game_config(&dir),
        Err(DataLoadError::InvalidConfig { .. })
    ));
    cleanup(&dir);
}
