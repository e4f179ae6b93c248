//! Resolution of deserialized game data into a core `GameConfig`.
//!
//! Converts `f64` values to fixed-point, resolves season, plant type and
//! duration tags, and links scheduled shocks to their templates by name.

use gridpolicy_core::config::GameConfig;
use gridpolicy_core::demand::SeasonDemand;
use gridpolicy_core::error::GridError;
use gridpolicy_core::fixed::Fixed64;
use gridpolicy_core::plant::{PlantSpec, PlantType};
use gridpolicy_core::policy::{DemandEffect, EffectVector, PolicySpec};
use gridpolicy_core::season::{Season, SeasonMap};
use gridpolicy_core::shock::{DurationClass, ScheduledShock, ShockTarget, ShockTemplate};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::loader::{DataLoadError, check_duplicate, resolve_name};
use crate::schema::*;

// ===========================================================================
// Scalars and tags
// ===========================================================================

fn to_fixed(value: f64, field: &'static str, file: &Path) -> Result<Fixed64, DataLoadError> {
    Fixed64::checked_from_num(value).ok_or_else(|| DataLoadError::InvalidConfig {
        file: file.to_path_buf(),
        source: GridError::InvalidValue {
            field,
            detail: format!("{value} is not representable"),
        },
    })
}

fn unresolved(file: &Path, name: &str, expected_kind: &'static str) -> DataLoadError {
    DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    }
}

fn season(tag: &str, file: &Path) -> Result<Season, DataLoadError> {
    tag.parse().map_err(|_| unresolved(file, tag, "season"))
}

fn plant_type(tag: &str, file: &Path) -> Result<PlantType, DataLoadError> {
    tag.parse().map_err(|_| unresolved(file, tag, "plant type"))
}

fn duration(tag: &str, file: &Path) -> Result<DurationClass, DataLoadError> {
    match tag.trim().to_ascii_lowercase().as_str() {
        "one_off" | "oneoff" => Ok(DurationClass::OneOff),
        "persistent" => Ok(DurationClass::Persistent),
        _ => Err(unresolved(file, tag, "duration")),
    }
}

/// Resolve a season-keyed table. Every season must be present exactly once.
fn seasonal<T: Copy, U>(
    table: &BTreeMap<String, T>,
    field: &'static str,
    file: &Path,
    mut convert: impl FnMut(T) -> Result<U, DataLoadError>,
) -> Result<SeasonMap<U>, DataLoadError> {
    let mut values: [Option<U>; 2] = [None, None];
    for (tag, &raw) in table {
        let index = season(tag, file)? as usize;
        if values[index].is_some() {
            return Err(DataLoadError::DuplicateName {
                file: file.to_path_buf(),
                name: tag.clone(),
            });
        }
        values[index] = Some(convert(raw)?);
    }
    let [winter, summer] = values;
    match (winter, summer) {
        (Some(winter), Some(summer)) => Ok(SeasonMap::new(winter, summer)),
        _ => Err(DataLoadError::InvalidConfig {
            file: file.to_path_buf(),
            source: GridError::InvalidValue {
                field,
                detail: "both winter and summer must be given".to_string(),
            },
        }),
    }
}

// ===========================================================================
// Components
// ===========================================================================

fn resolve_demand(
    data: &BTreeMap<String, DemandData>,
    file: &Path,
) -> Result<SeasonMap<SeasonDemand>, DataLoadError> {
    let pairs: BTreeMap<String, (f64, f64)> = data
        .iter()
        .map(|(tag, d)| (tag.clone(), (d.baseline, d.increment)))
        .collect();
    seasonal(&pairs, "demand", file, |(baseline, increment)| {
        Ok(SeasonDemand::new(
            to_fixed(baseline, "baseline", file)?,
            to_fixed(increment, "increment", file)?,
        ))
    })
}

fn resolve_plant(data: &PlantData, file: &Path) -> Result<PlantSpec, DataLoadError> {
    let availability = match &data.availability {
        AvailabilityData::Uniform(v) => SeasonMap::uniform(to_fixed(*v, "availability", file)?),
        AvailabilityData::Seasonal(table) => {
            seasonal(table, "availability", file, |v| to_fixed(v, "availability", file))?
        }
    };
    Ok(PlantSpec::new(
        data.name.clone(),
        plant_type(&data.plant_type, file)?,
        to_fixed(data.capacity, "capacity", file)?,
        availability,
    ))
}

fn resolve_policy(data: &PolicyData, file: &Path) -> Result<PolicySpec, DataLoadError> {
    let availability = data
        .availability
        .iter()
        .map(|(tag, delta)| Ok((plant_type(tag, file)?, to_fixed(*delta, "availability", file)?)))
        .collect::<Result<Vec<_>, DataLoadError>>()?;
    let demand = data
        .demand
        .iter()
        .map(|d| {
            Ok(DemandEffect {
                season: season(&d.season, file)?,
                delta: to_fixed(d.delta, "demand", file)?,
                duration: duration(&d.duration, file)?,
            })
        })
        .collect::<Result<Vec<_>, DataLoadError>>()?;
    let build = data
        .build
        .iter()
        .map(|p| resolve_plant(p, file))
        .collect::<Result<Vec<_>, _>>()?;
    let decommission = data
        .decommission
        .iter()
        .map(|tag| plant_type(tag, file))
        .collect::<Result<Vec<_>, _>>()?;

    let band = |v: Option<f64>, field| v.map(|v| to_fixed(v, field, file)).transpose();
    Ok(PolicySpec::new(
        data.name.clone(),
        EffectVector {
            support: to_fixed(data.support, "support", file)?,
            availability,
            demand,
            build,
            decommission,
        },
    )
    .with_description(data.description.clone())
    .with_support_band(
        band(data.min_support, "min_support")?,
        band(data.max_support, "max_support")?,
    ))
}

fn resolve_target(data: &TargetData, file: &Path) -> Result<ShockTarget, DataLoadError> {
    Ok(match data {
        TargetData::Plant(name) => ShockTarget::Plant { name: name.clone() },
        TargetData::PlantType(tag) => ShockTarget::PlantType {
            plant_type: plant_type(tag, file)?,
        },
        TargetData::Demand(tag) => ShockTarget::Demand {
            season: season(tag, file)?,
        },
        TargetData::Support => ShockTarget::Support,
    })
}

fn resolve_shock(data: &ShockData, file: &Path) -> Result<ShockTemplate, DataLoadError> {
    let mut template = ShockTemplate::new(
        data.name.clone(),
        resolve_target(&data.target, file)?,
        to_fixed(data.magnitude, "magnitude", file)?,
        duration(&data.duration, file)?,
        to_fixed(data.probability, "probability", file)?,
    );
    template.min_turn = data.min_turn;
    template.repeatable = data.repeatable;
    Ok(template)
}

// ===========================================================================
// Game
// ===========================================================================

/// Resolve a deserialized game file into a config. Does not run the core's
/// own validation; [`crate::loader::load_game_file`] does that.
pub fn resolve_game(data: GameData, file: &Path) -> Result<GameConfig, DataLoadError> {
    let mut config = GameConfig::new(resolve_demand(&data.demand, file)?)
        .with_horizon(data.horizon)
        .with_starting_support(to_fixed(data.starting_support, "starting_support", file)?)
        .with_seed(data.seed)
        .with_max_shocks_per_turn(data.max_shocks_per_turn);

    for plant in &data.plants {
        config = config.with_plant(resolve_plant(plant, file)?);
    }
    for policy in &data.policies {
        config = config.with_policy(resolve_policy(policy, file)?);
    }

    let mut by_name: HashMap<String, usize> = HashMap::new();
    for shock in &data.shocks {
        check_duplicate(&by_name, &shock.name, file)?;
        by_name.insert(shock.name.clone(), config.shocks.len());
        config = config.with_shock(resolve_shock(shock, file)?);
    }

    for entry in &data.scheduled {
        let &index = resolve_name(&by_name, &entry.shock, file, "shock")?;
        config.scheduled_shocks.push(ScheduledShock {
            turn: entry.turn,
            template: config.shocks[index].clone(),
        });
    }

    log::debug!(
        "resolved {} scheduled shocks from {}",
        config.scheduled_shocks.len(),
        file.display()
    );
    Ok(config)
}
