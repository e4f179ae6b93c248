//! Seasons and season-keyed values.
//!
//! Demand and plant availability are partitioned by season. [`SeasonMap`]
//! keys values by [`Season`] rather than by position so winter and summer
//! values can never be swapped by an off-by-one index.

use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// A demand/availability partition of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Summer,
}

impl Season {
    /// Every season, in canonical order.
    pub const ALL: [Season; 2] = [Season::Winter, Season::Summer];

    /// Lowercase tag used in data files and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Summer => "summer",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for Season {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" => Ok(Season::Winter),
            "summer" => Ok(Season::Summer),
            _ => Err(GridError::UnknownSeason { name: s.to_string() }),
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SeasonMap<T> {
    values: [T; 2],
}

impl<T> SeasonMap<T> {
    /// Build a map from explicit winter and summer values.
    pub fn new(winter: T, summer: T) -> Self {
        Self {
            values: [winter, summer],
        }
    }

    /// Build a map by evaluating `f` for each season in canonical order.
    pub fn from_fn(mut f: impl FnMut(Season) -> T) -> Self {
        Self {
            values: [f(Season::Winter), f(Season::Summer)],
        }
    }

    /// Iterate `(season, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Season, &T)> {
        Season::ALL.into_iter().zip(self.values.iter())
    }

    /// Iterate mutable values in canonical order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Season, &mut T)> {
        Season::ALL.into_iter().zip(self.values.iter_mut())
    }

    /// Transform every value, keeping the season keys.
    pub fn map<U>(&self, mut f: impl FnMut(Season, &T) -> U) -> SeasonMap<U> {
        SeasonMap::from_fn(|season| f(season, &self[season]))
    }
}

impl<T: Clone> SeasonMap<T> {
    /// The same value for every season.
    pub fn uniform(value: T) -> Self {
        Self {
            values: [value.clone(), value],
        }
    }
}

impl<T> Index<Season> for SeasonMap<T> {
    type Output = T;

    fn index(&self, season: Season) -> &T {
        &self.values[season.index()]
    }
}

impl<T> IndexMut<Season> for SeasonMap<T> {
    fn index_mut(&mut self, season: Season) -> &mut T {
        &mut self.values[season.index()]
    }
}
