//! Static game catalog: cities, base speed, and upgrade tables.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

use crate::upgrades::UpgradeKind;

/// Terrain flavor of a city, used by the presentation layer for backdrops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Plains,
    Hills,
    Coast,
    Desert,
}

impl Region {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plains => "plains",
            Self::Hills => "hills",
            Self::Coast => "coast",
            Self::Desert => "desert",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the travel graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: usize,
    pub name: String,
    pub region: Region,
    pub lat: f64,
    pub lon: f64,
}

/// Cost ladder and tooltip text for a single upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UpgradeSpec {
    pub costs: Vec<i64>,
    #[serde(default)]
    pub descriptions: Vec<String>,
}

impl UpgradeSpec {
    /// Highest reachable level: one per cost entry on top of the stock level.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.costs.len()).unwrap_or(u32::MAX - 1) + 1
    }

    /// Cost to move from `level` to `level + 1`, if any remains.
    #[must_use]
    pub fn cost_from(&self, level: u32) -> Option<i64> {
        let index = usize::try_from(level.max(1) - 1).ok()?;
        self.costs.get(index).copied()
    }

    /// Tooltip for the given level, if the catalog has one.
    #[must_use]
    pub fn description(&self, level: u32) -> Option<&str> {
        let index = usize::try_from(level.max(1) - 1).ok()?;
        self.descriptions.get(index).map(String::as_str)
    }
}

/// Errors raised when catalog data is unusable.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON could not be parsed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog must contain at least one city")]
    NoCities,
    #[error("city at position {index} declares id {id}")]
    CityIdMismatch { index: usize, id: usize },
    #[error("base speed must be positive (got {0:.2})")]
    BaseSpeed(f32),
    #[error("upgrade {0} has an empty cost table")]
    EmptyCosts(UpgradeKind),
}

/// Complete static catalog consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameCatalog {
    pub cities: Vec<City>,
    pub base_speed: f32,
    pub upgrades: BTreeMap<UpgradeKind, UpgradeSpec>,
}

impl GameCatalog {
    /// Load catalog data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the catalog fails validation.
    pub fn from_json(json_str: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json_str)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.cities.is_empty() {
            return Err(CatalogError::NoCities);
        }
        // City ids double as matrix indices.
        for (index, city) in self.cities.iter().enumerate() {
            if city.id != index {
                return Err(CatalogError::CityIdMismatch { index, id: city.id });
            }
        }
        if self.base_speed.is_nan() || self.base_speed <= 0.0 {
            return Err(CatalogError::BaseSpeed(self.base_speed));
        }
        for (kind, spec) in &self.upgrades {
            if spec.costs.is_empty() {
                return Err(CatalogError::EmptyCosts(*kind));
            }
        }
        Ok(())
    }

    /// Embedded catalog shipped with the crate.
    ///
    /// # Panics
    ///
    /// Panics if the embedded asset is invalid.
    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<GameCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            Self::from_json(include_str!("../assets/data/game.json"))
                .expect("valid embedded game catalog")
        })
    }

    #[must_use]
    pub fn city(&self, id: usize) -> Option<&City> {
        self.cities.get(id)
    }

    /// Display name for a city id, `"Unknown"` when out of range.
    #[must_use]
    pub fn city_name(&self, id: usize) -> &str {
        self.city(id).map_or("Unknown", |city| city.name.as_str())
    }

    #[must_use]
    pub fn upgrade(&self, kind: UpgradeKind) -> Option<&UpgradeSpec> {
        self.upgrades.get(&kind)
    }

    #[must_use]
    pub fn city_count(&self) -> usize {
        self.cities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_is_valid() {
        let catalog = GameCatalog::default_catalog();
        assert_eq!(catalog.city_count(), 6);
        assert!((catalog.base_speed - 60.0).abs() < f32::EPSILON);
        assert_eq!(catalog.upgrades.len(), UpgradeKind::ALL.len());
        assert_eq!(catalog.city_name(0), "Atlanta, GA");
        assert_eq!(catalog.city_name(99), "Unknown");
    }

    #[test]
    fn upgrade_spec_ladder() {
        let spec = UpgradeSpec {
            costs: vec![100, 200],
            descriptions: vec!["a".into(), "b".into(), "c".into()],
        };
        assert_eq!(spec.max_level(), 3);
        assert_eq!(spec.cost_from(1), Some(100));
        assert_eq!(spec.cost_from(2), Some(200));
        assert_eq!(spec.cost_from(3), None);
        assert_eq!(spec.description(3), Some("c"));
    }

    #[test]
    fn validation_rejects_bad_catalogs() {
        let no_cities = r#"{"cities":[],"baseSpeed":60,"upgrades":{}}"#;
        assert!(matches!(
            GameCatalog::from_json(no_cities),
            Err(CatalogError::NoCities)
        ));

        let bad_id = r#"{"cities":[{"id":3,"name":"X","region":"coast","lat":0,"lon":0}],
            "baseSpeed":60,"upgrades":{}}"#;
        assert!(matches!(
            GameCatalog::from_json(bad_id),
            Err(CatalogError::CityIdMismatch { index: 0, id: 3 })
        ));

        let empty_costs = r#"{"cities":[{"id":0,"name":"X","region":"coast","lat":0,"lon":0}],
            "baseSpeed":60,"upgrades":{"tank":{"costs":[]}}}"#;
        assert!(matches!(
            GameCatalog::from_json(empty_costs),
            Err(CatalogError::EmptyCosts(UpgradeKind::Tank))
        ));

        assert!(matches!(
            GameCatalog::from_json("not json"),
            Err(CatalogError::Json(_))
        ));
    }
}
