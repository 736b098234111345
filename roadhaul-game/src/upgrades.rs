//! Truck upgrades and the stat derivations they drive.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    ENGINE_SPEED_STEP, MITIGATION_STEP, TANK_BASE, TANK_STEP, VIOLATION_STEP,
};
use crate::data::GameCatalog;
use crate::error::{ActionError, ActionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    Engine,
    Transmission,
    Tires,
    Tank,
    Reefer,
    Aero,
    Suspension,
    Safety,
    Comfort,
}

impl UpgradeKind {
    pub const ALL: [Self; 9] = [
        Self::Engine,
        Self::Transmission,
        Self::Tires,
        Self::Tank,
        Self::Reefer,
        Self::Aero,
        Self::Suspension,
        Self::Safety,
        Self::Comfort,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Engine => "engine",
            Self::Transmission => "transmission",
            Self::Tires => "tires",
            Self::Tank => "tank",
            Self::Reefer => "reefer",
            Self::Aero => "aero",
            Self::Suspension => "suspension",
            Self::Safety => "safety",
            Self::Comfort => "comfort",
        }
    }
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpgradeKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

/// Purchased level per upgrade. Every upgrade starts at level 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Upgrades {
    levels: BTreeMap<UpgradeKind, u32>,
}

impl Default for Upgrades {
    fn default() -> Self {
        Self {
            levels: UpgradeKind::ALL.into_iter().map(|kind| (kind, 1)).collect(),
        }
    }
}

impl Upgrades {
    #[must_use]
    pub fn level(&self, kind: UpgradeKind) -> u32 {
        self.levels.get(&kind).copied().unwrap_or(1).max(1)
    }

    pub fn set_level(&mut self, kind: UpgradeKind, level: u32) {
        self.levels.insert(kind, level.max(1));
    }

    /// Iterate over every upgrade with its current level.
    pub fn iter(&self) -> impl Iterator<Item = (UpgradeKind, u32)> + '_ {
        UpgradeKind::ALL.into_iter().map(|kind| (kind, self.level(kind)))
    }

    /// Clamp restored levels into `[1, max_level]` and fill in missing entries.
    pub fn sanitize(&mut self, catalog: &GameCatalog) {
        for kind in UpgradeKind::ALL {
            let max = catalog.upgrade(kind).map_or(1, |spec| spec.max_level());
            let level = self.level(kind).clamp(1, max);
            self.levels.insert(kind, level);
        }
    }

    /// Cost of the next level, `None` at max level or for unknown upgrades.
    #[must_use]
    pub fn next_cost(&self, kind: UpgradeKind, catalog: &GameCatalog) -> Option<i64> {
        catalog.upgrade(kind)?.cost_from(self.level(kind))
    }

    /// Validate and apply a purchase against `money`, returning the new level.
    ///
    /// # Errors
    ///
    /// `UnknownTarget` for names missing from the catalog, `AlreadyAtLimit` at
    /// max level and `InsufficientFunds` when `money` is short. Neither money
    /// nor levels change on error.
    pub fn purchase(
        &mut self,
        name: &str,
        money: &mut i64,
        catalog: &GameCatalog,
    ) -> ActionResult<(UpgradeKind, u32)> {
        let unknown = || ActionError::UnknownTarget(name.to_string());
        let kind = UpgradeKind::from_str(name).map_err(|()| unknown())?;
        let spec = catalog.upgrade(kind).ok_or_else(unknown)?;
        let current = self.level(kind);
        let cost = spec.cost_from(current).ok_or(ActionError::AlreadyAtLimit)?;
        if *money < cost {
            return Err(ActionError::InsufficientFunds {
                needed: cost,
                available: *money,
            });
        }
        *money -= cost;
        let next = current + 1;
        self.levels.insert(kind, next);
        Ok((kind, next))
    }

    /// Fuel tank capacity for the current tank level.
    #[must_use]
    pub fn tank_capacity(&self) -> f32 {
        TANK_BASE * (1.0 + level_f32(self.level(UpgradeKind::Tank)) * TANK_STEP)
    }

    /// Cruising speed for the current engine level.
    #[must_use]
    pub fn speed(&self, base_speed: f32) -> f32 {
        base_speed * (1.0 + level_f32(self.level(UpgradeKind::Engine)) * ENGINE_SPEED_STEP)
    }

    /// Scale applied to road damage; better suspension absorbs more.
    #[must_use]
    pub fn durability_mitigation(&self) -> f32 {
        (1.0 - level_f32(self.level(UpgradeKind::Suspension)) * MITIGATION_STEP).max(0.0)
    }

    /// Chance that a DOT citation is written up against the current job.
    #[must_use]
    pub fn violation_chance(&self) -> f32 {
        (1.0 - level_f32(self.level(UpgradeKind::Tires)) * VIOLATION_STEP).max(0.0)
    }
}

#[allow(clippy::cast_precision_loss)]
fn level_f32(level: u32) -> f32 {
    level as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> &'static GameCatalog {
        GameCatalog::default_catalog()
    }

    #[test]
    fn defaults_start_at_level_one() {
        let upgrades = Upgrades::default();
        for (_, level) in upgrades.iter() {
            assert_eq!(level, 1);
        }
        assert_eq!(upgrades.next_cost(UpgradeKind::Engine, catalog()), Some(2000));
    }

    #[test]
    fn purchase_debits_and_levels_up() {
        let mut upgrades = Upgrades::default();
        let mut money = 5000;
        let (kind, level) = upgrades.purchase("tires", &mut money, catalog()).unwrap();
        assert_eq!(kind, UpgradeKind::Tires);
        assert_eq!(level, 2);
        assert_eq!(money, 4000);
        assert_eq!(upgrades.level(UpgradeKind::Tires), 2);
    }

    #[test]
    fn max_level_fails_without_mutation() {
        let mut upgrades = Upgrades::default();
        upgrades.set_level(UpgradeKind::Tires, 3);
        let mut money = 100_000;
        let err = upgrades.purchase("tires", &mut money, catalog()).unwrap_err();
        assert_eq!(err, ActionError::AlreadyAtLimit);
        assert_eq!(money, 100_000);
        assert_eq!(upgrades.level(UpgradeKind::Tires), 3);
    }

    #[test]
    fn insufficient_funds_fails_without_mutation() {
        let mut upgrades = Upgrades::default();
        let mut money = 1999;
        let err = upgrades.purchase("engine", &mut money, catalog()).unwrap_err();
        assert_eq!(
            err,
            ActionError::InsufficientFunds {
                needed: 2000,
                available: 1999
            }
        );
        assert_eq!(money, 1999);
        assert_eq!(upgrades.level(UpgradeKind::Engine), 1);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut upgrades = Upgrades::default();
        let mut money = 10_000;
        let err = upgrades.purchase("truck", &mut money, catalog()).unwrap_err();
        assert_eq!(err, ActionError::UnknownTarget("truck".into()));
        assert_eq!(money, 10_000);
    }

    #[test]
    fn tank_capacity_strictly_increases() {
        let mut upgrades = Upgrades::default();
        let mut last = 0.0;
        for level in 1..=3 {
            upgrades.set_level(UpgradeKind::Tank, level);
            let capacity = upgrades.tank_capacity();
            assert!(capacity > last);
            last = capacity;
        }
        upgrades.set_level(UpgradeKind::Tank, 1);
        assert!((upgrades.tank_capacity() - 138.0).abs() < 1e-3);
    }

    #[test]
    fn derivations_follow_levels() {
        let mut upgrades = Upgrades::default();
        assert!((upgrades.speed(60.0) - 66.0).abs() < 1e-3);
        assert!((upgrades.durability_mitigation() - 0.9).abs() < 1e-6);
        assert!((upgrades.violation_chance() - 0.9).abs() < 1e-6);
        upgrades.set_level(UpgradeKind::Engine, 5);
        assert!((upgrades.speed(60.0) - 90.0).abs() < 1e-3);
        upgrades.set_level(UpgradeKind::Suspension, 12);
        assert!(upgrades.durability_mitigation().abs() < f32::EPSILON);
    }

    #[test]
    fn sanitize_clamps_restored_levels() {
        let mut upgrades: Upgrades =
            serde_json::from_str(r#"{"engine": 99, "tank": 0}"#).unwrap();
        upgrades.sanitize(catalog());
        assert_eq!(upgrades.level(UpgradeKind::Engine), 5);
        assert_eq!(upgrades.level(UpgradeKind::Tank), 1);
        assert_eq!(upgrades.level(UpgradeKind::Comfort), 1);
    }

    #[test]
    fn serializes_as_flat_name_map() {
        let upgrades = Upgrades::default();
        let value = serde_json::to_value(&upgrades).unwrap();
        assert_eq!(value["engine"], 1);
        assert_eq!(value["comfort"], 1);
    }
}
