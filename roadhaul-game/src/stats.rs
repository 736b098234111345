//! Player stats and road weather
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{START_FUEL, START_MONEY, START_REPUTATION, STAT_MAX};

/// Weather on the current leg. Cosmetic apart from the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Storm,
    Fog,
}

impl Weather {
    pub const ALL: [Self; 4] = [Self::Clear, Self::Rain, Self::Storm, Self::Fog];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Rain => "rain",
            Self::Storm => "storm",
            Self::Fog => "fog",
        }
    }

    /// Uniform draw over every weather state.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable player aggregate. All mutators clamp to the valid range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStats {
    pub money: i64,
    pub jobs_delivered: u32,
    pub truck_health: f32,
    pub engine_health: f32,
    pub tire_health: f32,
    pub dot_reputation: f32,
    pub fuel: f32,
    pub active_weather: Weather,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            money: START_MONEY,
            jobs_delivered: 0,
            truck_health: STAT_MAX,
            engine_health: STAT_MAX,
            tire_health: STAT_MAX,
            dot_reputation: START_REPUTATION,
            fuel: START_FUEL,
            active_weather: Weather::Clear,
        }
    }
}

fn clamp_stat(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, STAT_MAX)
}

impl PlayerStats {
    /// Add (or with a negative amount remove) money, never dropping below zero.
    pub fn adjust_money(&mut self, delta: i64) {
        self.money = self.money.saturating_add(delta).max(0);
    }

    pub fn credit(&mut self, amount: i64) {
        self.adjust_money(amount.max(0));
    }

    /// Remove money, clamping at zero. Returns the amount actually taken.
    pub fn debit(&mut self, amount: i64) -> i64 {
        let before = self.money;
        self.adjust_money(-amount.max(0));
        before - self.money
    }

    #[must_use]
    pub const fn can_afford(&self, amount: i64) -> bool {
        self.money >= amount
    }

    pub fn damage_engine(&mut self, amount: f32) {
        self.engine_health = clamp_stat(self.engine_health - amount);
    }

    pub fn damage_tires(&mut self, amount: f32) {
        self.tire_health = clamp_stat(self.tire_health - amount);
    }

    pub fn adjust_reputation(&mut self, delta: f32) {
        self.dot_reputation = clamp_stat(self.dot_reputation + delta);
    }

    /// Burn fuel, stopping at an empty tank.
    pub fn burn_fuel(&mut self, amount: f32) {
        self.fuel = (self.fuel - amount).max(0.0);
    }

    pub fn set_fuel(&mut self, fuel: f32, capacity: f32) {
        self.fuel = if fuel.is_nan() { 0.0 } else { fuel.clamp(0.0, capacity.max(0.0)) };
    }

    /// Re-apply every range after a restore or a capacity change.
    pub fn sanitize(&mut self, tank_capacity: f32) {
        self.money = self.money.max(0);
        self.truck_health = clamp_stat(self.truck_health);
        self.engine_health = clamp_stat(self.engine_health);
        self.tire_health = clamp_stat(self.tire_health);
        self.dot_reputation = clamp_stat(self.dot_reputation);
        self.set_fuel(self.fuel, tank_capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn defaults_match_new_career() {
        let stats = PlayerStats::default();
        assert_eq!(stats.money, 800);
        assert_eq!(stats.jobs_delivered, 0);
        assert!((stats.dot_reputation - 50.0).abs() < f32::EPSILON);
        assert!((stats.fuel - 120.0).abs() < f32::EPSILON);
        assert_eq!(stats.active_weather, Weather::Clear);
    }

    #[test]
    fn money_never_goes_negative() {
        let mut stats = PlayerStats {
            money: 30,
            ..PlayerStats::default()
        };
        assert_eq!(stats.debit(100), 30);
        assert_eq!(stats.money, 0);
        stats.credit(-5);
        assert_eq!(stats.money, 0);
    }

    #[test]
    fn health_and_reputation_clamp() {
        let mut stats = PlayerStats::default();
        stats.damage_engine(250.0);
        stats.damage_tires(-30.0);
        stats.adjust_reputation(80.0);
        assert!(stats.engine_health.abs() < f32::EPSILON);
        assert!((stats.tire_health - 100.0).abs() < f32::EPSILON);
        assert!((stats.dot_reputation - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn fuel_clamps_to_tank() {
        let mut stats = PlayerStats::default();
        stats.burn_fuel(500.0);
        assert!(stats.fuel.abs() < f32::EPSILON);
        stats.set_fuel(999.0, 138.0);
        assert!((stats.fuel - 138.0).abs() < f32::EPSILON);
        stats.fuel = f32::NAN;
        stats.sanitize(138.0);
        assert!(stats.fuel.abs() < f32::EPSILON);
    }

    #[test]
    fn weather_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Weather::Fog).unwrap(), "\"fog\"");
        let mut rng = StepRng::new(0, 0);
        assert_eq!(Weather::random(&mut rng), Weather::Clear);
    }
}
