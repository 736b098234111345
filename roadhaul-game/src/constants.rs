//! Centralized balance and tuning constants for Roadhaul game logic.
//!
//! These values define the deterministic math for the core simulation.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through the
//! JSON catalog (which only carries cities and upgrade tables).

// Distance index ------------------------------------------------------------
pub(crate) const EARTH_RADIUS_MILES: f64 = 3958.8;
pub(crate) const ROAD_MULT_BASE: f64 = 1.15;
pub(crate) const ROAD_MULT_STEP: f64 = 0.01;
pub(crate) const ROAD_MULT_CYCLE: usize = 11;
pub(crate) const MIN_LEG_MILES: f64 = 80.0;
pub(crate) const FALLBACK_DISTANCE_MILES: u32 = 300;

// Job board -----------------------------------------------------------------
pub(crate) const JOBS_PER_CITY: usize = 4;
pub(crate) const MED_RATE: f64 = 1.3;
pub(crate) const LIGHT_RATE: f64 = 1.1;

// Player defaults -----------------------------------------------------------
pub(crate) const START_MONEY: i64 = 800;
pub(crate) const START_REPUTATION: f32 = 50.0;
pub(crate) const START_FUEL: f32 = 120.0;
pub(crate) const STAT_MAX: f32 = 100.0;

// Truck derivations ---------------------------------------------------------
pub(crate) const TANK_BASE: f32 = 120.0;
pub(crate) const TANK_STEP: f32 = 0.15;
pub(crate) const ENGINE_SPEED_STEP: f32 = 0.10;
pub(crate) const MITIGATION_STEP: f32 = 0.10;
pub(crate) const VIOLATION_STEP: f32 = 0.10;
pub(crate) const FUEL_PER_MILE: f32 = 0.04;

// Fuel economy --------------------------------------------------------------
pub(crate) const CITY_REFUEL_COST: i64 = 50;
pub(crate) const ROADSIDE_REFUEL_COST: i64 = 250;
pub(crate) const ROADSIDE_REFUEL_FRACTION: f32 = 0.25;
pub(crate) const STRANDED_FUEL_FRACTION: f32 = 0.10;

// Event system --------------------------------------------------------------
pub(crate) const EVENT_INTERVAL_MIN: f32 = 15.0;
pub(crate) const EVENT_INTERVAL_MAX: f32 = 25.0;
pub(crate) const EVENT_CHANCE_DOT: f32 = 0.05;
pub(crate) const EVENT_CHANCE_BREAKDOWN: f32 = 0.18;
pub(crate) const EVENT_CHANCE_TIRE: f32 = 0.12;
pub(crate) const EVENT_CHANCE_WEATHER: f32 = 0.20;
pub(crate) const EVENT_CHANCE_BONUS: f32 = 0.07;
pub(crate) const ENGINE_DAMAGE_MIN: i32 = 5;
pub(crate) const ENGINE_DAMAGE_MAX: i32 = 15;
pub(crate) const ENGINE_DAMAGE_COST: i64 = 10;
pub(crate) const TIRE_DAMAGE_MIN: i32 = 8;
pub(crate) const TIRE_DAMAGE_MAX: i32 = 20;
pub(crate) const TIRE_DAMAGE_COST: i64 = 7;
pub(crate) const BONUS_MIN: i64 = 20;
pub(crate) const BONUS_MAX: i64 = 80;

// Roadside breakdowns -------------------------------------------------------
pub(crate) const BREAKDOWN_CHECK_INTERVAL: f32 = 8.0;
pub(crate) const BREAKDOWN_CHANCE: f32 = 0.015;
pub(crate) const ROADSIDE_BASE_COST: f64 = 180.0;
pub(crate) const ROADSIDE_MILE_FACTOR: f64 = 0.08;
pub(crate) const ROADSIDE_DISTANCE_CAP: f64 = 400.0;
pub(crate) const ROADSIDE_MIN_COST: i64 = 90;

// DOT wheel -----------------------------------------------------------------
pub(crate) const DOT_SPIN_BASE_SECS: f32 = 2.4;
pub(crate) const DOT_SPIN_JITTER_SECS: f32 = 0.5;
pub(crate) const DOT_REP_BYPASS: f32 = 6.0;
pub(crate) const DOT_REP_WARNING: f32 = 4.0;
pub(crate) const DOT_REP_OUT_OF_SERVICE: f32 = 10.0;
pub(crate) const DOT_TICKET_MIN: i64 = 80;
pub(crate) const DOT_TICKET_SPREAD: i64 = 120;
pub(crate) const DOT_BONUS_MIN: i64 = 120;
pub(crate) const DOT_BONUS_SPREAD: i64 = 180;
pub(crate) const DOT_OOS_MIN: i64 = 200;
pub(crate) const DOT_OOS_SPREAD: i64 = 300;

// Status line durations (seconds) -------------------------------------------
pub(crate) const MSG_SHORT: f32 = 2.0;
pub(crate) const MSG_UPGRADE: f32 = 2.5;
pub(crate) const MSG_NORMAL: f32 = 3.0;
pub(crate) const MSG_LONG: f32 = 4.0;

// Persistence ---------------------------------------------------------------
pub(crate) const SAVE_VERSION: u32 = 1;
pub(crate) const UPGRADES_KEY: &str = "roadhaul.upgrades.v1";
pub(crate) const SLOT_KEY_PREFIX: &str = "roadhaul.save.";
pub(crate) const AUTOSAVE_SLOT: &str = "slot1";
