//! Timer-driven random road events.
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    BONUS_MAX, BONUS_MIN, ENGINE_DAMAGE_COST, ENGINE_DAMAGE_MAX, ENGINE_DAMAGE_MIN,
    EVENT_CHANCE_BONUS, EVENT_CHANCE_BREAKDOWN, EVENT_CHANCE_DOT, EVENT_CHANCE_TIRE,
    EVENT_CHANCE_WEATHER, EVENT_INTERVAL_MAX, EVENT_INTERVAL_MIN, TIRE_DAMAGE_COST,
    TIRE_DAMAGE_MAX, TIRE_DAMAGE_MIN,
};
use crate::stats::{PlayerStats, Weather};

/// Per-roll chances, evaluated in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventChances {
    pub dot: f32,
    pub breakdown: f32,
    pub tire: f32,
    pub weather: f32,
    pub bonus: f32,
}

impl Default for EventChances {
    fn default() -> Self {
        Self {
            dot: EVENT_CHANCE_DOT,
            breakdown: EVENT_CHANCE_BREAKDOWN,
            tire: EVENT_CHANCE_TIRE,
            weather: EVENT_CHANCE_WEATHER,
            bonus: EVENT_CHANCE_BONUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(default = "EventConfig::default_interval_min")]
    pub interval_min: f32,
    #[serde(default = "EventConfig::default_interval_max")]
    pub interval_max: f32,
    #[serde(default)]
    pub chances: EventChances,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            interval_min: Self::default_interval_min(),
            interval_max: Self::default_interval_max(),
            chances: EventChances::default(),
        }
    }
}

impl EventConfig {
    const fn default_interval_min() -> f32 {
        EVENT_INTERVAL_MIN
    }

    const fn default_interval_max() -> f32 {
        EVENT_INTERVAL_MAX
    }

    /// Repair inverted or non-positive intervals and out-of-range chances.
    pub fn sanitize(&mut self) {
        self.interval_min = self.interval_min.max(0.1);
        if self.interval_max < self.interval_min {
            self.interval_max = self.interval_min;
        }
        for chance in [
            &mut self.chances.dot,
            &mut self.chances.breakdown,
            &mut self.chances.tire,
            &mut self.chances.weather,
            &mut self.chances.bonus,
        ] {
            *chance = chance.clamp(0.0, 1.0);
        }
    }

    fn sample_interval<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.interval_max <= self.interval_min {
            return self.interval_min;
        }
        rng.gen_range(self.interval_min..self.interval_max)
    }
}

/// Outcome of a successful event roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadEvent {
    DotCheck,
    EngineTrouble { damage: i32, cost: i64 },
    TireDamage { damage: i32, cost: i64 },
    WeatherShift(Weather),
    Bonus(i64),
}

impl RoadEvent {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::DotCheck => "Random DOT check!".to_string(),
            Self::EngineTrouble { damage, .. } => format!("Engine hiccup -{damage}%"),
            Self::TireDamage { damage, .. } => format!("Tire damage -{damage}%"),
            Self::WeatherShift(_) => "Weather changed".to_string(),
            Self::Bonus(amount) => format!("Bonus: +${amount}"),
        }
    }
}

/// Interval timer for road events.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSystem {
    config: EventConfig,
    timer: f32,
    next_event_in: f32,
}

impl EventSystem {
    pub fn new<R: Rng + ?Sized>(mut config: EventConfig, rng: &mut R) -> Self {
        config.sanitize();
        let next_event_in = config.sample_interval(rng);
        Self {
            config,
            timer: 0.0,
            next_event_in,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EventConfig {
        &self.config
    }

    #[must_use]
    pub const fn timer(&self) -> f32 {
        self.timer
    }

    #[must_use]
    pub const fn next_event_in(&self) -> f32 {
        self.next_event_in
    }

    /// Restart the countdown, e.g. when a new trip begins.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.timer = 0.0;
        self.next_event_in = self.config.sample_interval(rng);
    }

    /// Advance the timer; when it elapses, roll and apply one event.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        stats: &mut PlayerStats,
        mitigation: f32,
        rng: &mut R,
    ) -> Option<RoadEvent> {
        self.timer += dt;
        if self.timer < self.next_event_in {
            return None;
        }
        self.reset(rng);
        let event = roll_event(&self.config.chances, rng)?;
        Some(apply_event(event, stats, mitigation, rng))
    }
}

/// Which event kind fires this round, before magnitudes are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Dot,
    Breakdown,
    Tire,
    Weather,
    Bonus,
}

/// Independent draws in priority order; the first success wins, so later
/// kinds fire less often than their nominal chance.
pub fn roll_event<R: Rng + ?Sized>(chances: &EventChances, rng: &mut R) -> Option<EventKind> {
    let ladder = [
        (EventKind::Dot, chances.dot),
        (EventKind::Breakdown, chances.breakdown),
        (EventKind::Tire, chances.tire),
        (EventKind::Weather, chances.weather),
        (EventKind::Bonus, chances.bonus),
    ];
    for (kind, chance) in ladder {
        if rng.r#gen::<f32>() < chance {
            debug!("road event rolled: {kind:?}");
            return Some(kind);
        }
    }
    None
}

fn mitigated(raw: i32, mitigation: f32) -> i32 {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let scaled = (raw as f32 * mitigation).round() as i32;
    scaled.max(1)
}

/// Draw magnitudes and apply the stat effect of `kind`. Money debits clamp at zero.
pub fn apply_event<R: Rng + ?Sized>(
    kind: EventKind,
    stats: &mut PlayerStats,
    mitigation: f32,
    rng: &mut R,
) -> RoadEvent {
    match kind {
        EventKind::Dot => RoadEvent::DotCheck,
        EventKind::Breakdown => {
            let damage = mitigated(
                rng.gen_range(ENGINE_DAMAGE_MIN..ENGINE_DAMAGE_MAX),
                mitigation,
            );
            stats.damage_engine(damage as f32);
            let cost = stats.debit(i64::from(damage) * ENGINE_DAMAGE_COST);
            RoadEvent::EngineTrouble { damage, cost }
        }
        EventKind::Tire => {
            let damage = mitigated(
                rng.gen_range(TIRE_DAMAGE_MIN..TIRE_DAMAGE_MAX),
                mitigation,
            );
            stats.damage_tires(damage as f32);
            let cost = stats.debit(i64::from(damage) * TIRE_DAMAGE_COST);
            RoadEvent::TireDamage { damage, cost }
        }
        EventKind::Weather => {
            let weather = Weather::random(rng);
            stats.active_weather = weather;
            RoadEvent::WeatherShift(weather)
        }
        EventKind::Bonus => {
            let amount = rng.gen_range(BONUS_MIN..BONUS_MAX);
            stats.credit(amount);
            RoadEvent::Bonus(amount)
        }
    }
}
