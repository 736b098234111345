//! Roadside breakdowns that halt the truck until the player pays or walks away.
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    BREAKDOWN_CHANCE, BREAKDOWN_CHECK_INTERVAL, ROADSIDE_BASE_COST, ROADSIDE_DISTANCE_CAP,
    ROADSIDE_MILE_FACTOR, ROADSIDE_MIN_COST,
};
use crate::error::{ActionError, ActionResult};
use crate::stats::PlayerStats;

pub const BREAKDOWN_DESCRIPTIONS: [&str; 4] = [
    "Engine trouble detected. Power loss imminent.",
    "Tire blowout! Truck shudders to a halt.",
    "Electrical issue: dashboard flickers wildly.",
    "Coolant leak spotted. Temperature spiking.",
];

/// Roadside service quote; grows with the miles still ahead, within bounds.
#[must_use]
pub fn roadside_cost(miles_left: f32) -> i64 {
    let distance_factor =
        (f64::from(miles_left.max(0.0)) * ROADSIDE_MILE_FACTOR).min(ROADSIDE_DISTANCE_CAP);
    #[allow(clippy::cast_possible_truncation)]
    let quote = (ROADSIDE_BASE_COST + distance_factor).round() as i64;
    quote.max(ROADSIDE_MIN_COST)
}

/// What the driving loop should know about the breakdown check this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakdownNotice {
    pub description: String,
    pub cost: i64,
}

/// Persistent breakdown subsystem state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownState {
    pub active: bool,
    pub timer: f32,
    pub pending_cost: i64,
    #[serde(default)]
    pub description: String,
}

impl BreakdownState {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub const fn reset_timer(&mut self) {
        self.timer = 0.0;
    }

    /// Run the periodic check. `on_trip` is true while driving with a job;
    /// `dot_active` blocks the check while an inspection is open.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        on_trip: bool,
        dot_active: bool,
        miles_left: f32,
        rng: &mut R,
    ) -> Option<BreakdownNotice> {
        if dot_active || self.active {
            return None;
        }
        if !on_trip {
            self.reset_timer();
            return None;
        }
        self.timer += dt;
        if self.timer < BREAKDOWN_CHECK_INTERVAL {
            return None;
        }
        self.timer = 0.0;
        if rng.r#gen::<f32>() < BREAKDOWN_CHANCE {
            return self.trigger(miles_left, rng);
        }
        None
    }

    /// Start a breakdown. Ignored while one is already pending.
    pub fn trigger<R: Rng + ?Sized>(
        &mut self,
        miles_left: f32,
        rng: &mut R,
    ) -> Option<BreakdownNotice> {
        if self.active {
            return None;
        }
        let pick = rng.gen_range(0..BREAKDOWN_DESCRIPTIONS.len());
        let description = BREAKDOWN_DESCRIPTIONS[pick];
        self.active = true;
        self.pending_cost = roadside_cost(miles_left);
        self.description = description.to_string();
        debug!("breakdown triggered, quote ${}", self.pending_cost);
        Some(BreakdownNotice {
            description: self.description.clone(),
            cost: self.pending_cost,
        })
    }

    /// Pay for roadside service, returning the amount paid.
    ///
    /// # Errors
    ///
    /// `InvalidState` when no breakdown is pending, `InsufficientFunds` when
    /// the quote is unaffordable. The breakdown stays active on error.
    pub fn settle(&mut self, stats: &mut PlayerStats) -> ActionResult<i64> {
        if !self.active {
            return Err(ActionError::InvalidState);
        }
        let cost = self.pending_cost;
        if !stats.can_afford(cost) {
            return Err(ActionError::InsufficientFunds {
                needed: cost,
                available: stats.money,
            });
        }
        stats.debit(cost);
        self.clear();
        Ok(cost)
    }

    /// Drop the pending breakdown without paying.
    pub fn clear(&mut self) {
        self.active = false;
        self.pending_cost = 0;
        self.description.clear();
    }
}
