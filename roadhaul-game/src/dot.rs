//! DOT inspection wheel.
//!
//! The wheel is a three-phase machine: `Idle` (overlay shown, waiting for a
//! spin), `Spinning` (outcome already decided, animation running) and
//! `AwaitingCollect` (effect applied, waiting for the player to close it).
//! The spin animation never influences the outcome.
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DOT_BONUS_MIN, DOT_BONUS_SPREAD, DOT_OOS_MIN, DOT_OOS_SPREAD, DOT_REP_BYPASS,
    DOT_REP_OUT_OF_SERVICE, DOT_REP_WARNING, DOT_SPIN_BASE_SECS, DOT_SPIN_JITTER_SECS,
    DOT_TICKET_MIN, DOT_TICKET_SPREAD,
};
use crate::error::{ActionError, ActionResult};
use crate::stats::PlayerStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DotEffect {
    RepPlus,
    DelayMinor,
    DelayMajor,
    RepMinus,
    Fine,
    BonusCash,
    Nuisance,
    BigPenalty,
}

impl DotEffect {
    /// Outcomes that can put a violation on the driver's record.
    #[must_use]
    pub const fn can_flag_violation(self) -> bool {
        matches!(self, Self::RepMinus | Self::Fine | Self::BigPenalty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DotOutcome {
    pub name: &'static str,
    pub effect: DotEffect,
    pub weight: u32,
    pub desc: &'static str,
}

pub const DOT_OUTCOMES: [DotOutcome; 8] = [
    DotOutcome {
        name: "BYPASS",
        effect: DotEffect::RepPlus,
        weight: 25,
        desc: "Bypass granted. Smooth sailing.",
    },
    DotOutcome {
        name: "LEVEL 2",
        effect: DotEffect::DelayMinor,
        weight: 20,
        desc: "Minor inspection. Light delay.",
    },
    DotOutcome {
        name: "LEVEL 1",
        effect: DotEffect::DelayMajor,
        weight: 15,
        desc: "Full inspection. Major delay risk.",
    },
    DotOutcome {
        name: "WARNING",
        effect: DotEffect::RepMinus,
        weight: 15,
        desc: "Written warning on file.",
    },
    DotOutcome {
        name: "TICKET",
        effect: DotEffect::Fine,
        weight: 10,
        desc: "Citation issued. Wallet hit.",
    },
    DotOutcome {
        name: "BONUS PAY",
        effect: DotEffect::BonusCash,
        weight: 5,
        desc: "DOT loves you. Bonus payout.",
    },
    DotOutcome {
        name: "CHECKPOINT",
        effect: DotEffect::Nuisance,
        weight: 5,
        desc: "Random checkpoint. Time wasted.",
    },
    DotOutcome {
        name: "OUT OF SERVICE",
        effect: DotEffect::BigPenalty,
        weight: 5,
        desc: "Out-of-service order. Big trouble.",
    },
];

/// Weighted random selection from a list of options
pub fn weighted_pick<T, R>(options: &[(T, u32)], rng: &mut R) -> Option<T>
where
    R: Rng + ?Sized,
    T: Clone,
{
    let total_weight: u32 = options.iter().map(|(_, weight)| *weight).sum();
    if total_weight == 0 {
        return None;
    }

    let mut roll = rng.gen_range(0..total_weight);
    for (item, weight) in options {
        if roll < *weight {
            return Some(item.clone());
        }
        roll -= weight;
    }
    options.first().map(|(item, _)| item.clone())
}

/// Index into [`DOT_OUTCOMES`] drawn by weight.
pub fn pick_outcome<R: Rng + ?Sized>(rng: &mut R) -> usize {
    let options: Vec<(usize, u32)> = DOT_OUTCOMES
        .iter()
        .enumerate()
        .map(|(index, outcome)| (index, outcome.weight))
        .collect();
    weighted_pick(&options, rng).unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DotPhase {
    #[default]
    Idle,
    Spinning,
    AwaitingCollect,
}

/// Applied outcome, kept until the player collects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotResult {
    pub outcome: DotOutcome,
    pub money_delta: i64,
    pub message: String,
    pub violation: bool,
}

/// Apply an outcome's stat effect. Money and reputation clamp like every other mutator.
pub fn apply_outcome<R: Rng + ?Sized>(
    outcome: DotOutcome,
    stats: &mut PlayerStats,
    rng: &mut R,
) -> (i64, String) {
    match outcome.effect {
        DotEffect::RepPlus => {
            stats.adjust_reputation(DOT_REP_BYPASS);
            (0, "Bypass: DOT rep boosted.".to_string())
        }
        DotEffect::DelayMinor => (0, "Minor inspection: short delay.".to_string()),
        DotEffect::DelayMajor => (0, "Level 1 inspection: big delay.".to_string()),
        DotEffect::RepMinus => {
            stats.adjust_reputation(-DOT_REP_WARNING);
            (0, "Warning on file. Watch it.".to_string())
        }
        DotEffect::Fine => {
            let fine = DOT_TICKET_MIN + rng.gen_range(0..DOT_TICKET_SPREAD);
            let taken = stats.debit(fine);
            (-taken, format!("Ticket issued: -${fine}"))
        }
        DotEffect::BonusCash => {
            let bonus = DOT_BONUS_MIN + rng.gen_range(0..DOT_BONUS_SPREAD);
            stats.credit(bonus);
            (bonus, format!("DOT bonus payout: +${bonus}"))
        }
        DotEffect::Nuisance => (0, "Checkpoint only. Time wasted, no ticket.".to_string()),
        DotEffect::BigPenalty => {
            let fine = DOT_OOS_MIN + rng.gen_range(0..DOT_OOS_SPREAD);
            let taken = stats.debit(fine);
            stats.adjust_reputation(-DOT_REP_OUT_OF_SERVICE);
            (-taken, format!("Out-of-service penalty: -${fine}"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DotWheel {
    open: bool,
    phase: DotPhase,
    chosen: Option<usize>,
    spin_time: f32,
    spin_duration: f32,
    extra_turns: f32,
    result: Option<DotResult>,
}

impl DotWheel {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub const fn phase(&self) -> DotPhase {
        self.phase
    }

    /// Outcome decided for the current spin, if any.
    #[must_use]
    pub fn chosen(&self) -> Option<DotOutcome> {
        self.chosen.map(|index| DOT_OUTCOMES[index])
    }

    #[must_use]
    pub const fn result(&self) -> Option<&DotResult> {
        self.result.as_ref()
    }

    /// Show the wheel, waiting for a spin.
    pub fn open(&mut self) {
        *self = Self {
            open: true,
            ..Self::default()
        };
    }

    /// Decide the outcome and start the animation.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the wheel is closed, already spinning, or holding an
    /// uncollected result.
    pub fn spin<R: Rng + ?Sized>(&mut self, rng: &mut R) -> ActionResult {
        if !self.open || self.phase != DotPhase::Idle {
            return Err(ActionError::InvalidState);
        }
        let index = pick_outcome(rng);
        self.chosen = Some(index);
        self.spin_time = 0.0;
        self.spin_duration = DOT_SPIN_BASE_SECS + rng.gen_range(0.0..DOT_SPIN_JITTER_SECS);
        self.extra_turns = 4.0 + rng.gen_range(0.0..2.0);
        self.phase = DotPhase::Spinning;
        debug!("dot wheel spinning toward {}", DOT_OUTCOMES[index].name);
        Ok(())
    }

    /// Advance the animation. When it completes, apply the effect and roll
    /// the violation check with `violation_chance`.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        stats: &mut PlayerStats,
        violation_chance: f32,
        rng: &mut R,
    ) -> Option<&DotResult> {
        if !self.open || self.phase != DotPhase::Spinning {
            return None;
        }
        self.spin_time += dt;
        if self.spin_time < self.spin_duration {
            return None;
        }
        self.spin_time = self.spin_duration;
        let outcome = DOT_OUTCOMES[self.chosen.unwrap_or(0)];
        let (money_delta, message) = apply_outcome(outcome, stats, rng);
        let violation =
            outcome.effect.can_flag_violation() && rng.r#gen::<f32>() < violation_chance;
        self.phase = DotPhase::AwaitingCollect;
        self.result = Some(DotResult {
            outcome,
            money_delta,
            message,
            violation,
        });
        self.result.as_ref()
    }

    /// Close the wheel after the result has been shown.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless a result is waiting to be collected.
    pub fn collect(&mut self) -> ActionResult<DotResult> {
        if self.phase != DotPhase::AwaitingCollect {
            return Err(ActionError::InvalidState);
        }
        let result = self.result.take().ok_or(ActionError::InvalidState)?;
        *self = Self::default();
        Ok(result)
    }

    /// Drop all transient state and hide the wheel.
    pub fn close(&mut self) {
        *self = Self::default();
    }

    /// Spin completion in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        match self.phase {
            DotPhase::Idle => 0.0,
            DotPhase::AwaitingCollect => 1.0,
            DotPhase::Spinning if self.spin_duration > 0.0 => {
                (self.spin_time / self.spin_duration).clamp(0.0, 1.0)
            }
            DotPhase::Spinning => 0.0,
        }
    }

    /// Wheel rotation in radians for renderers: eased toward the slice of the
    /// chosen outcome under a 12 o'clock pointer.
    #[must_use]
    pub fn angle(&self) -> f32 {
        let Some(index) = self.chosen else {
            return 0.0;
        };
        let slice = std::f32::consts::TAU / DOT_OUTCOMES.len() as f32;
        #[allow(clippy::cast_precision_loss)]
        let base = -std::f32::consts::FRAC_PI_2 - index as f32 * slice;
        let target = base + self.extra_turns * std::f32::consts::TAU;
        let t = self.progress();
        target * (1.0 - (1.0 - t).powi(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rand::rngs::mock::StepRng;

    #[test]
    fn outcome_weights_sum_to_hundred() {
        let total: u32 = DOT_OUTCOMES.iter().map(|o| o.weight).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn weighted_pick_zero_roll_takes_first() {
        let options = vec![("a", 2), ("b", 1)];
        let mut rng = StepRng::new(0, 0);
        assert_eq!(weighted_pick(&options, &mut rng), Some("a"));
        let empty: Vec<(&str, u32)> = vec![("x", 0)];
        assert_eq!(weighted_pick(&empty, &mut rng), None);
    }

    #[test]
    fn spin_requires_open_idle_wheel() {
        let mut wheel = DotWheel::default();
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(wheel.spin(&mut rng), Err(ActionError::InvalidState));
        wheel.open();
        assert!(wheel.spin(&mut rng).is_ok());
        assert_eq!(wheel.phase(), DotPhase::Spinning);
        let chosen = wheel.chosen();
        assert_eq!(wheel.spin(&mut rng), Err(ActionError::InvalidState));
        assert_eq!(wheel.chosen(), chosen);
    }

    #[test]
    fn completed_spin_blocks_new_spin_until_collected() {
        let mut wheel = DotWheel::default();
        let mut rng = SmallRng::seed_from_u64(2);
        let mut stats = PlayerStats::default();
        wheel.open();
        wheel.spin(&mut rng).unwrap();
        assert_eq!(wheel.collect(), Err(ActionError::InvalidState));
        assert!(wheel.tick(1.0, &mut stats, 0.0, &mut rng).is_none());
        let result = wheel.tick(5.0, &mut stats, 0.0, &mut rng).cloned().unwrap();
        assert_eq!(Some(result.outcome), wheel.chosen());
        assert_eq!(wheel.phase(), DotPhase::AwaitingCollect);
        assert_eq!(wheel.spin(&mut rng), Err(ActionError::InvalidState));
        let collected = wheel.collect().unwrap();
        assert_eq!(collected, result);
        assert!(!wheel.is_open());
        assert_eq!(wheel.phase(), DotPhase::Idle);
    }

    #[test]
    fn bypass_boosts_reputation() {
        let mut stats = PlayerStats::default();
        let mut rng = StepRng::new(0, 0);
        let (delta, _) = apply_outcome(DOT_OUTCOMES[0], &mut stats, &mut rng);
        assert_eq!(delta, 0);
        assert!((stats.dot_reputation - 56.0).abs() < f32::EPSILON);
    }

    #[test]
    fn out_of_service_fines_and_clamps() {
        let mut stats = PlayerStats {
            money: 50,
            dot_reputation: 4.0,
            ..PlayerStats::default()
        };
        let mut rng = SmallRng::seed_from_u64(8);
        let (delta, message) = apply_outcome(DOT_OUTCOMES[7], &mut stats, &mut rng);
        assert_eq!(delta, -50);
        assert_eq!(stats.money, 0);
        assert!(stats.dot_reputation.abs() < f32::EPSILON);
        assert!(message.starts_with("Out-of-service penalty"));
    }

    #[test]
    fn ticket_fine_within_range() {
        let mut rng = SmallRng::seed_from_u64(21);
        for _ in 0..100 {
            let mut stats = PlayerStats {
                money: 10_000,
                ..PlayerStats::default()
            };
            let (delta, _) = apply_outcome(DOT_OUTCOMES[4], &mut stats, &mut rng);
            assert!((80..200).contains(&-delta));
        }
    }

    #[test]
    fn violation_only_for_eligible_outcomes() {
        assert!(!DotEffect::RepPlus.can_flag_violation());
        assert!(!DotEffect::BonusCash.can_flag_violation());
        assert!(DotEffect::RepMinus.can_flag_violation());
        assert!(DotEffect::Fine.can_flag_violation());
        assert!(DotEffect::BigPenalty.can_flag_violation());
    }

    #[test]
    fn angle_and_progress_track_animation() {
        let mut wheel = DotWheel::default();
        wheel.open();
        assert!(wheel.angle().abs() < f32::EPSILON);
        let mut rng = SmallRng::seed_from_u64(4);
        wheel.spin(&mut rng).unwrap();
        let mut stats = PlayerStats::default();
        wheel.tick(1.0, &mut stats, 0.0, &mut rng);
        let mid = wheel.progress();
        assert!(mid > 0.0 && mid < 1.0);
        wheel.tick(5.0, &mut stats, 0.0, &mut rng);
        assert!((wheel.progress() - 1.0).abs() < f32::EPSILON);
    }
}
