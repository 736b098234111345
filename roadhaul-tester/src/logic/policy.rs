use std::fmt;

use clap::ValueEnum;
use roadhaul_game::{DotPhase, GameMode, GameSession, Job, UpgradeKind};

/// One player input chosen by a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PressStart,
    TakeJob(usize),
    Refuel,
    Upgrade(UpgradeKind),
    PayBreakdown,
    Abandon,
    SpinDot,
    CollectDot,
    Wait,
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Choose the next input for the session.
    fn decide(&mut self, session: &GameSession) -> Action;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum GameplayStrategy {
    /// Short hauls, full tanks, durability upgrades
    Cautious,
    /// Best payout, minimal fuel stops, no upgrades
    Greedy,
    /// Payout per mile, speed and tank upgrades
    Balanced,
}

impl GameplayStrategy {
    pub const ALL: [Self; 3] = [Self::Cautious, Self::Greedy, Self::Balanced];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Greedy => "Greedy",
            Self::Balanced => "Balanced",
        }
    }

    #[must_use]
    pub fn create_policy(self) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Greedy => Box::new(GreedyPolicy),
            Self::Balanced => Box::new(BalancedPolicy),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CautiousPolicy;
struct GreedyPolicy;
struct BalancedPolicy;

/// Inputs every policy answers the same way.
fn forced_action(session: &GameSession) -> Option<Action> {
    match session.mode() {
        GameMode::Start => Some(Action::PressStart),
        GameMode::DotCheck => Some(match session.dot().phase() {
            DotPhase::Idle => Action::SpinDot,
            DotPhase::Spinning => Action::Wait,
            DotPhase::AwaitingCollect => Action::CollectDot,
        }),
        GameMode::Driving if !session.breakdown().is_active() => Some(Action::Wait),
        GameMode::Driving | GameMode::City => None,
    }
}

fn handle_breakdown(session: &GameSession, max_cost: i64) -> Action {
    let cost = session.breakdown().pending_cost;
    if cost <= max_cost && session.stats().can_afford(cost) {
        Action::PayBreakdown
    } else {
        Action::Abandon
    }
}

fn best_job_by<F>(jobs: &[Job], score: F) -> usize
where
    F: Fn(&Job) -> f64,
{
    jobs.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| score(a).total_cmp(&score(b)))
        .map_or(0, |(index, _)| index)
}

fn fuel_needed(job: &Job) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let miles = job.distance_total as f32;
    miles * 0.04
}

fn affordable_upgrade(
    session: &GameSession,
    wishlist: &[UpgradeKind],
    reserve_factor: i64,
) -> Option<UpgradeKind> {
    wishlist.iter().copied().find(|kind| {
        session
            .next_upgrade_cost(*kind)
            .is_some_and(|cost| session.stats().money >= cost.saturating_mul(reserve_factor))
    })
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn decide(&mut self, session: &GameSession) -> Action {
        if let Some(action) = forced_action(session) {
            return action;
        }
        if session.mode() == GameMode::Driving {
            return handle_breakdown(session, i64::MAX);
        }
        if session.fuel_percent() < 99.0 && session.stats().can_afford(50) {
            return Action::Refuel;
        }
        let wishlist = [UpgradeKind::Tires, UpgradeKind::Suspension, UpgradeKind::Tank];
        if let Some(kind) = affordable_upgrade(session, &wishlist, 3) {
            return Action::Upgrade(kind);
        }
        let shortest = best_job_by(session.jobs(), |job| -f64::from(job.distance_total));
        Action::TakeJob(shortest)
    }
}

impl PlayerPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn decide(&mut self, session: &GameSession) -> Action {
        if let Some(action) = forced_action(session) {
            return action;
        }
        if session.mode() == GameMode::Driving {
            return handle_breakdown(session, 300);
        }
        #[allow(clippy::cast_precision_loss)]
        let index = best_job_by(session.jobs(), |job| job.payout as f64);
        let needs_fuel = session
            .jobs()
            .get(index)
            .is_some_and(|job| fuel_needed(job) > session.stats().fuel);
        if needs_fuel && session.stats().can_afford(50) {
            return Action::Refuel;
        }
        Action::TakeJob(index)
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn decide(&mut self, session: &GameSession) -> Action {
        if let Some(action) = forced_action(session) {
            return action;
        }
        if session.mode() == GameMode::Driving {
            return handle_breakdown(session, 450);
        }
        if session.fuel_percent() < 60.0 && session.stats().can_afford(50) {
            return Action::Refuel;
        }
        let wishlist = [UpgradeKind::Engine, UpgradeKind::Tank, UpgradeKind::Tires];
        if let Some(kind) = affordable_upgrade(session, &wishlist, 2) {
            return Action::Upgrade(kind);
        }
        #[allow(clippy::cast_precision_loss)]
        let index = best_job_by(session.jobs(), |job| {
            job.payout as f64 / f64::from(job.distance_total.max(1))
        });
        Action::TakeJob(index)
    }
}
