use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::Result;
use log::{debug, info, warn};
use roadhaul_game::{
    DataLoader, GameEngine, GameMode, GameSession, GameStorage, RoadEvent, TickOutcome,
};
use serde::Serialize;

use super::policy::{Action, GameplayStrategy};

const MAX_RECORDED_FAILURES: usize = 10;

/// Configuration for one autopilot run.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub max_ticks: u32,
    pub dt: f32,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            strategy,
            max_ticks: 20_000,
            dt: 0.25,
        }
    }

    #[must_use]
    pub const fn with_max_ticks(mut self, max_ticks: u32) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    #[must_use]
    pub const fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }
}

/// Everything measured during one run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub seed: u64,
    pub strategy: String,
    pub ticks: u32,
    pub deliveries: u32,
    pub clean_deliveries: u32,
    pub failed_trips: u32,
    pub abandoned_trips: u32,
    pub roadside_refuels: u32,
    pub breakdowns: u32,
    pub breakdowns_paid: u32,
    pub dot_checks: u32,
    pub violations: u32,
    pub upgrades_bought: u32,
    pub road_events: BTreeMap<String, u32>,
    pub challenges_completed: Vec<String>,
    pub final_money: i64,
    pub peak_money: i64,
    pub final_city: String,
    pub miles_driven: f64,
    pub autosaves: u32,
    pub save_errors: u32,
    pub invariant_failures: Vec<String>,
    pub elapsed_ms: u64,
}

impl RunRecord {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.invariant_failures.is_empty() && self.save_errors == 0
    }

    fn observe(&mut self, outcome: &TickOutcome) {
        if let Some(delivery) = outcome.delivered {
            self.deliveries += 1;
            if delivery.clean {
                self.clean_deliveries += 1;
            }
        }
        if outcome.trip_failed {
            self.failed_trips += 1;
        }
        if outcome.roadside_refuel {
            self.roadside_refuels += 1;
        }
        if outcome.breakdown_started {
            self.breakdowns += 1;
        }
        if let Some(event) = outcome.road_event {
            if event == RoadEvent::DotCheck {
                self.dot_checks += 1;
            }
            *self
                .road_events
                .entry(event_label(event).to_string())
                .or_insert(0) += 1;
        }
        if outcome.dot_result.as_ref().is_some_and(|r| r.violation) {
            self.violations += 1;
        }
        self.challenges_completed
            .extend(outcome.challenges_completed.iter().map(|id| (*id).to_string()));
    }

    fn record_failure(&mut self, tick: u32, message: String) {
        if self.invariant_failures.len() < MAX_RECORDED_FAILURES {
            self.invariant_failures.push(format!("tick {tick}: {message}"));
        }
    }
}

const fn event_label(event: RoadEvent) -> &'static str {
    match event {
        RoadEvent::DotCheck => "dot_check",
        RoadEvent::EngineTrouble { .. } => "engine_trouble",
        RoadEvent::TireDamage { .. } => "tire_damage",
        RoadEvent::WeatherShift(_) => "weather",
        RoadEvent::Bonus(_) => "bonus",
    }
}

fn apply_action(session: &mut GameSession, action: Action, record: &mut RunRecord) {
    let result = match action {
        Action::PressStart => session.press_start(),
        Action::TakeJob(index) => session.start_job(index).map(|_| ()),
        Action::Refuel => session.refuel(),
        Action::Upgrade(kind) => session
            .purchase_upgrade(kind.as_str())
            .map(|_| record.upgrades_bought += 1),
        Action::PayBreakdown => session
            .pay_breakdown()
            .map(|_| record.breakdowns_paid += 1),
        Action::Abandon => session.abandon_trip().map(|()| record.abandoned_trips += 1),
        Action::SpinDot => session.spin_dot(),
        Action::CollectDot => session.collect_dot().map(|_| ()),
        Action::Wait => Ok(()),
    };
    if let Err(err) = result {
        debug!("{action:?} refused: {err} ({})", err.reason());
    }
}

/// Cross-checks the session must satisfy after every tick.
pub fn check_invariants(session: &GameSession) -> Result<(), String> {
    let stats = session.stats();
    if stats.money < 0 {
        return Err(format!("negative money {}", stats.money));
    }
    if stats.fuel < 0.0 || stats.fuel > session.tank_capacity() + 1e-3 {
        return Err(format!("fuel {} outside tank", stats.fuel));
    }
    for (name, value) in [
        ("truck", stats.truck_health),
        ("engine", stats.engine_health),
        ("tires", stats.tire_health),
        ("reputation", stats.dot_reputation),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(format!("{name} {value} out of range"));
        }
    }
    let on_trip = matches!(session.mode(), GameMode::Driving | GameMode::DotCheck);
    if on_trip != session.active_job().is_some() {
        return Err(format!(
            "mode {} disagrees with active job presence",
            session.mode()
        ));
    }
    if session.breakdown().is_active() && session.mode() != GameMode::Driving {
        return Err("breakdown pending outside a drive".to_string());
    }
    if session.jobs().len() != 4 {
        return Err(format!("job board has {} entries", session.jobs().len()));
    }
    Ok(())
}

/// Drive one session with the configured policy.
///
/// # Errors
///
/// Returns an error if the engine cannot create a session.
pub fn run_simulation<L, S>(
    engine: &GameEngine<L, S>,
    config: &SimulationConfig,
) -> Result<RunRecord>
where
    L: DataLoader,
    S: GameStorage,
{
    let started = Instant::now();
    let mut session = engine.create_session(config.seed)?;
    let mut policy = config.strategy.create_policy();
    let mut record = RunRecord {
        seed: config.seed,
        strategy: config.strategy.label().to_string(),
        peak_money: session.stats().money,
        ..RunRecord::default()
    };
    debug!("running {} on seed {}", policy.name(), config.seed);

    for tick in 0..config.max_ticks {
        let action = policy.decide(&session);
        apply_action(&mut session, action, &mut record);
        let outcome = session.tick(config.dt);
        record.observe(&outcome);

        match engine.flush_autosave(&mut session) {
            Ok(true) => record.autosaves += 1,
            Ok(false) => {}
            Err(err) => {
                warn!("autosave failed on tick {tick}: {err}");
                record.save_errors += 1;
            }
        }
        if let Err(message) = check_invariants(&session) {
            record.record_failure(tick, message);
        }
        record.peak_money = record.peak_money.max(session.stats().money);
        record.ticks = tick + 1;
    }

    record.final_money = session.stats().money;
    record.final_city = session
        .current_city()
        .map_or_else(|| "Unknown".to_string(), |city| city.name.clone());
    record.miles_driven = session.world_scroll();
    record.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        "{} seed {}: {} deliveries, ${} final",
        record.strategy, record.seed, record.deliveries, record.final_money
    );
    Ok(record)
}
