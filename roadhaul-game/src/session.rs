//! Game mode state machine and the per-frame driving loop.
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::breakdown::BreakdownState;
use crate::challenges::{Challenge, Challenges};
use crate::constants::{
    CITY_REFUEL_COST, FUEL_PER_MILE, MSG_LONG, MSG_NORMAL, MSG_SHORT, MSG_UPGRADE,
    ROADSIDE_REFUEL_COST, ROADSIDE_REFUEL_FRACTION, STRANDED_FUEL_FRACTION,
};
use crate::data::{City, GameCatalog};
use crate::distance::DistanceIndex;
use crate::dot::{DotResult, DotWheel};
use crate::error::{ActionError, ActionResult};
use crate::events::{EventConfig, EventSystem, RoadEvent};
use crate::jobs::{ActiveJob, Job, JobBoard, make_jobs_for_city};
use crate::rng::RngBundle;
use crate::stats::{PlayerStats, Weather};
use crate::status::{NoopHooks, SessionHooks, StatusMessage};
use crate::upgrades::{UpgradeKind, Upgrades};

/// Top-level game mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    #[default]
    Start,
    City,
    Driving,
    DotCheck,
}

impl GameMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::City => "CITY",
            Self::Driving => "DRIVING",
            Self::DotCheck => "DOT_CHECK",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub dest_id: usize,
    pub payout: i64,
    pub clean: bool,
}

/// Everything notable that happened during one `tick`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub delivered: Option<Delivery>,
    pub trip_failed: bool,
    pub roadside_refuel: bool,
    pub road_event: Option<RoadEvent>,
    pub breakdown_started: bool,
    pub dot_result: Option<DotResult>,
    pub challenges_completed: Vec<&'static str>,
}

/// Single owner of all mutable game state.
pub struct GameSession {
    pub(crate) catalog: GameCatalog,
    pub(crate) distances: DistanceIndex,
    pub(crate) mode: GameMode,
    pub(crate) current_city: usize,
    pub(crate) trip_origin: usize,
    pub(crate) world_scroll: f64,
    pub(crate) stats: PlayerStats,
    pub(crate) upgrades: Upgrades,
    pub(crate) active_job: Option<ActiveJob>,
    pub(crate) job_remaining: f32,
    pub(crate) jobs: JobBoard,
    pub(crate) events: EventSystem,
    pub(crate) breakdown: BreakdownState,
    pub(crate) dot: DotWheel,
    pub(crate) challenges: Challenges,
    pub(crate) status: StatusMessage,
    pub(crate) rngs: RngBundle,
    pub(crate) seed: u64,
    pub(crate) lizard: Option<serde_json::Value>,
    hooks: Box<dyn SessionHooks>,
    autosave_requested: bool,
    upgrades_dirty: bool,
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("mode", &self.mode)
            .field("current_city", &self.current_city)
            .field("trip_origin", &self.trip_origin)
            .field("stats", &self.stats)
            .field("active_job", &self.active_job)
            .field("job_remaining", &self.job_remaining)
            .field("breakdown", &self.breakdown)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Fresh career in the first city, waiting on the start screen.
    #[must_use]
    pub fn new(catalog: GameCatalog, seed: u64) -> Self {
        Self::with_event_config(catalog, seed, EventConfig::default())
    }

    #[must_use]
    pub fn with_event_config(catalog: GameCatalog, seed: u64, event_cfg: EventConfig) -> Self {
        let distances = DistanceIndex::build(&catalog.cities);
        let mut rngs = RngBundle::from_user_seed(seed);
        let events = EventSystem::new(event_cfg, rngs.events());
        let jobs = make_jobs_for_city(0, &distances);
        let upgrades = Upgrades::default();
        let mut stats = PlayerStats::default();
        stats.sanitize(upgrades.tank_capacity());
        Self {
            catalog,
            distances,
            mode: GameMode::Start,
            current_city: 0,
            trip_origin: 0,
            world_scroll: 0.0,
            stats,
            upgrades,
            active_job: None,
            job_remaining: 0.0,
            jobs,
            events,
            breakdown: BreakdownState::default(),
            dot: DotWheel::default(),
            challenges: Challenges::default(),
            status: StatusMessage::default(),
            rngs,
            seed,
            lizard: None,
            hooks: Box::new(NoopHooks),
            autosave_requested: false,
            upgrades_dirty: false,
        }
    }

    /// Attach presentation-layer hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Box<dyn SessionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    // --- queries ------------------------------------------------------------

    #[must_use]
    pub const fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn catalog(&self) -> &GameCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn distances(&self) -> &DistanceIndex {
        &self.distances
    }

    #[must_use]
    pub const fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    /// Direct stat access for tooling and tests. Callers own the clamping.
    pub const fn stats_mut(&mut self) -> &mut PlayerStats {
        &mut self.stats
    }

    #[must_use]
    pub const fn upgrades(&self) -> &Upgrades {
        &self.upgrades
    }

    #[must_use]
    pub const fn current_city_id(&self) -> usize {
        self.current_city
    }

    #[must_use]
    pub fn current_city(&self) -> Option<&City> {
        self.catalog.city(self.current_city)
    }

    #[must_use]
    pub const fn trip_origin_id(&self) -> usize {
        self.trip_origin
    }

    #[must_use]
    pub const fn world_scroll(&self) -> f64 {
        self.world_scroll
    }

    #[must_use]
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    #[must_use]
    pub const fn active_job(&self) -> Option<&ActiveJob> {
        self.active_job.as_ref()
    }

    /// Raw miles left, may dip below zero for one frame before arrival.
    #[must_use]
    pub const fn job_remaining(&self) -> f32 {
        self.job_remaining
    }

    #[must_use]
    pub fn miles_remaining(&self) -> f32 {
        self.job_remaining.max(0.0)
    }

    #[must_use]
    pub fn progress_percent(&self) -> f32 {
        let Some(active) = &self.active_job else {
            return 0.0;
        };
        if active.job.distance_total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let total = active.job.distance_total as f32;
        (100.0 - self.job_remaining / total * 100.0).clamp(0.0, 100.0)
    }

    #[must_use]
    pub fn tank_capacity(&self) -> f32 {
        self.upgrades.tank_capacity()
    }

    #[must_use]
    pub fn fuel_percent(&self) -> f32 {
        (self.stats.fuel / self.tank_capacity() * 100.0).max(0.0)
    }

    #[must_use]
    pub fn speed(&self) -> f32 {
        self.upgrades.speed(self.catalog.base_speed)
    }

    #[must_use]
    pub fn upgrade_level(&self, kind: UpgradeKind) -> u32 {
        self.upgrades.level(kind)
    }

    #[must_use]
    pub fn next_upgrade_cost(&self, kind: UpgradeKind) -> Option<i64> {
        self.upgrades.next_cost(kind, &self.catalog)
    }

    #[must_use]
    pub fn upgrade_description(&self, kind: UpgradeKind) -> Option<&str> {
        self.catalog
            .upgrade(kind)?
            .description(self.upgrades.level(kind))
    }

    #[must_use]
    pub fn status_message(&self) -> Option<&str> {
        self.status.current()
    }

    #[must_use]
    pub const fn status(&self) -> &StatusMessage {
        &self.status
    }

    #[must_use]
    pub const fn breakdown(&self) -> &BreakdownState {
        &self.breakdown
    }

    #[must_use]
    pub const fn dot(&self) -> &DotWheel {
        &self.dot
    }

    #[must_use]
    pub const fn challenges(&self) -> &Challenges {
        &self.challenges
    }

    #[must_use]
    pub const fn event_system(&self) -> &EventSystem {
        &self.events
    }

    /// Opaque minigame state carried through saves untouched.
    #[must_use]
    pub const fn lizard(&self) -> Option<&serde_json::Value> {
        self.lizard.as_ref()
    }

    pub fn set_lizard(&mut self, state: Option<serde_json::Value>) {
        self.lizard = state;
    }

    #[must_use]
    pub const fn rngs(&self) -> &RngBundle {
        &self.rngs
    }

    /// True while the truck is halted by a breakdown or an inspection.
    #[must_use]
    pub const fn is_suspended(&self) -> bool {
        self.breakdown.active || self.dot.is_open()
    }

    /// Whether a save should be written. Clears the request.
    pub fn take_autosave_request(&mut self) -> bool {
        std::mem::take(&mut self.autosave_requested)
    }

    /// Whether the upgrade record changed since last asked. Clears the flag.
    pub fn take_upgrades_dirty(&mut self) -> bool {
        std::mem::take(&mut self.upgrades_dirty)
    }

    // --- player actions -----------------------------------------------------

    /// Leave the title screen.
    ///
    /// # Errors
    ///
    /// `InvalidState` once the game has already started.
    pub fn press_start(&mut self) -> ActionResult {
        if self.mode != GameMode::Start {
            return Err(ActionError::InvalidState);
        }
        self.set_mode(GameMode::City);
        Ok(())
    }

    /// Accept the job at `index` on the current board.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside the city, `UnknownTarget` for a bad index.
    pub fn start_job(&mut self, index: usize) -> ActionResult<&ActiveJob> {
        if self.mode != GameMode::City {
            return Err(ActionError::InvalidState);
        }
        let job = self
            .jobs
            .get(index)
            .cloned()
            .ok_or_else(|| ActionError::UnknownTarget(format!("job {index}")))?;
        let dest_name = self.catalog.city_name(job.dest_id).to_string();
        #[allow(clippy::cast_precision_loss)]
        let miles = job.distance_total as f32;
        self.trip_origin = self.current_city;
        self.job_remaining = miles;
        self.stats.active_weather = Weather::Clear;
        self.events.reset(self.rngs.events());
        self.breakdown.reset_timer();
        info!("job started: {} -> {dest_name}, {miles} mi", self.current_city);
        self.post(format!("Hauling to {dest_name}"), MSG_NORMAL);
        self.set_mode(GameMode::Driving);
        self.autosave_requested = true;
        Ok(self.active_job.insert(ActiveJob::from(job)))
    }

    /// Fill the tank at a city fuel stop.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside the city, `InsufficientFunds` when broke.
    pub fn refuel(&mut self) -> ActionResult {
        if self.mode != GameMode::City {
            return Err(ActionError::InvalidState);
        }
        if !self.stats.can_afford(CITY_REFUEL_COST) {
            self.post("Not enough money!", MSG_SHORT);
            return Err(ActionError::InsufficientFunds {
                needed: CITY_REFUEL_COST,
                available: self.stats.money,
            });
        }
        self.stats.debit(CITY_REFUEL_COST);
        let capacity = self.tank_capacity();
        self.stats.set_fuel(capacity, capacity);
        self.post(format!("Refueled for ${CITY_REFUEL_COST}"), MSG_SHORT);
        Ok(())
    }

    /// Buy the next level of the named upgrade.
    ///
    /// # Errors
    ///
    /// `InvalidState` outside the city, then `UnknownTarget`, `AlreadyAtLimit`
    /// or `InsufficientFunds`. Nothing changes on error.
    pub fn purchase_upgrade(&mut self, name: &str) -> ActionResult<u32> {
        if self.mode != GameMode::City {
            self.post("Upgrades available in city only", MSG_SHORT);
            return Err(ActionError::InvalidState);
        }
        match self
            .upgrades
            .purchase(name, &mut self.stats.money, &self.catalog)
        {
            Ok((kind, level)) => {
                self.stats.sanitize(self.upgrades.tank_capacity());
                self.upgrades_dirty = true;
                self.autosave_requested = true;
                info!("upgrade purchased: {kind} -> L{level}");
                self.post(format!("{kind} upgraded to L{level}"), MSG_UPGRADE);
                Ok(level)
            }
            Err(err) => {
                match &err {
                    ActionError::AlreadyAtLimit => self.post("Already maxed", MSG_SHORT),
                    ActionError::InsufficientFunds { needed, .. } => {
                        self.post(format!("Need ${needed} for upgrade"), MSG_SHORT);
                    }
                    _ => {}
                }
                Err(err)
            }
        }
    }

    /// Pay the pending roadside service quote and keep driving.
    ///
    /// # Errors
    ///
    /// `InvalidState` with no breakdown pending, `InsufficientFunds` when the
    /// quote is unaffordable (the breakdown stays pending).
    pub fn pay_breakdown(&mut self) -> ActionResult<i64> {
        match self.breakdown.settle(&mut self.stats) {
            Ok(cost) => {
                self.hooks.breakdown_hidden();
                info!("roadside service paid: ${cost}");
                self.post("Roadside service dispatched.", MSG_NORMAL);
                if self.active_job.is_some() {
                    self.set_mode(GameMode::Driving);
                }
                Ok(cost)
            }
            Err(err) => {
                if matches!(err, ActionError::InsufficientFunds { .. }) {
                    self.post("Not enough money for roadside service", MSG_NORMAL);
                }
                Err(err)
            }
        }
    }

    /// Give up on the current haul and return to the trip's origin city.
    ///
    /// # Errors
    ///
    /// `InvalidState` when there is no active job.
    pub fn abandon_trip(&mut self) -> ActionResult {
        if self.active_job.is_none() {
            return Err(ActionError::InvalidState);
        }
        let message = if self.breakdown.active {
            "Trip abandoned after breakdown."
        } else {
            "Trip abandoned."
        };
        self.abandon_active_job(message);
        Ok(())
    }

    /// Debug shortcut: bail out of the current drive back to the origin city.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless driving with an active job.
    pub fn return_to_city(&mut self) -> ActionResult {
        if self.mode != GameMode::Driving || self.active_job.is_none() {
            return Err(ActionError::InvalidState);
        }
        self.abandon_active_job("Returned to city.");
        Ok(())
    }

    /// Spin the DOT wheel.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the wheel is open and idle.
    pub fn spin_dot(&mut self) -> ActionResult {
        self.dot.spin(self.rngs.dot())
    }

    /// Dismiss the DOT result and resume the previous mode.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless a spin result is waiting.
    pub fn collect_dot(&mut self) -> ActionResult<DotResult> {
        let result = self.dot.collect()?;
        self.hooks.dot_wheel_closed();
        let next = if self.active_job.is_some() {
            GameMode::Driving
        } else {
            GameMode::City
        };
        self.set_mode(next);
        Ok(result)
    }

    /// Pull the truck over for an inspection.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless driving without another stop in progress.
    pub fn open_dot_inspection(&mut self) -> ActionResult {
        if self.mode != GameMode::Driving || self.is_suspended() {
            return Err(ActionError::InvalidState);
        }
        self.dot.open();
        self.hooks.dot_wheel_opened();
        self.set_mode(GameMode::DotCheck);
        Ok(())
    }

    /// Force a roadside breakdown now.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless on a trip with nothing else pending.
    pub fn trigger_breakdown(&mut self) -> ActionResult {
        if self.mode != GameMode::Driving || self.active_job.is_none() || self.is_suspended() {
            return Err(ActionError::InvalidState);
        }
        let miles_left = self.miles_remaining();
        let notice = self
            .breakdown
            .trigger(miles_left, self.rngs.breakdown())
            .ok_or(ActionError::InvalidState)?;
        self.hooks.breakdown_shown(&notice.description, notice.cost);
        Ok(())
    }

    // --- simulation ---------------------------------------------------------

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if let Some(done) = self.challenges.track_money(self.stats.money) {
            self.grant(done, &mut outcome);
        }

        self.check_breakdown(dt, &mut outcome);

        self.status.decay(dt);

        if self.mode == GameMode::Driving && self.active_job.is_some() && !self.breakdown.active {
            self.handle_driving(dt, &mut outcome);
        }

        if self.mode == GameMode::Driving && !self.is_suspended() {
            self.check_events(dt, &mut outcome);
        }

        if self.dot.is_open() {
            self.update_dot(dt, &mut outcome);
        }

        outcome
    }

    fn check_breakdown(&mut self, dt: f32, outcome: &mut TickOutcome) {
        let on_trip = self.mode == GameMode::Driving && self.active_job.is_some();
        let miles_left = self.miles_remaining();
        let dot_active = self.dot.is_open();
        if let Some(notice) =
            self.breakdown
                .tick(dt, on_trip, dot_active, miles_left, self.rngs.breakdown())
        {
            self.hooks.breakdown_shown(&notice.description, notice.cost);
            outcome.breakdown_started = true;
        }
    }

    fn handle_driving(&mut self, dt: f32, outcome: &mut TickOutcome) {
        let distance = self.speed() * dt;
        self.job_remaining -= distance;
        self.world_scroll += f64::from(distance);
        if let Some(done) = self.challenges.record_miles(f64::from(distance)) {
            self.grant(done, outcome);
        }

        self.stats.burn_fuel(distance * FUEL_PER_MILE);
        if self.stats.fuel <= 0.0 {
            let capacity = self.tank_capacity();
            if self.stats.can_afford(ROADSIDE_REFUEL_COST) {
                self.stats.debit(ROADSIDE_REFUEL_COST);
                self.stats.set_fuel(capacity * ROADSIDE_REFUEL_FRACTION, capacity);
                outcome.roadside_refuel = true;
                info!("roadside refuel for ${ROADSIDE_REFUEL_COST}");
                self.post(
                    format!("Out of fuel! Roadside refuel -${ROADSIDE_REFUEL_COST}"),
                    MSG_LONG,
                );
            } else {
                self.stats.set_fuel(capacity * STRANDED_FUEL_FRACTION, capacity);
                outcome.trip_failed = true;
                let origin = self.catalog.city_name(self.trip_origin).to_string();
                self.abandon_active_job(&format!("Out of fuel! Towed back to {origin}."));
                return;
            }
        }

        if self.job_remaining <= 0.0 {
            outcome.delivered = self.deliver(outcome);
        }
    }

    fn deliver(&mut self, outcome: &mut TickOutcome) -> Option<Delivery> {
        let active = self.active_job.take()?;
        let payout = active.job.payout;
        let dest_id = active.job.dest_id;
        let clean = !active.violation;
        self.stats.credit(payout);
        self.stats.jobs_delivered += 1;
        for done in self.challenges.record_job_complete(clean) {
            self.grant(done, outcome);
        }
        self.job_remaining = 0.0;
        self.move_to_city(dest_id);
        self.set_mode(GameMode::City);
        info!("delivered to {dest_id} for ${payout}");
        self.post(format!("Delivered! +${payout}"), MSG_NORMAL);
        self.autosave_requested = true;
        Some(Delivery {
            dest_id,
            payout,
            clean,
        })
    }

    fn check_events(&mut self, dt: f32, outcome: &mut TickOutcome) {
        let mitigation = self.upgrades.durability_mitigation();
        let Some(event) = self
            .events
            .tick(dt, &mut self.stats, mitigation, self.rngs.events())
        else {
            return;
        };
        debug!("road event: {event:?}");
        self.post(event.message(), MSG_NORMAL);
        if event == RoadEvent::DotCheck {
            if let Err(err) = self.open_dot_inspection() {
                debug!("DOT check not opened: {err}");
            }
        }
        outcome.road_event = Some(event);
    }

    fn update_dot(&mut self, dt: f32, outcome: &mut TickOutcome) {
        let violation_chance = self.upgrades.violation_chance();
        let Some(result) = self
            .dot
            .tick(dt, &mut self.stats, violation_chance, self.rngs.dot())
            .cloned()
        else {
            return;
        };
        if result.violation {
            if let Some(active) = self.active_job.as_mut() {
                active.violation = true;
            }
            self.challenges.record_violation();
        }
        self.post(result.message.clone(), MSG_NORMAL);
        outcome.dot_result = Some(result);
    }

    // --- internals ----------------------------------------------------------

    fn abandon_active_job(&mut self, message: &str) {
        let had_breakdown = self.breakdown.active;
        self.active_job = None;
        self.job_remaining = 0.0;
        self.breakdown.clear();
        self.breakdown.reset_timer();
        if had_breakdown {
            self.hooks.breakdown_hidden();
        }
        if self.dot.is_open() {
            self.dot.close();
            self.hooks.dot_wheel_closed();
        }
        self.move_to_city(self.trip_origin);
        self.set_mode(GameMode::City);
        info!("trip abandoned, back at city {}", self.trip_origin);
        self.post(message, MSG_LONG);
        self.autosave_requested = true;
    }

    /// Change the current city and rebuild its job board.
    pub(crate) fn move_to_city(&mut self, city_id: usize) {
        self.current_city = city_id;
        self.jobs = make_jobs_for_city(city_id, &self.distances);
        self.announce_city();
    }

    pub(crate) fn announce_city(&mut self) {
        if let Some(city) = self.catalog.city(self.current_city) {
            self.hooks.city_changed(city);
        }
    }

    pub(crate) fn set_mode(&mut self, mode: GameMode) {
        if self.mode != mode {
            debug!("mode {} -> {}", self.mode, mode);
            self.mode = mode;
        }
    }

    fn grant(&mut self, done: &'static Challenge, outcome: &mut TickOutcome) {
        self.stats.credit(done.reward);
        self.post(
            format!("Challenge complete: {}! Reward: ${}", done.name, done.reward),
            MSG_LONG,
        );
        outcome.challenges_completed.push(done.id);
    }

    pub(crate) fn post(&mut self, text: impl Into<String>, duration: f32) {
        self.status.set(text, duration);
        self.hooks.status_posted(&self.status.text, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session() -> GameSession {
        let mut session = GameSession::with_event_config(
            GameCatalog::default_catalog().clone(),
            0xC0FFEE,
            quiet_events(),
        );
        session.press_start().unwrap();
        session
    }

    fn quiet_events() -> EventConfig {
        let mut cfg = EventConfig::default();
        cfg.chances.dot = 0.0;
        cfg.chances.breakdown = 0.0;
        cfg.chances.tire = 0.0;
        cfg.chances.weather = 0.0;
        cfg.chances.bonus = 0.0;
        cfg
    }

    #[test]
    fn start_screen_leaves_once() {
        let mut session = GameSession::new(GameCatalog::default_catalog().clone(), 1);
        assert_eq!(session.mode(), GameMode::Start);
        assert!(session.start_job(0).is_err());
        session.press_start().unwrap();
        assert_eq!(session.mode(), GameMode::City);
        assert_eq!(session.press_start(), Err(ActionError::InvalidState));
    }

    #[test]
    fn start_job_enters_driving_and_records_origin() {
        let mut session = session();
        let dest = session.jobs()[2].dest_id;
        let job = session.start_job(2).unwrap().clone();
        assert_eq!(job.job.dest_id, dest);
        assert_eq!(session.mode(), GameMode::Driving);
        assert_eq!(session.trip_origin_id(), 0);
        assert!(session.take_autosave_request());
        assert!(!session.take_autosave_request());
        assert!(session.status_message().unwrap().starts_with("Hauling to"));
        assert_eq!(session.start_job(0).unwrap_err(), ActionError::InvalidState);
    }

    #[test]
    fn bad_job_index_is_unknown_target() {
        let mut session = session();
        assert!(matches!(
            session.start_job(9),
            Err(ActionError::UnknownTarget(_))
        ));
        assert_eq!(session.mode(), GameMode::City);
    }

    #[test]
    fn driving_burns_fuel_and_advances() {
        let mut session = session();
        session.start_job(0).unwrap();
        let before = session.job_remaining();
        session.tick(1.0);
        let speed = session.speed();
        assert!((before - session.job_remaining() - speed).abs() < 1e-3);
        assert!((session.stats().fuel - (120.0 - speed * 0.04)).abs() < 1e-3);
        assert!((session.world_scroll() - f64::from(speed)).abs() < 1e-3);
        assert!(session.progress_percent() > 0.0);
    }

    #[test]
    fn delivery_pays_and_moves_city() {
        let mut session = session();
        session.stats_mut().fuel = 1.0e6;
        let job = session.jobs()[0].clone();
        let money = session.stats().money;
        session.start_job(0).unwrap();
        session.take_autosave_request();
        let mut delivered = None;
        let mut roadside = 0;
        for _ in 0..10_000 {
            if session.breakdown().is_active() {
                roadside += session.pay_breakdown().unwrap();
            }
            let outcome = session.tick(0.5);
            if outcome.delivered.is_some() {
                delivered = outcome.delivered;
                break;
            }
        }
        let delivered = delivered.expect("delivery");
        assert_eq!(delivered.payout, job.payout);
        assert_eq!(session.stats().money, money + job.payout - roadside);
        assert_eq!(session.stats().jobs_delivered, 1);
        assert!(session.active_job().is_none());
        assert_eq!(session.current_city_id(), job.dest_id);
        assert_eq!(session.mode(), GameMode::City);
        assert_eq!(
            session.jobs(),
            make_jobs_for_city(job.dest_id, session.distances()).as_slice()
        );
        assert!(session.take_autosave_request());
    }

    #[test]
    fn empty_tank_with_cash_refuels_on_the_road() {
        let mut session = session();
        session.start_job(0).unwrap();
        session.stats_mut().fuel = 0.01;
        session.stats_mut().money = 1000;
        let outcome = session.tick(0.1);
        assert!(outcome.roadside_refuel);
        assert_eq!(session.stats().money, 750);
        let expected = session.tank_capacity() * 0.25;
        assert!((session.stats().fuel - expected).abs() < 1e-3);
        assert_eq!(session.mode(), GameMode::Driving);
        assert!(session.active_job().is_some());
    }

    #[test]
    fn empty_tank_without_cash_fails_the_trip() {
        let mut session = session();
        session.start_job(1).unwrap();
        session.stats_mut().fuel = 0.01;
        session.stats_mut().money = 100;
        let outcome = session.tick(0.1);
        assert!(outcome.trip_failed);
        assert_eq!(session.stats().money, 100);
        assert_eq!(session.mode(), GameMode::City);
        assert_eq!(session.current_city_id(), 0);
        assert!(session.active_job().is_none());
        let expected = session.tank_capacity() * 0.10;
        assert!((session.stats().fuel - expected).abs() < 1e-3);
    }

    #[test]
    fn refuel_in_city_only() {
        let mut session = session();
        session.stats_mut().fuel = 10.0;
        session.refuel().unwrap();
        assert_eq!(session.stats().money, 750);
        assert!((session.stats().fuel - session.tank_capacity()).abs() < 1e-3);
        session.stats_mut().money = 49;
        assert_eq!(
            session.refuel(),
            Err(ActionError::InsufficientFunds {
                needed: 50,
                available: 49
            })
        );
        session.start_job(0).unwrap();
        assert_eq!(session.refuel(), Err(ActionError::InvalidState));
    }

    #[test]
    fn upgrade_purchase_rules() {
        let mut session = session();
        session.stats_mut().money = 10_000;
        assert_eq!(session.purchase_upgrade("tank"), Ok(2));
        assert_eq!(session.stats().money, 8200);
        assert!(session.take_upgrades_dirty());
        assert_eq!(session.next_upgrade_cost(UpgradeKind::Tank), Some(4000));
        assert_eq!(session.purchase_upgrade("tank"), Ok(3));
        assert_eq!(
            session.purchase_upgrade("tank"),
            Err(ActionError::AlreadyAtLimit)
        );
        assert_eq!(session.stats().money, 4200);
        assert_eq!(session.status_message(), Some("Already maxed"));
        session.start_job(0).unwrap();
        assert_eq!(
            session.purchase_upgrade("engine"),
            Err(ActionError::InvalidState)
        );
    }

    #[test]
    fn breakdown_suspends_driving_until_paid() {
        let mut session = session();
        session.start_job(0).unwrap();
        session.trigger_breakdown().unwrap();
        assert!(session.is_suspended());
        let remaining = session.job_remaining();
        session.tick(1.0);
        assert!((session.job_remaining() - remaining).abs() < f32::EPSILON);
        let cost = session.breakdown().pending_cost;
        let money = session.stats().money;
        assert_eq!(session.pay_breakdown(), Ok(cost));
        assert_eq!(session.stats().money, money - cost);
        assert!(!session.is_suspended());
        assert_eq!(session.mode(), GameMode::Driving);
        session.tick(1.0);
        assert!(session.job_remaining() < remaining);
    }

    #[test]
    fn breakdown_abandon_rolls_back_to_origin() {
        let mut session = session();
        session.start_job(3).unwrap();
        session.trigger_breakdown().unwrap();
        assert_eq!(session.trigger_breakdown(), Err(ActionError::InvalidState));
        session.stats_mut().money = 10;
        assert!(session.pay_breakdown().is_err());
        assert!(session.breakdown().is_active());
        session.abandon_trip().unwrap();
        assert_eq!(session.stats().money, 10);
        assert!(session.active_job().is_none());
        assert!(!session.breakdown().is_active());
        assert_eq!(session.current_city_id(), 0);
        assert_eq!(session.mode(), GameMode::City);
        assert_eq!(
            session.jobs(),
            make_jobs_for_city(0, session.distances()).as_slice()
        );
        assert_eq!(session.status_message(), Some("Trip abandoned after breakdown."));
    }

    #[test]
    fn dot_wheel_round_trip_resumes_driving() {
        let mut session = session();
        session.start_job(0).unwrap();
        session.open_dot_inspection().unwrap();
        assert_eq!(session.mode(), GameMode::DotCheck);
        let remaining = session.job_remaining();
        session.spin_dot().unwrap();
        assert_eq!(session.spin_dot(), Err(ActionError::InvalidState));
        let mut result = None;
        for _ in 0..10 {
            let outcome = session.tick(0.5);
            if outcome.dot_result.is_some() {
                result = outcome.dot_result;
            }
        }
        assert!(result.is_some());
        assert!((session.job_remaining() - remaining).abs() < f32::EPSILON);
        assert_eq!(session.mode(), GameMode::DotCheck);
        session.collect_dot().unwrap();
        assert_eq!(session.mode(), GameMode::Driving);
        assert!(!session.dot().is_open());
    }

    #[derive(Default)]
    struct Recorder {
        cities: Rc<RefCell<Vec<usize>>>,
        statuses: Rc<RefCell<Vec<String>>>,
    }

    impl SessionHooks for Recorder {
        fn status_posted(&mut self, text: &str, _duration: f32) {
            self.statuses.borrow_mut().push(text.to_string());
        }

        fn city_changed(&mut self, city: &City) {
            self.cities.borrow_mut().push(city.id);
        }
    }

    #[test]
    fn hooks_receive_notifications() {
        let recorder = Recorder::default();
        let cities = recorder.cities.clone();
        let statuses = recorder.statuses.clone();
        let mut session = session().with_hooks(Box::new(recorder));
        session.start_job(1).unwrap();
        session.abandon_trip().unwrap();
        assert_eq!(cities.borrow().as_slice(), &[0]);
        assert!(statuses.borrow().iter().any(|s| s == "Trip abandoned."));
    }

    #[test]
    fn restoring_a_save_announces_the_city() {
        let mut core = session().to_core_save();
        core.current_city_id = 2;
        let recorder = Recorder::default();
        let cities = recorder.cities.clone();
        let mut restored = session().with_hooks(Box::new(recorder));
        restored.restore_core(core);
        assert_eq!(restored.current_city_id(), 2);
        assert_eq!(cities.borrow().as_slice(), &[2]);
    }
}
