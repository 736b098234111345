//! Save slots, the upgrade record, and session snapshot/restore.
//!
//! Slots are JSON blobs stored under `roadhaul.save.<slot>` in any
//! [`GameStorage`]. Reading never fails to the caller: missing, malformed or
//! newer-version data is reported with `log::warn!` and comes back as `None`.
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::rc::Rc;
use thiserror::Error;

use crate::GameStorage;
use crate::breakdown::{BREAKDOWN_DESCRIPTIONS, BreakdownState, roadside_cost};
use crate::challenges::ChallengeState;
use crate::constants::{JOBS_PER_CITY, MSG_UPGRADE, SAVE_VERSION, SLOT_KEY_PREFIX, UPGRADES_KEY};
use crate::data::GameCatalog;
use crate::jobs::{ActiveJob, Job, JobBoard, make_jobs_for_city};
use crate::session::{GameMode, GameSession};
use crate::stats::PlayerStats;
use crate::status::StatusMessage;
use crate::upgrades::Upgrades;

/// Slot names accepted by the slot API.
pub const SAVE_SLOTS: [&str; 3] = ["slot1", "slot2", "slot3"];

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("unknown save slot: {0}")]
    UnknownSlot(String),
    #[error("failed to encode save: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl SaveError {
    fn backend<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Errors raised by file-backed storage implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Trip bookkeeping inside a core save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSave {
    pub active_job: Option<ActiveJob>,
    pub job_remaining: f32,
    pub trip_origin_city_id: Option<usize>,
}

/// Core game state as written into a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreSave {
    pub game_state: GameMode,
    #[serde(default)]
    pub current_city_id: usize,
    #[serde(default)]
    pub trip_origin_city_id: Option<usize>,
    #[serde(default)]
    pub world_scroll: f64,
    #[serde(default)]
    pub stats: PlayerStats,
    #[serde(default)]
    pub upgrades: Upgrades,
    #[serde(default)]
    pub job: JobSave,
    #[serde(default)]
    pub cached_jobs: Vec<Job>,
}

/// Full slot blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSlot {
    pub version: u32,
    #[serde(default)]
    pub saved_at: i64,
    pub core: CoreSave,
    #[serde(default)]
    pub challenges: Option<ChallengeState>,
    #[serde(default)]
    pub breakdown: Option<BreakdownState>,
    #[serde(default)]
    pub lizard: Option<Value>,
    #[serde(default)]
    pub city_name: String,
}

/// Menu summary of a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotInfo {
    pub saved_at: Option<i64>,
    pub city_name: Option<String>,
    pub money: Option<i64>,
    pub game_state: Option<String>,
}

/// In-process storage, handy for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

impl GameStorage for MemoryStorage {
    type Error = Infallible;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Storage key for a slot name.
///
/// # Errors
///
/// `UnknownSlot` for names outside [`SAVE_SLOTS`].
pub fn slot_key(slot: &str) -> Result<String, SaveError> {
    if SAVE_SLOTS.contains(&slot) {
        Ok(format!("{SLOT_KEY_PREFIX}{slot}"))
    } else {
        Err(SaveError::UnknownSlot(slot.to_string()))
    }
}

fn read_raw<S: GameStorage>(storage: &S, slot: &str) -> Option<String> {
    let key = match slot_key(slot) {
        Ok(key) => key,
        Err(err) => {
            warn!("save read skipped: {err}");
            return None;
        }
    };
    match storage.read(&key) {
        Ok(raw) => raw,
        Err(err) => {
            warn!("failed to read {key}: {err}");
            None
        }
    }
}

/// Write a slot blob.
///
/// # Errors
///
/// Unknown slot names, encoding failures and backend failures.
pub fn write_slot<S: GameStorage>(
    storage: &S,
    slot: &str,
    data: &SaveSlot,
) -> Result<(), SaveError> {
    let key = slot_key(slot)?;
    let json = serde_json::to_string(data)?;
    storage.write(&key, &json).map_err(SaveError::backend)?;
    debug!("wrote {key} ({} bytes)", json.len());
    Ok(())
}

/// Read and validate a slot blob.
pub fn read_slot<S: GameStorage>(storage: &S, slot: &str) -> Option<SaveSlot> {
    let raw = read_raw(storage, slot)?;
    let data: SaveSlot = match serde_json::from_str(&raw) {
        Ok(data) => data,
        Err(err) => {
            warn!("save {slot} is malformed: {err}");
            return None;
        }
    };
    if data.version > SAVE_VERSION {
        warn!(
            "save {slot} has version {} newer than supported {SAVE_VERSION}",
            data.version
        );
        return None;
    }
    Some(data)
}

/// Summarize a slot without rebuilding a session. Partial blobs still report
/// whatever fields they carry.
pub fn slot_info<S: GameStorage>(storage: &S, slot: &str) -> Option<SlotInfo> {
    let raw = read_raw(storage, slot)?;
    let value: Value = serde_json::from_str(&raw).ok()?;
    let core = value.get("core");
    Some(SlotInfo {
        saved_at: value.get("savedAt").and_then(Value::as_i64),
        city_name: value
            .get("cityName")
            .and_then(Value::as_str)
            .map(str::to_string),
        money: core
            .and_then(|c| c.get("stats"))
            .and_then(|s| s.get("money"))
            .and_then(Value::as_i64),
        game_state: core
            .and_then(|c| c.get("gameState"))
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Summaries for every slot, in slot order.
pub fn list_slots<S: GameStorage>(storage: &S) -> Vec<(&'static str, Option<SlotInfo>)> {
    SAVE_SLOTS
        .iter()
        .map(|slot| (*slot, slot_info(storage, slot)))
        .collect()
}

/// Remove a slot.
///
/// # Errors
///
/// Unknown slot names and backend failures.
pub fn delete_slot<S: GameStorage>(storage: &S, slot: &str) -> Result<(), SaveError> {
    let key = slot_key(slot)?;
    storage.remove(&key).map_err(SaveError::backend)
}

/// Persist the standalone upgrade record.
///
/// # Errors
///
/// Encoding and backend failures.
pub fn write_upgrades<S: GameStorage>(storage: &S, upgrades: &Upgrades) -> Result<(), SaveError> {
    let json = serde_json::to_string(upgrades)?;
    storage.write(UPGRADES_KEY, &json).map_err(SaveError::backend)
}

/// Load the standalone upgrade record, clamped to the catalog.
pub fn read_upgrades<S: GameStorage>(storage: &S, catalog: &GameCatalog) -> Option<Upgrades> {
    let raw = match storage.read(UPGRADES_KEY) {
        Ok(raw) => raw?,
        Err(err) => {
            warn!("failed to read upgrade record: {err}");
            return None;
        }
    };
    match serde_json::from_str::<Upgrades>(&raw) {
        Ok(mut upgrades) => {
            upgrades.sanitize(catalog);
            Some(upgrades)
        }
        Err(err) => {
            warn!("upgrade record is malformed: {err}");
            None
        }
    }
}

fn cached_board_matches(cached: &[Job], fresh: &JobBoard) -> bool {
    cached.len() == JOBS_PER_CITY
        && cached
            .iter()
            .zip(fresh.iter())
            .all(|(saved, offer)| saved.dest_id == offer.dest_id)
}

impl GameSession {
    /// Snapshot the core state.
    #[must_use]
    pub fn to_core_save(&self) -> CoreSave {
        CoreSave {
            game_state: self.mode,
            current_city_id: self.current_city,
            trip_origin_city_id: Some(self.trip_origin),
            world_scroll: self.world_scroll,
            stats: self.stats.clone(),
            upgrades: self.upgrades.clone(),
            job: JobSave {
                active_job: self.active_job.clone(),
                job_remaining: self.job_remaining,
                trip_origin_city_id: Some(self.trip_origin),
            },
            cached_jobs: self.jobs.to_vec(),
        }
    }

    /// Snapshot everything a slot carries.
    #[must_use]
    pub fn to_save_slot(&self, saved_at: i64) -> SaveSlot {
        SaveSlot {
            version: SAVE_VERSION,
            saved_at,
            core: self.to_core_save(),
            challenges: Some(self.challenges.export()),
            breakdown: Some(self.breakdown.clone()),
            lizard: self.lizard.clone(),
            city_name: self.catalog.city_name(self.current_city).to_string(),
        }
    }

    /// Replace upgrade levels, e.g. from the standalone record.
    pub fn adopt_upgrades(&mut self, mut upgrades: Upgrades) {
        upgrades.sanitize(&self.catalog);
        self.upgrades = upgrades;
        self.stats.sanitize(self.upgrades.tank_capacity());
    }

    /// Apply a core save, repairing anything out of range.
    pub fn restore_core(&mut self, core: CoreSave) {
        let count = self.catalog.city_count();
        let in_range = |id: usize| id < count;

        self.current_city = if in_range(core.current_city_id) {
            core.current_city_id
        } else {
            0
        };
        self.trip_origin = core
            .job
            .trip_origin_city_id
            .or(core.trip_origin_city_id)
            .filter(|id| in_range(*id))
            .unwrap_or(self.current_city);
        self.world_scroll = if core.world_scroll.is_finite() {
            core.world_scroll
        } else {
            0.0
        };

        self.adopt_upgrades(core.upgrades);
        self.stats = core.stats;
        self.stats.sanitize(self.upgrades.tank_capacity());

        self.active_job = core
            .job
            .active_job
            .filter(|active| in_range(active.job.dest_id));
        #[allow(clippy::cast_precision_loss)]
        let fallback = self
            .active_job
            .as_ref()
            .map_or(0.0, |active| active.job.distance_total as f32);
        self.job_remaining = match &self.active_job {
            Some(_) if core.job.job_remaining.is_finite() => core.job.job_remaining.max(0.0),
            Some(_) => fallback,
            None => 0.0,
        };

        let fresh = make_jobs_for_city(self.current_city, &self.distances);
        self.jobs = if cached_board_matches(&core.cached_jobs, &fresh) {
            core.cached_jobs.into_iter().collect()
        } else {
            fresh
        };

        let has_job = self.active_job.is_some();
        self.mode = match core.game_state {
            GameMode::Driving | GameMode::DotCheck if has_job => GameMode::Driving,
            GameMode::Driving | GameMode::DotCheck => GameMode::City,
            other => other,
        };

        self.dot.close();
        self.breakdown = BreakdownState::default();
        self.status = StatusMessage::default();
        self.events.reset(self.rngs.events());
        self.announce_city();
    }

    /// Apply a full slot: core, challenges, breakdown and passthrough state.
    pub fn restore(&mut self, slot: SaveSlot) {
        self.restore_core(slot.core);
        self.challenges.import(slot.challenges.unwrap_or_default());
        if let Some(saved) = slot.breakdown {
            self.restore_breakdown(saved);
        }
        self.lizard = slot.lizard;
        self.post("Save loaded", MSG_UPGRADE);
        self.take_autosave_request();
    }

    fn restore_breakdown(&mut self, saved: BreakdownState) {
        let on_trip = self.mode == GameMode::Driving && self.active_job.is_some();
        if !saved.active || !on_trip {
            self.breakdown = BreakdownState {
                timer: saved.timer.max(0.0),
                ..BreakdownState::default()
            };
            return;
        }
        let pending_cost = if saved.pending_cost > 0 {
            saved.pending_cost
        } else {
            roadside_cost(self.miles_remaining())
        };
        let description = if saved.description.is_empty() {
            BREAKDOWN_DESCRIPTIONS[0].to_string()
        } else {
            saved.description
        };
        self.breakdown = BreakdownState {
            active: true,
            timer: 0.0,
            pending_cost,
            description,
        };
    }
}
