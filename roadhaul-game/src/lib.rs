//! Roadhaul Game Engine
//!
//! Platform-agnostic core of the Roadhaul trucking game: city graph, job
//! board, truck upgrades, road events, breakdowns, DOT inspections and save
//! slots. Rendering, audio and input live in the embedding layer.

pub mod breakdown;
pub mod challenges;
mod constants;
pub mod data;
pub mod distance;
pub mod dot;
pub mod error;
pub mod events;
pub mod jobs;
pub mod rng;
pub mod save;
pub mod session;
pub mod stats;
pub mod status;
pub mod upgrades;

// Re-export commonly used types
pub use breakdown::{BreakdownNotice, BreakdownState, roadside_cost};
pub use challenges::{CHALLENGES, Challenge, ChallengeKind, ChallengeState, Challenges};
pub use data::{CatalogError, City, GameCatalog, Region, UpgradeSpec};
pub use distance::{DistanceIndex, haversine_miles};
pub use dot::{DOT_OUTCOMES, DotEffect, DotOutcome, DotPhase, DotResult, DotWheel};
pub use error::{ActionError, ActionResult};
pub use events::{EventChances, EventConfig, EventKind, EventSystem, RoadEvent};
pub use jobs::{ActiveJob, Job, JobBoard, WeightClass, make_jobs_for_city, payout_for};
pub use rng::{CountingRng, RngBundle};
pub use save::{
    CoreSave, MemoryStorage, SAVE_SLOTS, SaveError, SaveSlot, SlotInfo, StorageError,
};
pub use session::{Delivery, GameMode, GameSession, TickOutcome};
pub use stats::{PlayerStats, Weather};
pub use status::{NoopHooks, SessionHooks, StatusMessage};
pub use upgrades::{UpgradeKind, Upgrades};

use std::convert::Infallible;

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the city and upgrade catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or fails validation.
    fn load_catalog(&self) -> Result<GameCatalog, Self::Error>;
}

/// Loader serving the catalog compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedData;

impl DataLoader for EmbeddedData {
    type Error = Infallible;

    fn load_catalog(&self) -> Result<GameCatalog, Self::Error> {
        Ok(GameCatalog::default_catalog().clone())
    }
}

/// Trait for abstracting key-value persistence
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the raw value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Remove `key`; removing a missing key is not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the removal.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// Main game engine for managing game sessions and their saves
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    /// Create a new game engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Start a new career. A stored upgrade record carries over.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn create_session(&self, seed: u64) -> Result<GameSession, L::Error> {
        let catalog = self.data_loader.load_catalog()?;
        let upgrades = save::read_upgrades(&self.storage, &catalog);
        let mut session = GameSession::new(catalog, seed);
        if let Some(upgrades) = upgrades {
            session.adopt_upgrades(upgrades);
        }
        Ok(session)
    }

    /// Write the session into `slot`, stamped with the current wall clock
    ///
    /// # Errors
    ///
    /// Returns an error for unknown slots or if the backend write fails.
    pub fn save_game(&self, slot: &str, session: &GameSession) -> Result<SaveSlot, SaveError> {
        let data = session.to_save_slot(chrono::Utc::now().timestamp_millis());
        save::write_slot(&self.storage, slot, &data)?;
        Ok(data)
    }

    /// Rebuild a session from `slot`. Unreadable slots yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the catalog cannot be loaded.
    pub fn load_game(&self, slot: &str, seed: u64) -> Result<Option<GameSession>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
    {
        let Some(data) = save::read_slot(&self.storage, slot) else {
            return Ok(None);
        };
        let catalog = self.data_loader.load_catalog().map_err(Into::into)?;
        let mut session = GameSession::new(catalog, seed);
        session.restore(data);
        Ok(Some(session))
    }

    /// Restore `slot` into an existing session. Returns whether anything loaded.
    pub fn load_into(&self, slot: &str, session: &mut GameSession) -> bool {
        if let Some(data) = save::read_slot(&self.storage, slot) {
            session.restore(data);
            true
        } else {
            false
        }
    }

    /// Write any pending autosave and upgrade record for `session`
    ///
    /// # Errors
    ///
    /// Returns an error if a backend write fails; the requests are consumed
    /// either way.
    pub fn flush_autosave(&self, session: &mut GameSession) -> Result<bool, SaveError> {
        let mut wrote = false;
        if session.take_upgrades_dirty() {
            save::write_upgrades(&self.storage, session.upgrades())?;
            wrote = true;
        }
        if session.take_autosave_request() {
            self.save_game(constants::AUTOSAVE_SLOT, session)?;
            wrote = true;
        }
        Ok(wrote)
    }

    #[must_use]
    pub fn slot_info(&self, slot: &str) -> Option<SlotInfo> {
        save::slot_info(&self.storage, slot)
    }

    #[must_use]
    pub fn list_slots(&self) -> Vec<(&'static str, Option<SlotInfo>)> {
        save::list_slots(&self.storage)
    }

    /// Delete a save slot
    ///
    /// # Errors
    ///
    /// Returns an error for unknown slots or if the backend refuses.
    pub fn delete_slot(&self, slot: &str) -> Result<(), SaveError> {
        save::delete_slot(&self.storage, slot)
    }
}
