//! Tourbus Session Core
//!
//! Platform-agnostic progression logic for the Tourbus road-trip game: the
//! session record, the onboarding walkthrough, region itineraries and save
//! slots. Rendering, input and audio live outside this crate.

pub mod config;
pub mod constants;
pub mod numbers;
pub mod persistence;
pub mod regions;
pub mod scheduler;
pub mod sequencer;
pub mod session;
pub mod state;
pub mod tutorial;
pub mod validation;

// Re-export commonly used types
pub use config::SessionConfig;
pub use persistence::{
    FileStore, MemoryStore, PersistenceGateway, SaveDataError, SaveHeader, SaveInfo,
    SavedSession, StorageError, validate_save_data,
};
pub use regions::{RegionGraph, RegionId, RegionInfo};
pub use scheduler::{EventKind, EventPlan, PlannedEvent, clamp_progress, exit_thresholds};
pub use sequencer::{region_hash, sequence_count};
pub use session::{ChangeListener, Session};
pub use state::{SeatPosition, SessionState, StatePatch, ViewMode};
pub use tutorial::{Transition, TutorialPhase};
pub use validation::{FieldRule, bounds_for, validate_field};

/// Trait for abstracting save-slot storage.
/// Platform-specific implementations should provide this
pub trait SaveStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the raw record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read. A missing slot is
    /// `Ok(None)`.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replace the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn write(&self, key: &str, contents: &str) -> Result<(), Self::Error>;

    /// Delete the record stored under `key`. Deleting a missing slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the delete.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}
