//! WordClusters Player Core
//!
//! Platform-agnostic player state for the WordClusters puzzle game.
//! This crate owns the persisted player profile, its mutation and
//! observation surface, and the debounced save path, without UI or
//! platform-specific dependencies.

pub mod defs;
pub mod observable;
pub mod persist;
pub mod profile;
pub mod store;

// Re-export commonly used types
pub use defs::{DefaultSettings, GameDefs, LevelDef, LocalizationDef};
pub use observable::{ObservableField, Subscription};
pub use persist::{DebouncedSaver, DiskFileService, PLAYER_PROFILE_PATH, SaveError};
pub use profile::{LevelProgress, PlayerProfile, SCHEMA_VERSION};
pub use store::{ProfileStore, StoreError};

/// Trait for abstracting durable blob storage
/// Platform-specific implementations should provide this
pub trait FileService {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Write the full contents of the file at `path`, replacing whatever
    /// was there before
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be written.
    fn write_all_text(&self, path: &str, content: &str) -> Result<(), Self::Error>;

    /// Read the full contents of the file at `path`, or `None` when no
    /// such file exists
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    fn read_all_text(&self, path: &str) -> Result<Option<String>, Self::Error>;
}
