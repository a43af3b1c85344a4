//! Player profile store: mutation, observation, and save scheduling
use std::cell::RefCell;
use std::rc::Rc;

use tokio::task::JoinHandle;

use crate::FileService;
use crate::defs::GameDefs;
use crate::observable::ObservableField;
use crate::persist::{DebouncedSaver, PLAYER_PROFILE_PATH, SaveError};
use crate::profile::{LevelProgress, PlayerProfile};

/// Caller-contract or content-data violation raised by a store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A level was completed without any progress entry having been created
    #[error("no progress entry exists for level '{0}'")]
    MissingProgress(String),
    /// The current localization is not defined in the game defs
    #[error("localization '{0}' is not defined in the game defs")]
    UnknownLocalization(String),
    /// A localization lists a level that has no content definition
    #[error("level '{level}' of localization '{localization}' has no level definition")]
    MissingLevelDef { level: String, localization: String },
}

/// Sole owner and mutator of the persisted [`PlayerProfile`].
///
/// Publishes localization, sounds-muted, and last-updated-level changes
/// through observable cells, and schedules debounced saves through the
/// supplied [`FileService`]. All published fields use force-notify: the
/// interesting event is *which* field or level was touched, not whether
/// the value happened to change.
pub struct ProfileStore<S> {
    profile: Rc<RefCell<PlayerProfile>>,
    saver: DebouncedSaver<S>,
    localization_def_id: ObservableField<Option<String>>,
    updated_level_def_id: ObservableField<Option<String>>,
    is_sounds_muted: ObservableField<bool>,
}

impl<S: FileService + 'static> ProfileStore<S> {
    /// Wrap an already-loaded profile, seeding the observable cells from it.
    #[must_use]
    pub fn new(profile: PlayerProfile, file_service: S) -> Self {
        let localization_def_id = ObservableField::new(profile.localization_def_id.clone());
        let is_sounds_muted = ObservableField::new(profile.is_sounds_muted);
        let profile = Rc::new(RefCell::new(profile));
        let saver = DebouncedSaver::new(
            Rc::clone(&profile),
            Rc::new(file_service),
            PLAYER_PROFILE_PATH,
        );
        Self {
            profile,
            saver,
            localization_def_id,
            updated_level_def_id: ObservableField::new(None),
            is_sounds_muted,
        }
    }

    /// Load the profile from the well-known path, falling back to a fresh
    /// default profile when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(file_service: S) -> Result<Self, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let profile = match file_service
            .read_all_text(PLAYER_PROFILE_PATH)
            .map_err(Into::into)?
        {
            Some(json) => PlayerProfile::from_json(&json)?,
            None => PlayerProfile::default(),
        };
        Ok(Self::new(profile, file_service))
    }

    /// Currently selected localization id; force-notified on every
    /// [`set_localization`](Self::set_localization).
    #[must_use]
    pub fn localization_def_id(&self) -> &ObservableField<Option<String>> {
        &self.localization_def_id
    }

    /// Id of the level whose progress was written last; force-notified on
    /// every progress write, independently of the localization channel.
    #[must_use]
    pub fn updated_level_def_id(&self) -> &ObservableField<Option<String>> {
        &self.updated_level_def_id
    }

    /// Mute flag; force-notified on every [`set_sounds_muted`](Self::set_sounds_muted).
    #[must_use]
    pub fn is_sounds_muted(&self) -> &ObservableField<bool> {
        &self.is_sounds_muted
    }

    /// Set the mute flag. Notifies even when the value did not change.
    pub fn set_sounds_muted(&self, is_muted: bool) {
        self.profile.borrow_mut().is_sounds_muted = is_muted;
        self.is_sounds_muted.force_set(is_muted);
    }

    /// Select a localization, validated against the catalog.
    ///
    /// An unknown id is rejected with a warning and the previous selection
    /// is kept (or the catalog default when nothing was selected yet); the
    /// localization cell emits the resolved id either way.
    pub fn set_localization(&self, localization_def_id: &str, defs: &GameDefs) {
        let resolved = if defs.has_localization(localization_def_id) {
            localization_def_id.to_string()
        } else {
            log::warn!("'{localization_def_id}' localization not found");
            self.profile
                .borrow()
                .localization_def_id
                .clone()
                .unwrap_or_else(|| defs.default_settings.localization_def_id.clone())
        };
        self.profile.borrow_mut().localization_def_id = Some(resolved.clone());
        self.localization_def_id.force_set(Some(resolved));
    }

    /// Mark an existing level as completed, leaving its clusters untouched.
    ///
    /// Callers must have created the entry beforehand via
    /// [`add_or_update_level_progress`](Self::add_or_update_level_progress);
    /// completing an unknown level is a contract violation, not a lazy
    /// creation point. Completing an already-completed level is idempotent
    /// in state but still notifies the updated-level cell.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingProgress`] when the level has no entry.
    pub fn complete_level(&self, level_def_id: &str) -> Result<(), StoreError> {
        {
            let mut profile = self.profile.borrow_mut();
            let progress = profile
                .levels_progress
                .get_mut(level_def_id)
                .ok_or_else(|| StoreError::MissingProgress(level_def_id.to_string()))?;
            progress.is_completed = true;
        }
        self.updated_level_def_id
            .force_set(Some(level_def_id.to_string()));
        Ok(())
    }

    /// Create or overwrite the cluster placement of a level.
    ///
    /// The entry is created lazily on first write; an existing entry keeps
    /// its completion flag and has both cluster collections replaced.
    pub fn add_or_update_level_progress(
        &self,
        level_def_id: &str,
        undistributed_clusters: Vec<String>,
        distributed_clusters: Vec<Vec<String>>,
    ) {
        {
            let mut profile = self.profile.borrow_mut();
            let progress = profile
                .levels_progress
                .entry(level_def_id.to_string())
                .or_insert_with(|| LevelProgress::new(level_def_id));
            progress.undistributed_clusters = undistributed_clusters;
            progress.distributed_clusters = distributed_clusters;
        }
        self.updated_level_def_id
            .force_set(Some(level_def_id.to_string()));
    }

    /// Whether any level has a progress entry at all.
    #[must_use]
    pub fn has_any_progress(&self) -> bool {
        !self.profile.borrow().levels_progress.is_empty()
    }

    /// Whether `level_def_id` has a progress entry.
    #[must_use]
    pub fn has_progress(&self, level_def_id: &str) -> bool {
        self.profile
            .borrow()
            .levels_progress
            .contains_key(level_def_id)
    }

    /// Snapshot of a level's progress, if any.
    #[must_use]
    pub fn progress(&self, level_def_id: &str) -> Option<LevelProgress> {
        self.profile
            .borrow()
            .levels_progress
            .get(level_def_id)
            .cloned()
    }

    /// Whether the level has a progress entry marked completed. False when
    /// no entry exists.
    #[must_use]
    pub fn is_level_completed(&self, level_def_id: &str) -> bool {
        self.profile
            .borrow()
            .levels_progress
            .get(level_def_id)
            .is_some_and(|progress| progress.is_completed)
    }

    /// Whether the how-to-play hint was already shown.
    #[must_use]
    pub fn is_hint_shown(&self) -> bool {
        self.profile.borrow().is_how_to_play_hint_shown
    }

    /// Record that the how-to-play hint was shown. Not observable.
    pub fn mark_hint_shown(&self) {
        self.profile.borrow_mut().is_how_to_play_hint_shown = true;
    }

    // Stored selection, or the catalog default before anything was selected.
    fn current_localization_id(&self, defs: &GameDefs) -> String {
        self.profile
            .borrow()
            .localization_def_id
            .clone()
            .unwrap_or_else(|| defs.default_settings.localization_def_id.clone())
    }

    /// Total word count across the current localization's completed levels.
    ///
    /// Levels without progress, or whose progress is not completed,
    /// contribute nothing. A level the localization lists without a content
    /// definition is corrupt content and surfaces as an error instead of
    /// being skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownLocalization`] when the current
    /// localization is missing from the catalog, and
    /// [`StoreError::MissingLevelDef`] for a listed level without a
    /// definition.
    pub fn completed_word_count(&self, defs: &GameDefs) -> Result<usize, StoreError> {
        let localization_def_id = self.current_localization_id(defs);
        let localization = defs
            .localization(&localization_def_id)
            .ok_or_else(|| StoreError::UnknownLocalization(localization_def_id.clone()))?;

        let profile = self.profile.borrow();
        let mut result = 0;
        for level_def_id in &localization.levels {
            let Some(progress) = profile.levels_progress.get(level_def_id) else {
                continue;
            };
            if !progress.is_completed {
                continue;
            }
            let level = defs
                .level(level_def_id)
                .ok_or_else(|| StoreError::MissingLevelDef {
                    level: level_def_id.clone(),
                    localization: localization_def_id.clone(),
                })?;
            result += level.words.len();
        }
        Ok(result)
    }

    /// Forget all progress belonging to the current localization, leaving
    /// other localizations' entries alone. Does not notify.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownLocalization`] when the current
    /// localization is missing from the catalog.
    pub fn clear_progress(&self, defs: &GameDefs) -> Result<(), StoreError> {
        let localization_def_id = self.current_localization_id(defs);
        let localization = defs
            .localization(&localization_def_id)
            .ok_or(StoreError::UnknownLocalization(localization_def_id))?;

        let mut profile = self.profile.borrow_mut();
        for level_def_id in &localization.levels {
            profile.levels_progress.remove(level_def_id);
        }
        Ok(())
    }

    /// Schedule a debounced save of the profile.
    ///
    /// See [`DebouncedSaver::request_save`] for the coalescing contract;
    /// `None` means a save was already pending and this call was absorbed.
    pub fn save(&self) -> Option<JoinHandle<Result<(), SaveError>>> {
        self.saver.request_save()
    }

    /// Whether a save is scheduled but has not run yet.
    #[must_use]
    pub fn is_save_pending(&self) -> bool {
        self.saver.is_pending()
    }
}
