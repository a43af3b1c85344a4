//! Read-only game definitions consulted by the profile store
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Settings applied before the player has chosen anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultSettings {
    pub localization_def_id: String,
}

/// One playable localization and the levels that belong to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocalizationDef {
    /// Display name, e.g. "English"
    #[serde(default)]
    pub name: String,
    /// Level def ids in play order
    #[serde(default)]
    pub levels: Vec<String>,
}

/// Content definition of a single level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LevelDef {
    /// Solution words assembled in this level
    #[serde(default)]
    pub words: Vec<String>,
}

/// Container for all game content the progress layer consults.
///
/// Never mutated by this crate; passed by reference into the operations
/// that validate or aggregate against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDefs {
    pub default_settings: DefaultSettings,
    #[serde(default)]
    pub localizations: HashMap<String, LocalizationDef>,
    #[serde(default)]
    pub levels: HashMap<String, LevelDef>,
}

impl GameDefs {
    /// Create empty game defs (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self {
            default_settings: DefaultSettings {
                localization_def_id: String::new(),
            },
            localizations: HashMap::new(),
            levels: HashMap::new(),
        }
    }

    /// Load game defs from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid game defs.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Localization definition for `localization_def_id`, if any.
    #[must_use]
    pub fn localization(&self, localization_def_id: &str) -> Option<&LocalizationDef> {
        self.localizations.get(localization_def_id)
    }

    /// Level definition for `level_def_id`, if any.
    #[must_use]
    pub fn level(&self, level_def_id: &str) -> Option<&LevelDef> {
        self.levels.get(level_def_id)
    }

    /// Whether `localization_def_id` names a known localization.
    #[must_use]
    pub fn has_localization(&self, localization_def_id: &str) -> bool {
        self.localizations.contains_key(localization_def_id)
    }
}
