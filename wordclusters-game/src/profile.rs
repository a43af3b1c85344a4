//! Persisted player profile and per-level progress
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version of the persisted profile schema.
///
/// Written into every saved profile so future readers can tell old files
/// apart. No migration logic exists yet; the field is reserved.
pub const SCHEMA_VERSION: u32 = 1;

const fn schema_version_default() -> u32 {
    SCHEMA_VERSION
}

/// Durable aggregate of everything the game remembers about a player.
///
/// Exclusively owned by [`ProfileStore`](crate::store::ProfileStore); other
/// code only sees clones handed out by its query methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    #[serde(default = "schema_version_default")]
    pub schema_version: u32,
    /// Currently selected localization, unset until the player picks one
    #[serde(default)]
    pub localization_def_id: Option<String>,
    #[serde(default)]
    pub is_sounds_muted: bool,
    /// One-shot flag for the how-to-play hint
    #[serde(default)]
    pub is_how_to_play_hint_shown: bool,
    /// Per-level progress keyed by level def id
    #[serde(default)]
    pub levels_progress: HashMap<String, LevelProgress>,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            localization_def_id: None,
            is_sounds_muted: false,
            is_how_to_play_hint_shown: false,
            levels_progress: HashMap::new(),
        }
    }
}

impl PlayerProfile {
    /// Parse a profile from its persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a valid profile.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the profile to the indented JSON form written to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Cluster placement and completion state for a single level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    /// Redundant copy of the owning map key
    pub level_def_id: String,
    #[serde(default)]
    pub is_completed: bool,
    /// Clusters the player has not placed yet, in presentation order
    #[serde(default)]
    pub undistributed_clusters: Vec<String>,
    /// Groups of clusters already placed together
    #[serde(default)]
    pub distributed_clusters: Vec<Vec<String>>,
}

impl LevelProgress {
    /// Fresh, untouched progress for a level.
    #[must_use]
    pub fn new(level_def_id: impl Into<String>) -> Self {
        Self {
            level_def_id: level_def_id.into(),
            is_completed: false,
            undistributed_clusters: Vec::new(),
            distributed_clusters: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_roundtrips_through_json() {
        let mut profile = PlayerProfile {
            localization_def_id: Some("loc-en".to_string()),
            is_sounds_muted: true,
            is_how_to_play_hint_shown: true,
            ..PlayerProfile::default()
        };
        profile.levels_progress.insert(
            "level-1".to_string(),
            LevelProgress {
                level_def_id: "level-1".to_string(),
                is_completed: true,
                undistributed_clusters: vec!["CAT".to_string()],
                distributed_clusters: vec![vec!["DO".to_string(), "G".to_string()]],
            },
        );

        let json = profile.to_json().unwrap();
        let parsed = PlayerProfile::from_json(&json).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn empty_profile_roundtrips_through_json() {
        let profile = PlayerProfile::default();
        let parsed = PlayerProfile::from_json(&profile.to_json().unwrap()).unwrap();
        assert_eq!(parsed, profile);
        assert!(parsed.levels_progress.is_empty());
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let parsed = PlayerProfile::from_json("{}").unwrap();
        assert_eq!(parsed.schema_version, SCHEMA_VERSION);
        assert_eq!(parsed.localization_def_id, None);
        assert!(!parsed.is_sounds_muted);
        assert!(!parsed.is_how_to_play_hint_shown);
        assert!(parsed.levels_progress.is_empty());
    }

    #[test]
    fn persisted_field_names_are_camel_case() {
        let json = r#"{
            "schemaVersion": 1,
            "localizationDefId": "loc-en",
            "isSoundsMuted": false,
            "isHowToPlayHintShown": true,
            "levelsProgress": {
                "level-1": {
                    "levelDefId": "level-1",
                    "isCompleted": false,
                    "undistributedClusters": ["CAT"],
                    "distributedClusters": [["DO", "G"]]
                }
            }
        }"#;

        let parsed = PlayerProfile::from_json(json).unwrap();
        assert_eq!(parsed.localization_def_id.as_deref(), Some("loc-en"));
        assert!(parsed.is_how_to_play_hint_shown);
        let progress = &parsed.levels_progress["level-1"];
        assert_eq!(progress.level_def_id, "level-1");
        assert_eq!(progress.undistributed_clusters, vec!["CAT".to_string()]);
        assert_eq!(
            progress.distributed_clusters,
            vec![vec!["DO".to_string(), "G".to_string()]]
        );
    }
}
