//! Operator preferences kept between runs (the browser's local storage).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::PREFERENCES_FILE;
use crate::models::RecordId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Guild selected last time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<RecordId>,
}

/// File-backed [`Preferences`]. Read and write failures never reach the operator.
#[derive(Debug, Clone)]
pub struct PreferencesStorage {
    path: PathBuf,
    prefs: Preferences,
}

impl PreferencesStorage {
    pub fn new(data_dir: &Path) -> Self {
        let path = data_dir.join(PREFERENCES_FILE);
        let prefs = Self::load_from_file(&path).unwrap_or_default();
        Self { path, prefs }
    }

    /// Preferences that are never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            prefs: Preferences::default(),
        }
    }

    fn load_from_file(path: &Path) -> Option<Preferences> {
        let contents = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    fn save(&self) {
        if self.path.as_os_str().is_empty() {
            return;
        }
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create preferences dir: {}", e);
                return;
            }
        }
        match serde_json::to_string_pretty(&self.prefs) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    tracing::warn!("Failed to save preferences: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize preferences: {}", e),
        }
    }

    pub fn guild_id(&self) -> Option<&RecordId> {
        self.prefs.guild_id.as_ref()
    }

    pub fn remember_guild(&mut self, guild_id: RecordId) {
        if self.prefs.guild_id.as_ref() == Some(&guild_id) {
            return;
        }
        self.prefs.guild_id = Some(guild_id);
        self.save();
    }
}
