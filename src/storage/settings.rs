//! Single-document JSON files: local settings and the server snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{StorageConfig, StorageError};

/// Locally persisted sync settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// `settings.json` in the data directory.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: config.settings_path(),
        }
    }

    /// Stored settings, or defaults when nothing was saved yet.
    pub fn load(&self) -> Result<SyncSettings, StorageError> {
        if !self.path.exists() {
            return Ok(SyncSettings::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, settings: &SyncSettings) -> Result<(), StorageError> {
        write_atomic(&self.path, &serde_json::to_vec_pretty(settings)?)?;
        debug!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

/// The raw JSON document held by the snapshot server.
///
/// The server stores whatever valid JSON clients send; it does not
/// interpret the snapshot.
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: config.snapshot_path(),
        }
    }

    pub fn read(&self) -> Result<Option<serde_json::Value>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    pub fn write(&self, document: &serde_json::Value) -> Result<(), StorageError> {
        write_atomic(&self.path, &serde_json::to_vec(document)?)?;
        debug!("Stored snapshot in {:?}", self.path);
        Ok(())
    }
}
