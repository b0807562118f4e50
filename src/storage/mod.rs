//! Filesystem storage for the local tracker state.
//!
//! Everything lives under one data directory:
//! - `encounters.jsonl`: every encounter, newest first
//! - `players/{team}.jsonl`: one roster per team
//! - `settings.json`: local sync settings
//! - `state/remote_state.json`: the document held by the snapshot server

pub mod encounters;
pub mod jsonl;
pub mod players;
pub mod settings;

pub use encounters::EncounterStore;
pub use jsonl::{JsonlReader, JsonlWriter};
pub use players::{PlayerStore, LOCAL_TEAM};
pub use settings::{SettingsStore, SnapshotFile, SyncSettings};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Roster is full ({0} players max)")]
    RosterFull(usize),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn encounters_path(&self) -> PathBuf {
        self.data_dir.join("encounters.jsonl")
    }

    pub fn players_dir(&self) -> PathBuf {
        self.data_dir.join("players")
    }

    pub fn players_path(&self, team: &str) -> PathBuf {
        self.players_dir().join(format!("{}.jsonl", team))
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.state_dir().join("remote_state.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
