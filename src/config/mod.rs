//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::MatchFormat;

/// Prefix of environment variables overriding file settings,
/// e.g. `PADEL__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "PADEL";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to load config: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Snapshot server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Shared secret clients must present. Unset means every request is refused.
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            auth_token: None,
        }
    }
}

/// Remote sync client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the snapshot server
    #[serde(default = "default_sync_base_url")]
    pub base_url: String,

    /// Quiet period before a local change is pushed
    #[serde(default = "default_push_debounce")]
    pub push_debounce_ms: u64,

    /// Interval between remote pulls in `sync watch`
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_sync_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_push_debounce() -> u64 {
    2000
}

fn default_poll_interval() -> u64 {
    300
}

fn default_timeout() -> u64 {
    30
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: default_sync_base_url(),
            push_debounce_ms: default_push_debounce(),
            poll_interval_secs: default_poll_interval(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Input limits applied before score edits reach the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub default_format: MatchFormat,

    #[serde(default = "default_max_games_two_sets")]
    pub max_games_two_sets: u32,

    #[serde(default = "default_max_games_one_set")]
    pub max_games_one_set: u32,

    #[serde(default = "default_max_tiebreak_points")]
    pub max_tiebreak_points: u32,
}

fn default_max_games_two_sets() -> u32 {
    7
}

fn default_max_games_one_set() -> u32 {
    9
}

fn default_max_tiebreak_points() -> u32 {
    30
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_format: MatchFormat::default(),
            max_games_two_sets: default_max_games_two_sets(),
            max_games_one_set: default_max_games_one_set(),
            max_tiebreak_points: default_max_tiebreak_points(),
        }
    }
}

impl ScoringConfig {
    pub fn max_games(&self, format: MatchFormat) -> u32 {
        match format {
            MatchFormat::TwoSets => self.max_games_two_sets,
            MatchFormat::OneSetToNine => self.max_games_one_set,
        }
    }

    /// Clamp a raw game count to `[0, max_games(format)]`.
    pub fn clamp_games(&self, format: MatchFormat, value: i64) -> u32 {
        clamp_to(value, self.max_games(format))
    }

    /// Clamp a raw tie-break point count to `[0, max_tiebreak_points]`.
    pub fn clamp_tiebreak(&self, value: i64) -> u32 {
        clamp_to(value, self.max_tiebreak_points)
    }
}

fn clamp_to(value: i64, max: u32) -> u32 {
    value.clamp(0, i64::from(max)) as u32
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            sync: SyncConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an optional TOML file layered under
    /// `PADEL__`-prefixed environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.sync.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Sync timeout must be greater than 0".to_string(),
            ));
        }

        if self.sync.push_debounce_ms == 0 || self.sync.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Sync intervals must be greater than 0".to_string(),
            ));
        }

        let scoring = &self.scoring;
        if scoring.max_games_two_sets == 0
            || scoring.max_games_one_set == 0
            || scoring.max_tiebreak_points == 0
        {
            return Err(ConfigError::ValidationError(
                "Scoring maxima must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
