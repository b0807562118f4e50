//! Remote snapshot sync.
//!
//! The whole local state (roster, encounters, team settings) travels as one
//! JSON snapshot keyed by the team's sync token:
//! 1. Fetch the remote snapshot
//! 2. If it differs from local state, it replaces local state wholesale
//! 3. If there is none yet, push local state
//!
//! Last writer wins. There is no merging and no conflict detection.

pub mod token;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::SyncConfig;
use crate::models::{Encounter, Player};
use crate::storage::{
    EncounterStore, PlayerStore, SettingsStore, StorageConfig, StorageError, LOCAL_TEAM,
};

pub use token::SyncCredentials;

/// Header carrying the sync token on snapshot requests.
pub const AUTH_HEADER: &str = "x-auth-token";

/// Errors that can occur during sync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote rejected the sync token")]
    Unauthorized,

    #[error("Unexpected HTTP status {0}")]
    UnexpectedStatus(u16),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid sync token: {0}")]
    InvalidToken(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Sync is not set up; create or join a team first")]
    NotConfigured,
}

/// Team settings carried in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSettings {
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub team_secret: String,
    #[serde(default)]
    pub sync_token: String,
}

/// Everything a device shares with its team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub encounters: Vec<Encounter>,
    #[serde(default)]
    pub settings: SnapshotSettings,
}

fn lenient_list<T: DeserializeOwned>(field: &str, value: Option<&Value>) -> Vec<T> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| match T::deserialize(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Dropping {}[{}] from remote snapshot: {}", field, idx, e);
                None
            }
        })
        .collect()
}

fn text_field(settings: Option<&Value>, key: &str) -> String {
    settings
        .and_then(|s| s.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl SyncSnapshot {
    /// Read a snapshot from arbitrary JSON. Missing or non-array lists become
    /// empty, unreadable entries are dropped, missing settings become `""`.
    pub fn from_value(value: &Value) -> Self {
        let settings = value.get("settings");
        Self {
            players: lenient_list("players", value.get("players")),
            encounters: lenient_list("encounters", value.get("encounters")),
            settings: SnapshotSettings {
                team_name: text_field(settings, "teamName"),
                team_secret: text_field(settings, "teamSecret"),
                sync_token: text_field(settings, "syncToken"),
            },
        }
    }

    /// SHA-256 hex digest of the serialized snapshot. Two snapshots are the
    /// same state iff their fingerprints match.
    pub fn fingerprint(&self) -> String {
        // Serializing plain data structs into memory does not fail.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }
}

/// Somewhere a team snapshot can be fetched from and pushed to.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The stored snapshot, `None` when the team has none yet.
    async fn fetch(&self, token: &str) -> Result<Option<SyncSnapshot>, SyncError>;

    async fn push(&self, token: &str, snapshot: &SyncSnapshot) -> Result<(), SyncError>;
}

/// `RemoteStore` backed by the snapshot server's `/api/state` endpoint.
pub struct HttpRemoteStore {
    client: Client,
    endpoint: Url,
}

impl HttpRemoteStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("padel-tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Self::with_client(base_url, client)
    }

    /// Use a preconfigured client, e.g. one with custom proxy settings.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self, SyncError> {
        let endpoint = Url::parse(base_url)?.join("api/state")?;
        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_seconds))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn check_status(status: StatusCode) -> Result<(), SyncError> {
    match status {
        StatusCode::UNAUTHORIZED => Err(SyncError::Unauthorized),
        s if !s.is_success() => Err(SyncError::UnexpectedStatus(s.as_u16())),
        _ => Ok(()),
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch(&self, token: &str) -> Result<Option<SyncSnapshot>, SyncError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(AUTH_HEADER, token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            debug!("No remote snapshot at {}", self.endpoint);
            return Ok(None);
        }
        check_status(status)?;

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(&body)?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(SyncSnapshot::from_value(&value)))
    }

    async fn push(&self, token: &str, snapshot: &SyncSnapshot) -> Result<(), SyncError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTH_HEADER, token)
            .json(snapshot)
            .send()
            .await?;

        check_status(response.status())?;
        debug!("Pushed snapshot to {}", self.endpoint);
        Ok(())
    }
}

/// What a sync round did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another sync was already running
    Skipped,
    /// The remote differs; the caller must replace local state with it
    RemoteApplied(SyncSnapshot),
    UpToDate,
    /// The remote was empty and received local state
    Pushed,
}

/// Clears the in-flight flag when a sync round ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs sync rounds for one team against a remote store.
pub struct SyncOrchestrator<R> {
    remote: R,
    token: String,
    in_flight: AtomicBool,
    last_synced: RwLock<Option<String>>,
}

impl<R: RemoteStore> SyncOrchestrator<R> {
    pub fn new(remote: R, token: impl Into<String>) -> Self {
        Self {
            remote,
            token: token.into(),
            in_flight: AtomicBool::new(false),
            last_synced: RwLock::new(None),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Fingerprint of the snapshot last pulled or pushed.
    pub async fn last_fingerprint(&self) -> Option<String> {
        self.last_synced.read().await.clone()
    }

    /// Pull the remote snapshot, or seed the remote with `local` when empty.
    pub async fn sync_now(&self, local: &SyncSnapshot) -> Result<SyncOutcome, SyncError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("Sync already in progress, skipping");
            return Ok(SyncOutcome::Skipped);
        };

        match self.remote.fetch(&self.token).await? {
            Some(remote) => {
                let remote_fp = remote.fingerprint();
                let differs = remote_fp != local.fingerprint();
                *self.last_synced.write().await = Some(remote_fp);

                if differs {
                    info!(
                        "Remote snapshot differs: {} players, {} encounters",
                        remote.players.len(),
                        remote.encounters.len()
                    );
                    Ok(SyncOutcome::RemoteApplied(remote))
                } else {
                    Ok(SyncOutcome::UpToDate)
                }
            }
            None => {
                self.remote.push(&self.token, local).await?;
                *self.last_synced.write().await = Some(local.fingerprint());
                info!("Remote was empty, pushed local snapshot");
                Ok(SyncOutcome::Pushed)
            }
        }
    }

    /// Push `local` unless it matches what was last synced. Returns whether
    /// a push happened. Skipped while another sync round runs.
    pub async fn push_if_changed(&self, local: &SyncSnapshot) -> Result<bool, SyncError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Ok(false);
        };

        let fp = local.fingerprint();
        if self.last_synced.read().await.as_deref() == Some(fp.as_str()) {
            return Ok(false);
        }

        self.remote.push(&self.token, local).await?;
        *self.last_synced.write().await = Some(fp);
        info!(
            "Pushed local changes: {} players, {} encounters",
            local.players.len(),
            local.encounters.len()
        );
        Ok(true)
    }
}

/// Token and credentials saved in local settings, if the device joined a team.
pub fn saved_credentials(
    storage: &StorageConfig,
) -> Result<Option<(String, SyncCredentials)>, SyncError> {
    let settings = SettingsStore::new(storage).load()?;
    match settings.sync_token.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => {
            let creds = token::parse_sync_token(t)?;
            Ok(Some((t.to_string(), creds)))
        }
        _ => Ok(None),
    }
}

/// Roster key for the current device: the team id once joined, else `local`.
pub fn roster_team(storage: &StorageConfig) -> Result<String, SyncError> {
    Ok(match saved_credentials(storage)? {
        Some((_, creds)) => token::team_id(&creds).to_string(),
        None => LOCAL_TEAM.to_string(),
    })
}

/// Assemble the snapshot of everything stored locally.
pub fn local_snapshot(storage: &StorageConfig) -> Result<SyncSnapshot, SyncError> {
    let credentials = saved_credentials(storage)?;
    let team = match &credentials {
        Some((_, creds)) => token::team_id(creds).to_string(),
        None => LOCAL_TEAM.to_string(),
    };

    let settings = match credentials {
        Some((sync_token, creds)) => SnapshotSettings {
            team_name: creds.team_name,
            team_secret: creds.team_secret,
            sync_token,
        },
        None => SnapshotSettings::default(),
    };

    Ok(SyncSnapshot {
        players: PlayerStore::for_team(storage, &team).list()?,
        encounters: EncounterStore::new(storage).list()?,
        settings,
    })
}

/// Replace local roster and encounters with a remote snapshot.
/// Remote matches are rescored locally; the local sync token is kept.
pub fn apply_snapshot(storage: &StorageConfig, snapshot: &SyncSnapshot) -> Result<(), SyncError> {
    let team = roster_team(storage)?;
    PlayerStore::for_team(storage, &team).replace_all(&snapshot.players)?;

    let mut encounters = snapshot.encounters.clone();
    for encounter in &mut encounters {
        encounter.rescore();
    }
    EncounterStore::new(storage).replace_all(&encounters)?;
    info!(
        "Applied remote snapshot: {} players, {} encounters",
        snapshot.players.len(),
        snapshot.encounters.len()
    );
    Ok(())
}

/// Tracks local state between ticks; a change is pushed only once it has
/// stayed put for a whole tick.
#[derive(Debug, Default)]
pub struct Debounce {
    last_seen: Option<String>,
}

impl Debounce {
    /// Record the current fingerprint and report whether it is unchanged
    /// since the previous observation.
    pub fn settled(&mut self, fingerprint: String) -> bool {
        let stable = self.last_seen.as_deref() == Some(fingerprint.as_str());
        self.last_seen = Some(fingerprint);
        stable
    }
}

/// Run one pull and apply whatever it brought in.
pub async fn pull_and_apply<R: RemoteStore>(
    orchestrator: &SyncOrchestrator<R>,
    storage: &StorageConfig,
) -> Result<SyncOutcome, SyncError> {
    let local = local_snapshot(storage)?;
    let outcome = orchestrator.sync_now(&local).await?;
    if let SyncOutcome::RemoteApplied(remote) = &outcome {
        apply_snapshot(storage, remote)?;
    }
    Ok(outcome)
}

/// One debounce tick: push local state once it has settled. Failures are
/// logged and reported as "nothing pushed".
async fn push_if_settled<R: RemoteStore>(
    orchestrator: &SyncOrchestrator<R>,
    storage: &StorageConfig,
    pending: &mut Debounce,
) -> bool {
    let local = match local_snapshot(storage) {
        Ok(local) => local,
        Err(e) => {
            error!("Reading local state failed: {}", e);
            return false;
        }
    };
    if !pending.settled(local.fingerprint()) {
        return false;
    }
    match orchestrator.push_if_changed(&local).await {
        Ok(pushed) => pushed,
        Err(e) => {
            error!("Push failed: {}", e);
            false
        }
    }
}

/// Keep local state in sync until Ctrl-C: pull every `poll`, push local
/// changes once they have settled for `debounce`.
pub async fn watch<R: RemoteStore>(
    orchestrator: &SyncOrchestrator<R>,
    storage: &StorageConfig,
    poll: Duration,
    debounce: Duration,
) -> Result<(), SyncError> {
    let mut pull = interval(poll);
    let mut settle = interval(debounce);
    settle.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pending = Debounce::default();

    info!(
        "Watching for changes: pull every {:?}, push after {:?} idle",
        poll, debounce
    );

    loop {
        tokio::select! {
            _ = pull.tick() => {
                match pull_and_apply(orchestrator, storage).await {
                    Ok(outcome) => debug!("Pull finished: {:?}", outcome),
                    Err(e) => error!("Sync failed: {}", e),
                }
            }
            _ = settle.tick() => {
                push_if_settled(orchestrator, storage, &mut pending).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Sync watch stopped");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EncounterMode, MatchFormat, SetScore, Side};
    use crate::storage::SyncSettings;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tokio::sync::Notify;

    /// In-memory remote, optionally pausing inside `fetch` until released.
    #[derive(Default)]
    struct MemoryRemote {
        stored: Mutex<Option<SyncSnapshot>>,
        pushes: AtomicUsize,
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl MemoryRemote {
        fn holding(snapshot: SyncSnapshot) -> Self {
            Self {
                stored: Mutex::new(Some(snapshot)),
                ..Default::default()
            }
        }

        fn pushes(&self) -> usize {
            self.pushes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteStore for MemoryRemote {
        async fn fetch(&self, _token: &str) -> Result<Option<SyncSnapshot>, SyncError> {
            if let Some((entered, release)) = &self.gate {
                entered.notify_one();
                release.notified().await;
            }
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn push(&self, _token: &str, snapshot: &SyncSnapshot) -> Result<(), SyncError> {
            self.pushes.fetch_add(1, Ordering::SeqCst);
            *self.stored.lock().unwrap() = Some(snapshot.clone());
            Ok(())
        }
    }

    fn snapshot_with(opponent: &str) -> SyncSnapshot {
        SyncSnapshot {
            players: vec![Player::new("Ana")],
            encounters: vec![Encounter::new(
                opponent,
                EncounterMode::Interclub,
                MatchFormat::TwoSets,
            )],
            settings: SnapshotSettings::default(),
        }
    }

    #[test]
    fn test_from_value_normalizes() {
        let snapshot = SyncSnapshot::from_value(&json!({
            "players": "not a list",
            "settings": {"teamName": "Zuid", "teamSecret": 42}
        }));

        assert!(snapshot.players.is_empty());
        assert!(snapshot.encounters.is_empty());
        assert_eq!(snapshot.settings.team_name, "Zuid");
        assert_eq!(snapshot.settings.team_secret, "");
        assert_eq!(snapshot.settings.sync_token, "");

        assert_eq!(SyncSnapshot::from_value(&json!(null)), SyncSnapshot::default());
    }

    #[test]
    fn test_from_value_drops_unreadable_entries() {
        let snapshot = SyncSnapshot::from_value(&json!({
            "players": [{"id": "p1", "name": "Ana"}, {"name": 7}],
            "encounters": []
        }));
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].name, "Ana");
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = snapshot_with("Club A");
        let same = SyncSnapshot::from_value(&serde_json::to_value(&a).unwrap());
        let mut changed = a.clone();
        changed.settings.team_name = "Other".to_string();

        assert_eq!(a.fingerprint(), same.fingerprint());
        assert_ne!(a.fingerprint(), changed.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_differing_remote_replaces_local() {
        let remote = snapshot_with("Remote Club");
        let orchestrator = SyncOrchestrator::new(MemoryRemote::holding(remote.clone()), "t");

        let outcome = tokio_test::block_on(orchestrator.sync_now(&snapshot_with("Local Club")));
        assert_eq!(outcome.unwrap(), SyncOutcome::RemoteApplied(remote.clone()));
        assert_eq!(orchestrator.remote.pushes(), 0);
        assert_eq!(
            tokio_test::block_on(orchestrator.last_fingerprint()),
            Some(remote.fingerprint())
        );
    }

    #[test]
    fn test_equal_remote_is_up_to_date() {
        let local = snapshot_with("Club");
        let orchestrator = SyncOrchestrator::new(MemoryRemote::holding(local.clone()), "t");

        let outcome = tokio_test::block_on(orchestrator.sync_now(&local)).unwrap();
        assert_eq!(outcome, SyncOutcome::UpToDate);
    }

    #[test]
    fn test_absent_remote_receives_local() {
        let local = snapshot_with("Club");
        let orchestrator = SyncOrchestrator::new(MemoryRemote::default(), "t");

        let outcome = tokio_test::block_on(orchestrator.sync_now(&local)).unwrap();
        assert_eq!(outcome, SyncOutcome::Pushed);
        assert_eq!(orchestrator.remote.pushes(), 1);
        assert_eq!(*orchestrator.remote.stored.lock().unwrap(), Some(local));
    }

    #[tokio::test]
    async fn test_push_if_changed_skips_known_state() {
        let local = snapshot_with("Club");
        let orchestrator = SyncOrchestrator::new(MemoryRemote::default(), "t");

        assert!(orchestrator.push_if_changed(&local).await.unwrap());
        assert!(!orchestrator.push_if_changed(&local).await.unwrap());

        let mut edited = local.clone();
        edited.players.push(Player::new("Ben"));
        assert!(orchestrator.push_if_changed(&edited).await.unwrap());
        assert_eq!(orchestrator.remote.pushes(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_sync_is_skipped() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let remote = MemoryRemote {
            gate: Some((entered.clone(), release.clone())),
            ..Default::default()
        };
        let orchestrator = Arc::new(SyncOrchestrator::new(remote, "t"));
        let local = snapshot_with("Club");

        let first = {
            let orchestrator = orchestrator.clone();
            let local = local.clone();
            tokio::spawn(async move { orchestrator.sync_now(&local).await })
        };
        entered.notified().await;

        assert!(orchestrator.is_syncing());
        assert_eq!(orchestrator.sync_now(&local).await.unwrap(), SyncOutcome::Skipped);
        assert!(!orchestrator.push_if_changed(&local).await.unwrap());

        release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), SyncOutcome::Pushed);
        assert!(!orchestrator.is_syncing());
    }

    #[test]
    fn test_debounce_waits_for_stable_state() {
        let mut debounce = Debounce::default();
        assert!(!debounce.settled("a".to_string()));
        assert!(debounce.settled("a".to_string()));
        assert!(!debounce.settled("b".to_string()));
        assert!(debounce.settled("b".to_string()));
    }

    fn join_team(storage: &StorageConfig, team: &str) -> String {
        let sync_token = token::create_sync_token(team, &token::generate_team_secret());
        SettingsStore::new(storage)
            .save(&SyncSettings {
                sync_token: Some(sync_token.clone()),
            })
            .unwrap();
        sync_token
    }

    #[test]
    fn test_local_snapshot_and_apply() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageConfig::new(temp_dir.path().to_path_buf());

        PlayerStore::for_team(&storage, LOCAL_TEAM).add("Solo").unwrap();
        assert_eq!(local_snapshot(&storage).unwrap().players.len(), 1);

        let sync_token = join_team(&storage, "Zuid");
        let local = local_snapshot(&storage).unwrap();
        assert!(local.players.is_empty());
        assert_eq!(local.settings.team_name, "Zuid");
        assert_eq!(local.settings.sync_token, sync_token);

        let mut remote = snapshot_with("Remote Club");
        remote.settings = local.settings.clone();
        apply_snapshot(&storage, &remote).unwrap();

        let after = local_snapshot(&storage).unwrap();
        assert_eq!(after, remote);
        assert_ne!(roster_team(&storage).unwrap(), LOCAL_TEAM);
    }

    #[tokio::test]
    async fn test_pull_and_apply_writes_remote_state() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageConfig::new(temp_dir.path().to_path_buf());
        let sync_token = join_team(&storage, "Zuid");

        let mut remote = snapshot_with("Remote Club");
        remote.settings = local_snapshot(&storage).unwrap().settings;
        let orchestrator = SyncOrchestrator::new(MemoryRemote::holding(remote.clone()), sync_token);

        let outcome = pull_and_apply(&orchestrator, &storage).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::RemoteApplied(_)));
        assert_eq!(local_snapshot(&storage).unwrap(), remote);

        let again = pull_and_apply(&orchestrator, &storage).await.unwrap();
        assert_eq!(again, SyncOutcome::UpToDate);
    }

    #[tokio::test]
    async fn test_oversized_remote_roster_converges() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageConfig::new(temp_dir.path().to_path_buf());
        let sync_token = join_team(&storage, "Zuid");

        let mut remote = snapshot_with("Remote Club");
        remote.settings = local_snapshot(&storage).unwrap().settings;
        remote.players = ["Ana", "Ben", "Cas", "Dee", "Eve"]
            .into_iter()
            .map(Player::new)
            .collect();
        let orchestrator = SyncOrchestrator::new(MemoryRemote::holding(remote.clone()), sync_token);

        let outcome = pull_and_apply(&orchestrator, &storage).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::RemoteApplied(_)));
        assert_eq!(local_snapshot(&storage).unwrap().players.len(), 5);

        let again = pull_and_apply(&orchestrator, &storage).await.unwrap();
        assert_eq!(again, SyncOutcome::UpToDate);
        assert_eq!(orchestrator.remote.pushes(), 0);
    }

    #[test]
    fn test_apply_snapshot_rescores_remote_matches() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageConfig::new(temp_dir.path().to_path_buf());

        let mut encounter = Encounter::new("Remote Club", EncounterMode::Single, MatchFormat::OneSetToNine);
        if let Some(m) = encounter.single_match.as_mut() {
            m.sets = vec![SetScore::new(2, 9)];
            m.winner = Some(Side::Home);
        }
        let remote = SyncSnapshot {
            encounters: vec![encounter],
            ..Default::default()
        };
        apply_snapshot(&storage, &remote).unwrap();

        let stored = EncounterStore::new(&storage).list().unwrap();
        let m = stored[0].single_match.as_ref().unwrap();
        assert_eq!(m.winner, Some(Side::Away));
        assert_eq!(stored[0].result, None);
    }

    #[tokio::test]
    async fn test_settle_tick_survives_unreadable_state() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageConfig::new(temp_dir.path().to_path_buf());
        let orchestrator = SyncOrchestrator::new(MemoryRemote::default(), "t");
        let mut pending = Debounce::default();

        std::fs::write(storage.settings_path(), "{ half written").unwrap();
        assert!(!push_if_settled(&orchestrator, &storage, &mut pending).await);
        assert!(!push_if_settled(&orchestrator, &storage, &mut pending).await);

        std::fs::remove_file(storage.settings_path()).unwrap();
        PlayerStore::for_team(&storage, LOCAL_TEAM).add("Ana").unwrap();
        assert!(!push_if_settled(&orchestrator, &storage, &mut pending).await);
        assert!(push_if_settled(&orchestrator, &storage, &mut pending).await);
        assert_eq!(orchestrator.remote.pushes(), 1);
    }

    #[test]
    fn test_http_endpoint() {
        let store = HttpRemoteStore::new("http://127.0.0.1:9000", Duration::from_secs(5)).unwrap();
        assert_eq!(store.endpoint().as_str(), "http://127.0.0.1:9000/api/state");
        assert!(HttpRemoteStore::new("not a url", Duration::from_secs(5)).is_err());
    }
}
