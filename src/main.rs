use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use padel_tracker::api::{self, state::AppState};
use padel_tracker::config::AppConfig;
use padel_tracker::models::{
    player_name, Encounter, EncounterId, EncounterMode, Match, MatchFormat, MatchSlot, Player,
    PlayerId, PlayerPair, Side,
};
use padel_tracker::scoring::{format_match_score, ScoreEdit};
use padel_tracker::storage::{
    EncounterStore, PlayerStore, SettingsStore, StorageConfig, SyncSettings, LOCAL_TEAM,
};
use padel_tracker::sync::{
    self, token, HttpRemoteStore, SyncError, SyncOrchestrator, SyncOutcome,
};

#[derive(Parser)]
#[command(name = "padel-tracker")]
#[command(about = "Padel interclub and tournament score tracker")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the snapshot server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create, score and finish encounters
    Encounter {
        #[command(subcommand)]
        action: EncounterAction,
    },

    /// Manage the team roster
    Player {
        #[command(subcommand)]
        action: PlayerAction,
    },

    /// Share state with the rest of the team
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },
}

/// Which match of an encounter to address. Interclub encounters need
/// `--round`; single and tournament encounters have one match.
#[derive(Args, Clone, Copy)]
struct MatchSelector {
    /// Round number (1-3)
    #[arg(long)]
    round: Option<u8>,

    /// Match within the round (1 or 2)
    #[arg(long = "match", default_value = "1")]
    match_no: usize,
}

impl MatchSelector {
    fn slot(&self, encounter: &Encounter) -> Result<MatchSlot> {
        match (encounter.mode.has_rounds(), self.round) {
            (true, Some(round)) => {
                if !(1..=2).contains(&self.match_no) {
                    bail!("--match must be 1 or 2");
                }
                Ok(MatchSlot::Round {
                    round,
                    index: self.match_no - 1,
                })
            }
            (true, None) => bail!("--round is required for interclub encounters"),
            (false, _) => Ok(MatchSlot::Single),
        }
    }
}

#[derive(Subcommand)]
enum EncounterAction {
    /// Start a new encounter
    New {
        /// Opposing team, player or host club
        #[arg(long)]
        opponent: String,

        /// interclub, single or tournament
        #[arg(long, default_value = "interclub")]
        mode: EncounterMode,

        /// 2sets or 1set9 (defaults to the configured format)
        #[arg(long)]
        format: Option<MatchFormat>,
    },

    /// List encounters, newest first
    List,

    /// Show every match of an encounter
    Show { id: String },

    /// Set the games of one side in a set
    Score {
        id: String,

        #[command(flatten)]
        at: MatchSelector,

        /// Set number, starting at 1
        #[arg(long)]
        set: usize,

        #[arg(long)]
        side: Side,

        #[arg(long, allow_hyphen_values = true)]
        value: i64,
    },

    /// Set the tie-break points of one side in a set
    Tiebreak {
        id: String,

        #[command(flatten)]
        at: MatchSelector,

        /// Set number, starting at 1
        #[arg(long)]
        set: usize,

        #[arg(long)]
        side: Side,

        #[arg(long, allow_hyphen_values = true)]
        value: i64,
    },

    /// Assign the players of a match
    Pair {
        id: String,

        #[command(flatten)]
        at: MatchSelector,

        /// Two player ids from the roster
        #[arg(long, num_args = 2, required = true)]
        home: Vec<String>,

        /// Two opponent player ids, for matches between known players
        #[arg(long, num_args = 2)]
        away: Option<Vec<String>>,
    },

    /// Freeze the result of an encounter
    Finish { id: String },

    /// Start the next round of a won tournament encounter
    NextRound { id: String },

    /// Delete an encounter
    Delete { id: String },
}

#[derive(Subcommand)]
enum PlayerAction {
    /// Add a player (four at most)
    Add { name: String },

    /// List the roster
    List,

    /// Rename a player
    Rename { id: String, name: String },

    /// Remove a player
    Remove { id: String },
}

#[derive(Subcommand)]
enum SyncAction {
    /// Pull the team snapshot once, or push local state if there is none
    Now,

    /// Keep syncing until interrupted
    Watch {
        /// Seconds between pulls (overrides the config file)
        #[arg(long)]
        poll_secs: Option<u64>,
    },

    /// Team token management
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Join a team from a token or share link
    Join { token_or_link: String },

    /// Print a share link carrying the team token
    ShareLink {
        /// App URL the link should open
        #[arg(long)]
        origin: String,
    },

    /// Forget the team token and go back to the local roster
    Leave,
}

#[derive(Subcommand)]
enum TokenAction {
    /// Create a new team and its token
    New {
        #[arg(long)]
        team: String,
    },

    /// Print the current token
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::debug!("Starting padel-tracker v{}", env!("CARGO_PKG_VERSION"));
    let storage = StorageConfig::new(config.data_dir.clone());

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            if config.server.auth_token.is_none() {
                tracing::warn!("No server.auth_token configured; every request will be refused");
            }

            let state = AppState::new(storage, &config.server);
            let app = api::build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Snapshot server listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Encounter { action } => run_encounter(action, &config, &storage)?,
        Commands::Player { action } => run_player(action, &storage)?,
        Commands::Sync { action } => run_sync(action, &config, &storage).await?,
    }

    Ok(())
}

fn roster(storage: &StorageConfig) -> Result<Vec<Player>> {
    let team = sync::roster_team(storage)?;
    Ok(PlayerStore::for_team(storage, &team).list()?)
}

fn pair_label(players: &[Player], pair: &PlayerPair) -> String {
    format!(
        "{} & {}",
        player_name(players, &pair[0]),
        player_name(players, &pair[1])
    )
}

fn print_match(label: &str, m: &Match, format: MatchFormat, players: &[Player]) {
    let winner = m
        .winner
        .map(|w| w.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {:<6} {:<24} {:<22} winner: {}",
        label,
        pair_label(players, &m.home_pair),
        format_match_score(m, format),
        winner
    );
}

fn print_encounter(encounter: &Encounter, players: &[Player]) {
    println!(
        "{} vs {} ({}, {}, {:?})",
        encounter.date.format("%Y-%m-%d"),
        encounter.opponent_name,
        encounter.mode,
        encounter.format,
        encounter.status
    );
    if let Some(round) = encounter.tournament_round {
        println!("  tournament round {}", round);
    }

    for round in &encounter.rounds {
        for (idx, m) in round.matches.iter().enumerate() {
            let label = format!("R{}M{}", round.number, idx + 1);
            print_match(&label, m, encounter.format, players);
        }
    }
    if let Some(m) = &encounter.single_match {
        print_match("Match", m, encounter.format, players);
    }

    let result = encounter.result.unwrap_or_else(|| encounter.running_result());
    println!(
        "  matches {}-{}  games {}-{}  points {}-{}  -> {} (by {:?})",
        result.home_matches_won,
        result.away_matches_won,
        result.home_games_won,
        result.away_games_won,
        result.home_points_won,
        result.away_points_won,
        result.winner,
        result.decided_by()
    );
}

fn set_index(set: usize) -> Result<usize> {
    set.checked_sub(1)
        .ok_or_else(|| anyhow!("--set starts at 1"))
}

fn to_pair(ids: &[String], players: &[Player]) -> Result<PlayerPair> {
    let [first, second] = ids else {
        bail!("a pair needs exactly two player ids");
    };
    let pair: PlayerPair = [PlayerId::from(first.as_str()), PlayerId::from(second.as_str())];
    for id in &pair {
        if !players.iter().any(|p| &p.id == id) {
            bail!("unknown player id {}", id);
        }
    }
    Ok(pair)
}

fn run_encounter(action: EncounterAction, config: &AppConfig, storage: &StorageConfig) -> Result<()> {
    let store = EncounterStore::new(storage);

    match action {
        EncounterAction::New {
            opponent,
            mode,
            format,
        } => {
            if opponent.trim().is_empty() {
                bail!("--opponent must not be empty");
            }
            let format = format.unwrap_or(config.scoring.default_format);
            let encounter = Encounter::new(opponent, mode, format);
            store.add(encounter.clone())?;
            tracing::info!("Created {} encounter {}", mode, encounter.id);
            println!("{}", encounter.id);
        }
        EncounterAction::List => {
            for encounter in store.list()? {
                let result = encounter.result.unwrap_or_else(|| encounter.running_result());
                println!(
                    "{}  {}  {:<10}  {:<24}  {}-{}{}",
                    encounter.id,
                    encounter.date.format("%Y-%m-%d"),
                    encounter.mode,
                    encounter.opponent_name,
                    result.home_matches_won,
                    result.away_matches_won,
                    if encounter.is_completed() { "" } else { "  (in progress)" }
                );
            }
        }
        EncounterAction::Show { id } => {
            let encounter = store.get(&EncounterId::from(id))?;
            print_encounter(&encounter, &roster(storage)?);
        }
        EncounterAction::Score {
            id,
            at,
            set,
            side,
            value,
        } => {
            let id = EncounterId::from(id);
            let set_index = set_index(set)?;
            let updated = store.update(&id, |e| -> Result<(Match, MatchFormat)> {
                let slot = at.slot(e)?;
                let value = config.scoring.clamp_games(e.format, value);
                let m = e.apply_edit(slot, ScoreEdit::games(set_index, side, value))?;
                Ok((m.clone(), e.format))
            })?;
            println!("{}", format_match_score(&updated.0, updated.1));
        }
        EncounterAction::Tiebreak {
            id,
            at,
            set,
            side,
            value,
        } => {
            let id = EncounterId::from(id);
            let set_index = set_index(set)?;
            let value = config.scoring.clamp_tiebreak(value);
            let updated = store.update(&id, |e| -> Result<(Match, MatchFormat)> {
                let slot = at.slot(e)?;
                let m = e.apply_edit(slot, ScoreEdit::tiebreak(set_index, side, value))?;
                Ok((m.clone(), e.format))
            })?;
            println!("{}", format_match_score(&updated.0, updated.1));
        }
        EncounterAction::Pair { id, at, home, away } => {
            let players = roster(storage)?;
            let home = to_pair(&home, &players)?;
            let away = away.as_deref().map(|ids| to_pair(ids, &players)).transpose()?;
            store.update(&EncounterId::from(id), |e| -> Result<()> {
                let slot = at.slot(e)?;
                e.assign_pairs(slot, home, away)?;
                Ok(())
            })?;
        }
        EncounterAction::Finish { id } => {
            let id = EncounterId::from(id);
            let encounter = store.update(&id, |e| -> Result<Encounter> {
                if !e.is_completed() && !e.all_matches_complete() {
                    tracing::warn!("Finishing {} with unfinished matches", e.id);
                }
                e.finalize();
                Ok(e.clone())
            })?;
            print_encounter(&encounter, &roster(storage)?);
        }
        EncounterAction::NextRound { id } => {
            let current = store.get(&EncounterId::from(id))?;
            let next = current.next_tournament_round()?;
            store.add(next.clone())?;
            tracing::info!(
                "Tournament round {} created",
                next.tournament_round.unwrap_or(1)
            );
            println!("{}", next.id);
        }
        EncounterAction::Delete { id } => {
            let removed = store.delete(&EncounterId::from(id))?;
            println!("Deleted encounter against {}", removed.opponent_name);
        }
    }

    Ok(())
}

fn run_player(action: PlayerAction, storage: &StorageConfig) -> Result<()> {
    let team = sync::roster_team(storage)?;
    let store = PlayerStore::for_team(storage, &team);

    match action {
        PlayerAction::Add { name } => {
            let player = store.add(&name)?;
            println!("{}  {}", player.id, player.name);
        }
        PlayerAction::List => {
            for player in store.list()? {
                println!("{}  {}", player.id, player.name);
            }
        }
        PlayerAction::Rename { id, name } => {
            let player = store.rename(&PlayerId::from(id), &name)?;
            println!("{}  {}", player.id, player.name);
        }
        PlayerAction::Remove { id } => {
            let player = store.remove(&PlayerId::from(id))?;
            println!("Removed {}", player.name);
        }
    }

    Ok(())
}

/// Save `token` and seed the team roster from the local one when it is empty.
fn join_team(storage: &StorageConfig, sync_token: &str) -> Result<token::SyncCredentials> {
    let credentials = token::parse_sync_token(sync_token)?;
    SettingsStore::new(storage).save(&SyncSettings {
        sync_token: Some(sync_token.to_string()),
    })?;

    let team_store = PlayerStore::for_team(storage, token::team_id(&credentials).as_str());
    if team_store.list()?.is_empty() {
        let local = PlayerStore::for_team(storage, LOCAL_TEAM).list()?;
        if !local.is_empty() {
            team_store.replace_all(&local)?;
            tracing::info!("Copied {} local players to the team roster", local.len());
        }
    }
    Ok(credentials)
}

fn orchestrator(
    config: &AppConfig,
    storage: &StorageConfig,
) -> Result<SyncOrchestrator<HttpRemoteStore>> {
    let (sync_token, _) = sync::saved_credentials(storage)?.ok_or(SyncError::NotConfigured)?;
    let remote = HttpRemoteStore::from_config(&config.sync)?;
    Ok(SyncOrchestrator::new(remote, sync_token))
}

fn describe(outcome: &SyncOutcome) -> &'static str {
    match outcome {
        SyncOutcome::Skipped => "skipped, another sync is running",
        SyncOutcome::RemoteApplied(_) => "pulled team state",
        SyncOutcome::UpToDate => "already up to date",
        SyncOutcome::Pushed => "pushed local state",
    }
}

async fn run_sync(action: SyncAction, config: &AppConfig, storage: &StorageConfig) -> Result<()> {
    match action {
        SyncAction::Now => {
            let orchestrator = orchestrator(config, storage)?;
            let outcome = sync::pull_and_apply(&orchestrator, storage).await?;
            println!("Sync: {}", describe(&outcome));
        }
        SyncAction::Watch { poll_secs } => {
            let orchestrator = orchestrator(config, storage)?;
            let poll = Duration::from_secs(poll_secs.unwrap_or(config.sync.poll_interval_secs).max(1));
            let debounce = Duration::from_millis(config.sync.push_debounce_ms);
            sync::watch(&orchestrator, storage, poll, debounce).await?;
        }
        SyncAction::Token { action } => match action {
            TokenAction::New { team } => {
                if team.trim().is_empty() {
                    bail!("--team must not be empty");
                }
                let sync_token = token::create_sync_token(&team, &token::generate_team_secret());
                join_team(storage, &sync_token)?;
                println!("{}", sync_token);
            }
            TokenAction::Show => {
                let (sync_token, credentials) =
                    sync::saved_credentials(storage)?.ok_or(SyncError::NotConfigured)?;
                println!("Team:  {}", credentials.team_name);
                println!("Token: {}", sync_token);
            }
        },
        SyncAction::Join { token_or_link } => {
            let (sync_token, _) = token::resolve_token_input(&token_or_link)?;
            let credentials = join_team(storage, &sync_token)?;
            println!("Joined team {}", credentials.team_name);

            let orchestrator = orchestrator(config, storage)?;
            match sync::pull_and_apply(&orchestrator, storage).await {
                Ok(outcome) => println!("Sync: {}", describe(&outcome)),
                Err(e) => tracing::warn!("Joined, but the first sync failed: {}", e),
            }
        }
        SyncAction::ShareLink { origin } => {
            let (sync_token, _) =
                sync::saved_credentials(storage)?.ok_or(SyncError::NotConfigured)?;
            println!("{}", token::create_share_link(&origin, &sync_token)?);
        }
        SyncAction::Leave => {
            SettingsStore::new(storage).save(&SyncSettings::default())?;
            println!("Left the team; using the local roster again");
        }
    }

    Ok(())
}
