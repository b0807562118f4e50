//! Team rosters.

use tracing::info;

use super::{JsonlReader, JsonlWriter, StorageConfig, StorageError};
use crate::models::{Player, PlayerId, MAX_ROSTER_SIZE};

/// Roster key used before the device joins a sync team.
pub const LOCAL_TEAM: &str = "local";

/// One team's roster in `players/{team}.jsonl`.
pub struct PlayerStore {
    team: String,
    reader: JsonlReader<Player>,
    writer: JsonlWriter<Player>,
}

fn not_found(id: &PlayerId) -> StorageError {
    StorageError::NotFound {
        kind: "Player",
        id: id.to_string(),
    }
}

fn clean_name(name: &str) -> Result<String, StorageError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StorageError::InvalidInput(
            "player name must not be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

impl PlayerStore {
    pub fn for_team(config: &StorageConfig, team: &str) -> Self {
        let path = config.players_path(team);
        Self {
            team: team.to_string(),
            reader: JsonlReader::new(path.clone()),
            writer: JsonlWriter::new(path),
        }
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn list(&self) -> Result<Vec<Player>, StorageError> {
        self.reader.read_all()
    }

    /// Add a player to the roster; a team holds at most four.
    pub fn add(&self, name: &str) -> Result<Player, StorageError> {
        let name = clean_name(name)?;
        if self.reader.count()? >= MAX_ROSTER_SIZE {
            return Err(StorageError::RosterFull(MAX_ROSTER_SIZE));
        }

        let player = Player::new(name);
        self.writer.append(&player)?;
        info!("Added {} to roster {}", player.name, self.team);
        Ok(player)
    }

    pub fn rename(&self, id: &PlayerId, name: &str) -> Result<Player, StorageError> {
        let name = clean_name(name)?;
        let mut all = self.list()?;
        let player = all
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| not_found(id))?;

        player.name = name;
        let renamed = player.clone();
        self.writer.write_all(&all)?;
        Ok(renamed)
    }

    pub fn remove(&self, id: &PlayerId) -> Result<Player, StorageError> {
        let mut all = self.list()?;
        let idx = all
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| not_found(id))?;

        let removed = all.remove(idx);
        self.writer.write_all(&all)?;
        info!("Removed {} from roster {}", removed.name, self.team);
        Ok(removed)
    }

    /// Overwrite the roster as given. The size cap only applies to [`add`](Self::add).
    pub fn replace_all(&self, players: &[Player]) -> Result<usize, StorageError> {
        self.writer.write_all(players)
    }
}
