//! Team roster member.

use serde::{Deserialize, Serialize};

use super::{EntityId, PlayerId};

/// Maximum number of players on one team roster.
pub const MAX_ROSTER_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    /// Create a player with a fresh random id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::random(),
            name: name.into(),
        }
    }
}

/// Look up a player's display name, `?` when unknown or unassigned.
pub fn player_name<'a>(players: &'a [Player], id: &PlayerId) -> &'a str {
    players
        .iter()
        .find(|p| &p.id == id)
        .map(|p| p.name.as_str())
        .unwrap_or("?")
}
