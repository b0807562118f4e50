//! Match model: one home pair against the opponent, scored in sets.

use serde::{Deserialize, Serialize};

use super::{MatchId, PlayerId, SetScore, Side};

/// Two players forming one side of a match. Empty ids mean "not picked yet".
pub type PlayerPair = [PlayerId; 2];

/// A single match within an encounter.
///
/// `winner` is a cache of the resolved winner. It is rewritten by the
/// mutation engine after every edit and must never be set by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,

    pub home_pair: PlayerPair,

    /// Opponent pair, only tracked for single games between known players
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_pair: Option<PlayerPair>,

    #[serde(default)]
    pub sets: Vec<SetScore>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Side>,
}

impl Match {
    /// A fresh match with one empty set and no players assigned.
    pub fn new(id: impl Into<MatchId>) -> Self {
        Self {
            id: id.into(),
            home_pair: [PlayerId::default(), PlayerId::default()],
            away_pair: None,
            sets: vec![SetScore::default()],
            winner: None,
        }
    }

    pub fn with_home_pair(mut self, first: PlayerId, second: PlayerId) -> Self {
        self.home_pair = [first, second];
        self
    }

    pub fn with_away_pair(mut self, first: PlayerId, second: PlayerId) -> Self {
        self.away_pair = Some([first, second]);
        self
    }

    /// Both home players have been picked.
    pub fn has_home_pair(&self) -> bool {
        self.home_pair.iter().all(|p| !p.is_empty())
    }
}
