//! Encounter model: a full outing against one opponent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use super::{EncounterId, EntityId, Match, MatchFormat, PlayerPair, Side, TournamentId};
use crate::scoring::{self, ScoreEdit};

/// Errors raised when addressing or mutating an encounter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncounterError {
    #[error("No match at {0}")]
    MatchNotFound(MatchSlot),

    #[error("Encounter {0} is completed and can no longer be edited")]
    AlreadyCompleted(EncounterId),

    #[error("Encounter {0} is not part of a tournament")]
    NotATournament(EncounterId),

    #[error("Encounter {0} was not won; the tournament run is over")]
    TournamentLost(EncounterId),
}

/// How the encounter is organised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncounterMode {
    /// Three rounds of two matches against another club's team
    #[default]
    Interclub,
    /// One match
    Single,
    /// One match per encounter, chained round after round while winning
    Tournament,
}

impl EncounterMode {
    pub fn has_rounds(&self) -> bool {
        matches!(self, EncounterMode::Interclub)
    }
}

impl std::fmt::Display for EncounterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncounterMode::Interclub => write!(f, "interclub"),
            EncounterMode::Single => write!(f, "single"),
            EncounterMode::Tournament => write!(f, "tournament"),
        }
    }
}

impl FromStr for EncounterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interclub" => Ok(EncounterMode::Interclub),
            "single" => Ok(EncounterMode::Single),
            "tournament" | "tornooi" => Ok(EncounterMode::Tournament),
            other => Err(format!(
                "unknown mode '{}' (expected interclub, single or tournament)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EncounterStatus {
    #[default]
    InProgress,
    Completed,
}

/// Number of rounds in an interclub encounter.
pub const INTERCLUB_ROUNDS: u8 = 3;

/// Id of the only match of a single/tournament encounter.
pub const SINGLE_MATCH_ID: &str = "single-match";

/// An interclub round: exactly two matches played side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub number: u8,
    pub matches: [Match; 2],
}

impl Round {
    pub fn new(number: u8) -> Self {
        Self {
            number,
            matches: [
                Match::new(format!("r{}m1", number)),
                Match::new(format!("r{}m2", number)),
            ],
        }
    }
}

/// Addresses one match inside an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSlot {
    /// Round number (1-based) and match index within the round (0 or 1)
    Round { round: u8, index: usize },
    Single,
}

impl std::fmt::Display for MatchSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchSlot::Round { round, index } => write!(f, "round {} match {}", round, index + 1),
            MatchSlot::Single => write!(f, "single match"),
        }
    }
}

/// Which level of the cascade decided an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CascadeTier {
    Matches,
    Games,
    Points,
}

/// Tallies and winner of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterResult {
    pub home_matches_won: u32,
    pub away_matches_won: u32,
    pub home_games_won: u32,
    pub away_games_won: u32,
    pub home_points_won: u32,
    pub away_points_won: u32,
    pub winner: Side,
}

impl EncounterResult {
    /// First tier of the cascade where the two sides differ.
    /// A full tie falls through to `Points`.
    pub fn decided_by(&self) -> CascadeTier {
        if self.home_matches_won != self.away_matches_won {
            CascadeTier::Matches
        } else if self.home_games_won != self.away_games_won {
            CascadeTier::Games
        } else {
            CascadeTier::Points
        }
    }
}

/// A full outing between the home team and one opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub id: EncounterId,

    pub date: DateTime<Utc>,

    /// Opposing team, player or (for tournaments) the host club
    pub opponent_name: String,

    #[serde(default)]
    pub mode: EncounterMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<TournamentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_round: Option<u32>,

    pub format: MatchFormat,

    /// Interclub rounds; empty for single and tournament encounters
    #[serde(default)]
    pub rounds: Vec<Round>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_match: Option<Match>,

    #[serde(default)]
    pub status: EncounterStatus,

    /// Frozen when the encounter is completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<EncounterResult>,
}

impl Encounter {
    /// Start a new in-progress encounter with empty matches laid out for `mode`.
    pub fn new(opponent_name: impl Into<String>, mode: EncounterMode, format: MatchFormat) -> Self {
        let (rounds, single_match) = if mode.has_rounds() {
            ((1..=INTERCLUB_ROUNDS).map(Round::new).collect(), None)
        } else {
            (Vec::new(), Some(Match::new(SINGLE_MATCH_ID)))
        };
        let is_tournament = mode == EncounterMode::Tournament;

        Self {
            id: EntityId::random(),
            date: Utc::now(),
            opponent_name: opponent_name.into().trim().to_string(),
            mode,
            tournament_id: is_tournament.then(EntityId::random),
            tournament_round: is_tournament.then_some(1),
            format,
            rounds,
            single_match,
            status: EncounterStatus::InProgress,
            result: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == EncounterStatus::Completed
    }

    /// Every match the encounter owns, in play order.
    pub fn matches(&self) -> impl Iterator<Item = &Match> + '_ {
        self.rounds
            .iter()
            .flat_map(|r| r.matches.iter())
            .chain(self.single_match.iter())
    }

    pub fn match_at(&self, slot: MatchSlot) -> Option<&Match> {
        match slot {
            MatchSlot::Round { round, index } => self
                .rounds
                .iter()
                .find(|r| r.number == round)
                .and_then(|r| r.matches.get(index)),
            MatchSlot::Single => self.single_match.as_ref(),
        }
    }

    fn match_at_mut(&mut self, slot: MatchSlot) -> Result<&mut Match, EncounterError> {
        let found = match slot {
            MatchSlot::Round { round, index } => self
                .rounds
                .iter_mut()
                .find(|r| r.number == round)
                .and_then(|r| r.matches.get_mut(index)),
            MatchSlot::Single => self.single_match.as_mut(),
        };
        found.ok_or(EncounterError::MatchNotFound(slot))
    }

    fn ensure_editable(&self) -> Result<(), EncounterError> {
        if self.is_completed() {
            return Err(EncounterError::AlreadyCompleted(self.id.clone()));
        }
        Ok(())
    }

    /// Run one score edit through the mutation engine and store the result.
    pub fn apply_edit(&mut self, slot: MatchSlot, edit: ScoreEdit) -> Result<&Match, EncounterError> {
        self.ensure_editable()?;
        let format = self.format;
        let current = self.match_at_mut(slot)?;
        *current = scoring::apply_edit(current, format, edit);
        Ok(&*current)
    }

    /// Assign the players of a match.
    pub fn assign_pairs(
        &mut self,
        slot: MatchSlot,
        home: PlayerPair,
        away: Option<PlayerPair>,
    ) -> Result<(), EncounterError> {
        self.ensure_editable()?;
        let current = self.match_at_mut(slot)?;
        current.home_pair = home;
        if away.is_some() {
            current.away_pair = away;
        }
        Ok(())
    }

    /// Re-derive every match's set structure and winner. A frozen `result`
    /// is left untouched.
    pub fn rescore(&mut self) {
        let format = self.format;
        for m in self
            .rounds
            .iter_mut()
            .flat_map(|r| r.matches.iter_mut())
            .chain(self.single_match.iter_mut())
        {
            *m = scoring::normalize_match(m, format);
        }
    }

    /// Live tally over every match, complete or not.
    pub fn running_result(&self) -> EncounterResult {
        scoring::aggregate(self.matches(), self.format)
    }

    /// All matches have a winner.
    pub fn all_matches_complete(&self) -> bool {
        self.matches()
            .all(|m| scoring::is_match_complete(m, self.format))
    }

    /// Freeze the encounter. The result is computed once; later calls
    /// return the stored snapshot.
    pub fn finalize(&mut self) -> EncounterResult {
        if let (EncounterStatus::Completed, Some(result)) = (self.status, self.result) {
            return result;
        }
        let result = self.running_result();
        self.status = EncounterStatus::Completed;
        self.result = Some(result);
        result
    }

    /// Id grouping all rounds of this encounter's tournament run.
    pub fn tournament_run_id(&self) -> Option<&TournamentId> {
        match self.mode {
            EncounterMode::Tournament => Some(self.tournament_id.as_ref().unwrap_or(&self.id)),
            _ => None,
        }
    }

    /// Build the next round of a tournament run after a win.
    ///
    /// The home pair carries over when both players were picked.
    pub fn next_tournament_round(&self) -> Result<Encounter, EncounterError> {
        let run_id = self
            .tournament_run_id()
            .cloned()
            .ok_or_else(|| EncounterError::NotATournament(self.id.clone()))?;

        let result = self.result.unwrap_or_else(|| self.running_result());
        if result.winner != Side::Home {
            return Err(EncounterError::TournamentLost(self.id.clone()));
        }

        let mut next = Encounter::new(self.opponent_name.clone(), EncounterMode::Tournament, self.format);
        next.tournament_id = Some(run_id);
        next.tournament_round = Some(self.tournament_round.unwrap_or(1) + 1);
        if let (Some(prev), Some(m)) = (self.single_match.as_ref(), next.single_match.as_mut()) {
            if prev.has_home_pair() {
                m.home_pair = prev.home_pair.clone();
            }
        }
        Ok(next)
    }
}

/// Every encounter of one tournament run, ordered by round then date.
pub fn tournament_history<'a>(encounters: &'a [Encounter], run_id: &TournamentId) -> Vec<&'a Encounter> {
    let mut runs: Vec<&Encounter> = encounters
        .iter()
        .filter(|e| e.tournament_run_id() == Some(run_id))
        .collect();
    runs.sort_by_key(|e| (e.tournament_round.unwrap_or(1), e.date));
    runs
}
