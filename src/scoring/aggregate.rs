//! Encounter result aggregation.

use super::set::resolve_match_winner;
use crate::models::{EncounterResult, Match, MatchFormat, Round, Side};

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    home_matches: u32,
    away_matches: u32,
    home_games: u32,
    away_games: u32,
    home_points: u32,
    away_points: u32,
}

impl Tally {
    /// Sums saturate at `u32::MAX`.
    fn add_match(&mut self, m: &Match, format: MatchFormat) {
        match resolve_match_winner(m, format) {
            Some(Side::Home) => self.home_matches += 1,
            Some(Side::Away) => self.away_matches += 1,
            None => {}
        }
        for set in &m.sets {
            self.home_games = self.home_games.saturating_add(set.home);
            self.away_games = self.away_games.saturating_add(set.away);
            self.home_points = self.home_points.saturating_add(set.tiebreak_points(Side::Home));
            self.away_points = self.away_points.saturating_add(set.tiebreak_points(Side::Away));
        }
    }

    /// Matches, then games, then tie-break points. At the points tier an
    /// exact tie goes to home.
    fn winner(&self) -> Side {
        if self.home_matches != self.away_matches {
            if self.home_matches > self.away_matches {
                Side::Home
            } else {
                Side::Away
            }
        } else if self.home_games != self.away_games {
            if self.home_games > self.away_games {
                Side::Home
            } else {
                Side::Away
            }
        } else if self.home_points >= self.away_points {
            Side::Home
        } else {
            Side::Away
        }
    }

    fn into_result(self) -> EncounterResult {
        EncounterResult {
            home_matches_won: self.home_matches,
            away_matches_won: self.away_matches,
            home_games_won: self.home_games,
            away_games_won: self.away_games,
            home_points_won: self.home_points,
            away_points_won: self.away_points,
            winner: self.winner(),
        }
    }
}

/// Fold matches into tallies and a cascading winner.
///
/// Unfinished matches still contribute games and points, just no match win,
/// so this doubles as the live running score.
pub fn aggregate<'a, I>(matches: I, format: MatchFormat) -> EncounterResult
where
    I: IntoIterator<Item = &'a Match>,
{
    let mut tally = Tally::default();
    for m in matches {
        tally.add_match(m, format);
    }
    tally.into_result()
}

/// Result over every match of an interclub encounter's rounds.
pub fn calculate_encounter_result(rounds: &[Round], format: MatchFormat) -> EncounterResult {
    aggregate(rounds.iter().flat_map(|r| r.matches.iter()), format)
}

/// Result of a single-match encounter.
pub fn calculate_single_result(m: &Match, format: MatchFormat) -> EncounterResult {
    aggregate(std::iter::once(m), format)
}
