//! Set and tie-break scores.

use serde::{Deserialize, Serialize};

use super::Side;

/// Point-level tie-break record attached to a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TiebreakScore {
    pub home: u32,
    pub away: u32,
}

impl TiebreakScore {
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }

    pub fn set(&mut self, side: Side, value: u32) {
        match side {
            Side::Home => self.home = value,
            Side::Away => self.away = value,
        }
    }

    /// The losing side's point count, as printed in `7-6(5)`.
    pub fn loser_points(&self) -> u32 {
        self.home.min(self.away)
    }
}

/// Game count of one set, plus an optional tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SetScore {
    pub home: u32,
    pub away: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiebreak: Option<TiebreakScore>,
}

impl SetScore {
    pub fn new(home: u32, away: u32) -> Self {
        Self {
            home,
            away,
            tiebreak: None,
        }
    }

    /// A set at the given games with a tie-break record.
    pub fn with_tiebreak(home: u32, away: u32, tb_home: u32, tb_away: u32) -> Self {
        Self {
            home,
            away,
            tiebreak: Some(TiebreakScore::new(tb_home, tb_away)),
        }
    }

    /// Placeholder for a super tie-break set: games fixed at 0-0, empty tie-break.
    pub fn super_tiebreak() -> Self {
        Self::with_tiebreak(0, 0, 0, 0)
    }

    pub fn games(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }

    pub fn set_games(&mut self, side: Side, value: u32) {
        match side {
            Side::Home => self.home = value,
            Side::Away => self.away = value,
        }
    }

    /// Tie-break points for one side; zero when there is no tie-break.
    pub fn tiebreak_points(&self, side: Side) -> u32 {
        self.tiebreak.map(|tb| tb.get(side)).unwrap_or(0)
    }
}
