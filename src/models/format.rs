//! Sides and scoring formats.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One of the two sides of a match. "Home" is always the tracking team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Home => write!(f, "home"),
            Side::Away => write!(f, "away"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" | "h" => Ok(Side::Home),
            "away" | "a" => Ok(Side::Away),
            other => Err(format!("unknown side '{}' (expected home or away)", other)),
        }
    }
}

/// Scoring format of every match in an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MatchFormat {
    /// Best of two sets to 6; a split goes to a super tie-break.
    #[serde(rename = "2sets")]
    TwoSets,
    /// One set to 9 games, tie-break at 8-8.
    #[default]
    #[serde(rename = "1set9")]
    OneSetToNine,
}

impl MatchFormat {
    /// Wire name of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchFormat::TwoSets => "2sets",
            MatchFormat::OneSetToNine => "1set9",
        }
    }

    /// Upper bound on the number of sets a match can hold.
    pub fn max_sets(&self) -> usize {
        match self {
            MatchFormat::TwoSets => 3,
            MatchFormat::OneSetToNine => 1,
        }
    }

    /// Set wins needed to take the match.
    pub fn sets_to_win(&self) -> u32 {
        match self {
            MatchFormat::TwoSets => 2,
            MatchFormat::OneSetToNine => 1,
        }
    }

    /// Whether `set_index` is the super tie-break set of this format.
    pub fn is_deciding_set(&self, set_index: usize) -> bool {
        matches!(self, MatchFormat::TwoSets) && set_index == 2
    }
}

impl std::fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2sets" => Ok(MatchFormat::TwoSets),
            "1set9" => Ok(MatchFormat::OneSetToNine),
            other => Err(format!("unknown format '{}' (expected 2sets or 1set9)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_serialization_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&MatchFormat::TwoSets).unwrap(),
            "\"2sets\""
        );
        assert_eq!(
            serde_json::to_string(&MatchFormat::OneSetToNine).unwrap(),
            "\"1set9\""
        );
        let parsed: MatchFormat = serde_json::from_str("\"2sets\"").unwrap();
        assert_eq!(parsed, MatchFormat::TwoSets);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("1set9".parse::<MatchFormat>(), Ok(MatchFormat::OneSetToNine));
        assert!("3sets".parse::<MatchFormat>().is_err());
    }

    #[test]
    fn test_deciding_set_only_in_two_sets() {
        assert!(MatchFormat::TwoSets.is_deciding_set(2));
        assert!(!MatchFormat::TwoSets.is_deciding_set(1));
        assert!(!MatchFormat::OneSetToNine.is_deciding_set(2));
    }

    #[test]
    fn test_side_parsing_and_display() {
        assert_eq!("Home".parse::<Side>(), Ok(Side::Home));
        assert_eq!("a".parse::<Side>(), Ok(Side::Away));
        assert!("left".parse::<Side>().is_err());
        assert_eq!(Side::Away.to_string(), "away");
        assert_eq!(Side::Home.opposite(), Side::Away);
    }

    #[test]
    fn test_side_serialization() {
        assert_eq!(serde_json::to_string(&Side::Home).unwrap(), "\"home\"");
    }
}
