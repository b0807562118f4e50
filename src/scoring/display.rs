//! Score formatting and finished-set validation.

use crate::models::{Match, MatchFormat};

/// Placeholder shown for a match or deciding set with nothing to show.
pub const NO_SCORE: &str = "—";

/// Render a match as `6-4 6-6(5) [10-8]`.
///
/// Regular sets show their games plus the loser's tie-break points in
/// parentheses; the `2sets` deciding set shows only its super tie-break.
pub fn format_match_score(m: &Match, format: MatchFormat) -> String {
    if m.sets.is_empty() {
        return NO_SCORE.to_string();
    }

    m.sets
        .iter()
        .enumerate()
        .map(|(i, set)| {
            if format.is_deciding_set(i) {
                return match set.tiebreak {
                    Some(tb) => format!("[{}-{}]", tb.home, tb.away),
                    None => NO_SCORE.to_string(),
                };
            }
            match set.tiebreak {
                Some(tb) => format!("{}-{}({})", set.home, set.away, tb.loser_points()),
                None => format!("{}-{}", set.home, set.away),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a game score is a legal finished set in `format`.
///
/// The deciding set of `2sets` is always accepted; its tie-break is checked
/// by the set resolver instead.
pub fn is_valid_set_score(home: u32, away: u32, format: MatchFormat, is_deciding_set: bool) -> bool {
    let (high, low) = (home.max(away), home.min(away));
    match format {
        MatchFormat::TwoSets if is_deciding_set => true,
        MatchFormat::TwoSets => matches!((high, low), (6, 0..=4) | (7, 5) | (7, 6)),
        MatchFormat::OneSetToNine => matches!((high, low), (9, 0..=8)),
    }
}
