//! Tie-break policy predicates.

use super::set::count_set_wins;
use crate::models::{Match, MatchFormat};

/// Whether a set standing at `home`-`away` games must be settled by a tie-break.
pub fn needs_tiebreak(home: u32, away: u32, format: MatchFormat) -> bool {
    match format {
        MatchFormat::TwoSets => home == 6 && away == 6,
        MatchFormat::OneSetToNine => home == 8 && away == 8,
    }
}

/// Whether the first two sets are split one apiece, calling for a super
/// tie-break. Only `2sets` matches have one.
pub fn needs_super_tiebreak(m: &Match, format: MatchFormat) -> bool {
    if format != MatchFormat::TwoSets {
        return false;
    }
    count_set_wins(&m.sets, format, 2) == (1, 1)
}

/// Whether the set at `set_index` may carry a tie-break record right now.
pub fn accepts_tiebreak(m: &Match, set_index: usize, format: MatchFormat) -> bool {
    if format.is_deciding_set(set_index) {
        return true;
    }
    m.sets
        .get(set_index)
        .map(|set| needs_tiebreak(set.home, set.away, format))
        .unwrap_or(false)
}
