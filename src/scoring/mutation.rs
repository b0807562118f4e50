//! Match mutation engine.
//!
//! Every edit takes a match snapshot and returns a new one. The set list is
//! kept structurally valid (second set, super tie-break, stale tie-breaks)
//! and `winner` is re-derived from scratch each time, so applying the same
//! edit twice gives the same match as applying it once.

use tracing::trace;

use super::set::{count_set_wins, resolve_match_winner, resolve_set_winner};
use super::tiebreak::{accepts_tiebreak, needs_tiebreak};
use crate::models::{Match, MatchFormat, SetScore, Side};

/// One score stepper change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreEdit {
    /// Set the game count of one side in one set
    Games {
        set_index: usize,
        side: Side,
        value: u32,
    },
    /// Set the tie-break points of one side in one set
    Tiebreak {
        set_index: usize,
        side: Side,
        value: u32,
    },
}

impl ScoreEdit {
    pub fn games(set_index: usize, side: Side, value: u32) -> Self {
        ScoreEdit::Games {
            set_index,
            side,
            value,
        }
    }

    pub fn tiebreak(set_index: usize, side: Side, value: u32) -> Self {
        ScoreEdit::Tiebreak {
            set_index,
            side,
            value,
        }
    }
}

pub fn apply_edit(m: &Match, format: MatchFormat, edit: ScoreEdit) -> Match {
    match edit {
        ScoreEdit::Games {
            set_index,
            side,
            value,
        } => apply_set_edit(m, format, set_index, side, value),
        ScoreEdit::Tiebreak {
            set_index,
            side,
            value,
        } => apply_tiebreak_edit(m, format, set_index, side, value),
    }
}

/// Change one side's game count in a set.
///
/// Game edits to the `2sets` deciding set are ignored: its games are a fixed
/// placeholder and only the super tie-break counts.
pub fn apply_set_edit(m: &Match, format: MatchFormat, set_index: usize, side: Side, value: u32) -> Match {
    let mut next = m.clone();

    if pad_to(&mut next.sets, set_index, format) && !format.is_deciding_set(set_index) {
        let set = &mut next.sets[set_index];
        set.set_games(side, value);
        if !needs_tiebreak(set.home, set.away, format) && set.tiebreak.take().is_some() {
            trace!(set_index, "dropped stale tie-break");
        }
    }

    normalize_sets(&mut next.sets, format);
    refresh_winner(&mut next, format);
    next
}

/// Change one side's tie-break points in a set.
///
/// Ignored unless the set is at a tie-break score or is the super tie-break.
pub fn apply_tiebreak_edit(
    m: &Match,
    format: MatchFormat,
    set_index: usize,
    side: Side,
    value: u32,
) -> Match {
    let mut next = m.clone();

    if pad_to(&mut next.sets, set_index, format) && accepts_tiebreak(&next, set_index, format) {
        next.sets[set_index]
            .tiebreak
            .get_or_insert_with(Default::default)
            .set(side, value);
    }

    normalize_sets(&mut next.sets, format);
    refresh_winner(&mut next, format);
    next
}

/// Re-run structural normalization and winner derivation on a match
/// received from elsewhere (storage, sync).
pub fn normalize_match(m: &Match, format: MatchFormat) -> Match {
    let mut next = m.clone();
    normalize_sets(&mut next.sets, format);
    refresh_winner(&mut next, format);
    next
}

/// Recompute the cached winner from the sets.
pub fn refresh_winner(m: &mut Match, format: MatchFormat) {
    m.winner = None;
    m.winner = resolve_match_winner(m, format);
}

/// Grow `sets` so `set_index` exists. False when the index is beyond what
/// the format allows; the list is left alone in that case.
fn pad_to(sets: &mut Vec<SetScore>, set_index: usize, format: MatchFormat) -> bool {
    if set_index >= format.max_sets() {
        return false;
    }
    while sets.len() <= set_index {
        sets.push(SetScore::default());
    }
    true
}

fn normalize_sets(sets: &mut Vec<SetScore>, format: MatchFormat) {
    if sets.is_empty() {
        sets.push(SetScore::default());
    }

    match format {
        MatchFormat::OneSetToNine => sets.truncate(1),
        MatchFormat::TwoSets => {
            sets.truncate(format.max_sets());

            if sets.len() == 1 && resolve_set_winner(&sets[0], format, false).is_some() {
                trace!("first set decided, opening second set");
                sets.push(SetScore::default());
            }

            let split = count_set_wins(sets, format, 2) == (1, 1);
            if split && sets.len() == 2 {
                trace!("sets split, adding super tie-break");
                sets.push(SetScore::super_tiebreak());
            } else if !split && sets.len() == 3 {
                trace!("sets no longer split, dropping super tie-break");
                sets.truncate(2);
            }

            if let Some(decider) = sets.get_mut(2) {
                decider.home = 0;
                decider.away = 0;
                decider.tiebreak.get_or_insert_with(Default::default);
            }
        }
    }
}
