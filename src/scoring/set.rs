//! Set and match winner resolution.
//!
//! Each format has its own resolver; both share the [`SetResolver`]
//! signature and are picked by [`resolver_for`].

use crate::models::{Match, MatchFormat, Round, SetScore, Side, TiebreakScore};

/// Decides a single set. The flag marks the deciding (3rd) set.
pub type SetResolver = fn(&SetScore, bool) -> Option<Side>;

/// Games needed to win a regular `2sets` set.
const TWO_SETS_GAMES: u32 = 6;
/// Points needed to win the 6-6 tie-break.
const TIEBREAK_POINTS: u32 = 7;
/// Points needed to win a super tie-break (and the 8-8 tie-break in `1set9`).
const SUPER_TIEBREAK_POINTS: u32 = 10;
/// Games needed to win a `1set9` set.
const ONE_SET_GAMES: u32 = 9;
/// Game score at which a `1set9` set turns into a tie-break.
const ONE_SET_TIEBREAK_AT: u32 = 8;

/// First side to `target` with at least `lead` over the other.
fn first_to(home: u32, away: u32, target: u32, lead: u32) -> Option<Side> {
    if home >= target && home.saturating_sub(away) >= lead {
        Some(Side::Home)
    } else if away >= target && away.saturating_sub(home) >= lead {
        Some(Side::Away)
    } else {
        None
    }
}

fn tiebreak_winner(tiebreak: Option<TiebreakScore>, target: u32) -> Option<Side> {
    tiebreak.and_then(|tb| first_to(tb.home, tb.away, target, 2))
}

/// Best of two sets to 6, with a super tie-break as the deciding set.
pub fn resolve_two_sets(set: &SetScore, is_deciding_set: bool) -> Option<Side> {
    if is_deciding_set {
        return tiebreak_winner(set.tiebreak, SUPER_TIEBREAK_POINTS);
    }

    match (set.home, set.away) {
        (7, 6) | (7, 5) => return Some(Side::Home),
        (6, 7) | (5, 7) => return Some(Side::Away),
        _ => {}
    }
    if let Some(side) = first_to(set.home, set.away, TWO_SETS_GAMES, 2) {
        return Some(side);
    }
    if set.home == TWO_SETS_GAMES && set.away == TWO_SETS_GAMES {
        return tiebreak_winner(set.tiebreak, TIEBREAK_POINTS);
    }
    None
}

/// One set to 9 games; at 8-8 a tie-break to 10 decides.
pub fn resolve_one_set_to_nine(set: &SetScore, _is_deciding_set: bool) -> Option<Side> {
    if set.home == ONE_SET_TIEBREAK_AT && set.away == ONE_SET_TIEBREAK_AT && set.tiebreak.is_some() {
        return tiebreak_winner(set.tiebreak, SUPER_TIEBREAK_POINTS);
    }
    first_to(set.home, set.away, ONE_SET_GAMES, 1)
}

pub fn resolver_for(format: MatchFormat) -> SetResolver {
    match format {
        MatchFormat::TwoSets => resolve_two_sets,
        MatchFormat::OneSetToNine => resolve_one_set_to_nine,
    }
}

/// Winner of one set, `None` while undecided.
pub fn resolve_set_winner(set: &SetScore, format: MatchFormat, is_deciding_set: bool) -> Option<Side> {
    resolver_for(format)(set, is_deciding_set)
}

/// Sets won by each side over the first `limit` sets, as `(home, away)`.
pub(crate) fn count_set_wins(sets: &[SetScore], format: MatchFormat, limit: usize) -> (u32, u32) {
    sets.iter()
        .take(limit)
        .enumerate()
        .fold((0, 0), |(home, away), (i, set)| {
            match resolve_set_winner(set, format, format.is_deciding_set(i)) {
                Some(Side::Home) => (home + 1, away),
                Some(Side::Away) => (home, away + 1),
                None => (home, away),
            }
        })
}

/// Winner of a match: first side to the format's required set wins.
pub fn resolve_match_winner(m: &Match, format: MatchFormat) -> Option<Side> {
    let (home, away) = count_set_wins(&m.sets, format, format.max_sets());
    let needed = format.sets_to_win();
    if home >= needed {
        Some(Side::Home)
    } else if away >= needed {
        Some(Side::Away)
    } else {
        None
    }
}

pub fn is_match_complete(m: &Match, format: MatchFormat) -> bool {
    resolve_match_winner(m, format).is_some()
}

pub fn is_round_complete(round: &Round, format: MatchFormat) -> bool {
    round.matches.iter().all(|m| is_match_complete(m, format))
}
