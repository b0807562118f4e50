//! Scoring engine.
//!
//! Pure, synchronous functions over score snapshots:
//! - **set**: set and match winner resolution per format
//! - **tiebreak**: when a tie-break or super tie-break is required
//! - **mutation**: applying score edits while keeping the set list valid
//! - **aggregate**: encounter tallies and the matches → games → points cascade
//! - **display**: score strings and finished-set validation

pub mod aggregate;
pub mod display;
pub mod mutation;
pub mod set;
pub mod tiebreak;

pub use aggregate::{aggregate, calculate_encounter_result, calculate_single_result};
pub use display::{format_match_score, is_valid_set_score};
pub use mutation::{
    apply_edit, apply_set_edit, apply_tiebreak_edit, normalize_match, refresh_winner, ScoreEdit,
};
pub use set::{
    is_match_complete, is_round_complete, resolve_match_winner, resolve_set_winner, resolver_for,
    SetResolver,
};
pub use tiebreak::{accepts_tiebreak, needs_super_tiebreak, needs_tiebreak};
