//! Core data models: scores, matches, encounters and players.

mod encounter;
mod format;
mod ids;
mod padel_match;
mod player;
mod score;

pub use encounter::*;
pub use format::*;
pub use ids::*;
pub use padel_match::*;
pub use player::*;
pub use score::*;
