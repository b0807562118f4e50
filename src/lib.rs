//! # Padel Tracker
//!
//! Score tracking for padel interclub encounters, single matches and
//! tournament runs, with whole-state sync between a team's devices.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (encounters, matches, sets, players)
//! - **scoring**: Pure scoring engine (set/match resolution, edits, aggregation)
//! - **storage**: JSONL and JSON files under the data directory
//! - **sync**: Snapshot sync against a remote store, sync tokens and share links
//! - **api**: Snapshot server endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod config;
pub mod models;
pub mod scoring;
pub mod storage;
pub mod sync;

pub use models::*;
