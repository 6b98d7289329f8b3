//! Rating module: global skill profiles and the ELO engine.
//!
//! This module implements:
//! - Player skill profiles with a derived category and best-ever rating
//! - Expected score, tiered K-factor and clean-sweep margin
//! - Append-only rating history and per-match history snapshots
//! - Manual adjustments (admin, tournament bonus, inactivity decay)
//!
//! ## Example
//!
//! ```
//! use cue_league::rating::elo::compute_deltas;
//!
//! let deltas = compute_deltas(1000, 1000, 24.0, 24.0, 1.0);
//! assert_eq!(deltas.winner_delta, 12);
//! assert_eq!(deltas.loser_delta, -12);
//! ```

pub mod elo;
pub mod models;

pub use elo::{EloConfig, RatingDeltas, RatingEngine, RatingOutcome, compute_deltas, expected_score};
pub use models::{
    DEFAULT_RATING, MatchHistoryEntry, PlayerProfile, RatingContext, RatingHistoryEntry,
    RatingReason, SkillCategory,
};
