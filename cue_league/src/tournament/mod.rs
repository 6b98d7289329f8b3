//! Tournament module: participants and the configuration a match is played under.
//!
//! Tournament creation, seeding and payments live outside this crate; this
//! module only models what match transitions read and write:
//! - Participant entries and their running totals
//! - Race-to targets per match kind and geographic tier
//! - Confirmation and result windows
//! - Stage format (knockout vs round robin) and scoring model

pub mod models;
pub mod rules;

pub use models::{
    Participant, ParticipantStatus, ScoringModel, StageFormat, TournamentConfig, TournamentTier,
};
pub use rules::{
    MatchRules, RulesError, RulesProvider, RulesResult, StaticRules, TournamentRulesRegistry,
};
