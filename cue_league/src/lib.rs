//! # Cue League
//!
//! Match core for elimination and round-robin cue-sports tournaments.
//!
//! Players submit match results, opponents confirm or dispute them, a neutral
//! referee resolves disputes, winners advance through the bracket and a global
//! ELO-style skill rating is recalculated after every completed match.
//!
//! ## Architecture
//!
//! A match moves through a small state machine:
//!
//! - **Scheduled**: waiting for either player to report a result
//! - **PendingConfirmation**: one player reported, the opponent has to confirm
//! - **Disputed**: the opponent rejected the report, a referee has to decide
//! - **Completed**: the result is final
//! - **Expired** / **Cancelled**: the match ended without a result
//!
//! Reaching `Completed` triggers bracket advancement and the rating engine.
//! [`service::MatchService`] sequences all of it and persists every effect of a
//! transition as one atomic [`store::ChangeSet`].
//!
//! ## Core Modules
//!
//! - [`matches`]: match entity, score validation, transitions, tie-breaks
//! - [`bracket`]: winner/loser propagation and final standings
//! - [`rating`]: skill profiles and the ELO engine
//! - [`tournament`]: participants, tournament configuration and rules lookup
//! - [`service`]: the orchestrator
//! - [`store`] / [`db`]: persistence contract, in-memory and PostgreSQL stores
//!
//! ## Example
//!
//! ```
//! use cue_league::matches::score::is_valid_score;
//!
//! assert!(is_valid_score(7, 3, 7));
//! assert!(!is_valid_score(7, 7, 7));
//! ```

pub mod authority;
pub mod bracket;
pub mod clock;
pub mod db;
pub mod matches;
pub mod notify;
pub mod rating;
pub mod service;
pub mod store;
pub mod tournament;

pub use authority::{AuthorityCheck, StaticAuthority};
pub use clock::{Clock, ManualClock, SystemClock};
pub use matches::{
    BracketLink, Match, MatchError, MatchId, MatchKind, MatchResult, MatchStatus, ParticipantId,
    PlayerId, ScoreError, Slot, StageId, TournamentId,
};
pub use notify::{LogNotifier, MatchEvent, Notifier, RecordingNotifier};
pub use rating::{PlayerProfile, RatingEngine, RatingReason, SkillCategory};
pub use service::{
    ByeRequest, ExpireOutcome, MatchService, ServiceError, ServiceResult, SweepReport,
};
pub use store::{ChangeSet, LeagueStore, MatchFilter, MemoryStore, StoreError, StoreResult};
pub use tournament::{
    Participant, ParticipantStatus, RulesProvider, StaticRules, TournamentConfig,
    TournamentRulesRegistry, TournamentTier,
};
