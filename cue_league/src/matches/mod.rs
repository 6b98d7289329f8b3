//! Match module: the unit of play between two participant slots.
//!
//! This module provides:
//! - The [`Match`] entity and its closed kind/status enums
//! - Score validation against a race-to target
//! - Status transitions (submit, confirm, dispute, resolve, expire, bye)
//! - The tie-break cascade used when an expired match still has to rank its players
//!
//! ## Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use cue_league::matches::{Match, MatchKind, MatchStatus};
//!
//! let now = Utc::now();
//! let mut m = Match::new(1, 10, MatchKind::Normal, Some(100), Some(200))
//!     .with_result_deadline(now + Duration::hours(48));
//!
//! m.submit(100, 7, 4, 7, Duration::hours(24), now).unwrap();
//! assert_eq!(m.status, MatchStatus::PendingConfirmation);
//!
//! let completion = m.confirm(200, now).unwrap();
//! assert_eq!(completion.winner_id, 100);
//! assert_eq!(m.loser_id(), Some(200));
//! ```

pub mod errors;
pub mod models;
pub mod score;
pub mod state_machine;
pub mod tiebreak;

pub use errors::{MatchError, MatchResult, ScoreError};
pub use models::{
    BracketLink, Match, MatchId, MatchKind, MatchStatus, ParticipantId, PlayerId, Slot, StageId,
    TournamentId, loser_of,
};
pub use state_machine::{Completion, ExpiredFrom};
pub use tiebreak::{TiebreakCriterion, TiebreakDecision, TiebreakStanding};
