//! Match error types.

use super::models::{MatchStatus, ParticipantId, PlayerId};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Illegal score pair for a race-to target
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("race-to target must be positive, got {0}")]
    NonPositiveRaceTo(i32),

    #[error("scores must be non-negative, got {score1}-{score2}")]
    NegativeScore { score1: i32, score2: i32 },

    #[error("score {score} exceeds the race-to target of {race_to}")]
    ExceedsTarget { score: i32, race_to: i32 },

    #[error("both sides reached the race-to target of {race_to}")]
    BothReachedTarget { race_to: i32 },

    #[error("neither side reached the race-to target of {race_to} ({score1}-{score2})")]
    NoWinner {
        score1: i32,
        score2: i32,
        race_to: i32,
    },
}

/// Rejected match transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("invalid score: {0}")]
    InvalidScore(#[from] ScoreError),

    #[error("dispute reason must not be empty")]
    EmptyDisputeReason,

    #[error("cannot {action} a match that is {actual}")]
    InvalidState {
        action: &'static str,
        actual: MatchStatus,
    },

    #[error("participant {0} does not occupy a slot in this match")]
    NotParticipant(ParticipantId),

    #[error("match has no opponent to report against")]
    MissingOpponent,

    #[error("a result cannot be confirmed or disputed by its submitter")]
    SelfConfirmation,

    #[error("result deadline passed at {0}")]
    DeadlinePassed(DateTime<Utc>),

    #[error("match is not overdue yet")]
    NotOverdue,

    #[error("user {0} may not resolve disputes")]
    Unauthorized(PlayerId),

    #[error("user {0} plays in this match and cannot resolve it")]
    ParticipantResolver(PlayerId),
}

impl MatchError {
    /// Rejected because of the submitted data rather than the match state
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MatchError::InvalidScore(_) | MatchError::EmptyDisputeReason
        )
    }

    /// Rejected because the match or actor did not allow the transition
    pub fn is_precondition(&self) -> bool {
        !self.is_validation()
    }
}

/// Result type for match transitions
pub type MatchResult<T> = Result<T, MatchError>;
