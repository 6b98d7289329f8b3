//! Orchestrator error types.

use thiserror::Error;

use crate::matches::{MatchError, PlayerId, TournamentId};
use crate::store::StoreError;
use crate::tournament::RulesError;

/// Errors returned by [`super::MatchService`]
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transition rejected; nothing was written
    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Rules(#[from] RulesError),

    #[error("Player {player_id} is not entered in tournament {tournament_id}")]
    NotEntered {
        player_id: PlayerId,
        tournament_id: TournamentId,
    },
}

impl ServiceError {
    /// Whether re-running the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Rejected by validation or a precondition rather than by infrastructure
    pub fn is_rejection(&self) -> bool {
        matches!(self, ServiceError::Match(_) | ServiceError::NotEntered { .. })
    }

    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            ServiceError::Store(e) => e.client_message(),
            ServiceError::Rules(RulesError::Backend(_)) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for orchestrator operations
pub type ServiceResult<T> = Result<T, ServiceError>;
