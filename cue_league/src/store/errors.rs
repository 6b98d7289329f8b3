//! Store error types.

use std::time::Duration;
use thiserror::Error;

use crate::bracket::BracketError;
use crate::matches::{MatchId, ParticipantId, PlayerId};

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    #[error("Profile not found for player {0}")]
    ProfileNotFound(PlayerId),

    /// Another transition committed first; nothing from this batch was applied
    #[error("Concurrent modification of {entity} {id}")]
    Conflict { entity: &'static str, id: i64 },

    #[error(transparent)]
    Bracket(#[from] BracketError),

    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Stored value could not be mapped back to a model
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Commit failed: {0}")]
    CommitFailed(String),
}

impl StoreError {
    /// Whether re-running the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict { .. } | StoreError::Timeout(_))
    }

    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            StoreError::Database(_)
            | StoreError::Serialization(_)
            | StoreError::Corrupt(_)
            | StoreError::CommitFailed(_) => "Internal server error".to_string(),
            StoreError::Conflict { .. } => {
                "The match was updated concurrently, please retry".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(StoreError::Conflict { entity: "match", id: 1 }.is_retryable());
        assert!(StoreError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(!StoreError::MatchNotFound(1).is_retryable());
    }

    #[test]
    fn test_client_message_sanitized() {
        let err = StoreError::Corrupt("matches.status = 'bogus'".to_string());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(StoreError::MatchNotFound(4).client_message(), "Match not found: 4");
    }
}
