//! Match events handed to the notification collaborator.
//!
//! Events are emitted only after the transition that caused them has been
//! committed. Delivery and formatting belong to the [`Notifier`]
//! implementation; a failed delivery is logged and never undoes a transition.

use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::Mutex;

use crate::matches::{BracketLink, MatchId, ParticipantId, PlayerId};

/// Events emitted by the match core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum MatchEvent {
    ResultSubmitted {
        match_id: MatchId,
        submitted_by: ParticipantId,
        opponent: ParticipantId,
    },
    ResultConfirmed {
        match_id: MatchId,
        winner: ParticipantId,
        loser: Option<ParticipantId>,
    },
    MatchDisputed {
        match_id: MatchId,
        disputed_by: ParticipantId,
        reason: String,
    },
    DisputeResolved {
        match_id: MatchId,
        resolved_by: PlayerId,
        winner: ParticipantId,
        loser: Option<ParticipantId>,
    },
    MatchExpired {
        match_id: MatchId,
        participants: Vec<ParticipantId>,
    },
    PlayerAdvanced {
        match_id: MatchId,
        participant: ParticipantId,
        to: BracketLink,
    },
    PlayerEliminated {
        match_id: MatchId,
        participant: ParticipantId,
    },
    RatingChanged {
        match_id: Option<MatchId>,
        player: PlayerId,
        old_rating: i32,
        new_rating: i32,
    },
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResultSubmitted {
                match_id,
                submitted_by,
                ..
            } => write!(f, "match {match_id}: result submitted by {submitted_by}"),
            Self::ResultConfirmed {
                match_id, winner, ..
            } => write!(f, "match {match_id}: result confirmed, {winner} won"),
            Self::MatchDisputed {
                match_id,
                disputed_by,
                reason,
            } => write!(f, "match {match_id}: disputed by {disputed_by} ({reason})"),
            Self::DisputeResolved {
                match_id,
                resolved_by,
                winner,
                ..
            } => write!(
                f,
                "match {match_id}: dispute resolved by {resolved_by}, {winner} won"
            ),
            Self::MatchExpired { match_id, .. } => write!(f, "match {match_id}: expired"),
            Self::PlayerAdvanced {
                participant, to, ..
            } => write!(
                f,
                "{participant} advanced to match {} ({} slot)",
                to.match_id, to.slot
            ),
            Self::PlayerEliminated {
                match_id,
                participant,
            } => write!(f, "{participant} eliminated in match {match_id}"),
            Self::RatingChanged {
                player,
                old_rating,
                new_rating,
                ..
            } => write!(f, "player {player} rating {old_rating} -> {new_rating}"),
        }
    }
}

/// Notification error
#[derive(Debug, thiserror::Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Delivers match events to players and organisers
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &MatchEvent) -> Result<(), NotifyError>;
}

/// Writes every event to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &MatchEvent) -> Result<(), NotifyError> {
        info!("{event}");
        Ok(())
    }
}

/// Keeps events in memory for inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<MatchEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<MatchEvent> {
        self.events.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &MatchEvent) -> Result<(), NotifyError> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::Slot;

    #[test]
    fn test_event_display() {
        let event = MatchEvent::PlayerAdvanced {
            match_id: 1,
            participant: 10,
            to: BracketLink::new(7, Slot::Second),
        };
        assert_eq!(event.to_string(), "10 advanced to match 7 (second slot)");
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        let event = MatchEvent::MatchExpired {
            match_id: 3,
            participants: vec![1, 2],
        };
        notifier.notify(&event).await.unwrap();
        assert_eq!(notifier.events().await, vec![event]);

        notifier.clear().await;
        assert!(notifier.events().await.is_empty());
    }
}
