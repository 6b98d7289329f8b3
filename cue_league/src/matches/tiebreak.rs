//! Ranking two players of a match that ended without a result.
//!
//! Criteria, in order: frame differential, accumulated points, current rating.
//! The first criterion that differs decides. When all three tie, the first
//! standing passed in (slot 1) ranks higher.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::models::ParticipantId;

/// Numbers the cascade compares for one player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiebreakStanding {
    pub participant_id: ParticipantId,
    pub frame_difference: i32,
    pub points: i32,
    pub rating: i32,
}

/// Criterion that separated the two players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiebreakCriterion {
    FrameDifference,
    Points,
    Rating,
    /// Everything tied, slot order decided
    SlotOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiebreakDecision {
    pub higher: ParticipantId,
    pub lower: ParticipantId,
    pub decided_by: TiebreakCriterion,
}

/// Rank `first` against `second`
pub fn rank_pair(first: &TiebreakStanding, second: &TiebreakStanding) -> TiebreakDecision {
    let criteria = [
        (
            TiebreakCriterion::FrameDifference,
            first.frame_difference.cmp(&second.frame_difference),
        ),
        (TiebreakCriterion::Points, first.points.cmp(&second.points)),
        (TiebreakCriterion::Rating, first.rating.cmp(&second.rating)),
    ];

    let (decided_by, ordering) = criteria
        .into_iter()
        .find(|(_, ordering)| *ordering != Ordering::Equal)
        .unwrap_or((TiebreakCriterion::SlotOrder, Ordering::Equal));

    if ordering == Ordering::Less {
        TiebreakDecision {
            higher: second.participant_id,
            lower: first.participant_id,
            decided_by,
        }
    } else {
        TiebreakDecision {
            higher: first.participant_id,
            lower: second.participant_id,
            decided_by,
        }
    }
}
