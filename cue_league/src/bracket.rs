//! Bracket advancement and final standings.
//!
//! A finished match feeds its winner (and, for semifinals, its loser) into
//! pre-assigned slots of downstream matches. Each parent match only ever
//! writes the slot it was wired to, so two parents feeding the same match
//! cannot overwrite each other regardless of completion order.

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matches::{
    BracketLink, Match, MatchId, MatchKind, MatchStatus, ParticipantId, Slot,
    tiebreak::{TiebreakStanding, rank_pair},
};
use crate::tournament::{Participant, ParticipantStatus, StageFormat};

/// Bracket errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("slot {slot} of match {match_id} already holds participant {occupant}")]
    SlotOccupied {
        match_id: MatchId,
        slot: Slot,
        occupant: ParticipantId,
    },
}

/// Write of one participant into one slot of a downstream match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub match_id: MatchId,
    pub slot: Slot,
    pub participant_id: ParticipantId,
}

impl SlotAssignment {
    pub fn new(link: BracketLink, participant_id: ParticipantId) -> Self {
        Self {
            match_id: link.match_id,
            slot: link.slot,
            participant_id,
        }
    }

    /// Write into `target`, touching only the designated slot.
    ///
    /// Re-applying the same assignment is a no-op.
    ///
    /// # Errors
    ///
    /// * `BracketError::SlotOccupied` - Slot already holds someone else
    pub fn apply(&self, target: &mut Match) -> Result<(), BracketError> {
        match target.occupant(self.slot) {
            Some(occupant) if occupant != self.participant_id => Err(BracketError::SlotOccupied {
                match_id: target.id,
                slot: self.slot,
                occupant,
            }),
            _ => {
                target.set_occupant(self.slot, Some(self.participant_id));
                Ok(())
            }
        }
    }
}

/// Change in a participant's standing caused by a finished match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StandingChange {
    Advanced {
        participant_id: ParticipantId,
        to: BracketLink,
    },
    Eliminated {
        participant_id: ParticipantId,
    },
    Placed {
        participant_id: ParticipantId,
        position: i32,
    },
}

/// Downstream slot writes for a completed match. Empty for anything else.
pub fn advancement(m: &Match) -> Vec<SlotAssignment> {
    if m.status != MatchStatus::Completed {
        return Vec::new();
    }

    let winner = m
        .next_match
        .zip(m.winner_id)
        .map(|(link, winner)| SlotAssignment::new(link, winner));
    let loser = m
        .loser_next_match
        .zip(m.loser_id())
        .map(|(link, loser)| SlotAssignment::new(link, loser));

    winner.into_iter().chain(loser).collect()
}

/// Update statuses and placements after `m` completed.
///
/// `loser` is `None` for byes.
pub fn settle_completion(
    m: &Match,
    format: StageFormat,
    winner: &mut Participant,
    loser: Option<&mut Participant>,
) -> Vec<StandingChange> {
    let mut changes = Vec::new();
    winner.mark_active();

    match m.kind {
        MatchKind::Final => {
            winner.status = ParticipantStatus::Winner;
            place(winner, 1, &mut changes);
            if let Some(loser) = loser {
                place(loser, 2, &mut changes);
                eliminate(loser, &mut changes);
            }
        }
        MatchKind::ThirdPlace => {
            place(winner, 3, &mut changes);
            eliminate(winner, &mut changes);
            if let Some(loser) = loser {
                place(loser, 4, &mut changes);
                eliminate(loser, &mut changes);
            }
        }
        MatchKind::Normal | MatchKind::Semifinal | MatchKind::Bye => {
            if let Some(link) = m.next_match {
                changes.push(StandingChange::Advanced {
                    participant_id: winner.id,
                    to: link,
                });
            }

            if let Some(loser) = loser {
                loser.mark_active();
                if let Some(link) = m.loser_next_match {
                    changes.push(StandingChange::Advanced {
                        participant_id: loser.id,
                        to: link,
                    });
                } else if format == StageFormat::Knockout {
                    eliminate(loser, &mut changes);
                }
            }
        }
    }

    debug!("match {} settled: {:?}", m.id, changes);
    changes
}

/// Update statuses and placements after `m` expired without a result.
///
/// A third-place match with both players present is ranked by the tie-break
/// cascade into positions 3 and 4 and nobody is eliminated. Every other
/// expired match, the final included, eliminates whoever occupied it.
pub fn settle_expiry(
    m: &Match,
    first: Option<(&mut Participant, i32)>,
    second: Option<(&mut Participant, i32)>,
) -> Vec<StandingChange> {
    let mut changes = Vec::new();

    match (m.kind, first, second) {
        (MatchKind::ThirdPlace, Some((a, rating_a)), Some((b, rating_b))) => {
            let decision = rank_pair(&standing(a, rating_a), &standing(b, rating_b));
            let (higher, lower) = if decision.higher == a.id { (a, b) } else { (b, a) };

            debug!(
                "match {} expired, participant {} ranked above {} by {:?}",
                m.id, higher.id, lower.id, decision.decided_by
            );

            place(higher, 3, &mut changes);
            place(lower, 4, &mut changes);
        }
        (_, first, second) => {
            for (participant, _) in first.into_iter().chain(second) {
                eliminate(participant, &mut changes);
            }
        }
    }

    changes
}

fn standing(p: &Participant, rating: i32) -> TiebreakStanding {
    TiebreakStanding {
        participant_id: p.id,
        frame_difference: p.frame_difference,
        points: p.points,
        rating,
    }
}

fn place(p: &mut Participant, position: i32, changes: &mut Vec<StandingChange>) {
    p.place(position);
    changes.push(StandingChange::Placed {
        participant_id: p.id,
        position,
    });
}

fn eliminate(p: &mut Participant, changes: &mut Vec<StandingChange>) {
    if p.is_still_in() {
        p.eliminate();
        changes.push(StandingChange::Eliminated {
            participant_id: p.id,
        });
    }
}
