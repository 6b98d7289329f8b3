//! Match data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Match ID type
pub type MatchId = i64;
/// Tournament-scoped entry ID type
pub type ParticipantId = i64;
/// Global player (profile/user) ID type
pub type PlayerId = i64;
/// Tournament ID type
pub type TournamentId = i64;
/// Tournament stage ID type
pub type StageId = i64;

/// What a match decides within its bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Normal,
    /// Single occupant, completed on creation
    Bye,
    Semifinal,
    ThirdPlace,
    Final,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::Normal => "normal",
            MatchKind::Bye => "bye",
            MatchKind::Semifinal => "semifinal",
            MatchKind::ThirdPlace => "third_place",
            MatchKind::Final => "final",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(MatchKind::Normal),
            "bye" => Ok(MatchKind::Bye),
            "semifinal" => Ok(MatchKind::Semifinal),
            "third_place" => Ok(MatchKind::ThirdPlace),
            "final" => Ok(MatchKind::Final),
            other => Err(format!("unknown match kind: {other}")),
        }
    }
}

/// Match lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    PendingConfirmation,
    Disputed,
    Completed,
    Expired,
    Cancelled,
}

impl MatchStatus {
    /// Completed, expired and cancelled matches never change again
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MatchStatus::Completed | MatchStatus::Expired | MatchStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::PendingConfirmation => "pending_confirmation",
            MatchStatus::Disputed => "disputed",
            MatchStatus::Completed => "completed",
            MatchStatus::Expired => "expired",
            MatchStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "pending_confirmation" => Ok(MatchStatus::PendingConfirmation),
            "disputed" => Ok(MatchStatus::Disputed),
            "completed" => Ok(MatchStatus::Completed),
            "expired" => Ok(MatchStatus::Expired),
            "cancelled" => Ok(MatchStatus::Cancelled),
            other => Err(format!("unknown match status: {other}")),
        }
    }
}

/// One of the two positions in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::First => Slot::Second,
            Slot::Second => Slot::First,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::First => "first",
            Slot::Second => "second",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Slot::First),
            "second" => Ok(Slot::Second),
            other => Err(format!("unknown slot: {other}")),
        }
    }
}

/// Downstream match slot fed by this match, fixed when the bracket is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketLink {
    pub match_id: MatchId,
    pub slot: Slot,
}

impl BracketLink {
    pub fn new(match_id: MatchId, slot: Slot) -> Self {
        Self { match_id, slot }
    }
}

/// Match model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub stage_id: Option<StageId>,
    pub round: i32,
    pub round_label: String,
    pub kind: MatchKind,
    pub player1_id: Option<ParticipantId>,
    pub player2_id: Option<ParticipantId>,
    pub player1_score: i32,
    pub player2_score: i32,
    pub winner_id: Option<ParticipantId>,
    /// Cache only. Read through [`Match::loser_id`].
    pub cached_loser_id: Option<ParticipantId>,
    pub status: MatchStatus,
    pub submitted_by: Option<ParticipantId>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<ParticipantId>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub disputed_by: Option<ParticipantId>,
    pub disputed_at: Option<DateTime<Utc>>,
    pub dispute_reason: Option<String>,
    pub resolved_by: Option<PlayerId>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
    pub result_deadline: Option<DateTime<Utc>>,
    pub confirmation_deadline: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expired_at: Option<DateTime<Utc>>,
    pub next_match: Option<BracketLink>,
    pub loser_next_match: Option<BracketLink>,
    /// Optimistic concurrency counter, bumped by the store on every commit
    pub version: i64,
}

impl Match {
    /// Create a scheduled match with no result yet
    pub fn new(
        id: MatchId,
        tournament_id: TournamentId,
        kind: MatchKind,
        player1_id: Option<ParticipantId>,
        player2_id: Option<ParticipantId>,
    ) -> Self {
        Self {
            id,
            tournament_id,
            stage_id: None,
            round: 1,
            round_label: String::new(),
            kind,
            player1_id,
            player2_id,
            player1_score: 0,
            player2_score: 0,
            winner_id: None,
            cached_loser_id: None,
            status: MatchStatus::Scheduled,
            submitted_by: None,
            submitted_at: None,
            confirmed_by: None,
            confirmed_at: None,
            disputed_by: None,
            disputed_at: None,
            dispute_reason: None,
            resolved_by: None,
            resolved_at: None,
            resolution_notes: None,
            result_deadline: None,
            confirmation_deadline: None,
            completed_at: None,
            expired_at: None,
            next_match: None,
            loser_next_match: None,
            version: 0,
        }
    }

    pub fn with_stage(mut self, stage_id: StageId) -> Self {
        self.stage_id = Some(stage_id);
        self
    }

    pub fn with_round(mut self, round: i32, label: impl Into<String>) -> Self {
        self.round = round;
        self.round_label = label.into();
        self
    }

    pub fn with_result_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.result_deadline = Some(deadline);
        self
    }

    /// Winner feeds `slot` of match `match_id`
    pub fn feeding(mut self, match_id: MatchId, slot: Slot) -> Self {
        self.next_match = Some(BracketLink::new(match_id, slot));
        self
    }

    /// Loser feeds `slot` of match `match_id` (semifinal into third place)
    pub fn feeding_loser(mut self, match_id: MatchId, slot: Slot) -> Self {
        self.loser_next_match = Some(BracketLink::new(match_id, slot));
        self
    }

    pub fn occupant(&self, slot: Slot) -> Option<ParticipantId> {
        match slot {
            Slot::First => self.player1_id,
            Slot::Second => self.player2_id,
        }
    }

    pub fn set_occupant(&mut self, slot: Slot, participant: Option<ParticipantId>) {
        match slot {
            Slot::First => self.player1_id = participant,
            Slot::Second => self.player2_id = participant,
        }
    }

    pub fn score(&self, slot: Slot) -> i32 {
        match slot {
            Slot::First => self.player1_score,
            Slot::Second => self.player2_score,
        }
    }

    /// Slot held by `participant`, if any
    pub fn slot_of(&self, participant: ParticipantId) -> Option<Slot> {
        if self.player1_id == Some(participant) {
            Some(Slot::First)
        } else if self.player2_id == Some(participant) {
            Some(Slot::Second)
        } else {
            None
        }
    }

    pub fn is_participant(&self, participant: ParticipantId) -> bool {
        self.slot_of(participant).is_some()
    }

    pub fn occupants(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.player1_id.into_iter().chain(self.player2_id)
    }

    pub fn is_bye(&self) -> bool {
        self.kind == MatchKind::Bye
    }

    /// Loser derived from the winner and the two slots, never from the cache
    pub fn loser_id(&self) -> Option<ParticipantId> {
        self.winner_id
            .and_then(|winner| loser_of(winner, self.player1_id, self.player2_id))
    }

    /// Frames won and lost by `participant` in this match
    pub fn frames_for(&self, participant: ParticipantId) -> Option<(i32, i32)> {
        self.slot_of(participant)
            .map(|slot| (self.score(slot), self.score(slot.other())))
    }
}

/// The opponent of `winner` among the two slot occupants.
///
/// Returns `None` when `winner` occupies neither slot or the other slot is empty.
pub fn loser_of(
    winner: ParticipantId,
    slot1: Option<ParticipantId>,
    slot2: Option<ParticipantId>,
) -> Option<ParticipantId> {
    if slot1 == Some(winner) {
        slot2
    } else if slot2 == Some(winner) {
        slot1
    } else {
        None
    }
}
