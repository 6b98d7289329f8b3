//! Match status transitions.
//!
//! Every transition checks all of its guards before touching the match, so a
//! rejected call leaves the match exactly as it was. Transitions only mutate
//! the match itself; participants, profiles and downstream matches are handled
//! by the orchestrator.

use chrono::{DateTime, Duration, Utc};
use log::debug;

use super::errors::{MatchError, MatchResult};
use super::models::{
    BracketLink, Match, MatchId, MatchKind, MatchStatus, ParticipantId, PlayerId, Slot, StageId,
    TournamentId,
};
use super::score::validate_score;

/// Outcome of a transition into `Completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub winner_id: ParticipantId,
    pub winner_slot: Slot,
    /// Empty for byes
    pub loser_id: Option<ParticipantId>,
}

/// Status a match expired from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiredFrom {
    /// Nobody reported a result before the result deadline
    Scheduled,
    /// The opponent never confirmed before the confirmation deadline
    PendingConfirmation,
}

impl Match {
    /// Synthesize a bye: completed on creation, sole occupant wins by `race_to`.
    ///
    /// # Errors
    ///
    /// * `MatchError::InvalidScore` - `race_to` is not positive
    #[allow(clippy::too_many_arguments)]
    pub fn bye(
        id: MatchId,
        tournament_id: TournamentId,
        stage_id: Option<StageId>,
        round: i32,
        round_label: impl Into<String>,
        participant: ParticipantId,
        race_to: i32,
        next_match: Option<BracketLink>,
        now: DateTime<Utc>,
    ) -> MatchResult<Self> {
        validate_score(race_to, 0, race_to)?;

        let mut m = Match::new(id, tournament_id, MatchKind::Bye, Some(participant), None)
            .with_round(round, round_label);
        m.stage_id = stage_id;
        m.next_match = next_match;
        m.player1_score = race_to;
        m.complete(now);

        Ok(m)
    }

    /// Report a result from the point of view of `by`.
    ///
    /// `my_score` is credited to whichever slot `by` occupies, regardless of
    /// argument order.
    ///
    /// # Errors
    ///
    /// * `MatchError::InvalidState` - Match is not scheduled
    /// * `MatchError::NotParticipant` - `by` does not play in this match
    /// * `MatchError::MissingOpponent` - The other slot is empty
    /// * `MatchError::DeadlinePassed` - Result deadline is over
    /// * `MatchError::InvalidScore` - Score pair is not a finished race
    pub fn submit(
        &mut self,
        by: ParticipantId,
        my_score: i32,
        opponent_score: i32,
        race_to: i32,
        confirmation_window: Duration,
        now: DateTime<Utc>,
    ) -> MatchResult<()> {
        self.expect_status("submit", MatchStatus::Scheduled)?;

        let slot = self.slot_of(by).ok_or(MatchError::NotParticipant(by))?;
        if self.occupant(slot.other()).is_none() {
            return Err(MatchError::MissingOpponent);
        }

        if let Some(deadline) = self.result_deadline.filter(|d| now > *d) {
            return Err(MatchError::DeadlinePassed(deadline));
        }

        let (score1, score2) = match slot {
            Slot::First => (my_score, opponent_score),
            Slot::Second => (opponent_score, my_score),
        };
        validate_score(score1, score2, race_to)?;

        self.player1_score = score1;
        self.player2_score = score2;
        self.submitted_by = Some(by);
        self.submitted_at = Some(now);
        self.confirmation_deadline = Some(now + confirmation_window);
        self.status = MatchStatus::PendingConfirmation;

        debug!(
            "match {} result {}-{} submitted by participant {}",
            self.id, score1, score2, by
        );
        Ok(())
    }

    /// Accept the submitted result.
    ///
    /// # Errors
    ///
    /// * `MatchError::InvalidState` - No result is pending
    /// * `MatchError::NotParticipant` - `by` does not play in this match
    /// * `MatchError::SelfConfirmation` - `by` submitted the result
    pub fn confirm(&mut self, by: ParticipantId, now: DateTime<Utc>) -> MatchResult<Completion> {
        self.check_opponent_response("confirm", by)?;

        self.confirmed_by = Some(by);
        self.confirmed_at = Some(now);

        debug!("match {} confirmed by participant {}", self.id, by);
        Ok(self.complete(now))
    }

    /// Reject the submitted result and hand the match to a referee.
    ///
    /// # Errors
    ///
    /// * `MatchError::InvalidState` - No result is pending
    /// * `MatchError::NotParticipant` - `by` does not play in this match
    /// * `MatchError::SelfConfirmation` - `by` submitted the result
    /// * `MatchError::EmptyDisputeReason` - `reason` is blank
    pub fn dispute(&mut self, by: ParticipantId, reason: &str, now: DateTime<Utc>) -> MatchResult<()> {
        self.check_opponent_response("dispute", by)?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(MatchError::EmptyDisputeReason);
        }

        self.disputed_by = Some(by);
        self.disputed_at = Some(now);
        self.dispute_reason = Some(reason.to_string());
        self.status = MatchStatus::Disputed;

        debug!("match {} disputed by participant {}", self.id, by);
        Ok(())
    }

    /// Overwrite a disputed result with the referee's decision.
    ///
    /// Authority and neutrality of `by` are checked by the caller, who has
    /// access to the authority collaborator and the participants' identities.
    ///
    /// # Errors
    ///
    /// * `MatchError::InvalidState` - Match is not disputed
    /// * `MatchError::InvalidScore` - Score pair is not a finished race
    pub fn resolve(
        &mut self,
        by: PlayerId,
        score1: i32,
        score2: i32,
        notes: Option<String>,
        race_to: i32,
        now: DateTime<Utc>,
    ) -> MatchResult<Completion> {
        self.expect_status("resolve", MatchStatus::Disputed)?;
        validate_score(score1, score2, race_to)?;

        self.player1_score = score1;
        self.player2_score = score2;
        self.resolved_by = Some(by);
        self.resolved_at = Some(now);
        self.resolution_notes = notes.filter(|n| !n.trim().is_empty());

        debug!(
            "match {} resolved {}-{} by user {}",
            self.id, score1, score2, by
        );
        Ok(self.complete(now))
    }

    /// Close an overdue match without a result.
    ///
    /// Returns `Ok(None)` for a match that is already terminal, so sweeps can
    /// re-run safely.
    ///
    /// # Errors
    ///
    /// * `MatchError::InvalidState` - Match is disputed (waits for a referee)
    /// * `MatchError::NotOverdue` - The relevant deadline has not passed
    pub fn expire(&mut self, now: DateTime<Utc>) -> MatchResult<Option<ExpiredFrom>> {
        let from = match self.status {
            MatchStatus::Completed | MatchStatus::Expired | MatchStatus::Cancelled => {
                return Ok(None);
            }
            MatchStatus::Disputed => {
                return Err(MatchError::InvalidState {
                    action: "expire",
                    actual: self.status,
                });
            }
            MatchStatus::Scheduled => {
                if !is_past(self.result_deadline, now) {
                    return Err(MatchError::NotOverdue);
                }
                ExpiredFrom::Scheduled
            }
            MatchStatus::PendingConfirmation => {
                if !is_past(self.confirmation_deadline, now) {
                    return Err(MatchError::NotOverdue);
                }
                ExpiredFrom::PendingConfirmation
            }
        };

        self.status = MatchStatus::Expired;
        self.expired_at = Some(now);

        debug!("match {} expired from {:?}", self.id, from);
        Ok(Some(from))
    }

    /// Whether `expire` would close this match at `now`
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            MatchStatus::Scheduled => is_past(self.result_deadline, now),
            MatchStatus::PendingConfirmation => is_past(self.confirmation_deadline, now),
            _ => false,
        }
    }

    fn expect_status(&self, action: &'static str, expected: MatchStatus) -> MatchResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(MatchError::InvalidState {
                action,
                actual: self.status,
            })
        }
    }

    fn check_opponent_response(&self, action: &'static str, by: ParticipantId) -> MatchResult<()> {
        self.expect_status(action, MatchStatus::PendingConfirmation)?;

        if !self.is_participant(by) {
            return Err(MatchError::NotParticipant(by));
        }
        if self.submitted_by == Some(by) {
            return Err(MatchError::SelfConfirmation);
        }

        Ok(())
    }

    /// Derive winner and loser from the final scores and mark completed
    fn complete(&mut self, now: DateTime<Utc>) -> Completion {
        let winner_slot = if self.player1_score > self.player2_score {
            Slot::First
        } else {
            Slot::Second
        };

        self.winner_id = self.occupant(winner_slot);
        self.cached_loser_id = self.occupant(winner_slot.other());
        self.status = MatchStatus::Completed;
        self.completed_at = Some(now);

        Completion {
            // A completed match always has its winning slot occupied: byes put the
            // occupant in the first slot and submit requires both slots.
            winner_id: self.winner_id.unwrap_or_default(),
            winner_slot,
            loser_id: self.cached_loser_id,
        }
    }
}

fn is_past(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    deadline.is_some_and(|d| now > d)
}
