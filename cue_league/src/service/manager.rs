//! Match orchestrator.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::errors::{ServiceError, ServiceResult};
use crate::authority::AuthorityCheck;
use crate::bracket::{StandingChange, advancement, settle_completion, settle_expiry};
use crate::clock::Clock;
use crate::matches::{
    BracketLink, ExpiredFrom, Match, MatchError, MatchId, MatchKind, ParticipantId, PlayerId,
    StageId, TournamentId,
};
use crate::notify::{MatchEvent, Notifier};
use crate::rating::{
    DEFAULT_RATING, MatchHistoryEntry, RatingContext, RatingEngine, RatingHistoryEntry,
    RatingReason,
};
use crate::store::{ChangeSet, LeagueStore, StoreError};
use crate::tournament::{MatchRules, Participant, RulesProvider};

/// Result of [`MatchService::expire_match`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpireOutcome {
    /// Match was already completed, expired or cancelled; nothing was written
    AlreadyTerminal,
    Expired {
        from: ExpiredFrom,
        standings: Vec<StandingChange>,
    },
}

/// Summary of one pass over overdue matches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: Vec<MatchId>,
    pub already_terminal: Vec<MatchId>,
    pub failed: Vec<(MatchId, String)>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Where a bye sits in the bracket and who gets it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByeRequest {
    pub tournament_id: TournamentId,
    pub stage_id: Option<StageId>,
    pub round: i32,
    pub round_label: String,
    pub participant_id: ParticipantId,
    pub next_match: Option<BracketLink>,
}

/// Sequences match transitions, bracket advancement and rating updates.
///
/// Every operation loads what it needs, validates and mutates local copies,
/// and writes all effects in one [`ChangeSet`]. Events go out only after the
/// commit succeeded.
#[derive(Clone)]
pub struct MatchService {
    store: Arc<dyn LeagueStore>,
    rules: Arc<dyn RulesProvider>,
    notifier: Arc<dyn Notifier>,
    authority: Arc<dyn AuthorityCheck>,
    clock: Arc<dyn Clock>,
    engine: RatingEngine,
    /// Overdue matches whose last expiry attempt failed
    failing: Arc<Mutex<HashSet<MatchId>>>,
}

impl MatchService {
    pub fn new(
        store: Arc<dyn LeagueStore>,
        rules: Arc<dyn RulesProvider>,
        notifier: Arc<dyn Notifier>,
        authority: Arc<dyn AuthorityCheck>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            rules,
            notifier,
            authority,
            clock,
            engine: RatingEngine::default(),
            failing: Arc::default(),
        }
    }

    pub fn with_rating_engine(mut self, engine: RatingEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn store(&self) -> &dyn LeagueStore {
        self.store.as_ref()
    }

    /// Report a result on behalf of `player`.
    ///
    /// # Errors
    ///
    /// * `ServiceError::NotEntered` - `player` has no entry in the tournament
    /// * `ServiceError::Match` - Transition rejected (state, deadline, score)
    pub async fn submit_result(
        &self,
        match_id: MatchId,
        player: PlayerId,
        my_score: i32,
        opponent_score: i32,
    ) -> ServiceResult<Match> {
        let now = self.clock.now();
        let mut m = self.store.load_match(match_id).await?;
        let entry = self.entry_of(&m, player).await?;
        let rules = self.rules.rules_for(&m).await?;

        m.submit(
            entry.id,
            my_score,
            opponent_score,
            rules.race_to,
            rules.confirmation_window,
            now,
        )?;

        let events = m
            .slot_of(entry.id)
            .and_then(|slot| m.occupant(slot.other()))
            .map(|opponent| MatchEvent::ResultSubmitted {
                match_id,
                submitted_by: entry.id,
                opponent,
            })
            .into_iter()
            .collect();

        self.commit_transition(&mut m, ChangeSet::new(), events).await?;
        Ok(m)
    }

    /// Accept the pending result on behalf of the opponent.
    ///
    /// Completes the match, advances the bracket and rates both players in
    /// the same commit.
    pub async fn confirm_result(&self, match_id: MatchId, player: PlayerId) -> ServiceResult<Match> {
        let now = self.clock.now();
        let mut m = self.store.load_match(match_id).await?;
        let entry = self.entry_of(&m, player).await?;
        let rules = self.rules.rules_for(&m).await?;

        let completion = m.confirm(entry.id, now)?;

        let mut events = vec![MatchEvent::ResultConfirmed {
            match_id,
            winner: completion.winner_id,
            loser: completion.loser_id,
        }];
        let changes = self.settle_completed(&m, &rules, now, &mut events).await?;
        self.commit_transition(&mut m, changes, events).await?;

        info!(
            "match {} completed, participant {} won {}-{}",
            match_id, completion.winner_id, m.player1_score, m.player2_score
        );
        Ok(m)
    }

    /// Reject the pending result and hand the match to a referee
    pub async fn dispute_result(
        &self,
        match_id: MatchId,
        player: PlayerId,
        reason: &str,
    ) -> ServiceResult<Match> {
        let now = self.clock.now();
        let mut m = self.store.load_match(match_id).await?;
        let entry = self.entry_of(&m, player).await?;

        m.dispute(entry.id, reason, now)?;

        let events = vec![MatchEvent::MatchDisputed {
            match_id,
            disputed_by: entry.id,
            reason: m.dispute_reason.clone().unwrap_or_default(),
        }];
        self.commit_transition(&mut m, ChangeSet::new(), events).await?;

        info!("match {} disputed by participant {}", match_id, entry.id);
        Ok(m)
    }

    /// Settle a disputed match with the referee's score.
    ///
    /// # Errors
    ///
    /// * `MatchError::Unauthorized` - `referee` holds no authority over the match
    /// * `MatchError::ParticipantResolver` - `referee` plays in the match
    /// * `MatchError::InvalidState` - Match is not disputed
    /// * `MatchError::InvalidScore` - Score pair is not a finished race
    pub async fn resolve_dispute(
        &self,
        match_id: MatchId,
        referee: PlayerId,
        score1: i32,
        score2: i32,
        notes: Option<String>,
    ) -> ServiceResult<Match> {
        let now = self.clock.now();
        let mut m = self.store.load_match(match_id).await?;

        if !self.authority.can_resolve(referee, &m).await {
            return Err(MatchError::Unauthorized(referee).into());
        }

        let occupants: Vec<ParticipantId> = m.occupants().collect();
        for participant_id in occupants {
            let p = self.store.load_participant(participant_id).await?;
            if p.player_id == referee {
                return Err(MatchError::ParticipantResolver(referee).into());
            }
        }

        let rules = self.rules.rules_for(&m).await?;
        let completion = m.resolve(referee, score1, score2, notes, rules.race_to, now)?;

        let mut events = vec![MatchEvent::DisputeResolved {
            match_id,
            resolved_by: referee,
            winner: completion.winner_id,
            loser: completion.loser_id,
        }];
        let changes = self.settle_completed(&m, &rules, now, &mut events).await?;
        self.commit_transition(&mut m, changes, events).await?;

        info!(
            "dispute on match {} resolved {}-{} by user {}",
            match_id, score1, score2, referee
        );
        Ok(m)
    }

    /// Close an overdue match.
    ///
    /// Safe to call repeatedly: a terminal match yields
    /// [`ExpireOutcome::AlreadyTerminal`] without writing anything.
    ///
    /// # Errors
    ///
    /// * `MatchError::NotOverdue` - Deadline has not passed yet
    /// * `MatchError::InvalidState` - Match is disputed
    pub async fn expire_match(&self, match_id: MatchId) -> ServiceResult<ExpireOutcome> {
        let now = self.clock.now();
        let mut m = self.store.load_match(match_id).await?;

        let Some(from) = m.expire(now)? else {
            debug!("match {} already terminal ({})", match_id, m.status);
            return Ok(ExpireOutcome::AlreadyTerminal);
        };

        let mut first = self.expiry_entry(m.player1_id).await?;
        let mut second = self.expiry_entry(m.player2_id).await?;

        let standings = settle_expiry(
            &m,
            first.as_mut().map(|(p, rating)| (p, *rating)),
            second.as_mut().map(|(p, rating)| (p, *rating)),
        );

        let mut events = vec![MatchEvent::MatchExpired {
            match_id,
            participants: m.occupants().collect(),
        }];
        events.extend(standing_events(match_id, &standings));

        let mut changes = ChangeSet::new();
        for (p, _) in first.into_iter().chain(second) {
            changes.update_participant(p);
        }
        self.commit_transition(&mut m, changes, events).await?;

        info!("match {} expired from {:?}", match_id, from);
        Ok(ExpireOutcome::Expired { from, standings })
    }

    /// Create a completed bye for one participant and advance them.
    ///
    /// Byes never touch ratings.
    pub async fn create_bye(&self, request: ByeRequest) -> ServiceResult<Match> {
        let now = self.clock.now();

        let entry = self.store.load_participant(request.participant_id).await?;
        if entry.tournament_id != request.tournament_id {
            return Err(ServiceError::NotEntered {
                player_id: entry.player_id,
                tournament_id: request.tournament_id,
            });
        }

        let id = self.store.allocate_match_id().await?;
        let mut bye_shape = Match::new(
            id,
            request.tournament_id,
            MatchKind::Bye,
            Some(request.participant_id),
            None,
        );
        bye_shape.stage_id = request.stage_id;
        let rules = self.rules.rules_for(&bye_shape).await?;

        let m = Match::bye(
            id,
            request.tournament_id,
            request.stage_id,
            request.round,
            request.round_label,
            request.participant_id,
            rules.race_to,
            request.next_match,
            now,
        )?;

        let mut events = Vec::new();
        let mut changes = self.settle_completed(&m, &rules, now, &mut events).await?;
        changes.insert_match(m.clone());
        self.persist(changes, events).await?;

        info!(
            "bye {} created for participant {}",
            m.id, request.participant_id
        );
        Ok(m)
    }

    /// Apply a manual rating change (admin, bonus or decay)
    pub async fn adjust_rating(
        &self,
        player_id: PlayerId,
        delta: i32,
        reason: RatingReason,
        context: RatingContext,
    ) -> ServiceResult<RatingHistoryEntry> {
        let now = self.clock.now();
        let mut profile = self
            .store
            .load_profile(player_id)
            .await?
            .ok_or(StoreError::ProfileNotFound(player_id))?;

        let entry = self.engine.adjust(&mut profile, delta, reason, context, now);

        let mut changes = ChangeSet::new();
        changes.update_profile(profile);
        changes.rating_history.push(entry.clone());
        let events = vec![MatchEvent::RatingChanged {
            match_id: entry.match_id,
            player: player_id,
            old_rating: entry.old_rating,
            new_rating: entry.new_rating,
        }];
        self.persist(changes, events).await?;

        info!(
            "rating of player {} adjusted {:+} ({})",
            player_id, entry.delta, reason
        );
        Ok(entry)
    }

    /// Expire up to `limit` overdue matches, one commit per match.
    ///
    /// A failure on one match is recorded in the report and does not stop the
    /// pass. Matches that failed before are retried only after every fresh
    /// overdue match in reach has had its turn, so a handful of broken
    /// matches cannot fill every batch.
    pub async fn sweep_overdue(&self, limit: i64) -> ServiceResult<SweepReport> {
        let mut failing = self.failing.lock().await;

        let reach = limit.saturating_add(i64::try_from(failing.len()).unwrap_or(i64::MAX));
        let due = self.store.list_overdue(self.clock.now(), reach).await?;

        // Everything overdue was listed, so ids missing from it are settled
        if (due.len() as i64) < reach {
            failing.retain(|id| due.contains(id));
        }

        let (retries, fresh): (Vec<MatchId>, Vec<MatchId>) =
            due.into_iter().partition(|id| failing.contains(id));
        let batch = usize::try_from(limit).unwrap_or(0);

        let mut report = SweepReport::default();
        for match_id in fresh.into_iter().chain(retries).take(batch) {
            match self.expire_match(match_id).await {
                Ok(ExpireOutcome::Expired { .. }) => {
                    failing.remove(&match_id);
                    report.expired.push(match_id);
                }
                Ok(ExpireOutcome::AlreadyTerminal) => {
                    failing.remove(&match_id);
                    report.already_terminal.push(match_id);
                }
                Err(e) => {
                    warn!("failed to expire match {match_id}: {e}");
                    failing.insert(match_id);
                    report.failed.push((match_id, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    async fn entry_of(&self, m: &Match, player: PlayerId) -> ServiceResult<Participant> {
        self.store
            .find_participant_by_player(m.tournament_id, player)
            .await?
            .ok_or(ServiceError::NotEntered {
                player_id: player,
                tournament_id: m.tournament_id,
            })
    }

    async fn expiry_entry(
        &self,
        occupant: Option<ParticipantId>,
    ) -> ServiceResult<Option<(Participant, i32)>> {
        let Some(participant_id) = occupant else {
            return Ok(None);
        };

        let p = self.store.load_participant(participant_id).await?;
        let rating = self
            .store
            .load_profile(p.player_id)
            .await?
            .map_or(DEFAULT_RATING, |profile| profile.rating);
        Ok(Some((p, rating)))
    }

    /// Participant totals, standings, slot writes and rating changes of a
    /// freshly completed match
    async fn settle_completed(
        &self,
        m: &Match,
        rules: &MatchRules,
        now: DateTime<Utc>,
        events: &mut Vec<MatchEvent>,
    ) -> ServiceResult<ChangeSet> {
        let mut changes = ChangeSet::new();
        let Some(winner_id) = m.winner_id else {
            return Ok(changes);
        };

        let mut winner = self.store.load_participant(winner_id).await?;
        let mut loser = match m.loser_id() {
            Some(id) => Some(self.store.load_participant(id).await?),
            None => None,
        };

        if let Some(loser) = loser.as_mut() {
            let (won, lost) = m.frames_for(winner.id).unwrap_or_default();
            winner.record_result(won, lost, true, rules.scoring);
            loser.record_result(lost, won, false, rules.scoring);
        }

        let standings = settle_completion(m, rules.stage_format, &mut winner, loser.as_mut());
        events.extend(standing_events(m.id, &standings));
        changes.slot_assignments = advancement(m);

        if let Some(loser) = &loser {
            self.rate(m, &winner, loser, now, &mut changes, events)
                .await?;
        }

        changes.update_participant(winner);
        if let Some(loser) = loser {
            changes.update_participant(loser);
        }
        Ok(changes)
    }

    async fn rate(
        &self,
        m: &Match,
        winner: &Participant,
        loser: &Participant,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
        events: &mut Vec<MatchEvent>,
    ) -> ServiceResult<()> {
        let winner_profile = self.store.load_profile(winner.player_id).await?;
        let loser_profile = self.store.load_profile(loser.player_id).await?;
        let (Some(mut winner_profile), Some(mut loser_profile)) = (winner_profile, loser_profile)
        else {
            debug!("match {} not rated, skill profile missing", m.id);
            return Ok(());
        };

        let snapshots = (
            MatchHistoryEntry::snapshot(
                m,
                winner,
                winner_profile.rating,
                loser,
                loser_profile.rating,
                now,
            ),
            MatchHistoryEntry::snapshot(
                m,
                loser,
                loser_profile.rating,
                winner,
                winner_profile.rating,
                now,
            ),
        );
        let (Some(mut winner_snapshot), Some(mut loser_snapshot)) = snapshots else {
            return Ok(());
        };

        let outcome = self.engine.rate_match(
            &mut winner_profile,
            &mut loser_profile,
            &mut winner_snapshot,
            &mut loser_snapshot,
            now,
        );

        for entry in [&outcome.winner, &outcome.loser] {
            events.push(MatchEvent::RatingChanged {
                match_id: Some(m.id),
                player: entry.player_id,
                old_rating: entry.old_rating,
                new_rating: entry.new_rating,
            });
        }

        changes.rating_history.extend([outcome.winner, outcome.loser]);
        changes.match_history.extend([winner_snapshot, loser_snapshot]);
        changes.update_profile(winner_profile);
        changes.update_profile(loser_profile);
        Ok(())
    }

    /// Commit `m` with the rest of `changes`, then bump its local version
    async fn commit_transition(
        &self,
        m: &mut Match,
        mut changes: ChangeSet,
        events: Vec<MatchEvent>,
    ) -> ServiceResult<()> {
        changes.matches.insert(0, m.clone());
        self.persist(changes, events).await?;
        m.version += 1;
        Ok(())
    }

    async fn persist(&self, changes: ChangeSet, events: Vec<MatchEvent>) -> ServiceResult<()> {
        self.store.commit(changes).await?;

        for event in &events {
            if let Err(e) = self.notifier.notify(event).await {
                warn!("notification dropped ({event}): {e}");
            }
        }
        Ok(())
    }
}

fn standing_events(
    match_id: MatchId,
    standings: &[StandingChange],
) -> impl Iterator<Item = MatchEvent> + '_ {
    standings.iter().filter_map(move |change| match *change {
        StandingChange::Advanced { participant_id, to } => Some(MatchEvent::PlayerAdvanced {
            match_id,
            participant: participant_id,
            to,
        }),
        StandingChange::Eliminated { participant_id } => Some(MatchEvent::PlayerEliminated {
            match_id,
            participant: participant_id,
        }),
        StandingChange::Placed { .. } => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::Slot;

    #[test]
    fn test_standing_events_skip_placements() {
        let standings = [
            StandingChange::Placed {
                participant_id: 1,
                position: 3,
            },
            StandingChange::Eliminated { participant_id: 1 },
            StandingChange::Advanced {
                participant_id: 2,
                to: BracketLink::new(9, Slot::First),
            },
        ];

        let events: Vec<MatchEvent> = standing_events(5, &standings).collect();
        assert_eq!(
            events,
            vec![
                MatchEvent::PlayerEliminated {
                    match_id: 5,
                    participant: 1
                },
                MatchEvent::PlayerAdvanced {
                    match_id: 5,
                    participant: 2,
                    to: BracketLink::new(9, Slot::First)
                },
            ]
        );
    }

    #[test]
    fn test_sweep_report_clean() {
        let mut report = SweepReport::default();
        assert!(report.is_clean());
        report.failed.push((1, "conflict".to_string()));
        assert!(!report.is_clean());
    }
}
