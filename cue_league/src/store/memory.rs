//! In-process store.
//!
//! Commits stage every write against a copy of the current state and swap it
//! in only when the whole batch applied cleanly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{ChangeSet, LeagueStore, MatchFilter, StoreError, StoreResult};
use crate::matches::{Match, MatchId, MatchStatus, ParticipantId, PlayerId, TournamentId};
use crate::rating::{MatchHistoryEntry, PlayerProfile, RatingHistoryEntry};
use crate::tournament::Participant;

#[derive(Debug, Clone, Default)]
struct State {
    matches: BTreeMap<MatchId, Match>,
    participants: BTreeMap<ParticipantId, Participant>,
    profiles: HashMap<PlayerId, PlayerProfile>,
    rating_history: Vec<RatingHistoryEntry>,
    match_history: Vec<MatchHistoryEntry>,
    next_match_id: MatchId,
}

impl State {
    fn apply(&mut self, changes: ChangeSet) -> StoreResult<()> {
        for m in changes.matches {
            let stored = self
                .matches
                .get_mut(&m.id)
                .ok_or(StoreError::MatchNotFound(m.id))?;
            if stored.version != m.version {
                return Err(StoreError::Conflict {
                    entity: "match",
                    id: m.id,
                });
            }
            *stored = Match {
                version: m.version + 1,
                ..m
            };
        }

        for m in changes.new_matches {
            if self.matches.contains_key(&m.id) {
                return Err(StoreError::Conflict {
                    entity: "match",
                    id: m.id,
                });
            }
            self.next_match_id = self.next_match_id.max(m.id + 1);
            self.matches.insert(m.id, m);
        }

        for assignment in changes.slot_assignments {
            let target = self
                .matches
                .get_mut(&assignment.match_id)
                .ok_or(StoreError::MatchNotFound(assignment.match_id))?;
            assignment.apply(target)?;
            target.version += 1;
        }

        for p in changes.participants {
            let stored = self
                .participants
                .get_mut(&p.id)
                .ok_or(StoreError::ParticipantNotFound(p.id))?;
            if stored.version != p.version {
                return Err(StoreError::Conflict {
                    entity: "participant",
                    id: p.id,
                });
            }
            *stored = Participant {
                version: p.version + 1,
                ..p
            };
        }

        for profile in changes.profiles {
            let stored = self
                .profiles
                .get_mut(&profile.player_id)
                .ok_or(StoreError::ProfileNotFound(profile.player_id))?;
            if stored.version != profile.version {
                return Err(StoreError::Conflict {
                    entity: "profile",
                    id: profile.player_id,
                });
            }
            *stored = PlayerProfile {
                version: profile.version + 1,
                ..profile
            };
        }

        self.rating_history.extend(changes.rating_history);
        self.match_history.extend(changes.match_history);
        Ok(())
    }
}

/// [`LeagueStore`] kept entirely in memory
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<State>,
    fail_next_commit: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                next_match_id: 1,
                ..State::default()
            }),
            fail_next_commit: AtomicBool::new(false),
        }
    }

    /// Insert or replace a match, bypassing version checks
    pub async fn insert_match(&self, m: Match) {
        let mut state = self.state.write().await;
        state.next_match_id = state.next_match_id.max(m.id + 1);
        state.matches.insert(m.id, m);
    }

    pub async fn insert_participant(&self, p: Participant) {
        self.state.write().await.participants.insert(p.id, p);
    }

    pub async fn insert_profile(&self, profile: PlayerProfile) {
        self.state
            .write()
            .await
            .profiles
            .insert(profile.player_id, profile);
    }

    /// Make the next commit fail after staging, leaving the state untouched
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub async fn all_rating_history(&self) -> Vec<RatingHistoryEntry> {
        self.state.read().await.rating_history.clone()
    }

    pub async fn all_match_history(&self) -> Vec<MatchHistoryEntry> {
        self.state.read().await.match_history.clone()
    }
}

#[async_trait]
impl LeagueStore for MemoryStore {
    async fn load_match(&self, match_id: MatchId) -> StoreResult<Match> {
        self.state
            .read()
            .await
            .matches
            .get(&match_id)
            .cloned()
            .ok_or(StoreError::MatchNotFound(match_id))
    }

    async fn load_participant(&self, participant_id: ParticipantId) -> StoreResult<Participant> {
        self.state
            .read()
            .await
            .participants
            .get(&participant_id)
            .cloned()
            .ok_or(StoreError::ParticipantNotFound(participant_id))
    }

    async fn find_participant_by_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StoreResult<Option<Participant>> {
        Ok(self
            .state
            .read()
            .await
            .participants
            .values()
            .find(|p| p.tournament_id == tournament_id && p.player_id == player_id)
            .cloned())
    }

    async fn load_profile(&self, player_id: PlayerId) -> StoreResult<Option<PlayerProfile>> {
        Ok(self.state.read().await.profiles.get(&player_id).cloned())
    }

    async fn list_matches(&self, filter: &MatchFilter) -> StoreResult<Vec<Match>> {
        let state = self.state.read().await;
        let limit = filter
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);

        Ok(state
            .matches
            .values()
            .filter(|m| filter.accepts(m))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_overdue(&self, now: DateTime<Utc>, limit: i64) -> StoreResult<Vec<MatchId>> {
        let state = self.state.read().await;
        let mut overdue: Vec<(DateTime<Utc>, MatchId)> = state
            .matches
            .values()
            .filter_map(|m| {
                let deadline = match m.status {
                    MatchStatus::Scheduled => m.result_deadline,
                    MatchStatus::PendingConfirmation => m.confirmation_deadline,
                    _ => None,
                }?;
                (deadline < now).then_some((deadline, m.id))
            })
            .collect();
        overdue.sort();

        Ok(overdue
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|(_, id)| id)
            .collect())
    }

    async fn rating_history(
        &self,
        player_id: PlayerId,
        limit: i64,
    ) -> StoreResult<Vec<RatingHistoryEntry>> {
        Ok(self
            .state
            .read()
            .await
            .rating_history
            .iter()
            .rev()
            .filter(|entry| entry.player_id == player_id)
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn match_history(
        &self,
        participant_id: ParticipantId,
    ) -> StoreResult<Vec<MatchHistoryEntry>> {
        Ok(self
            .state
            .read()
            .await
            .match_history
            .iter()
            .filter(|entry| entry.participant_id == participant_id)
            .cloned()
            .collect())
    }

    async fn allocate_match_id(&self) -> StoreResult<MatchId> {
        let mut state = self.state.write().await;
        let id = state.next_match_id;
        state.next_match_id += 1;
        Ok(id)
    }

    async fn commit(&self, changes: ChangeSet) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();
        staged.apply(changes)?;

        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::CommitFailed("injected failure".to_string()));
        }

        // Keep the allocator moving even if staged inserts used lower ids
        staged.next_match_id = staged.next_match_id.max(state.next_match_id);
        *state = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::SlotAssignment;
    use crate::matches::{BracketLink, MatchKind, Slot};
    use chrono::Duration;

    fn pair() -> Match {
        Match::new(1, 1, MatchKind::Normal, Some(10), Some(20))
    }

    #[tokio::test]
    async fn test_commit_bumps_version() {
        let store = MemoryStore::new();
        store.insert_match(pair()).await;

        let mut m = store.load_match(1).await.unwrap();
        m.player1_score = 3;
        let mut changes = ChangeSet::new();
        changes.update_match(m);
        store.commit(changes).await.unwrap();

        let stored = store.load_match(1).await.unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.player1_score, 3);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let store = MemoryStore::new();
        store.insert_match(pair()).await;

        let first = store.load_match(1).await.unwrap();
        let second = store.load_match(1).await.unwrap();

        let mut changes = ChangeSet::new();
        changes.update_match(first);
        store.commit(changes).await.unwrap();

        let mut changes = ChangeSet::new();
        changes.update_match(second);
        let err = store.commit(changes).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { entity: "match", id: 1 }));
    }

    #[tokio::test]
    async fn test_failed_batch_applies_nothing() {
        let store = MemoryStore::new();
        store.insert_match(pair()).await;
        store
            .insert_match(Match::new(2, 1, MatchKind::Normal, Some(30), None))
            .await;

        let mut m = store.load_match(1).await.unwrap();
        m.player1_score = 5;
        let mut changes = ChangeSet::new();
        changes.update_match(m);
        changes.slot_assignments.push(SlotAssignment::new(
            BracketLink::new(2, Slot::First),
            10,
        ));

        assert!(matches!(
            store.commit(changes).await,
            Err(StoreError::Bracket(_))
        ));
        let untouched = store.load_match(1).await.unwrap();
        assert_eq!(untouched.player1_score, 0);
        assert_eq!(untouched.version, 0);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.insert_match(pair()).await;
        store.fail_next_commit();

        let mut changes = ChangeSet::new();
        changes.update_match(store.load_match(1).await.unwrap());
        assert!(store.commit(changes.clone()).await.is_err());
        assert_eq!(store.load_match(1).await.unwrap().version, 0);

        store.commit(changes).await.unwrap();
        assert_eq!(store.load_match(1).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_list_overdue_orders_by_deadline() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .insert_match(pair().with_result_deadline(now - Duration::hours(1)))
            .await;
        let mut later = Match::new(2, 1, MatchKind::Normal, Some(30), Some(40))
            .with_result_deadline(now - Duration::hours(5));
        later.status = MatchStatus::Completed;
        store.insert_match(later).await;
        store
            .insert_match(
                Match::new(3, 1, MatchKind::Normal, Some(50), Some(60))
                    .with_result_deadline(now - Duration::hours(3)),
            )
            .await;
        store
            .insert_match(
                Match::new(4, 1, MatchKind::Normal, Some(70), Some(80))
                    .with_result_deadline(now + Duration::hours(3)),
            )
            .await;

        assert_eq!(store.list_overdue(now, 10).await.unwrap(), vec![3, 1]);
        assert_eq!(store.list_overdue(now, 1).await.unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_allocate_after_seed() {
        let store = MemoryStore::new();
        store
            .insert_match(Match::new(41, 1, MatchKind::Normal, Some(1), Some(2)))
            .await;
        assert_eq!(store.allocate_match_id().await.unwrap(), 42);
        assert_eq!(store.allocate_match_id().await.unwrap(), 43);
    }
}
