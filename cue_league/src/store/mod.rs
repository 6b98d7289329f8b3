//! Persistence contract for the match core.
//!
//! The orchestrator reads aggregates through [`LeagueStore`] and writes every
//! effect of one transition as a single [`ChangeSet`]. A commit is all or
//! nothing: either the match, participants, profiles, slot writes and history
//! rows are all stored, or none of them are.
//!
//! Matches, participants and profiles carry a `version`. A commit only
//! succeeds if every versioned aggregate in it is still at the version it was
//! loaded with; the stored version is then bumped by one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod errors;
pub mod memory;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;

use crate::bracket::SlotAssignment;
use crate::matches::{Match, MatchId, MatchStatus, ParticipantId, PlayerId, TournamentId};
use crate::rating::{MatchHistoryEntry, PlayerProfile, RatingHistoryEntry};
use crate::tournament::Participant;

/// Read-path filter for match listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFilter {
    pub tournament_id: Option<TournamentId>,
    pub status: Option<MatchStatus>,
    pub participant_id: Option<ParticipantId>,
    pub limit: Option<i64>,
}

impl MatchFilter {
    pub fn tournament(tournament_id: TournamentId) -> Self {
        Self {
            tournament_id: Some(tournament_id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: MatchStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_participant(mut self, participant_id: ParticipantId) -> Self {
        self.participant_id = Some(participant_id);
        self
    }

    pub fn accepts(&self, m: &Match) -> bool {
        self.tournament_id.is_none_or(|t| m.tournament_id == t)
            && self.status.is_none_or(|s| m.status == s)
            && self.participant_id.is_none_or(|p| m.is_participant(p))
    }
}

/// Every write caused by one transition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Existing matches, carrying the version they were loaded at
    pub matches: Vec<Match>,
    pub new_matches: Vec<Match>,
    pub slot_assignments: Vec<SlotAssignment>,
    pub participants: Vec<Participant>,
    pub profiles: Vec<PlayerProfile>,
    pub rating_history: Vec<RatingHistoryEntry>,
    pub match_history: Vec<MatchHistoryEntry>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
            && self.new_matches.is_empty()
            && self.slot_assignments.is_empty()
            && self.participants.is_empty()
            && self.profiles.is_empty()
            && self.rating_history.is_empty()
            && self.match_history.is_empty()
    }

    pub fn update_match(&mut self, m: Match) -> &mut Self {
        self.matches.push(m);
        self
    }

    pub fn insert_match(&mut self, m: Match) -> &mut Self {
        self.new_matches.push(m);
        self
    }

    pub fn update_participant(&mut self, p: Participant) -> &mut Self {
        self.participants.push(p);
        self
    }

    pub fn update_profile(&mut self, profile: PlayerProfile) -> &mut Self {
        self.profiles.push(profile);
        self
    }
}

/// Persistence collaborator
#[async_trait]
pub trait LeagueStore: Send + Sync {
    async fn load_match(&self, match_id: MatchId) -> StoreResult<Match>;

    async fn load_participant(&self, participant_id: ParticipantId) -> StoreResult<Participant>;

    /// Entry of `player_id` in `tournament_id`, if registered
    async fn find_participant_by_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StoreResult<Option<Participant>>;

    async fn load_profile(&self, player_id: PlayerId) -> StoreResult<Option<PlayerProfile>>;

    async fn list_matches(&self, filter: &MatchFilter) -> StoreResult<Vec<Match>>;

    /// Scheduled matches past their result deadline and pending matches past
    /// their confirmation deadline, oldest first
    async fn list_overdue(&self, now: DateTime<Utc>, limit: i64) -> StoreResult<Vec<MatchId>>;

    /// Newest first
    async fn rating_history(
        &self,
        player_id: PlayerId,
        limit: i64,
    ) -> StoreResult<Vec<RatingHistoryEntry>>;

    async fn match_history(&self, participant_id: ParticipantId)
    -> StoreResult<Vec<MatchHistoryEntry>>;

    /// Reserve an ID for a match created by the core (byes)
    async fn allocate_match_id(&self) -> StoreResult<MatchId>;

    /// Apply `changes` atomically
    ///
    /// # Errors
    ///
    /// * `StoreError::Conflict` - A versioned aggregate changed since it was loaded
    /// * `StoreError::Bracket` - A slot write hit a slot held by someone else
    async fn commit(&self, changes: ChangeSet) -> StoreResult<()>;
}
