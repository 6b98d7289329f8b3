//! Skill profile and rating history models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::matches::{Match, MatchId, ParticipantId, PlayerId, TournamentId};
use crate::tournament::Participant;

/// Rating every new profile starts with
pub const DEFAULT_RATING: i32 = 1000;

/// Banding of a rating, always derived from the rating itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Beginner,
    Amateur,
    Intermediate,
    Advanced,
    Expert,
    Master,
}

impl SkillCategory {
    /// Band of `rating`
    ///
    /// - Beginner: below 800
    /// - Amateur: 800-1199
    /// - Intermediate: 1200-1599
    /// - Advanced: 1600-1999
    /// - Expert: 2000-2399
    /// - Master: 2400 and up
    pub fn from_rating(rating: i32) -> Self {
        match rating {
            i32::MIN..800 => SkillCategory::Beginner,
            800..1200 => SkillCategory::Amateur,
            1200..1600 => SkillCategory::Intermediate,
            1600..2000 => SkillCategory::Advanced,
            2000..2400 => SkillCategory::Expert,
            _ => SkillCategory::Master,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkillCategory::Beginner => "beginner",
            SkillCategory::Amateur => "amateur",
            SkillCategory::Intermediate => "intermediate",
            SkillCategory::Advanced => "advanced",
            SkillCategory::Expert => "expert",
            SkillCategory::Master => "master",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a rating changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingReason {
    MatchResult,
    AdminAdjustment,
    TournamentBonus,
    InactivityDecay,
}

impl RatingReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RatingReason::MatchResult => "match_result",
            RatingReason::AdminAdjustment => "admin_adjustment",
            RatingReason::TournamentBonus => "tournament_bonus",
            RatingReason::InactivityDecay => "inactivity_decay",
        }
    }
}

impl fmt::Display for RatingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatingReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "match_result" => Ok(RatingReason::MatchResult),
            "admin_adjustment" => Ok(RatingReason::AdminAdjustment),
            "tournament_bonus" => Ok(RatingReason::TournamentBonus),
            "inactivity_decay" => Ok(RatingReason::InactivityDecay),
            other => Err(format!("unknown rating reason: {other}")),
        }
    }
}

/// Long-lived skill profile of a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: PlayerId,
    pub display_name: String,
    pub rating: i32,
    pub category: SkillCategory,
    /// Never decreases
    pub best_rating: i32,
    pub matches_played: i32,
    pub wins: i32,
    pub losses: i32,
    pub frames_won: i32,
    pub frames_lost: i32,
    pub last_match_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl PlayerProfile {
    pub fn new(player_id: PlayerId, display_name: impl Into<String>) -> Self {
        Self::with_rating(player_id, display_name, DEFAULT_RATING)
    }

    pub fn with_rating(player_id: PlayerId, display_name: impl Into<String>, rating: i32) -> Self {
        let rating = rating.max(0);
        Self {
            player_id,
            display_name: display_name.into(),
            rating,
            category: SkillCategory::from_rating(rating),
            best_rating: rating,
            matches_played: 0,
            wins: 0,
            losses: 0,
            frames_won: 0,
            frames_lost: 0,
            last_match_at: None,
            version: 0,
        }
    }

    /// Apply a signed delta, clamped at zero, and describe the change.
    ///
    /// Keeps the category and best-ever rating in step with the new rating.
    pub fn apply_rating_change(
        &mut self,
        delta: i32,
        reason: RatingReason,
        context: RatingContext,
        now: DateTime<Utc>,
    ) -> RatingHistoryEntry {
        let old_rating = self.rating;
        let new_rating = old_rating.saturating_add(delta).max(0);

        self.rating = new_rating;
        self.category = SkillCategory::from_rating(new_rating);
        if new_rating > self.best_rating {
            self.best_rating = new_rating;
        }

        RatingHistoryEntry {
            player_id: self.player_id,
            old_rating,
            new_rating,
            delta: new_rating - old_rating,
            reason,
            match_id: context.match_id,
            tournament_id: context.tournament_id,
            note: context.note,
            created_at: now,
        }
    }

    /// Add one played match to the lifetime totals
    pub fn record_match(&mut self, frames_won: i32, frames_lost: i32, won: bool, now: DateTime<Utc>) {
        self.matches_played += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.frames_won += frames_won;
        self.frames_lost += frames_lost;
        self.last_match_at = Some(now);
    }
}

/// What a rating change is attributable to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatingContext {
    pub match_id: Option<MatchId>,
    pub tournament_id: Option<TournamentId>,
    pub note: Option<String>,
}

impl RatingContext {
    /// Attribute a change to the match a history snapshot was taken from
    pub fn from_snapshot(entry: &MatchHistoryEntry) -> Self {
        Self {
            match_id: Some(entry.match_id),
            tournament_id: Some(entry.tournament_id),
            note: None,
        }
    }
}

/// Immutable record of one rating change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingHistoryEntry {
    pub player_id: PlayerId,
    pub old_rating: i32,
    pub new_rating: i32,
    pub delta: i32,
    pub reason: RatingReason,
    pub match_id: Option<MatchId>,
    pub tournament_id: Option<TournamentId>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-participant snapshot of a completed match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchHistoryEntry {
    pub match_id: MatchId,
    pub tournament_id: TournamentId,
    pub participant_id: ParticipantId,
    pub player_id: PlayerId,
    pub opponent_participant_id: ParticipantId,
    pub opponent_player_id: PlayerId,
    pub opponent_rating: i32,
    pub frames_won: i32,
    pub frames_lost: i32,
    pub won: bool,
    pub rating_before: i32,
    pub rating_after: i32,
    pub rating_delta: i32,
    pub played_at: DateTime<Utc>,
}

impl MatchHistoryEntry {
    /// Snapshot taken at completion, before the rating change is known.
    ///
    /// `rating_before` and `rating_after` both hold the current rating until
    /// [`MatchHistoryEntry::correct`] fills in the real values. Returns `None`
    /// when `me` does not play in `m`.
    pub fn snapshot(
        m: &Match,
        me: &Participant,
        my_rating: i32,
        opponent: &Participant,
        opponent_rating: i32,
        played_at: DateTime<Utc>,
    ) -> Option<Self> {
        let (frames_won, frames_lost) = m.frames_for(me.id)?;

        Some(Self {
            match_id: m.id,
            tournament_id: m.tournament_id,
            participant_id: me.id,
            player_id: me.player_id,
            opponent_participant_id: opponent.id,
            opponent_player_id: opponent.player_id,
            opponent_rating,
            frames_won,
            frames_lost,
            won: m.winner_id == Some(me.id),
            rating_before: my_rating,
            rating_after: my_rating,
            rating_delta: 0,
            played_at,
        })
    }

    pub fn correct(&mut self, change: &RatingHistoryEntry) {
        self.rating_before = change.old_rating;
        self.rating_after = change.new_rating;
        self.rating_delta = change.delta;
    }
}
