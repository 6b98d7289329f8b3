//! Tournament data models: participants and match configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};

use crate::matches::{MatchKind, ParticipantId, PlayerId, StageId, TournamentId};

/// Participant status within a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Registered,
    Active,
    Eliminated,
    Disqualified,
    Winner,
}

impl ParticipantStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantStatus::Registered => "registered",
            ParticipantStatus::Active => "active",
            ParticipantStatus::Eliminated => "eliminated",
            ParticipantStatus::Disqualified => "disqualified",
            ParticipantStatus::Winner => "winner",
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(ParticipantStatus::Registered),
            "active" => Ok(ParticipantStatus::Active),
            "eliminated" => Ok(ParticipantStatus::Eliminated),
            "disqualified" => Ok(ParticipantStatus::Disqualified),
            "winner" => Ok(ParticipantStatus::Winner),
            other => Err(format!("unknown participant status: {other}")),
        }
    }
}

/// How standings points are earned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "model")]
pub enum ScoringModel {
    /// Points equal cumulative frames won
    FramesWon,
    /// Fixed points per match result
    MatchPoints { win: i32, loss: i32 },
}

/// Stage format, decides whether a lost match knocks a player out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageFormat {
    Knockout,
    RoundRobin,
}

/// Geographic tier of a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentTier {
    Local,
    Regional,
    National,
}

/// Tournament-scoped entry wrapping a player's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub tournament_id: TournamentId,
    pub player_id: PlayerId,
    pub seed: Option<i32>,
    pub status: ParticipantStatus,
    pub matches_played: i32,
    pub matches_won: i32,
    pub matches_lost: i32,
    pub frames_won: i32,
    pub frames_lost: i32,
    /// Always `frames_won - frames_lost`
    pub frame_difference: i32,
    pub points: i32,
    pub current_stage: Option<StageId>,
    pub group_label: Option<String>,
    pub final_position: Option<i32>,
    pub version: i64,
}

impl Participant {
    /// Create a freshly registered participant
    pub fn new(id: ParticipantId, tournament_id: TournamentId, player_id: PlayerId) -> Self {
        Self {
            id,
            tournament_id,
            player_id,
            seed: None,
            status: ParticipantStatus::Registered,
            matches_played: 0,
            matches_won: 0,
            matches_lost: 0,
            frames_won: 0,
            frames_lost: 0,
            frame_difference: 0,
            points: 0,
            current_stage: None,
            group_label: None,
            final_position: None,
            version: 0,
        }
    }

    pub fn with_seed(mut self, seed: i32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Add one played match to the running totals
    pub fn record_result(&mut self, frames_won: i32, frames_lost: i32, won: bool, scoring: ScoringModel) {
        self.matches_played += 1;
        if won {
            self.matches_won += 1;
        } else {
            self.matches_lost += 1;
        }

        self.frames_won += frames_won;
        self.frames_lost += frames_lost;
        self.frame_difference = self.frames_won - self.frames_lost;

        self.points += match scoring {
            ScoringModel::FramesWon => frames_won,
            ScoringModel::MatchPoints { win, loss } => {
                if won {
                    win
                } else {
                    loss
                }
            }
        };

        self.mark_active();
    }

    /// Registered participants become active once they play
    pub fn mark_active(&mut self) {
        if self.status == ParticipantStatus::Registered {
            self.status = ParticipantStatus::Active;
        }
    }

    pub fn eliminate(&mut self) {
        if self.is_still_in() {
            self.status = ParticipantStatus::Eliminated;
        }
    }

    pub fn place(&mut self, position: i32) {
        self.final_position = Some(position);
    }

    /// Not yet knocked out, disqualified or crowned
    pub fn is_still_in(&self) -> bool {
        matches!(
            self.status,
            ParticipantStatus::Registered | ParticipantStatus::Active
        )
    }
}

/// Per-tournament match configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    pub tier: TournamentTier,
    /// Race-to for regular matches
    pub race_to: i32,
    pub semifinal_race_to: Option<i32>,
    pub third_place_race_to: Option<i32>,
    pub final_race_to: Option<i32>,
    /// Time the opponent has to confirm a submitted result
    pub confirmation_window_hours: i64,
    /// Time players have to report a result once a match is scheduled
    pub result_window_hours: i64,
    pub stage_format: StageFormat,
    /// Stages that differ from `stage_format` (e.g. a group stage before the knockout)
    #[serde(default)]
    pub stage_formats: HashMap<StageId, StageFormat>,
    pub scoring: ScoringModel,
}

impl TournamentConfig {
    /// Default configuration for a geographic tier
    ///
    /// - Local: race to 5, finals race to 7
    /// - Regional: race to 7, finals race to 9
    /// - National: race to 9, finals race to 11
    pub fn for_tier(tier: TournamentTier) -> Self {
        let (race_to, finals_race_to) = match tier {
            TournamentTier::Local => (5, 7),
            TournamentTier::Regional => (7, 9),
            TournamentTier::National => (9, 11),
        };

        Self {
            tier,
            race_to,
            semifinal_race_to: Some(finals_race_to),
            third_place_race_to: Some(finals_race_to),
            final_race_to: Some(finals_race_to),
            confirmation_window_hours: 24,
            result_window_hours: 72,
            stage_format: StageFormat::Knockout,
            stage_formats: HashMap::new(),
            scoring: ScoringModel::FramesWon,
        }
    }

    /// Round-robin league night: one race length, points per frame
    pub fn round_robin(tier: TournamentTier) -> Self {
        let mut config = Self::for_tier(tier);
        config.semifinal_race_to = None;
        config.third_place_race_to = None;
        config.final_race_to = None;
        config.stage_format = StageFormat::RoundRobin;
        config
    }

    /// Override the format of one stage
    pub fn with_stage_format(mut self, stage_id: StageId, format: StageFormat) -> Self {
        self.stage_formats.insert(stage_id, format);
        self
    }

    /// Race-to target for a match kind, falling back to the regular target
    pub fn race_to_for(&self, kind: MatchKind) -> i32 {
        let special = match kind {
            MatchKind::Normal | MatchKind::Bye => None,
            MatchKind::Semifinal => self.semifinal_race_to,
            MatchKind::ThirdPlace => self.third_place_race_to,
            MatchKind::Final => self.final_race_to,
        };
        special.unwrap_or(self.race_to)
    }

    pub fn stage_format_for(&self, stage_id: Option<StageId>) -> StageFormat {
        stage_id
            .and_then(|id| self.stage_formats.get(&id).copied())
            .unwrap_or(self.stage_format)
    }

    pub fn confirmation_window(&self) -> Duration {
        Duration::hours(self.confirmation_window_hours)
    }

    pub fn result_window(&self) -> Duration {
        Duration::hours(self.result_window_hours)
    }

    /// Check that every race-to and window is positive
    pub fn validate(&self) -> Result<(), String> {
        let targets = [
            ("race_to", Some(self.race_to)),
            ("semifinal_race_to", self.semifinal_race_to),
            ("third_place_race_to", self.third_place_race_to),
            ("final_race_to", self.final_race_to),
        ];
        for (name, value) in targets {
            if let Some(v) = value.filter(|v| *v <= 0) {
                return Err(format!("{name} must be positive, got {v}"));
            }
        }

        if self.confirmation_window_hours <= 0 {
            return Err("confirmation_window_hours must be positive".to_string());
        }
        if self.result_window_hours <= 0 {
            return Err("result_window_hours must be positive".to_string());
        }

        Ok(())
    }
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self::for_tier(TournamentTier::Local)
    }
}
