//! Tournament configuration lookup for a given match.

use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use super::models::{ScoringModel, StageFormat, TournamentConfig};
use crate::matches::{Match, TournamentId};

/// Rules lookup errors
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("No configuration for tournament {0}")]
    UnknownTournament(TournamentId),

    #[error("Invalid configuration for tournament {tournament_id}: {reason}")]
    InvalidConfig {
        tournament_id: TournamentId,
        reason: String,
    },

    #[error("Rules lookup failed: {0}")]
    Backend(String),
}

pub type RulesResult<T> = Result<T, RulesError>;

/// Everything a match transition needs from its tournament's configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRules {
    pub race_to: i32,
    pub confirmation_window: Duration,
    pub stage_format: StageFormat,
    pub scoring: ScoringModel,
}

impl MatchRules {
    /// Resolve the rules of `m` from its tournament's configuration
    pub fn from_config(config: &TournamentConfig, m: &Match) -> Self {
        Self {
            race_to: config.race_to_for(m.kind),
            confirmation_window: config.confirmation_window(),
            stage_format: config.stage_format_for(m.stage_id),
            scoring: config.scoring,
        }
    }
}

/// Supplies race-to targets and windows, which may vary per tournament tier
#[async_trait]
pub trait RulesProvider: Send + Sync {
    async fn rules_for(&self, m: &Match) -> RulesResult<MatchRules>;
}

/// One configuration for every tournament
#[derive(Debug, Clone, Default)]
pub struct StaticRules {
    config: TournamentConfig,
}

impl StaticRules {
    pub fn new(config: TournamentConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RulesProvider for StaticRules {
    async fn rules_for(&self, m: &Match) -> RulesResult<MatchRules> {
        Ok(MatchRules::from_config(&self.config, m))
    }
}

/// Configuration registered per tournament
#[derive(Debug, Default)]
pub struct TournamentRulesRegistry {
    configs: RwLock<HashMap<TournamentId, TournamentConfig>>,
}

impl TournamentRulesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a tournament's configuration
    ///
    /// # Errors
    ///
    /// * `RulesError::InvalidConfig` - Config failed validation
    pub async fn register(
        &self,
        tournament_id: TournamentId,
        config: TournamentConfig,
    ) -> RulesResult<()> {
        config
            .validate()
            .map_err(|reason| RulesError::InvalidConfig {
                tournament_id,
                reason,
            })?;

        self.configs.write().await.insert(tournament_id, config);
        Ok(())
    }

    pub async fn config(&self, tournament_id: TournamentId) -> Option<TournamentConfig> {
        self.configs.read().await.get(&tournament_id).cloned()
    }
}

#[async_trait]
impl RulesProvider for TournamentRulesRegistry {
    async fn rules_for(&self, m: &Match) -> RulesResult<MatchRules> {
        let configs = self.configs.read().await;
        let config = configs
            .get(&m.tournament_id)
            .ok_or(RulesError::UnknownTournament(m.tournament_id))?;
        Ok(MatchRules::from_config(config, m))
    }
}
