//! Dispute-resolution authority lookup.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use crate::matches::{Match, PlayerId, TournamentId};

/// Answers whether a user may act as referee for a match
#[async_trait]
pub trait AuthorityCheck: Send + Sync {
    async fn can_resolve(&self, user: PlayerId, m: &Match) -> bool;
}

/// Fixed referee lists: global referees plus per-tournament referees
#[derive(Debug, Clone, Default)]
pub struct StaticAuthority {
    global: HashSet<PlayerId>,
    per_tournament: HashMap<TournamentId, HashSet<PlayerId>>,
}

impl StaticAuthority {
    pub fn new(referees: impl IntoIterator<Item = PlayerId>) -> Self {
        Self {
            global: referees.into_iter().collect(),
            per_tournament: HashMap::new(),
        }
    }

    /// Grant `user` authority over one tournament only
    pub fn with_tournament_referee(mut self, tournament_id: TournamentId, user: PlayerId) -> Self {
        self.per_tournament
            .entry(tournament_id)
            .or_default()
            .insert(user);
        self
    }
}

#[async_trait]
impl AuthorityCheck for StaticAuthority {
    async fn can_resolve(&self, user: PlayerId, m: &Match) -> bool {
        self.global.contains(&user)
            || self
                .per_tournament
                .get(&m.tournament_id)
                .is_some_and(|refs| refs.contains(&user))
    }
}
