//! ELO-style rating engine with experience-tiered K-factors and a
//! clean-sweep margin multiplier.
//!
//! All calculations are pure functions of their inputs; [`RatingEngine`] only
//! carries the constants.

use chrono::{DateTime, Utc};
use log::debug;

use super::models::{
    MatchHistoryEntry, PlayerProfile, RatingContext, RatingHistoryEntry, RatingReason,
};

/// Rating engine constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EloConfig {
    /// K for players with fewer than `provisional_matches` recorded matches
    pub provisional_k: f64,
    pub provisional_matches: i32,
    /// K for established players rated at or above `elite_rating`
    pub elite_k: f64,
    pub elite_rating: i32,
    /// K for everyone else
    pub established_k: f64,
    /// Applied to both deltas when the loser won no frames
    pub clean_sweep_multiplier: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            provisional_k: 40.0,
            provisional_matches: 30,
            elite_k: 16.0,
            elite_rating: 2000,
            established_k: 24.0,
            clean_sweep_multiplier: 1.2,
        }
    }
}

impl EloConfig {
    pub fn k_factor(&self, matches_played: i32, rating: i32) -> f64 {
        if matches_played < self.provisional_matches {
            self.provisional_k
        } else if rating >= self.elite_rating {
            self.elite_k
        } else {
            self.established_k
        }
    }

    pub fn margin_multiplier(&self, loser_frames: i32) -> f64 {
        if loser_frames == 0 {
            self.clean_sweep_multiplier
        } else {
            1.0
        }
    }
}

/// Probability that a player rated `rating` beats one rated `opponent`
pub fn expected_score(rating: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf(f64::from(opponent - rating) / 400.0))
}

/// Signed rating changes for one decided match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingDeltas {
    pub winner_expected: f64,
    pub winner_k: f64,
    pub loser_k: f64,
    pub margin: f64,
    /// Always at least +1
    pub winner_delta: i32,
    /// Always at most -1
    pub loser_delta: i32,
}

/// Compute both deltas from ratings, K-factors and margin multiplier
pub fn compute_deltas(
    winner_rating: i32,
    loser_rating: i32,
    winner_k: f64,
    loser_k: f64,
    margin: f64,
) -> RatingDeltas {
    let winner_expected = expected_score(winner_rating, loser_rating);
    let loser_expected = 1.0 - winner_expected;

    let winner_delta = (winner_k * margin * (1.0 - winner_expected)).round() as i32;
    let loser_delta = (loser_k * margin * (0.0 - loser_expected)).round() as i32;

    RatingDeltas {
        winner_expected,
        winner_k,
        loser_k,
        margin,
        winner_delta: winner_delta.max(1),
        loser_delta: loser_delta.min(-1),
    }
}

/// Both sides of an applied match rating change
#[derive(Debug, Clone, PartialEq)]
pub struct RatingOutcome {
    pub deltas: RatingDeltas,
    pub winner: RatingHistoryEntry,
    pub loser: RatingHistoryEntry,
}

/// Applies match results and manual adjustments to skill profiles
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingEngine {
    config: EloConfig,
}

impl RatingEngine {
    pub fn new(config: EloConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EloConfig {
        &self.config
    }

    /// Deltas for `winner` beating `loser`, who took `loser_frames` frames
    pub fn deltas(&self, winner: &PlayerProfile, loser: &PlayerProfile, loser_frames: i32) -> RatingDeltas {
        compute_deltas(
            winner.rating,
            loser.rating,
            self.config.k_factor(winner.matches_played, winner.rating),
            self.config.k_factor(loser.matches_played, loser.rating),
            self.config.margin_multiplier(loser_frames),
        )
    }

    /// Rate a decided match.
    ///
    /// Updates both profiles (rating, category, best-ever, lifetime totals) and
    /// corrects both placeholder snapshots. Nothing is persisted here; the
    /// caller commits the profiles, history entries and snapshots together.
    pub fn rate_match(
        &self,
        winner: &mut PlayerProfile,
        loser: &mut PlayerProfile,
        winner_snapshot: &mut MatchHistoryEntry,
        loser_snapshot: &mut MatchHistoryEntry,
        now: DateTime<Utc>,
    ) -> RatingOutcome {
        let deltas = self.deltas(winner, loser, loser_snapshot.frames_won);

        let context = RatingContext::from_snapshot(winner_snapshot);
        let winner_entry = winner.apply_rating_change(
            deltas.winner_delta,
            RatingReason::MatchResult,
            context.clone(),
            now,
        );
        let loser_entry =
            loser.apply_rating_change(deltas.loser_delta, RatingReason::MatchResult, context, now);

        winner.record_match(winner_snapshot.frames_won, winner_snapshot.frames_lost, true, now);
        loser.record_match(loser_snapshot.frames_won, loser_snapshot.frames_lost, false, now);

        winner_snapshot.correct(&winner_entry);
        loser_snapshot.correct(&loser_entry);

        debug!(
            "match {} rated: player {} {:+} -> {}, player {} {:+} -> {}",
            winner_snapshot.match_id,
            winner.player_id,
            winner_entry.delta,
            winner.rating,
            loser.player_id,
            loser_entry.delta,
            loser.rating
        );

        RatingOutcome {
            deltas,
            winner: winner_entry,
            loser: loser_entry,
        }
    }

    /// Manual change outside of match play (admin, bonus, decay)
    pub fn adjust(
        &self,
        profile: &mut PlayerProfile,
        delta: i32,
        reason: RatingReason,
        context: RatingContext,
        now: DateTime<Utc>,
    ) -> RatingHistoryEntry {
        profile.apply_rating_change(delta, reason, context, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_match_established_k() {
        let deltas = compute_deltas(1000, 1000, 24.0, 24.0, 1.0);
        assert_eq!(deltas.winner_expected, 0.5);
        assert_eq!(deltas.winner_delta, 12);
        assert_eq!(deltas.loser_delta, -12);
        assert_eq!(1000 + deltas.winner_delta, 1012);
        assert_eq!(1000 + deltas.loser_delta, 988);
    }

    #[test]
    fn test_deltas_are_deterministic() {
        let a = compute_deltas(1432, 1391, 24.0, 40.0, 1.2);
        let b = compute_deltas(1432, 1391, 24.0, 40.0, 1.2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_minimum_delta_of_one() {
        // Huge favourite: raw deltas round to zero
        let deltas = compute_deltas(3000, 100, 16.0, 16.0, 1.0);
        assert_eq!(deltas.winner_delta, 1);
        assert_eq!(deltas.loser_delta, -1);
    }

    #[test]
    fn test_k_factor_tiers() {
        let config = EloConfig::default();
        assert_eq!(config.k_factor(0, 2500), 40.0);
        assert_eq!(config.k_factor(29, 1000), 40.0);
        assert_eq!(config.k_factor(30, 2000), 16.0);
        assert_eq!(config.k_factor(30, 1999), 24.0);
    }

    #[test]
    fn test_clean_sweep_multiplier() {
        let config = EloConfig::default();
        assert_eq!(config.margin_multiplier(0), 1.2);
        assert_eq!(config.margin_multiplier(1), 1.0);

        let sweep = compute_deltas(1000, 1000, 24.0, 24.0, config.margin_multiplier(0));
        let close = compute_deltas(1000, 1000, 24.0, 24.0, config.margin_multiplier(4));
        assert!(sweep.winner_delta > close.winner_delta);
        assert!(sweep.loser_delta < close.loser_delta);
    }

    #[test]
    fn test_rate_match_attributes_history_to_the_match() {
        use crate::matches::{Match, MatchKind};
        use crate::tournament::Participant;
        use chrono::TimeZone;

        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut m = Match::new(9, 4, MatchKind::Normal, Some(10), Some(20));
        m.player1_score = 5;
        m.player2_score = 3;
        m.winner_id = Some(10);

        let (a, b) = (Participant::new(10, 4, 100), Participant::new(20, 4, 200));
        let mut winner = PlayerProfile::new(100, "A");
        let mut loser = PlayerProfile::new(200, "B");
        let mut winner_snap = MatchHistoryEntry::snapshot(&m, &a, 1000, &b, 1000, now).unwrap();
        let mut loser_snap = MatchHistoryEntry::snapshot(&m, &b, 1000, &a, 1000, now).unwrap();

        let engine = RatingEngine::new(EloConfig::default());
        let outcome = engine.rate_match(
            &mut winner,
            &mut loser,
            &mut winner_snap,
            &mut loser_snap,
            now,
        );

        for entry in [&outcome.winner, &outcome.loser] {
            assert_eq!(entry.match_id, Some(9));
            assert_eq!(entry.tournament_id, Some(4));
            assert_eq!(entry.reason, RatingReason::MatchResult);
        }
        assert_eq!(winner_snap.rating_after, winner.rating);
    }

    #[test]
    fn test_expected_scores_sum_to_one() {
        let e = expected_score(1200, 1000);
        assert!(e > 0.5);
        assert!((e + expected_score(1000, 1200) - 1.0).abs() < 1e-12);
    }
}
