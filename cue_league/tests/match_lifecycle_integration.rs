//! Integration tests for the match lifecycle driven through `MatchService`.
//!
//! Covers submission, confirmation, disputes and referee resolution, together
//! with the rating and participant updates a completion commits.

use chrono::{DateTime, Duration, TimeZone, Utc};
use cue_league::matches::MatchError;
use cue_league::rating::{EloConfig, RatingContext};
use cue_league::{
    LeagueStore, ManualClock, Match, MatchEvent, MatchKind, MatchService, MatchStatus,
    MemoryStore, Participant, ParticipantStatus, PlayerProfile, RatingEngine, RatingReason,
    RecordingNotifier, ScoreError, ServiceError, SkillCategory, StaticAuthority, StaticRules,
    StoreError, TournamentConfig, TournamentTier,
};
use std::sync::Arc;

const REFEREE: i64 = 900;

struct Harness {
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<ManualClock>,
    service: MatchService,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// Tournament 1 with participants 10, 20, 30, 40 for players 100..400
async fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    for (participant, player) in [(10, 100), (20, 200), (30, 300), (40, 400)] {
        store
            .insert_participant(Participant::new(participant, 1, player))
            .await;
        store
            .insert_profile(PlayerProfile::new(player, format!("player {player}")))
            .await;
    }

    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(ManualClock::new(start()));
    let authority = StaticAuthority::new([REFEREE]).with_tournament_referee(1, 100);

    // Established K for everyone keeps the expected deltas easy to read
    let engine = RatingEngine::new(EloConfig {
        provisional_matches: 0,
        ..EloConfig::default()
    });

    let service = MatchService::new(
        store.clone(),
        Arc::new(StaticRules::new(TournamentConfig::for_tier(
            TournamentTier::Local,
        ))),
        notifier.clone(),
        Arc::new(authority),
        clock.clone(),
    )
    .with_rating_engine(engine);

    Harness {
        store,
        notifier,
        clock,
        service,
    }
}

fn scheduled(id: i64, kind: MatchKind, p1: i64, p2: i64) -> Match {
    Match::new(id, 1, kind, Some(p1), Some(p2)).with_result_deadline(start() + Duration::hours(72))
}

#[tokio::test]
async fn test_submit_then_confirm_completes_and_rates() {
    let h = harness().await;
    h.store.insert_match(scheduled(1, MatchKind::Normal, 10, 20)).await;

    // Slot-2 player reports from their own point of view
    let m = h.service.submit_result(1, 200, 2, 5).await.unwrap();
    assert_eq!(m.status, MatchStatus::PendingConfirmation);
    assert_eq!((m.player1_score, m.player2_score), (5, 2));
    assert_eq!(m.submitted_by, Some(20));
    assert_eq!(m.confirmation_deadline, Some(start() + Duration::hours(24)));
    assert_eq!(m.version, 1);

    let m = h.service.confirm_result(1, 100).await.unwrap();
    assert_eq!(m.status, MatchStatus::Completed);
    assert_eq!(m.winner_id, Some(10));
    assert_eq!(m.loser_id(), Some(20));
    assert_eq!(m.confirmed_by, Some(10));
    assert_eq!(h.store.load_match(1).await.unwrap(), m);

    let winner = h.store.load_profile(100).await.unwrap().unwrap();
    let loser = h.store.load_profile(200).await.unwrap().unwrap();
    assert_eq!(winner.rating, 1012);
    assert_eq!(loser.rating, 988);
    assert_eq!(winner.best_rating, 1012);
    assert_eq!(loser.best_rating, 1000);
    assert_eq!((winner.wins, winner.frames_won, winner.frames_lost), (1, 5, 2));
    assert_eq!((loser.losses, loser.frames_won, loser.frames_lost), (1, 2, 5));

    let p10 = h.store.load_participant(10).await.unwrap();
    assert_eq!(p10.matches_won, 1);
    assert_eq!(p10.frame_difference, 3);
    assert_eq!(p10.points, 5);
    assert_eq!(p10.status, ParticipantStatus::Active);

    let p20 = h.store.load_participant(20).await.unwrap();
    assert_eq!(p20.matches_lost, 1);
    assert_eq!(p20.frame_difference, -3);
    assert_eq!(p20.status, ParticipantStatus::Eliminated);

    let history = h.store.rating_history(100, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].delta, 12);
    assert_eq!(history[0].reason, RatingReason::MatchResult);
    assert_eq!(history[0].match_id, Some(1));

    let snapshots = h.store.match_history(20).await.unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].opponent_participant_id, 10);
    assert_eq!(snapshots[0].opponent_rating, 1000);
    assert_eq!(
        (snapshots[0].rating_before, snapshots[0].rating_after),
        (1000, 988)
    );
    assert!(!snapshots[0].won);

    let events = h.notifier.events().await;
    assert_eq!(
        events,
        vec![
            MatchEvent::ResultSubmitted {
                match_id: 1,
                submitted_by: 20,
                opponent: 10
            },
            MatchEvent::ResultConfirmed {
                match_id: 1,
                winner: 10,
                loser: Some(20)
            },
            MatchEvent::PlayerEliminated {
                match_id: 1,
                participant: 20
            },
            MatchEvent::RatingChanged {
                match_id: Some(1),
                player: 100,
                old_rating: 1000,
                new_rating: 1012
            },
            MatchEvent::RatingChanged {
                match_id: Some(1),
                player: 200,
                old_rating: 1000,
                new_rating: 988
            },
        ]
    );
}

#[tokio::test]
async fn test_clean_sweep_bonus() {
    let h = harness().await;
    h.store.insert_match(scheduled(1, MatchKind::Normal, 10, 20)).await;

    h.service.submit_result(1, 100, 5, 0).await.unwrap();
    h.service.confirm_result(1, 200).await.unwrap();

    assert_eq!(h.store.load_profile(100).await.unwrap().unwrap().rating, 1014);
    assert_eq!(h.store.load_profile(200).await.unwrap().unwrap().rating, 986);
}

#[tokio::test]
async fn test_self_confirmation_and_self_dispute_rejected() {
    let h = harness().await;
    h.store.insert_match(scheduled(1, MatchKind::Normal, 10, 20)).await;
    h.service.submit_result(1, 100, 5, 3).await.unwrap();

    let err = h.service.confirm_result(1, 100).await.unwrap_err();
    assert!(matches!(err, ServiceError::Match(MatchError::SelfConfirmation)));

    let err = h
        .service
        .dispute_result(1, 100, "changed my mind")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Match(MatchError::SelfConfirmation)));

    let m = h.store.load_match(1).await.unwrap();
    assert_eq!(m.status, MatchStatus::PendingConfirmation);
    assert_eq!(m.version, 1);
    assert_eq!(h.notifier.events().await.len(), 1);
}

#[tokio::test]
async fn test_only_occupants_may_report() {
    let h = harness().await;
    h.store.insert_match(scheduled(1, MatchKind::Normal, 10, 20)).await;

    let err = h.service.submit_result(1, 300, 5, 0).await.unwrap_err();
    assert!(matches!(err, ServiceError::Match(MatchError::NotParticipant(30))));

    let err = h.service.submit_result(1, 999, 5, 0).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotEntered {
            player_id: 999,
            tournament_id: 1
        }
    ));
    assert!(err.is_rejection());
}

#[tokio::test]
async fn test_invalid_score_leaves_match_untouched() {
    let h = harness().await;
    h.store.insert_match(scheduled(1, MatchKind::Normal, 10, 20)).await;

    let err = h.service.submit_result(1, 100, 5, 5).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Match(MatchError::InvalidScore(ScoreError::BothReachedTarget {
            race_to: 5
        }))
    ));

    let m = h.store.load_match(1).await.unwrap();
    assert_eq!(m.status, MatchStatus::Scheduled);
    assert_eq!(m.version, 0);
    assert!(h.notifier.events().await.is_empty());
}

#[tokio::test]
async fn test_final_uses_its_own_race_length() {
    let h = harness().await;
    h.store.insert_match(scheduled(1, MatchKind::Final, 10, 20)).await;

    let err = h.service.submit_result(1, 100, 5, 2).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Match(MatchError::InvalidScore(ScoreError::NoWinner { race_to: 7, .. }))
    ));

    h.service.submit_result(1, 100, 7, 2).await.unwrap();
}

#[tokio::test]
async fn test_submission_after_deadline_rejected() {
    let h = harness().await;
    h.store.insert_match(scheduled(1, MatchKind::Normal, 10, 20)).await;
    h.clock.advance(Duration::hours(73));

    let err = h.service.submit_result(1, 100, 5, 1).await.unwrap_err();
    assert!(matches!(err, ServiceError::Match(MatchError::DeadlinePassed(_))));
}

#[tokio::test]
async fn test_dispute_then_referee_resolution() {
    let h = harness().await;
    h.store.insert_match(scheduled(1, MatchKind::Normal, 10, 20)).await;

    h.service.submit_result(1, 100, 5, 3).await.unwrap();

    let err = h.service.dispute_result(1, 200, "   ").await.unwrap_err();
    assert!(matches!(err, ServiceError::Match(MatchError::EmptyDisputeReason)));

    let m = h
        .service
        .dispute_result(1, 200, "  I won the last frame  ")
        .await
        .unwrap();
    assert_eq!(m.status, MatchStatus::Disputed);
    assert_eq!(m.dispute_reason.as_deref(), Some("I won the last frame"));

    // No rating effect while disputed
    assert_eq!(h.store.load_profile(100).await.unwrap().unwrap().rating, 1000);

    let err = h
        .service
        .resolve_dispute(1, 555, 3, 5, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Match(MatchError::Unauthorized(555))));

    // Tournament referee, but also a player in this match
    let err = h
        .service
        .resolve_dispute(1, 100, 5, 3, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Match(MatchError::ParticipantResolver(100))
    ));

    let err = h
        .service
        .resolve_dispute(1, REFEREE, 4, 3, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Match(MatchError::InvalidScore(_))));

    let m = h
        .service
        .resolve_dispute(1, REFEREE, 3, 5, Some("video review".to_string()))
        .await
        .unwrap();
    assert_eq!(m.status, MatchStatus::Completed);
    assert_eq!(m.winner_id, Some(20));
    assert_eq!(m.resolved_by, Some(REFEREE));
    assert_eq!(m.resolution_notes.as_deref(), Some("video review"));

    assert_eq!(h.store.load_profile(200).await.unwrap().unwrap().rating, 1012);
    assert_eq!(
        h.store.load_participant(10).await.unwrap().status,
        ParticipantStatus::Eliminated
    );

    let events = h.notifier.events().await;
    assert!(events.contains(&MatchEvent::DisputeResolved {
        match_id: 1,
        resolved_by: REFEREE,
        winner: 20,
        loser: Some(10)
    }));
}

#[tokio::test]
async fn test_resolving_undisputed_match_rejected() {
    let h = harness().await;
    h.store.insert_match(scheduled(1, MatchKind::Normal, 10, 20)).await;

    let err = h
        .service
        .resolve_dispute(1, REFEREE, 5, 3, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Match(MatchError::InvalidState {
            action: "resolve",
            actual: MatchStatus::Scheduled
        })
    ));
}

#[tokio::test]
async fn test_failed_commit_writes_nothing() {
    let h = harness().await;
    h.store.insert_match(scheduled(1, MatchKind::Normal, 10, 20)).await;
    h.service.submit_result(1, 100, 5, 3).await.unwrap();
    h.notifier.clear().await;

    h.store.fail_next_commit();
    let err = h.service.confirm_result(1, 200).await.unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::CommitFailed(_))));

    let m = h.store.load_match(1).await.unwrap();
    assert_eq!(m.status, MatchStatus::PendingConfirmation);
    assert_eq!(h.store.load_profile(100).await.unwrap().unwrap().rating, 1000);
    assert_eq!(h.store.load_participant(20).await.unwrap().matches_played, 0);
    assert!(h.store.all_rating_history().await.is_empty());
    assert!(h.store.all_match_history().await.is_empty());
    assert!(h.notifier.events().await.is_empty());

    // The same confirmation goes through once the store recovers
    h.service.confirm_result(1, 200).await.unwrap();
    assert_eq!(h.store.all_rating_history().await.len(), 2);
}

#[tokio::test]
async fn test_stale_copy_loses_race() {
    let h = harness().await;
    h.store.insert_match(scheduled(1, MatchKind::Normal, 10, 20)).await;

    let stale = h.store.load_match(1).await.unwrap();
    h.service.submit_result(1, 100, 5, 3).await.unwrap();

    let mut changes = cue_league::ChangeSet::new();
    changes.update_match(stale);
    let err = ServiceError::from(h.store.commit(changes).await.unwrap_err());
    assert!(err.is_retryable());
    assert_eq!(
        h.store.load_match(1).await.unwrap().status,
        MatchStatus::PendingConfirmation
    );
}

#[tokio::test]
async fn test_missing_profile_skips_rating() {
    let h = harness().await;
    h.store
        .insert_participant(Participant::new(50, 1, 500))
        .await;
    h.store.insert_match(scheduled(1, MatchKind::Normal, 10, 50)).await;

    h.service.submit_result(1, 100, 5, 3).await.unwrap();
    let m = h.service.confirm_result(1, 500).await.unwrap();

    assert_eq!(m.status, MatchStatus::Completed);
    assert_eq!(h.store.load_profile(100).await.unwrap().unwrap().rating, 1000);
    assert!(h.store.all_rating_history().await.is_empty());
    assert_eq!(h.store.load_participant(10).await.unwrap().matches_won, 1);
}

#[tokio::test]
async fn test_admin_adjustment_clamps_at_zero() {
    let h = harness().await;

    let entry = h
        .service
        .adjust_rating(
            100,
            -2500,
            RatingReason::AdminAdjustment,
            RatingContext {
                note: Some("sandbagging".to_string()),
                ..RatingContext::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(entry.old_rating, 1000);
    assert_eq!(entry.new_rating, 0);
    assert_eq!(entry.delta, -1000);

    let profile = h.store.load_profile(100).await.unwrap().unwrap();
    assert_eq!(profile.rating, 0);
    assert_eq!(profile.category, SkillCategory::Beginner);
    assert_eq!(profile.best_rating, 1000);

    h.service
        .adjust_rating(100, 50, RatingReason::TournamentBonus, RatingContext::default())
        .await
        .unwrap();
    let history = h.store.rating_history(100, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].reason, RatingReason::TournamentBonus);
    assert_eq!(history[1].note.as_deref(), Some("sandbagging"));
}

#[tokio::test]
async fn test_adjusting_unknown_player_fails() {
    let h = harness().await;
    let err = h
        .service
        .adjust_rating(777, 10, RatingReason::AdminAdjustment, RatingContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::ProfileNotFound(777))));
}
