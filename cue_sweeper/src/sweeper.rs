//! Periodic expiry loop.

use cue_league::{MatchService, ServiceResult, SweepReport};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

use crate::metrics;

/// Run one sweep and record its outcome.
///
/// Per-match failures stay inside the report; only a failure to list the
/// overdue matches is returned as an error.
pub async fn run_once(service: &MatchService, batch_size: i64) -> ServiceResult<SweepReport> {
    let started = Instant::now();

    let report = match service.sweep_overdue(batch_size).await {
        Ok(report) => report,
        Err(e) => {
            metrics::sweep_errors_total(1);
            return Err(e);
        }
    };

    metrics::sweep_runs_total();
    metrics::matches_expired_total(report.expired.len() as u64);
    metrics::sweep_errors_total(report.failed.len() as u64);
    metrics::sweep_duration_ms(started.elapsed().as_secs_f64() * 1000.0);

    if report.is_clean() {
        tracing::info!(
            expired = report.expired.len(),
            already_terminal = report.already_terminal.len(),
            "Sweep finished"
        );
    } else {
        tracing::warn!(
            expired = report.expired.len(),
            already_terminal = report.already_terminal.len(),
            failed = report.failed.len(),
            "Sweep finished with failures"
        );
    }

    Ok(report)
}

/// Sweep every `interval` until `shutdown` resolves.
///
/// A sweep in progress is finished before the loop checks for shutdown again.
pub async fn run<F>(service: &MatchService, interval: Duration, batch_size: i64, shutdown: F)
where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested, stopping sweeper");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = run_once(service, batch_size).await {
                    tracing::error!(error = %e, "Sweep failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use cue_league::{
        LeagueStore, LogNotifier, ManualClock, Match, MatchKind, MatchStatus, MemoryStore,
        Participant, StaticAuthority, StaticRules, TournamentConfig, TournamentTier,
    };
    use std::sync::Arc;

    async fn service_with_overdue_match() -> (MatchService, Arc<MemoryStore>) {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::new());
        store.insert_participant(Participant::new(1, 1, 10)).await;
        store.insert_participant(Participant::new(2, 1, 20)).await;
        store
            .insert_match(
                Match::new(1, 1, MatchKind::Normal, Some(1), Some(2))
                    .with_result_deadline(start - ChronoDuration::hours(1)),
            )
            .await;

        let service = MatchService::new(
            store.clone(),
            Arc::new(StaticRules::new(TournamentConfig::for_tier(
                TournamentTier::Local,
            ))),
            Arc::new(LogNotifier),
            Arc::new(StaticAuthority::default()),
            Arc::new(ManualClock::new(start)),
        );
        (service, store)
    }

    #[tokio::test]
    async fn test_run_once_expires_overdue_match() {
        let (service, store) = service_with_overdue_match().await;

        let report = run_once(&service, 10).await.unwrap();
        assert_eq!(report.expired, vec![1]);
        assert!(report.is_clean());
        assert_eq!(
            store.load_match(1).await.unwrap().status,
            MatchStatus::Expired
        );

        // Nothing left to do on the next pass
        let report = run_once(&service, 10).await.unwrap();
        assert!(report.expired.is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (service, store) = service_with_overdue_match().await;

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            run(&service, Duration::from_millis(10), 10, async {
                let _ = rx.await;
            })
            .await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(
            store.load_match(1).await.unwrap().status,
            MatchStatus::Expired
        );
    }
}
