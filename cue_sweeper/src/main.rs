//! Expiry sweeper for cue-sports tournaments.
//!
//! Periodically moves every match whose result or confirmation deadline has
//! passed into its expired outcome, one atomic commit per match.

mod config;
mod logging;
mod metrics;
mod sweeper;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use cue_league::{LogNotifier, MatchService, StaticAuthority, SystemClock, db::Database};
use log::info;
use pico_args::Arguments;

use crate::config::{CliOverrides, SweeperConfig};

const HELP: &str = "\
Expire overdue cue-sports matches

USAGE:
  cue_sweeper [OPTIONS]

OPTIONS:
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --interval   SECS        Seconds between sweeps      [default: env SWEEP_INTERVAL_SECS or 60]
  --batch      N           Matches expired per sweep   [default: env SWEEP_BATCH_SIZE or 100]
  --metrics    IP:PORT     Prometheus scrape address   [default: env METRICS_BIND, disabled]

FLAGS:
  --once                   Run a single sweep and exit
  --init-schema            Create the league tables before sweeping
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  SWEEP_ONCE               Same as --once when set to true
  RUST_LOG                 Log filter [default: info,sqlx=warn]
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let init_schema = pargs.contains("--init-schema");
    let overrides = CliOverrides {
        once: pargs.contains("--once"),
        database_url: pargs.opt_value_from_str("--db-url")?,
        interval_secs: pargs.opt_value_from_str("--interval")?,
        batch_size: pargs.opt_value_from_str("--batch")?,
        metrics_bind: pargs.opt_value_from_str::<_, SocketAddr>("--metrics")?,
    };

    logging::init();

    let config = SweeperConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Metrics available at http://{addr}/metrics");
    }

    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    db.health_check()
        .await
        .map_err(|e| anyhow::anyhow!("Database health check failed: {}", e))?;
    info!("Database connected successfully");

    if init_schema {
        db.apply_schema().await?;
        info!("League schema ready");
    }

    let store = Arc::new(db.league_store());
    let service = MatchService::new(
        store.clone(),
        store,
        Arc::new(LogNotifier),
        Arc::new(StaticAuthority::default()),
        Arc::new(SystemClock),
    );

    if config.once {
        let report = sweeper::run_once(&service, config.batch_size).await?;
        info!(
            "Single sweep done: {} expired, {} failed",
            report.expired.len(),
            report.failed.len()
        );
    } else {
        info!(
            "Sweeping every {}s in batches of {}. Press Ctrl+C to stop.",
            config.interval.as_secs(),
            config.batch_size
        );
        sweeper::run(&service, config.interval, config.batch_size, shutdown_signal()).await;
    }

    db.close().await;
    info!("Sweeper stopped");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
