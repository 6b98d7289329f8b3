//! PostgreSQL access for the league: pool setup and the Postgres-backed store.
//!
//! The schema lives in `migrations/001_match_core.sql`; [`Database::apply_schema`]
//! runs it for fresh databases and test setups.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub mod pg_store;
pub mod timeouts;

pub use config::{DatabaseConfig, DatabaseConfigError};
pub use pg_store::PgLeagueStore;

const SCHEMA: &str = include_str!("../../migrations/001_match_core.sql");

/// Owns the league's connection pool
#[derive(Clone)]
pub struct Database {
    pool: Arc<PgPool>,
}

impl Database {
    /// Connect using the pool limits in `config`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use cue_league::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let db = Database::new(&DatabaseConfig::from_env()?).await?;
    ///     let store = db.league_store();
    ///     # let _ = store;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Store and rules provider sharing this pool
    pub fn league_store(&self) -> PgLeagueStore {
        PgLeagueStore::new(Arc::clone(&self.pool))
    }

    /// Create the league tables if they do not exist yet
    pub async fn apply_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(SCHEMA).execute(self.pool.as_ref()).await?;
        Ok(())
    }

    /// Round-trip a trivial query
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
