//! Database configuration module.

use std::env;
use thiserror::Error;

/// Database configuration errors
#[derive(Debug, Error)]
pub enum DatabaseConfigError {
    #[error("DATABASE_URL must be set")]
    MissingUrl,

    #[error("{name} has an invalid value: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 1)
    /// - `DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 10)
    /// - `DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME`: Max lifetime in seconds (default: 1800)
    ///
    /// # Errors
    ///
    /// * `DatabaseConfigError::MissingUrl` - `DATABASE_URL` is not set
    /// * `DatabaseConfigError::InvalidValue` - A pool setting does not parse
    pub fn from_env() -> Result<Self, DatabaseConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| DatabaseConfigError::MissingUrl)?;
        Self::with_url(database_url)
    }

    /// Pool settings from the `DB_*` variables, connection string from the caller
    ///
    /// # Errors
    ///
    /// * `DatabaseConfigError::InvalidValue` - A pool setting does not parse
    pub fn with_url(database_url: impl Into<String>) -> Result<Self, DatabaseConfigError> {
        Self::from_lookup(database_url.into(), |name| env::var(name).ok())
    }

    fn from_lookup<F>(database_url: String, lookup: F) -> Result<Self, DatabaseConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::development();

        Ok(Self {
            database_url,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connection_timeout_secs: parse_or(
                &lookup,
                "DB_CONNECTION_TIMEOUT",
                defaults.connection_timeout_secs,
            )?,
            idle_timeout_secs: parse_or(&lookup, "DB_IDLE_TIMEOUT", defaults.idle_timeout_secs)?,
            max_lifetime_secs: parse_or(&lookup, "DB_MAX_LIFETIME", defaults.max_lifetime_secs)?,
        })
    }

    /// Local development configuration
    ///
    /// Uses `postgres://postgres@localhost/cue_league` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/cue_league".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn parse_or<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, DatabaseConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| DatabaseConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}
