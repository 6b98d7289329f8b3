//! Sweeper configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use cue_league::db::{DatabaseConfig, DatabaseConfigError};
use std::net::SocketAddr;
use std::time::Duration;

/// Values given on the command line, which win over the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database_url: Option<String>,
    pub interval_secs: Option<u64>,
    pub batch_size: Option<i64>,
    pub metrics_bind: Option<SocketAddr>,
    pub once: bool,
}

/// Complete sweeper configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Pause between two sweeps
    pub interval: Duration,
    /// Most matches expired by one sweep
    pub batch_size: i64,
    /// Prometheus scrape endpoint, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Run a single sweep and exit
    pub once: bool,
}

impl SweeperConfig {
    /// Load configuration from environment variables
    ///
    /// Variables:
    /// - `DATABASE_URL` plus the `DB_*` pool settings
    /// - `SWEEP_INTERVAL_SECS` (default: 60)
    /// - `SWEEP_BATCH_SIZE` (default: 100)
    /// - `METRICS_BIND` (optional)
    /// - `SWEEP_ONCE` (default: false)
    ///
    /// # Errors
    ///
    /// Returns error if the database URL is missing everywhere or a value does not parse
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        // An explicit URL still takes its pool settings from DB_*
        let database = match overrides.database_url {
            Some(url) => DatabaseConfig::with_url(url)?,
            None => match DatabaseConfig::from_env() {
                Ok(database) => database,
                Err(DatabaseConfigError::MissingUrl) => {
                    return Err(ConfigError::MissingRequired {
                        var: "DATABASE_URL".to_string(),
                        hint: "Pass --db-url or set it in .env".to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            },
        };

        let interval_secs = match overrides.interval_secs {
            Some(secs) => secs,
            None => parse_env_or("SWEEP_INTERVAL_SECS", 60)?,
        };

        let batch_size = match overrides.batch_size {
            Some(size) => size,
            None => parse_env_or("SWEEP_BATCH_SIZE", 100)?,
        };

        let metrics_bind = match overrides.metrics_bind {
            Some(addr) => Some(addr),
            None => parse_env_opt("METRICS_BIND")?,
        };

        let once = overrides.once || parse_env_or("SWEEP_ONCE", false)?;

        Ok(SweeperConfig {
            database,
            interval: Duration::from_secs(interval_secs),
            batch_size,
            metrics_bind,
            once,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "SWEEP_INTERVAL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.batch_size <= 0 {
            return Err(ConfigError::Invalid {
                var: "SWEEP_BATCH_SIZE".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error(transparent)]
    Database(#[from] DatabaseConfigError),
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    Ok(parse_env_opt(key)?.unwrap_or(default))
}

fn parse_env_opt<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(value) => parse_value(key, &value).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("'{value}' is not a valid value"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SweeperConfig {
        SweeperConfig {
            database: DatabaseConfig::development(),
            interval: Duration::from_secs(60),
            batch_size: 100,
            metrics_bind: None,
            once: false,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "DATABASE_URL".to_string(),
            hint: "Pass --db-url".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DATABASE_URL"));
        assert!(msg.contains("Pass --db-url"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = SweeperConfig {
            interval: Duration::ZERO,
            ..config()
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SWEEP_INTERVAL_SECS"));
    }

    #[test]
    fn test_non_positive_batch_rejected() {
        let config = SweeperConfig {
            batch_size: 0,
            ..config()
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SWEEP_BATCH_SIZE"));
    }

    #[test]
    fn test_pool_bounds_checked() {
        let mut config = config();
        config.database.min_connections = 20;
        config.database.max_connections = 5;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_win() {
        let overrides = CliOverrides {
            database_url: Some("postgres://sweeper@db/league".to_string()),
            interval_secs: Some(5),
            batch_size: Some(25),
            metrics_bind: None,
            once: true,
        };

        let config = SweeperConfig::from_env(overrides).unwrap();
        assert_eq!(config.database.database_url, "postgres://sweeper@db/league");
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.batch_size, 25);
        assert!(config.once);
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u64>("SWEEP_INTERVAL_SECS", " 30 ").unwrap(), 30);
        assert!(parse_value::<bool>("SWEEP_ONCE", "true").unwrap());
        assert!(matches!(
            parse_value::<i64>("SWEEP_BATCH_SIZE", "lots"),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
