//! Query timeout helpers
//!
//! Every statement the Postgres store issues goes through one of these so a
//! stuck connection surfaces as `StoreError::Timeout` instead of a hang.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::store::{StoreError, StoreResult};

/// Default timeout for single queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for a whole commit transaction (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `future`, giving up after `duration`
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    timeout(duration, future)
        .await
        .unwrap_or_else(|_| Err(StoreError::Timeout(duration)))
}

/// Run a single sqlx query with [`DEFAULT_QUERY_TIMEOUT`]
pub async fn with_default_timeout<F, T>(future: F) -> StoreResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    with_timeout(DEFAULT_QUERY_TIMEOUT, async { Ok(future.await?) }).await
}
