//! Timeout bound and exponential back-off for store calls.
//!
//! Every outbound store call is capped by a fixed timeout. On top of that,
//! [`retry_read`] re-runs **idempotent reads** after transient failures;
//! mutating calls go through [`bounded`] only and are never silently
//! re-issued, since a retried write can apply twice.

use std::future::Future;
use std::time::Duration;

use crate::error::{CartError, CartResult};

/// Transient errors worth another attempt: timeouts and transport-level
/// database failures. Validation, configuration and application errors fail
/// immediately.
pub(crate) fn is_retriable(err: &CartError) -> bool {
    match err {
        CartError::Timeout => true,
        CartError::Db(sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut) => true,
        _ => false,
    }
}

/// Caps `fut` at `limit`; the call fails with [`CartError::Timeout`] instead
/// of hanging.
pub(crate) async fn bounded<T, F>(limit: Duration, fut: F) -> CartResult<T>
where
    F: Future<Output = CartResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(CartError::Timeout),
    }
}

/// Runs a read with up to `max_retries` extra attempts, each bounded by
/// `limit`, sleeping `base_ms × 2ⁿ ± 25 %` (capped at 60 s) between attempts.
pub(crate) async fn retry_read<T, F, Fut>(
    max_retries: u32,
    base_ms: u64,
    limit: Duration,
    mut operation: F,
) -> CartResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CartResult<T>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match bounded(limit, operation()).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient store error, retrying read after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
