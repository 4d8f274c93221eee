//! Fixed-count polling for state that lags behind a confirmed transaction

use anyhow::{anyhow, Result};
use std::future::Future;
use std::time::Duration;

/// Fixed number of attempts with a fixed pause between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        // zero attempts would never call the operation
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

/// Run `op` until it yields a value.
///
/// `Ok(None)` (not visible yet) and `Err` both count as a failed attempt. The
/// error returned after the last attempt carries the last cause.
pub async fn retry_fetch<T, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let mut last_error = None;

    for attempt in 1..=policy.attempts {
        let error = match op().await {
            Ok(Some(value)) => {
                log::info!("Successfully fetched {}", what);
                return Ok(value);
            }
            Ok(None) => anyhow!("{} not found", what),
            Err(e) => e,
        };

        log::warn!(
            "Retry attempt {}/{}: Failed to fetch {}: {:#}",
            attempt,
            policy.attempts,
            what,
            error
        );
        last_error = Some(error);

        if attempt < policy.attempts {
            log::info!("Waiting {:?} before retry...", policy.delay);
            tokio::time::sleep(policy.delay).await;
        }
    }

    let last_error = last_error.unwrap_or_else(|| anyhow!("{} not found", what));
    Err(last_error.context(format!(
        "Failed to fetch {} after {} attempts",
        what, policy.attempts
    )))
}

/// Poll `op` until it yields a value, at most `policy.attempts` times.
///
/// Unlike [`retry_fetch`], an `Err` stops polling at once. `Ok(None)` after
/// the last attempt means the value never showed up. No sleep follows the
/// last attempt.
pub async fn poll_until<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    for attempt in 1..=policy.attempts {
        if let Some(value) = op().await? {
            return Ok(Some(value));
        }
        if attempt < policy.attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Ok(None)
}
