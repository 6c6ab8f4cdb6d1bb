// src/services/retry.rs
//! Bounded exponential-backoff retry for the Bria client's submission calls.
//!
//! Every failure is retried until the attempt budget runs out; the last
//! error is re-raised unchanged. Callers must treat the wrapped operation as
//! idempotent: an operation with partial side effects (a create that half
//! succeeded before failing) will be re-issued as-is.

use std::future::Future;

use log::warn;

use crate::config::RetryOptions;

/// Runs `operation` with up to `options.max_retries` additional attempts.
///
/// Delay starts at `initial_delay` and is multiplied by
/// `backoff_multiplier` after each failure, capped at `max_delay`. No jitter.
pub async fn retry<T, E, F, Fut>(options: &RetryOptions, mut operation: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = options.initial_delay;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= options.max_retries {
                    return Err(err);
                }
                attempt += 1;
                warn!(
                    "attempt {}/{} failed ({}), retrying in {:?}",
                    attempt,
                    options.max_retries + 1,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = delay.mul_f64(options.backoff_multiplier).min(options.max_delay);
            }
        }
    }
}
