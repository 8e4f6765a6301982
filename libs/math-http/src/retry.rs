use crate::config::{Backoff, RetryPolicy};
use crate::error::HttpError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Set on repeated attempts to the one-based retry number.
pub const RETRY_ATTEMPT_HEADER: &str = "X-Retry-Attempt";

/// Run `attempt_fn` until it succeeds, fails with an error that is not
/// retryable, or `policy` runs out.
///
/// `attempt_fn` gets the zero-based attempt number. Cancelling `cancel`
/// interrupts the running attempt (its future is dropped, which aborts the
/// request) as well as a pending backoff sleep.
///
/// # Errors
/// The last attempt's error, wrapped in [`HttpError::RetriesExhausted`] when
/// at least one retry happened, or [`HttpError::Cancelled`].
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut attempt_fn: F,
) -> Result<T, HttpError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, HttpError>>,
{
    let mut attempt = 0usize;
    loop {
        let err = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(HttpError::Cancelled),
            outcome = attempt_fn(attempt) => match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            },
        };

        if !err.is_retryable() {
            return Err(err);
        }
        if attempt >= policy.max_retries {
            if attempt == 0 {
                return Err(err);
            }
            tracing::warn!(attempts = attempt + 1, error = %err, "retries exhausted");
            return Err(HttpError::RetriesExhausted {
                attempts: attempt + 1,
                last: Box::new(err),
            });
        }

        let pause = calculate_backoff(&policy.backoff, attempt);
        tracing::debug!(
            attempt = attempt + 1,
            max_retries = policy.max_retries,
            backoff_ms = pause.as_millis(),
            error = %err,
            "attempt failed, retrying"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(HttpError::Cancelled),
            () = tokio::time::sleep(pause) => {}
        }
        attempt += 1;
    }
}

/// Pause before retry number `retry` (zero-based).
#[must_use]
pub fn calculate_backoff(backoff: &Backoff, retry: usize) -> Duration {
    let exponent = u32::try_from(retry).unwrap_or(u32::MAX);
    let base = backoff
        .factor
        .checked_pow(exponent)
        .map_or(backoff.max, |scale| backoff.initial.saturating_mul(scale))
        .min(backoff.max);

    if !backoff.jitter || base.is_zero() {
        return base;
    }
    let stretch = rand::rng().random_range(0.0..=0.25);
    (base + base.mul_f64(stretch)).min(backoff.max)
}
