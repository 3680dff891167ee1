//! Retry loop: run an async operation until success or the policy says stop.

use std::future::Future;

use super::error::RequestError;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `operation` until it succeeds or the retry policy says to stop.
///
/// On a retryable failure, sleeps for the backoff delay then tries again. The
/// last error is returned unchanged; classification for display happens at the
/// call site. At most `policy.max_retries + 1` attempts are made.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RequestError>>,
{
    let mut attempt = 1u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        match policy.decide(attempt, &err) {
            RetryDecision::NoRetry => {
                if attempt > 1 {
                    tracing::debug!("giving up after {} attempts: {}", attempt, err);
                }
                return Err(err);
            }
            RetryDecision::RetryAfter(delay) => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_retries.saturating_add(1),
                    delay_ms = delay.as_millis() as u64,
                    "request failed: {}; retrying",
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
