use std::collections::BTreeSet;
use std::time::Duration;

use super::classify::is_retryable;
use super::error::RequestError;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with caps and the retryable status/code sets.
///
/// Built from `config::RetryConfig` or `RetryPolicy::default()`; per-call
/// tweaks go through `RetryOverride` and `merged`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries (not counting the first attempt).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays.
    pub backoff_multiplier: f64,
    /// HTTP statuses worth another attempt.
    pub retryable_status_codes: BTreeSet<u16>,
    /// Transport codes (see `TransportCode::as_str`) worth another attempt.
    pub retryable_error_codes: BTreeSet<String>,
}

pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

pub const DEFAULT_RETRYABLE_ERROR_CODES: [&str; 7] = [
    "ECONNABORTED",
    "ETIMEDOUT",
    "ECONNREFUSED",
    "ECONNRESET",
    "ENOTFOUND",
    "ENETUNREACH",
    "ERR_NETWORK",
];

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
            retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.into_iter().collect(),
            retryable_error_codes: DEFAULT_RETRYABLE_ERROR_CODES
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Per-call override of any subset of `RetryPolicy` fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryOverride {
    pub max_retries: Option<u32>,
    pub base_delay: Option<Duration>,
    pub max_delay: Option<Duration>,
    pub backoff_multiplier: Option<f64>,
    pub retryable_status_codes: Option<BTreeSet<u16>>,
    pub retryable_error_codes: Option<BTreeSet<String>>,
}

impl RetryOverride {
    /// Override that disables retries entirely.
    pub fn no_retry() -> Self {
        Self {
            max_retries: Some(0),
            ..Self::default()
        }
    }
}

impl RetryPolicy {
    /// This policy with every field present in `over` replaced.
    ///
    /// `base_delay` is clamped to `max_delay` so the merged value keeps
    /// `base_delay <= max_delay`.
    pub fn merged(&self, over: &RetryOverride) -> RetryPolicy {
        let mut p = self.clone();
        if let Some(n) = over.max_retries {
            p.max_retries = n;
        }
        if let Some(d) = over.base_delay {
            p.base_delay = d;
        }
        if let Some(d) = over.max_delay {
            p.max_delay = d;
        }
        if let Some(m) = over.backoff_multiplier {
            p.backoff_multiplier = m;
        }
        if let Some(codes) = &over.retryable_status_codes {
            p.retryable_status_codes = codes.clone();
        }
        if let Some(codes) = &over.retryable_error_codes {
            p.retryable_error_codes = codes.clone();
        }
        if p.base_delay > p.max_delay {
            tracing::debug!(
                "retry override base_delay {:?} exceeds max_delay {:?}; clamping",
                p.base_delay,
                p.max_delay
            );
            p.base_delay = p.max_delay;
        }
        p
    }

    /// Backoff delay before retry number `attempt` (1-based).
    ///
    /// `min(base_delay * backoff_multiplier^(attempt-1), max_delay)`. Products
    /// that overflow or are not finite saturate to `max_delay`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exp);
        if !secs.is_finite() || secs < 0.0 || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs).min(self.max_delay)
    }

    /// Decide whether the failure of attempt `attempt` (1-based) gets another try.
    pub fn decide(&self, attempt: u32, err: &RequestError) -> RetryDecision {
        if attempt > self.max_retries {
            return RetryDecision::NoRetry;
        }
        if !is_retryable(err, self) {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.delay(attempt))
    }
}
