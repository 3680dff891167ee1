//! Retry and backoff policy.
//!
//! This module encapsulates error classification (timeouts, connectivity,
//! HTTP statuses) and exponential backoff decisions so that the request
//! client and the UI boundary share one consistent policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{
    classify, classify_curl_error, clears_session, extract_detail, is_retryable, ErrorKind,
    ErrorState, MSG_ACCESS_DENIED, MSG_AUTH_FAILED, MSG_NOT_FOUND, MSG_NO_CONNECTION,
    MSG_SERVER, MSG_TIMEOUT, MSG_UNKNOWN, MSG_VALIDATION,
};
pub use error::{RequestError, TransportCode};
pub use policy::{
    RetryDecision, RetryOverride, RetryPolicy, DEFAULT_RETRYABLE_ERROR_CODES,
    DEFAULT_RETRYABLE_STATUS_CODES,
};
pub use run::run_with_retry;
