//! Request error type shared by both transports.

use serde_json::Value;
use std::fmt;

/// Transport-level failure code, reported when no HTTP response was received.
///
/// The string forms match the codes listed in `RetryPolicy::retryable_error_codes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCode {
    /// Request aborted by the client-side timeout.
    Aborted,
    /// Timed out at the socket level.
    TimedOut,
    /// Connection refused by the peer.
    Refused,
    /// Connection reset, or the server closed without replying.
    Reset,
    /// Host (or proxy) name could not be resolved.
    NotFound,
    /// Network unreachable.
    Unreachable,
    /// Any other network failure.
    Network,
}

impl TransportCode {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportCode::Aborted => "ECONNABORTED",
            TransportCode::TimedOut => "ETIMEDOUT",
            TransportCode::Refused => "ECONNREFUSED",
            TransportCode::Reset => "ECONNRESET",
            TransportCode::NotFound => "ENOTFOUND",
            TransportCode::Unreachable => "ENETUNREACH",
            TransportCode::Network => "ERR_NETWORK",
        }
    }

    /// Inverse of `as_str`.
    pub fn from_code(code: &str) -> Option<Self> {
        [
            TransportCode::Aborted,
            TransportCode::TimedOut,
            TransportCode::Refused,
            TransportCode::Reset,
            TransportCode::NotFound,
            TransportCode::Unreachable,
            TransportCode::Network,
        ]
        .into_iter()
        .find(|c| c.as_str() == code)
    }

    /// True for the codes that mean the request was cut off by a timeout.
    pub fn is_abort(self) -> bool {
        matches!(self, TransportCode::Aborted | TransportCode::TimedOut)
    }
}

impl fmt::Display for TransportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single request, as surfaced by either transport.
///
/// Both transports produce the same shapes so the retry executor and the
/// classifier never need to know which one was used.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// No HTTP response was received (connect failure, timeout, reset).
    #[error("{message} ({code})")]
    Transport { code: TransportCode, message: String },
    /// A response was received with a non-2xx status.
    #[error("{}", http_message(.status, .data))]
    Http { status: u16, data: Value },
    /// The outgoing payload could not be serialized; nothing was sent.
    #[error("could not encode request body: {0}")]
    Encode(serde_json::Error),
    /// A 2xx response whose body did not match the expected type.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RequestError {
    /// A server-side failure carrying `message` as its detail, shaped like a 500
    /// from the backend.
    pub fn server(message: impl Into<String>) -> Self {
        RequestError::Http {
            status: 500,
            data: serde_json::json!({ "detail": message.into() }),
        }
    }

    /// HTTP status, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body, if a response was received.
    pub fn response_data(&self) -> Option<&Value> {
        match self {
            RequestError::Http { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Transport code, if no response was received.
    pub fn transport_code(&self) -> Option<TransportCode> {
        match self {
            RequestError::Transport { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Display text for an HTTP failure: the body's `detail` string when there is
/// one, otherwise the status line.
fn http_message(status: &u16, data: &Value) -> String {
    match data.get("detail").and_then(Value::as_str) {
        Some(detail) => detail.to_string(),
        None => format!("HTTP {}", status),
    }
}
