//! Classify request failures into UI-facing error kinds and decide retryability.

use serde::Serialize;
use serde_json::Value;

use super::error::{RequestError, TransportCode};
use super::policy::RetryPolicy;

pub const MSG_TIMEOUT: &str = "Request timed out. Please check your connection and try again.";
pub const MSG_NO_CONNECTION: &str =
    "Unable to connect to the server. Please check your connection and that the backend is running.";
pub const MSG_SERVER: &str = "Server error occurred. Please try again later.";
pub const MSG_NOT_FOUND: &str = "Service not found. Please check that the backend is running.";
pub const MSG_VALIDATION: &str = "Invalid request parameters.";
pub const MSG_AUTH_FAILED: &str = "Authentication failed. Please log in again.";
pub const MSG_ACCESS_DENIED: &str = "Access denied. You do not have permission to perform this action.";
pub const MSG_UNKNOWN: &str = "An unexpected error occurred.";

/// High-level error kind the UI uses to pick icon, copy and whether to offer retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Network,
    Validation,
    Server,
    Auth,
    Unknown,
}

/// Classification result for one failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorState {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorState {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Classify a failure. First matching rule wins: timeout, no response, known
/// HTTP statuses, then `Unknown`.
pub fn classify(err: &RequestError) -> ErrorState {
    match err {
        RequestError::Transport { code, message } if code.is_abort() => {
            ErrorState::new(ErrorKind::Network, MSG_TIMEOUT).with_details(message.clone())
        }
        RequestError::Transport { message, .. } => {
            ErrorState::new(ErrorKind::Network, MSG_NO_CONNECTION).with_details(message.clone())
        }
        RequestError::Http { status, data } => classify_http(*status, data)
            .unwrap_or_else(|| {
                ErrorState::new(ErrorKind::Unknown, extract_detail(data, MSG_UNKNOWN))
                    .with_details(format!("HTTP {}", status))
            }),
        RequestError::Encode(_) | RequestError::Decode(_) => {
            ErrorState::new(ErrorKind::Unknown, err.to_string())
        }
    }
}

fn classify_http(status: u16, data: &Value) -> Option<ErrorState> {
    let state = match status {
        500 => ErrorState::new(ErrorKind::Server, extract_detail(data, MSG_SERVER)),
        404 => ErrorState::new(ErrorKind::Server, MSG_NOT_FOUND)
            .with_details(extract_detail(data, "Not Found")),
        400 | 422 => ErrorState::new(ErrorKind::Validation, extract_detail(data, MSG_VALIDATION)),
        401 => ErrorState::new(ErrorKind::Auth, MSG_AUTH_FAILED),
        403 => ErrorState::new(ErrorKind::Auth, MSG_ACCESS_DENIED),
        _ => return None,
    };
    Some(state)
}

/// True when the failure means the stored session token is no longer valid
/// and must be purged. Only a 401 does this; a 403 leaves the token in place.
pub fn clears_session(err: &RequestError) -> bool {
    err.status() == Some(401)
}

/// Whether `err` is worth another attempt under `policy`.
pub fn is_retryable(err: &RequestError, policy: &RetryPolicy) -> bool {
    match err {
        RequestError::Transport { code, .. } => {
            code.is_abort() || policy.retryable_error_codes.contains(code.as_str())
        }
        RequestError::Http { status, .. } => policy.retryable_status_codes.contains(status),
        RequestError::Encode(_) | RequestError::Decode(_) => false,
    }
}

/// Pull a human-readable message out of a backend error body.
///
/// A string `detail` is used verbatim; a list of validation entries is joined
/// as `"Validation error: <loc>: <msg>, ..."`; otherwise `message`, otherwise
/// `default`.
pub fn extract_detail(data: &Value, default: &str) -> String {
    match data.get("detail") {
        Some(Value::String(s)) => return s.clone(),
        Some(Value::Array(entries)) if !entries.is_empty() => {
            let parts: Vec<String> = entries.iter().map(format_validation_entry).collect();
            return format!("Validation error: {}", parts.join(", "));
        }
        _ => {}
    }
    match data.get("message").and_then(Value::as_str) {
        Some(m) => m.to_string(),
        None => default.to_string(),
    }
}

fn format_validation_entry(entry: &Value) -> String {
    let loc = entry.get("loc").or_else(|| entry.get("location"));
    let loc = match loc {
        Some(Value::Array(parts)) => parts
            .iter()
            .map(|p| match p {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("."),
        Some(Value::String(s)) => s.clone(),
        _ => "body".to_string(),
    };
    let msg = entry
        .get("msg")
        .or_else(|| entry.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("invalid value");
    format!("{}: {}", loc, msg)
}

/// Map a libcurl failure to the transport code it represents.
pub fn classify_curl_error(e: &curl::Error) -> TransportCode {
    if e.is_operation_timedout() {
        return TransportCode::Aborted;
    }
    if e.is_couldnt_connect() {
        return TransportCode::Refused;
    }
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return TransportCode::NotFound;
    }
    if e.is_read_error() || e.is_recv_error() || e.is_send_error() || e.is_got_nothing() {
        return TransportCode::Reset;
    }
    TransportCode::Network
}
