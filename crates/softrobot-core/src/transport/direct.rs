//! Direct HTTP transport.

use serde_json::Value;
use std::time::Duration;

use super::http::{parse_body, perform};
use super::{RequestDescriptor, TransportResult};
use crate::retry::{classify_curl_error, RequestError, TransportCode};

/// Origin used when no base URL is configured: the locally hosted backend.
pub const LOCAL_ORIGIN: &str = "http://127.0.0.1:8000";

/// Per-call timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues requests straight to the backend over HTTP.
#[derive(Debug, Clone)]
pub struct DirectTransport {
    base_url: String,
    timeout: Duration,
}

impl DirectTransport {
    /// `base_url` may be empty, meaning same origin (`LOCAL_ORIGIN`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL for `endpoint`.
    pub fn url_for(&self, endpoint: &str) -> String {
        let base = if self.base_url.trim().is_empty() {
            LOCAL_ORIGIN
        } else {
            self.base_url.trim_end_matches('/')
        };
        if endpoint.starts_with('/') {
            format!("{}{}", base, endpoint)
        } else {
            format!("{}/{}", base, endpoint)
        }
    }

    /// Sends one request. Non-2xx responses fail with `RequestError::Http`
    /// carrying the status and parsed body; curl failures with
    /// `RequestError::Transport`.
    pub async fn send(&self, request: RequestDescriptor) -> Result<TransportResult<Value>, RequestError> {
        let url = self.url_for(&request.endpoint);
        let body = request
            .payload
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(RequestError::Encode)?;
        let method = request.method;
        let token = request.auth_token;
        let timeout = self.timeout;
        tracing::debug!(%method, %url, "direct request");

        let task_url = url.clone();
        let response = tokio::task::spawn_blocking(move || {
            perform(method, &task_url, body.as_deref(), token.as_deref(), timeout)
        })
        .await
        .map_err(|e| RequestError::Transport {
            code: TransportCode::Network,
            message: format!("request task failed: {}", e),
        })?
        .map_err(|e| {
            let code = classify_curl_error(&e);
            tracing::debug!(%method, %url, %code, "direct request failed: {}", e);
            RequestError::Transport {
                code,
                message: e.to_string(),
            }
        })?;

        let data = parse_body(&response.body);
        if !response.is_success() {
            tracing::debug!(%method, %url, status = response.status, "non-2xx response");
            return Err(RequestError::Http {
                status: response.status,
                data,
            });
        }
        Ok(TransportResult::from_body(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_base_url_is_same_origin() {
        let t = DirectTransport::new("");
        assert_eq!(t.url_for("/pcc"), "http://127.0.0.1:8000/pcc");
    }

    #[test]
    fn configured_base_url_is_joined_without_double_slash() {
        let t = DirectTransport::new("https://api.example.com/");
        assert_eq!(t.url_for("/presets/"), "https://api.example.com/presets/");
        assert_eq!(t.url_for("auth/me"), "https://api.example.com/auth/me");
    }

    #[test]
    fn default_timeout_applies() {
        let t = DirectTransport::new("");
        assert_eq!(t.timeout(), DEFAULT_TIMEOUT);
        let t = t.with_timeout(Duration::from_secs(5));
        assert_eq!(t.timeout(), Duration::from_secs(5));
    }
}
