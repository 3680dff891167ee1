//! Host-side implementation of the bridge procedure.
//!
//! This is what the desktop shell runs when the client calls through the
//! bridge: it forwards the call to the backend over HTTP and reports the
//! outcome as a `BridgeReply` instead of failing. Failures with no HTTP
//! response are labelled with their transport code (`ECONNREFUSED: ...`).

use serde_json::Value;
use std::time::Duration;

use super::bridged::{BridgeReply, BridgeRequest, HostBridge, METHOD_OVERRIDE_KEY, WRAPPED_BODY_KEY};
use super::direct::{DEFAULT_TIMEOUT, LOCAL_ORIGIN};
use super::http::{parse_body, perform};
use super::Method;
use crate::retry::classify_curl_error;

/// Forwards bridged calls to a backend origin with libcurl.
#[derive(Debug, Clone)]
pub struct HttpHostBridge {
    backend_url: String,
    timeout: Duration,
}

impl Default for HttpHostBridge {
    fn default() -> Self {
        Self::new(LOCAL_ORIGIN)
    }
}

impl HttpHostBridge {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl HostBridge for HttpHostBridge {
    fn invoke(&self, request: BridgeRequest) -> BridgeReply {
        let (method, endpoint, data) = untunnel(request.endpoint, request.data);
        let base = if self.backend_url.trim().is_empty() {
            LOCAL_ORIGIN
        } else {
            self.backend_url.trim_end_matches('/')
        };
        let url = format!("{}{}", base, endpoint);

        let body = match data.as_ref().map(serde_json::to_vec).transpose() {
            Ok(body) => body,
            Err(e) => return BridgeReply::failed(format!("invalid request body: {}", e)),
        };

        tracing::debug!(%method, %url, "host bridge forwarding");
        match perform(
            method,
            &url,
            body.as_deref(),
            request.auth_token.as_deref(),
            self.timeout,
        ) {
            Ok(resp) if resp.is_success() => BridgeReply::ok(parse_body(&resp.body)),
            Ok(resp) => BridgeReply::failed(format!(
                "HTTP {}: {}",
                resp.status,
                String::from_utf8_lossy(&resp.body).trim()
            )),
            Err(e) => {
                let code = classify_curl_error(&e);
                tracing::warn!(%method, %url, %code, "host bridge request failed: {}", e);
                BridgeReply::failed(format!("{}: {}", code, e))
            }
        }
    }
}

/// Recover the real verb, endpoint and body from a tunnelled call.
pub(crate) fn untunnel(endpoint: String, data: Option<Value>) -> (Method, String, Option<Value>) {
    let (endpoint, query_method) = strip_method_param(&endpoint);
    if query_method.as_deref() == Some(Method::Delete.as_str()) {
        return (Method::Delete, endpoint, None);
    }
    match data {
        None => (Method::Get, endpoint, None),
        Some(Value::Object(mut map)) => {
            let put = map
                .get(METHOD_OVERRIDE_KEY)
                .and_then(Value::as_str)
                .map(|m| m.eq_ignore_ascii_case(Method::Put.as_str()))
                .unwrap_or(false);
            if !put {
                return (Method::Post, endpoint, Some(Value::Object(map)));
            }
            map.remove(METHOD_OVERRIDE_KEY);
            let body = match map.remove(WRAPPED_BODY_KEY) {
                Some(inner) if map.is_empty() => inner,
                Some(inner) => {
                    map.insert(WRAPPED_BODY_KEY.to_string(), inner);
                    Value::Object(map)
                }
                None => Value::Object(map),
            };
            (Method::Put, endpoint, Some(body))
        }
        Some(other) => (Method::Post, endpoint, Some(other)),
    }
}

/// Remove a `_method=...` query parameter, returning the cleaned endpoint and
/// the parameter's value.
fn strip_method_param(endpoint: &str) -> (String, Option<String>) {
    let Some((path, query)) = endpoint.split_once('?') else {
        return (endpoint.to_string(), None);
    };
    let mut found = None;
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| match pair.split_once('=') {
            Some((k, v)) if k == METHOD_OVERRIDE_KEY => {
                found = Some(v.to_ascii_uppercase());
                false
            }
            _ => true,
        })
        .collect();
    let cleaned = if kept.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, kept.join("&"))
    };
    (cleaned, found)
}
