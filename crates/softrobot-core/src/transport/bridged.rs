//! Host-bridge transport.
//!
//! When running inside a desktop shell, network access goes through a single
//! host procedure taking `{endpoint, data, auth_token}` and replying
//! `{success, data?, error?}`. The procedure only knows two verbs: POST when
//! `data` is present, GET otherwise. PUT and DELETE are tunnelled:
//! - PUT: POST with `"_method": "PUT"` added to the payload object (other
//!   payloads are wrapped as `{"_method": "PUT", "_body": <payload>}`).
//! - DELETE: GET with `_method=DELETE` appended to the query string.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::{Method, RequestDescriptor, TransportResult};
use crate::retry::{RequestError, TransportCode};

/// Payload key / query parameter carrying the tunnelled verb.
pub const METHOD_OVERRIDE_KEY: &str = "_method";

/// Payload key used when a non-object PUT payload has to be wrapped.
pub(crate) const WRAPPED_BODY_KEY: &str = "_body";

/// Arguments of the host procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeRequest {
    pub endpoint: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Reply of the host procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeReply {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BridgeReply {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// The host procedure. Blocking; the transport calls it from `spawn_blocking`.
pub trait HostBridge: Send + Sync {
    fn invoke(&self, request: BridgeRequest) -> BridgeReply;
}

/// Delegates every call to a `HostBridge`.
#[derive(Clone)]
pub struct BridgedTransport {
    bridge: Arc<dyn HostBridge>,
}

impl BridgedTransport {
    pub fn new(bridge: Arc<dyn HostBridge>) -> Self {
        Self { bridge }
    }

    /// Sends one request through the host. A failed reply is turned into the
    /// same `RequestError::Http` shape the direct transport produces.
    pub async fn send(&self, request: RequestDescriptor) -> Result<TransportResult<Value>, RequestError> {
        let method = request.method;
        let call = tunnel(request);
        tracing::debug!(%method, endpoint = %call.endpoint, "bridged request");

        let bridge = Arc::clone(&self.bridge);
        let reply = tokio::task::spawn_blocking(move || bridge.invoke(call))
            .await
            .map_err(|e| RequestError::Transport {
                code: TransportCode::Network,
                message: format!("host bridge call failed: {}", e),
            })?;

        if reply.success {
            return Ok(TransportResult::from_body(reply.data.unwrap_or(Value::Null)));
        }
        let error = reply.error.as_deref().unwrap_or("call failed");
        tracing::debug!(%method, "host bridge reported failure: {}", error);
        Err(error_from_host(error))
    }
}

/// Map a request onto the host's two-verb surface.
pub fn tunnel(request: RequestDescriptor) -> BridgeRequest {
    let RequestDescriptor {
        endpoint,
        method,
        payload,
        auth_token,
    } = request;
    let (endpoint, data) = match method {
        Method::Get => (endpoint, None),
        Method::Post => (endpoint, Some(payload.unwrap_or_else(|| Value::Object(Map::new())))),
        Method::Put => (endpoint, Some(with_method_override(payload, Method::Put))),
        Method::Delete => (append_query(&endpoint, METHOD_OVERRIDE_KEY, Method::Delete.as_str()), None),
    };
    BridgeRequest {
        endpoint,
        data,
        auth_token,
    }
}

fn with_method_override(payload: Option<Value>, method: Method) -> Value {
    let mut map = match payload {
        Some(Value::Object(map)) => map,
        None => Map::new(),
        Some(other) => {
            let mut map = Map::new();
            map.insert(WRAPPED_BODY_KEY.to_string(), other);
            map
        }
    };
    map.insert(
        METHOD_OVERRIDE_KEY.to_string(),
        Value::String(method.as_str().to_string()),
    );
    Value::Object(map)
}

fn append_query(endpoint: &str, key: &str, value: &str) -> String {
    let sep = if endpoint.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", endpoint, sep, key, value)
}

/// Shape a host error string like the direct transport's HTTP failure.
///
/// `"HTTP <status>[ <reason>]: <body>"` keeps the status and parsed body;
/// `"<TRANSPORT CODE>: <message>"` (no response received) becomes a transport
/// error; any other text becomes a 500 with the text as its detail.
pub fn error_from_host(error: &str) -> RequestError {
    if let Some((label, message)) = error.split_once(':') {
        if let Some(code) = TransportCode::from_code(label.trim()) {
            return RequestError::Transport {
                code,
                message: message.trim().to_string(),
            };
        }
    }
    if let Some(rest) = error.strip_prefix("HTTP ") {
        let (head, body) = match rest.split_once(':') {
            Some((head, body)) => (head, body.trim()),
            None => (rest, ""),
        };
        let status = head
            .split_whitespace()
            .next()
            .and_then(|code| code.parse::<u16>().ok());
        if let Some(status) = status {
            let data = serde_json::from_str(body).unwrap_or_else(|_| {
                if body.is_empty() {
                    Value::Object(Map::new())
                } else {
                    serde_json::json!({ "detail": body })
                }
            });
            return RequestError::Http { status, data };
        }
    }
    RequestError::server(error)
}
