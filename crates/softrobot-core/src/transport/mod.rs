//! Request transports.
//!
//! Two implementations sit behind one closed enum:
//! - `Direct`: HTTP straight to the backend (libcurl).
//! - `Bridged`: a host-provided procedure that performs the call for us
//!   (desktop shell), see `bridged`.
//!
//! Both produce `TransportResult` on success and the same `RequestError`
//! shapes on failure, so retry and classification never care which was used.

mod bridged;
mod direct;
mod host;
pub(crate) mod http;
mod select;

pub use bridged::{
    error_from_host, tunnel, BridgeReply, BridgeRequest, BridgedTransport, HostBridge,
    METHOD_OVERRIDE_KEY,
};
pub use direct::{DirectTransport, DEFAULT_TIMEOUT, LOCAL_ORIGIN};
pub use host::HttpHostBridge;
pub use select::{bridge_requested, select, HostEnvironment, HOST_BRIDGE_ENV};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::retry::RequestError;

/// HTTP verb of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// True for verbs that carry a request body.
    pub fn has_body(self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request, built per call and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// Path on the backend, e.g. `/presets/3`.
    pub endpoint: String,
    pub method: Method,
    pub payload: Option<Value>,
    pub auth_token: Option<String>,
}

/// Uniform result both transports produce on a completed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportResult<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> TransportResult<T> {
    pub fn ok(data: T) -> Self {
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

impl TransportResult<Value> {
    /// Wrap a 2xx response body. A body that itself reports `"success": false`
    /// (the backend's response envelope) becomes a failed result carrying its
    /// `error`/`message`.
    pub fn from_body(body: Value) -> Self {
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            let error = ["error", "message", "detail"]
                .iter()
                .find_map(|k| body.get(*k).and_then(Value::as_str))
                .map(str::to_string);
            return Self {
                success: false,
                data: Some(body),
                error,
            };
        }
        Self::ok(body)
    }
}

/// The transport chosen for one call.
#[derive(Clone)]
pub enum Transport {
    Direct(DirectTransport),
    Bridged(BridgedTransport),
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Direct(d) => f.debug_tuple("Direct").field(d).finish(),
            Transport::Bridged(_) => f.write_str("Bridged"),
        }
    }
}

impl Transport {
    pub fn is_bridged(&self) -> bool {
        matches!(self, Transport::Bridged(_))
    }

    pub async fn send(&self, request: RequestDescriptor) -> Result<TransportResult<Value>, RequestError> {
        match self {
            Transport::Direct(t) => t.send(request).await,
            Transport::Bridged(t) => t.send(request).await,
        }
    }

    pub async fn get(
        &self,
        endpoint: &str,
        auth_token: Option<String>,
    ) -> Result<TransportResult<Value>, RequestError> {
        self.send(descriptor(endpoint, Method::Get, None, auth_token))
            .await
    }

    pub async fn post(
        &self,
        endpoint: &str,
        payload: Value,
        auth_token: Option<String>,
    ) -> Result<TransportResult<Value>, RequestError> {
        self.send(descriptor(endpoint, Method::Post, Some(payload), auth_token))
            .await
    }

    pub async fn put(
        &self,
        endpoint: &str,
        payload: Value,
        auth_token: Option<String>,
    ) -> Result<TransportResult<Value>, RequestError> {
        self.send(descriptor(endpoint, Method::Put, Some(payload), auth_token))
            .await
    }

    pub async fn delete(
        &self,
        endpoint: &str,
        auth_token: Option<String>,
    ) -> Result<TransportResult<Value>, RequestError> {
        self.send(descriptor(endpoint, Method::Delete, None, auth_token))
            .await
    }
}

fn descriptor(
    endpoint: &str,
    method: Method,
    payload: Option<Value>,
    auth_token: Option<String>,
) -> RequestDescriptor {
    RequestDescriptor {
        endpoint: endpoint.to_string(),
        method,
        payload,
        auth_token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Records the tunnelled calls and echoes success.
    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<BridgeRequest>>,
    }

    impl HostBridge for Recording {
        fn invoke(&self, request: BridgeRequest) -> BridgeReply {
            self.seen.lock().unwrap().push(request);
            BridgeReply::ok(json!({ "ok": true }))
        }
    }

    #[tokio::test]
    async fn verbs_tunnel_through_the_bridge() {
        let host = Arc::new(Recording::default());
        let t = Transport::Bridged(BridgedTransport::new(host.clone()));
        let tok = || Some("tok".to_string());

        t.get("/presets/public", tok()).await.unwrap();
        t.post("/presets/", json!({ "name": "a" }), tok()).await.unwrap();
        t.put("/presets/2", json!({ "name": "b" }), tok()).await.unwrap();
        let r = t.delete("/presets/2", tok()).await.unwrap();
        assert_eq!(r.data, Some(json!({ "ok": true })));

        let seen = host.seen.lock().unwrap().clone();
        let expected = [
            ("/presets/public", None),
            ("/presets/", Some(json!({ "name": "a" }))),
            ("/presets/2", Some(json!({ "name": "b", "_method": "PUT" }))),
            ("/presets/2?_method=DELETE", None),
        ];
        assert_eq!(seen.len(), expected.len());
        for (call, (endpoint, data)) in seen.iter().zip(expected) {
            assert_eq!(call.endpoint, endpoint);
            assert_eq!(call.data, data);
            assert_eq!(call.auth_token.as_deref(), Some("tok"));
        }
    }

    #[test]
    fn from_body_plain_is_success() {
        let r = TransportResult::from_body(json!({ "segments": [] }));
        assert!(r.success);
        assert_eq!(r.data, Some(json!({ "segments": [] })));
    }

    #[test]
    fn from_body_envelope_failure() {
        let r = TransportResult::from_body(json!({ "success": false, "error": "quota exceeded" }));
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn from_body_envelope_success_keeps_whole_body() {
        let body = json!({ "success": true, "data": { "id": 1 } });
        let r = TransportResult::from_body(body.clone());
        assert!(r.success);
        assert_eq!(r.data, Some(body));
    }
}
