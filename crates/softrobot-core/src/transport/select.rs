//! Per-call transport selection.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::bridged::{BridgedTransport, HostBridge};
use super::direct::DirectTransport;
use super::host::HttpHostBridge;
use super::Transport;

/// Environment variable that marks the process as running under a host bridge.
pub const HOST_BRIDGE_ENV: &str = "SOFTROBOT_HOST_BRIDGE";

/// Capabilities of the surrounding environment, injected into the client.
#[derive(Clone, Default)]
pub struct HostEnvironment {
    bridge: Option<Arc<dyn HostBridge>>,
}

impl fmt::Debug for HostEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostEnvironment")
            .field("host_bridge", &self.has_host_bridge())
            .finish()
    }
}

impl HostEnvironment {
    /// No host bridge: every call goes direct.
    pub fn direct_only() -> Self {
        Self { bridge: None }
    }

    pub fn with_bridge(bridge: Arc<dyn HostBridge>) -> Self {
        Self {
            bridge: Some(bridge),
        }
    }

    /// Installs an `HttpHostBridge` to `backend_url` when `SOFTROBOT_HOST_BRIDGE`
    /// is set to a truthy value; otherwise direct only.
    pub fn detect(backend_url: &str, timeout: Duration) -> Self {
        let flag = std::env::var(HOST_BRIDGE_ENV).ok();
        if bridge_requested(flag.as_deref()) {
            tracing::debug!("host bridge capability detected ({})", HOST_BRIDGE_ENV);
            Self::http_bridge(backend_url, timeout)
        } else {
            Self::direct_only()
        }
    }

    /// Always bridged through an `HttpHostBridge` to `backend_url`.
    pub fn http_bridge(backend_url: &str, timeout: Duration) -> Self {
        Self::with_bridge(Arc::new(
            HttpHostBridge::new(backend_url).with_timeout(timeout),
        ))
    }

    pub fn has_host_bridge(&self) -> bool {
        self.bridge.is_some()
    }
}

/// True when the capability flag value asks for the host bridge.
pub fn bridge_requested(flag: Option<&str>) -> bool {
    match flag.map(str::trim) {
        None | Some("") => false,
        Some(v) => !(v == "0" || v.eq_ignore_ascii_case("false") || v.eq_ignore_ascii_case("no")),
    }
}

/// Pick the transport for one call: bridged when the environment exposes a host
/// bridge, direct otherwise.
pub fn select(env: &HostEnvironment, direct: &DirectTransport) -> Transport {
    match &env.bridge {
        Some(bridge) => Transport::Bridged(BridgedTransport::new(Arc::clone(bridge))),
        None => Transport::Direct(direct.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{BridgeReply, BridgeRequest};

    struct NullBridge;

    impl HostBridge for NullBridge {
        fn invoke(&self, _request: BridgeRequest) -> BridgeReply {
            BridgeReply::failed("unused")
        }
    }

    #[test]
    fn selects_direct_without_bridge() {
        let t = select(&HostEnvironment::direct_only(), &DirectTransport::new(""));
        assert!(!t.is_bridged());
    }

    #[test]
    fn selects_bridged_when_capability_present() {
        let env = HostEnvironment::with_bridge(Arc::new(NullBridge));
        assert!(env.has_host_bridge());
        let t = select(&env, &DirectTransport::new(""));
        assert!(t.is_bridged());
    }

    #[test]
    fn http_bridge_is_a_host_bridge() {
        let env = HostEnvironment::http_bridge("http://127.0.0.1:8000", Duration::from_secs(1));
        assert!(env.has_host_bridge());
    }

    #[test]
    fn bridge_flag_values() {
        assert!(!bridge_requested(None));
        assert!(!bridge_requested(Some("")));
        assert!(!bridge_requested(Some("0")));
        assert!(!bridge_requested(Some("false")));
        assert!(bridge_requested(Some("1")));
        assert!(bridge_requested(Some("tauri")));
    }
}
