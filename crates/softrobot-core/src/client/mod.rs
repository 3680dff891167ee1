//! Resilient request client: the public request surface used by the UI.
//!
//! Two request families:
//! - compute calls (`/pcc`, `/pcc-with-tendons`, `/tendons/*`): pure functions
//!   of their input, run through the retry executor;
//! - CRUD and session calls (`/auth/*`, `/presets/*`): dispatched once, never
//!   retried, since re-sending a create or delete is not safe.
//!
//! Every call reads the session token from the injected `TokenProvider` and
//! picks the transport for the current `HostEnvironment`. A 401 clears the
//! token; whether to send the user to a login screen is up to the caller.

mod types;

pub use types::{
    AccessToken, ActuationCommand, ActuationResult, Credentials, DeletedPreset, KinematicsResult,
    PccParams, Preset, PresetCreate, PresetUpdate, TendonConfig, User,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::retry::{clears_session, run_with_retry, RequestError, RetryOverride, RetryPolicy};
use crate::token::TokenProvider;
use crate::transport::{
    select, DirectTransport, HostEnvironment, Method, Transport, TransportResult,
};

/// Fallback error text when a failed result carries none.
const CALL_FAILED: &str = "call failed";

/// API client shared by all views.
#[derive(Clone)]
pub struct ApiClient {
    direct: DirectTransport,
    env: HostEnvironment,
    tokens: Arc<dyn TokenProvider>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("direct", &self.direct)
            .field("env", &self.env)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ApiClient {
    pub fn new(direct: DirectTransport, env: HostEnvironment, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            direct,
            env,
            tokens,
            retry: RetryPolicy::default(),
        }
    }

    /// Client for the resolved base URL, timeout and retry policy in `cfg`.
    pub fn from_config(cfg: &ClientConfig, env: HostEnvironment, tokens: Arc<dyn TokenProvider>) -> Self {
        let direct = DirectTransport::new(cfg.resolved_api_base_url()).with_timeout(cfg.request_timeout());
        Self::new(direct, env, tokens).with_retry_policy(cfg.retry_policy())
    }

    /// Replace the default retry policy used by compute calls.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Transport for the next call. Re-evaluated every time.
    pub fn transport(&self) -> Transport {
        select(&self.env, &self.direct)
    }

    /// `POST /pcc`.
    pub async fn compute_kinematics(
        &self,
        params: &PccParams,
        retry: Option<&RetryOverride>,
    ) -> Result<KinematicsResult, RequestError> {
        self.compute("/pcc", params, retry).await
    }

    /// `POST /pcc-with-tendons`.
    pub async fn compute_kinematics_with_actuation(
        &self,
        params: &PccParams,
        retry: Option<&RetryOverride>,
    ) -> Result<ActuationResult, RequestError> {
        self.compute("/pcc-with-tendons", params, retry).await
    }

    /// `POST /tendons/calculate` (authenticated; `{data: T}` envelope).
    pub async fn calculate_tendons(
        &self,
        params: &PccParams,
        retry: Option<&RetryOverride>,
    ) -> Result<Value, RequestError> {
        let body: Value = self.compute("/tendons/calculate", params, retry).await?;
        Ok(unwrap_envelope(body))
    }

    /// `POST /tendons/analyze` (authenticated; `{data: T}` envelope).
    pub async fn analyze_tendons(
        &self,
        params: &PccParams,
        retry: Option<&RetryOverride>,
    ) -> Result<Value, RequestError> {
        let body: Value = self.compute("/tendons/analyze", params, retry).await?;
        Ok(unwrap_envelope(body))
    }

    async fn compute<P, T>(
        &self,
        endpoint: &str,
        params: &P,
        retry: Option<&RetryOverride>,
    ) -> Result<T, RequestError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let policy = match retry {
            Some(over) => self.retry.merged(over),
            None => self.retry.clone(),
        };
        let payload = encode(params)?;
        let data = run_with_retry(&policy, || {
            let payload = payload.clone();
            async move {
                let result = self.dispatch(Method::Post, endpoint, Some(payload)).await?;
                unwrap_result(result)
            }
        })
        .await?;
        Ok(serde_json::from_value(data)?)
    }

    /// `POST /auth/register`.
    pub async fn register(&self, credentials: &Credentials) -> Result<User, RequestError> {
        self.crud(Method::Post, "/auth/register", Some(encode(credentials)?))
            .await
    }

    /// `POST /auth/login`. Storing the returned token is the caller's job.
    pub async fn login(&self, credentials: &Credentials) -> Result<AccessToken, RequestError> {
        self.crud(Method::Post, "/auth/login", Some(encode(credentials)?))
            .await
    }

    /// `POST /auth/verify-email?token=...`.
    pub async fn verify_email(&self, token: &str) -> Result<Value, RequestError> {
        let endpoint = format!("/auth/verify-email?token={}", encode_query_value(token));
        self.crud(Method::Post, &endpoint, None).await
    }

    /// `GET /auth/me`.
    pub async fn current_user(&self) -> Result<User, RequestError> {
        self.crud(Method::Get, "/auth/me", None).await
    }

    /// `DELETE /auth/account`.
    pub async fn delete_account(&self) -> Result<Value, RequestError> {
        self.crud(Method::Delete, "/auth/account", None).await
    }

    /// `GET /presets/`: presets owned by the current user.
    pub async fn list_presets(&self) -> Result<Vec<Preset>, RequestError> {
        self.crud(Method::Get, "/presets/", None).await
    }

    /// `GET /presets/public`.
    pub async fn public_presets(&self) -> Result<Vec<Preset>, RequestError> {
        self.crud(Method::Get, "/presets/public", None).await
    }

    /// `GET /presets/{id}`.
    pub async fn get_preset(&self, id: i64) -> Result<Preset, RequestError> {
        self.crud(Method::Get, &format!("/presets/{}", id), None).await
    }

    /// `POST /presets/`.
    pub async fn create_preset(&self, preset: &PresetCreate) -> Result<Preset, RequestError> {
        self.crud(Method::Post, "/presets/", Some(encode(preset)?))
            .await
    }

    /// `PUT /presets/{id}`.
    pub async fn update_preset(&self, id: i64, update: &PresetUpdate) -> Result<Preset, RequestError> {
        self.crud(
            Method::Put,
            &format!("/presets/{}", id),
            Some(encode(update)?),
        )
        .await
    }

    /// `DELETE /presets/{id}`.
    pub async fn delete_preset(&self, id: i64) -> Result<DeletedPreset, RequestError> {
        self.crud(Method::Delete, &format!("/presets/{}", id), None).await
    }

    async fn crud<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<Value>,
    ) -> Result<T, RequestError> {
        let result = self.dispatch(method, endpoint, payload).await?;
        let body = unwrap_result(result)?;
        Ok(serde_json::from_value(unwrap_envelope(body))?)
    }

    /// One transport call with the current token. Clears the token on a 401.
    async fn dispatch(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<Value>,
    ) -> Result<TransportResult<Value>, RequestError> {
        let token = self.tokens.token();
        let transport = self.transport();
        let outcome = match method {
            Method::Get => transport.get(endpoint, token).await,
            Method::Post => transport.post(endpoint, payload.unwrap_or_else(empty_object), token).await,
            Method::Put => transport.put(endpoint, payload.unwrap_or_else(empty_object), token).await,
            Method::Delete => transport.delete(endpoint, token).await,
        };
        if let Err(e) = &outcome {
            if clears_session(e) {
                tracing::info!(%method, endpoint, "authentication failed; clearing stored session token");
                self.tokens.clear();
            }
        }
        outcome
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Serialize an outgoing payload.
fn encode<T: Serialize>(value: &T) -> Result<Value, RequestError> {
    serde_json::to_value(value).map_err(RequestError::Encode)
}

/// Plain value of a transport result, or the failure as a server-shaped error
/// carrying `error` (or "call failed").
fn unwrap_result(result: TransportResult<Value>) -> Result<Value, RequestError> {
    if result.success {
        return Ok(result.data.unwrap_or(Value::Null));
    }
    Err(RequestError::server(
        result.error.unwrap_or_else(|| CALL_FAILED.to_string()),
    ))
}

/// `{data: T}` → `T`. Bodies without a `data` member are returned unchanged.
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Form-encode a query parameter value.
fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
