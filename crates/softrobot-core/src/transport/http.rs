//! Blocking libcurl request shared by the direct transport and the host bridge.
//!
//! Runs in the current thread; callers on the async side go through
//! `spawn_blocking`.

use serde_json::Value;
use std::time::Duration;

use super::Method;

/// Connect timeout; the overall per-call timeout is passed in.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Status and raw body of a completed HTTP exchange (any status).
#[derive(Debug)]
pub(crate) struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one JSON request. Only transport failures are errors; non-2xx
/// statuses come back as a normal `HttpResponse`.
pub(crate) fn perform(
    method: Method,
    url: &str,
    body: Option<&[u8]>,
    auth_token: Option<&str>,
    timeout: Duration,
) -> Result<HttpResponse, curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.connect_timeout(CONNECT_TIMEOUT.min(timeout))?;
    easy.timeout(timeout)?;

    match method {
        Method::Get => easy.get(true)?,
        Method::Post => easy.post(true)?,
        Method::Put => {
            easy.post(true)?;
            easy.custom_request("PUT")?;
        }
        Method::Delete => easy.custom_request("DELETE")?,
    }

    let mut list = curl::easy::List::new();
    list.append("Accept: application/json")?;
    match body {
        Some(bytes) => {
            list.append("Content-Type: application/json")?;
            easy.post_fields_copy(bytes)?;
        }
        None if method.has_body() => easy.post_fields_copy(b"")?,
        None => {}
    }
    if let Some(token) = auth_token {
        list.append(&format!("Authorization: Bearer {}", token))?;
    }
    easy.http_headers(list)?;

    let mut out = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            out.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()? as u16;
    Ok(HttpResponse { status, body: out })
}

/// Parse a response body as JSON. Empty bodies become `null`; anything that is
/// not JSON is kept as a JSON string so error bodies are never lost.
pub(crate) fn parse_body(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).trim().to_string()))
}
