use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::{RetryPolicy, DEFAULT_RETRYABLE_ERROR_CODES, DEFAULT_RETRYABLE_STATUS_CODES};
use crate::transport::LOCAL_ORIGIN;

/// Runtime override for the API base URL.
pub const API_URL_ENV: &str = "SOFTROBOT_API_URL";

/// API base URL baked in at build time, if any.
const BUILD_API_URL: Option<&str> = option_env!("SOFTROBOT_API_URL");

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum backoff delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor between consecutive delays; must be > 1.
    pub backoff_multiplier: f64,
    /// HTTP statuses that are retried.
    #[serde(default = "default_status_codes")]
    pub retryable_status_codes: Vec<u16>,
    /// Transport codes (ECONNREFUSED, ...) that are retried.
    #[serde(default = "default_error_codes")]
    pub retryable_error_codes: Vec<String>,
}

fn default_status_codes() -> Vec<u16> {
    DEFAULT_RETRYABLE_STATUS_CODES.to_vec()
}

fn default_error_codes() -> Vec<String> {
    DEFAULT_RETRYABLE_ERROR_CODES
        .iter()
        .map(|c| c.to_string())
        .collect()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            retryable_status_codes: default_status_codes(),
            retryable_error_codes: default_error_codes(),
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_delay_ms > self.max_delay_ms {
            bail!(
                "retry.base_delay_ms ({}) must not exceed retry.max_delay_ms ({})",
                self.base_delay_ms,
                self.max_delay_ms
            );
        }
        if !(self.backoff_multiplier.is_finite() && self.backoff_multiplier > 1.0) {
            bail!(
                "retry.backoff_multiplier must be greater than 1 (got {})",
                self.backoff_multiplier
            );
        }
        Ok(())
    }

    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
            retryable_status_codes: self.retryable_status_codes.iter().copied().collect(),
            retryable_error_codes: self.retryable_error_codes.iter().cloned().collect(),
        }
    }
}

/// Client configuration loaded from `~/.config/softrobot/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL. Empty means same origin (the locally hosted backend).
    #[serde(default)]
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Backend origin the host bridge forwards to.
    pub bridge_backend_url: String,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            request_timeout_secs: 30,
            bridge_backend_url: LOCAL_ORIGIN.to_string(),
            retry: None,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        check_url("api_base_url", &self.api_base_url)?;
        check_url("bridge_backend_url", &self.bridge_backend_url)?;
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry policy from the `[retry]` section, or the built-in default.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }

    /// Base URL after applying overrides: `SOFTROBOT_API_URL` in the
    /// environment, then the config file, then the build-time value.
    pub fn resolved_api_base_url(&self) -> String {
        let runtime = std::env::var(API_URL_ENV).ok();
        resolve_api_base_url(runtime.as_deref(), &self.api_base_url, BUILD_API_URL)
    }
}

/// First non-empty of runtime override, configured value, build-time value;
/// empty string (same origin) if none.
pub fn resolve_api_base_url(runtime: Option<&str>, configured: &str, build_time: Option<&str>) -> String {
    [runtime, Some(configured), build_time]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("")
        .to_string()
}

fn check_url(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Ok(());
    }
    let parsed = url::Url::parse(value.trim()).with_context(|| format!("{} is not a valid URL: {}", field, value))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("{} must be an http(s) URL: {}", field, value);
    }
    Ok(())
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("softrobot")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ClientConfig> {
    load_or_init_at(&config_path()?)
}

/// Same as `load_or_init` with an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<ClientConfig> {
    if !path.exists() {
        let default_cfg = ClientConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: ClientConfig =
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_values() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.api_base_url, "");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.bridge_backend_url, "http://127.0.0.1:8000");
        assert!(cfg.retry.is_none());
        assert_eq!(cfg.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn default_retry_config_matches_default_policy() {
        assert_eq!(RetryConfig::default().to_policy(), RetryPolicy::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = ClientConfig {
            retry: Some(RetryConfig::default()),
            ..ClientConfig::default()
        };
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ClientConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            api_base_url = "https://robot.example.com"
            request_timeout_secs = 5
            bridge_backend_url = "http://localhost:9000"

            [retry]
            max_retries = 1
            base_delay_ms = 250
            max_delay_ms = 4000
            backoff_multiplier = 1.5
            retryable_status_codes = [503]
        "#;
        let cfg: ClientConfig = toml::from_str(toml).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.api_base_url, "https://robot.example.com");
        assert_eq!(cfg.request_timeout(), Duration::from_secs(5));
        let p = cfg.retry_policy();
        assert_eq!(p.max_retries, 1);
        assert_eq!(p.base_delay, Duration::from_millis(250));
        assert_eq!(p.max_delay, Duration::from_millis(4000));
        assert!(p.retryable_status_codes.contains(&503));
        assert!(!p.retryable_status_codes.contains(&500));
        // Missing list falls back to the defaults.
        assert!(p.retryable_error_codes.contains("ECONNREFUSED"));
    }

    #[test]
    fn validate_rejects_bad_retry_and_urls() {
        let mut cfg = ClientConfig {
            retry: Some(RetryConfig {
                base_delay_ms: 5000,
                max_delay_ms: 1000,
                ..RetryConfig::default()
            }),
            ..ClientConfig::default()
        };
        assert!(cfg.validate().is_err());

        cfg.retry = Some(RetryConfig {
            backoff_multiplier: 1.0,
            ..RetryConfig::default()
        });
        assert!(cfg.validate().is_err());

        cfg.retry = None;
        cfg.api_base_url = "not a url".to_string();
        assert!(cfg.validate().is_err());

        cfg.api_base_url = "ftp://example.com".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn resolve_base_url_precedence() {
        assert_eq!(
            resolve_api_base_url(Some("https://env"), "https://file", Some("https://build")),
            "https://env"
        );
        assert_eq!(
            resolve_api_base_url(Some("  "), "https://file", Some("https://build")),
            "https://file"
        );
        assert_eq!(
            resolve_api_base_url(None, "", Some("https://build")),
            "https://build"
        );
        assert_eq!(resolve_api_base_url(None, "", None), "");
    }

    #[test]
    fn load_or_init_creates_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("softrobot").join("config.toml");
        let cfg = load_or_init_at(&path).unwrap();
        assert_eq!(cfg, ClientConfig::default());
        assert!(path.exists());
        // Second load reads the file back.
        let again = load_or_init_at(&path).unwrap();
        assert_eq!(again, cfg);
    }

    #[test]
    fn load_rejects_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "request_timeout_secs = 0\nbridge_backend_url = \"http://127.0.0.1:8000\"\n",
        )
        .unwrap();
        assert!(load_or_init_at(&path).is_err());
    }
}
