//! Session token access.
//!
//! The token belongs to the auth flow (login/logout); the request client only
//! reads it before each call and clears it after a 401. `TokenProvider` is the
//! seam the client is constructed with.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// File name of the stored token under the XDG state dir.
pub const TOKEN_FILE: &str = "auth_token";

/// Read/clear access to the stored bearer token.
pub trait TokenProvider: Send + Sync {
    /// Current token, if any.
    fn token(&self) -> Option<String>;
    /// Forget the token (after an authentication failure).
    fn clear(&self);
}

/// Strip whitespace and incidental quoting (`"abc"` or `'abc'`); empty means none.
pub fn normalize_token(raw: &str) -> Option<String> {
    let t = raw.trim().trim_matches('"').trim_matches('\'').trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Token kept in a single file, e.g. `~/.local/state/softrobot/auth_token`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the XDG state directory.
    pub fn open_default() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("softrobot")?;
        let path = xdg_dirs
            .place_state_file(TOKEN_FILE)
            .context("could not create state directory for token")?;
        Ok(Self::at(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a token (login flow).
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{}\n", token.trim()))
            .with_context(|| format!("writing token to {}", self.path.display()))?;
        restrict_permissions(&self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

impl TokenProvider for FileTokenStore {
    fn token(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => normalize_token(&raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "could not read token: {}", e);
                None
            }
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "token removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), "could not remove token: {}", e),
        }
    }
}

/// In-process token, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: RwLock::new(token.and_then(normalize_token)),
        }
    }

    pub fn set(&self, token: &str) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = normalize_token(token);
    }
}

impl TokenProvider for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
