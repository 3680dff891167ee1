//! CLI command handlers, grouped by API area.

mod auth;
mod compute;
mod presets;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use softrobot_core::token::FileTokenStore;
use softrobot_core::ApiClient;
use std::path::Path;
use std::sync::Arc;

pub use auth::{run_delete_account, run_login, run_logout, run_me, run_register, run_verify_email};
pub use compute::{run_compute, ComputeKind};
pub use presets::run_presets;

/// Client plus the token store it reads from, shared by all commands.
pub struct Session {
    pub client: ApiClient,
    pub tokens: Arc<FileTokenStore>,
}

/// Read and parse a JSON input file.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
