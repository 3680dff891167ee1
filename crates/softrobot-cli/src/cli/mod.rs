//! CLI for the soft-robot API client.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use softrobot_core::config;
use softrobot_core::token::FileTokenStore;
use softrobot_core::transport::HostEnvironment;
use softrobot_core::ApiClient;
use std::path::PathBuf;
use std::sync::Arc;

use commands::{
    run_compute, run_delete_account, run_login, run_logout, run_me, run_presets, run_register,
    run_verify_email, ComputeKind, Session,
};

/// Top-level CLI for the soft-robot API client.
#[derive(Debug, Parser)]
#[command(name = "softrobot")]
#[command(about = "softrobot: client for the soft-robot kinematics API", long_about = None)]
pub struct Cli {
    /// Route requests through the local host bridge instead of calling the API directly.
    #[arg(long, global = true)]
    pub bridge: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Compute the PCC backbone for the parameters in a JSON file.
    Pcc {
        /// Path to a JSON file with bending/rotation angles and lengths.
        params: PathBuf,
        /// Also compute tendon actuation commands.
        #[arg(long)]
        tendons: bool,
        /// Override the number of retries for this call.
        #[arg(long, value_name = "N")]
        max_retries: Option<u32>,
    },

    /// Run the authenticated tendon calculation or analysis.
    Tendons {
        params: PathBuf,
        /// Run the full analysis instead of the plain calculation.
        #[arg(long)]
        analyze: bool,
    },

    /// Log in and store the session token.
    Login {
        #[arg(long)]
        email: String,
        /// Password; read from SOFTROBOT_PASSWORD when omitted.
        #[arg(long, env = "SOFTROBOT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SOFTROBOT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Confirm an email address with the token from the verification mail.
    VerifyEmail { token: String },

    /// Show the logged-in user.
    Me,

    /// Forget the stored session token.
    Logout,

    /// Delete the current account and its presets.
    DeleteAccount,

    /// Manage saved robot presets.
    Presets {
        #[command(subcommand)]
        action: PresetAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum PresetAction {
    /// List presets owned by the current user.
    List,
    /// List public presets.
    Public,
    /// Show one preset.
    Get { id: i64 },
    /// Create a preset from a JSON file (`name`, `configuration`, ...).
    Create { file: PathBuf },
    /// Update a preset with the fields in a JSON file.
    Update { id: i64, file: PathBuf },
    /// Delete a preset.
    Delete { id: i64 },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let env = if cli.bridge {
            HostEnvironment::http_bridge(&cfg.bridge_backend_url, cfg.request_timeout())
        } else {
            HostEnvironment::detect(&cfg.bridge_backend_url, cfg.request_timeout())
        };
        let tokens = Arc::new(FileTokenStore::open_default()?);
        let session = Session {
            client: ApiClient::from_config(&cfg, env, tokens.clone()),
            tokens,
        };

        match cli.command {
            CliCommand::Pcc {
                params,
                tendons,
                max_retries,
            } => {
                let kind = if tendons {
                    ComputeKind::Actuation
                } else {
                    ComputeKind::Kinematics
                };
                run_compute(&session, kind, &params, max_retries).await?
            }
            CliCommand::Tendons { params, analyze } => {
                let kind = if analyze {
                    ComputeKind::TendonAnalysis
                } else {
                    ComputeKind::TendonCalculation
                };
                run_compute(&session, kind, &params, None).await?
            }
            CliCommand::Login { email, password } => run_login(&session, email, password).await?,
            CliCommand::Register { email, password } => {
                run_register(&session, email, password).await?
            }
            CliCommand::VerifyEmail { token } => run_verify_email(&session, &token).await?,
            CliCommand::Me => run_me(&session).await?,
            CliCommand::Logout => run_logout(&session)?,
            CliCommand::DeleteAccount => run_delete_account(&session).await?,
            CliCommand::Presets { action } => run_presets(&session, action).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
