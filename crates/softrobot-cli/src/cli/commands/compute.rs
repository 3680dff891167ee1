//! `softrobot pcc` and `softrobot tendons`: compute calls (retried).

use anyhow::Result;
use softrobot_core::client::PccParams;
use softrobot_core::retry::RetryOverride;
use std::path::Path;

use super::{print_json, read_json, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeKind {
    Kinematics,
    Actuation,
    TendonCalculation,
    TendonAnalysis,
}

pub async fn run_compute(
    session: &Session,
    kind: ComputeKind,
    params_path: &Path,
    max_retries: Option<u32>,
) -> Result<()> {
    let params: PccParams = read_json(params_path)?;
    let over = max_retries.map(|n| RetryOverride {
        max_retries: Some(n),
        ..RetryOverride::default()
    });
    let over = over.as_ref();
    let client = &session.client;
    tracing::debug!(?kind, transport = ?client.transport(), "compute request");

    match kind {
        ComputeKind::Kinematics => print_json(&client.compute_kinematics(&params, over).await?),
        ComputeKind::Actuation => {
            print_json(&client.compute_kinematics_with_actuation(&params, over).await?)
        }
        ComputeKind::TendonCalculation => {
            print_json(&client.calculate_tendons(&params, over).await?)
        }
        ComputeKind::TendonAnalysis => print_json(&client.analyze_tendons(&params, over).await?),
    }
}
