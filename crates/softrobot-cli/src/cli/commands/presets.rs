//! `softrobot presets ...`

use anyhow::Result;
use softrobot_core::client::{PresetCreate, PresetUpdate};

use super::{print_json, read_json, Session};
use crate::cli::PresetAction;

pub async fn run_presets(session: &Session, action: PresetAction) -> Result<()> {
    let client = &session.client;
    match action {
        PresetAction::List => {
            let presets = client.list_presets().await?;
            if presets.is_empty() {
                println!("No presets.");
                return Ok(());
            }
            println!("{:<6} {:<8} {}", "ID", "PUBLIC", "NAME");
            for p in presets {
                println!("{:<6} {:<8} {}", p.id, p.is_public, p.name);
            }
        }
        PresetAction::Public => print_json(&client.public_presets().await?)?,
        PresetAction::Get { id } => print_json(&client.get_preset(id).await?)?,
        PresetAction::Create { file } => {
            let create: PresetCreate = read_json(&file)?;
            let preset = client.create_preset(&create).await?;
            println!("Created preset {} ({})", preset.id, preset.name);
        }
        PresetAction::Update { id, file } => {
            let update: PresetUpdate = read_json(&file)?;
            print_json(&client.update_preset(id, &update).await?)?;
        }
        PresetAction::Delete { id } => {
            let deleted = client.delete_preset(id).await?;
            println!("Deleted preset {}", deleted.deleted_id);
        }
    }
    Ok(())
}
