//! Installations command

use anyhow::{Context, Result};
use camino::Utf8Path;
use lodestone_core::types::ModelId;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use super::Workspace;
use crate::cli::InstallationsArgs;
use crate::output;

#[derive(Tabled, Serialize)]
struct InstallationRow {
    id: String,
    #[tabled(rename = "content pack")]
    content_pack: String,
    revision: u32,
    entities: usize,
    #[tabled(rename = "created by")]
    created_by: String,
    #[tabled(rename = "created at")]
    created_at: String,
    comment: String,
}

pub async fn run(args: InstallationsArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let store = workspace.service.installations();

    let mut installations = match &args.pack {
        Some(pack) => store.find_by_content_pack(&ModelId::from(pack.as_str())).await?,
        None => store.list().await?,
    };
    installations.sort_by_key(|i| i.created_at);

    if installations.is_empty() {
        output::info("No installations");
        return Ok(());
    }

    let rows: Vec<InstallationRow> = installations
        .iter()
        .map(|i| InstallationRow {
            id: i.id.clone(),
            content_pack: i.content_pack_id.to_string(),
            revision: i.content_pack_revision,
            entities: i.entities.len(),
            created_by: i.created_by.clone(),
            created_at: i.created_at.format("%Y-%m-%d %H:%M").to_string(),
            comment: i.comment.clone(),
        })
        .collect();

    if args.json {
        let json = serde_json::to_string_pretty(&installations)
            .context("Failed to serialize installations to JSON")?;
        println!("{}", json);
    } else {
        let mut table = Table::new(&rows);
        table.with(Style::sharp());
        println!("{}", table);
    }
    Ok(())
}
