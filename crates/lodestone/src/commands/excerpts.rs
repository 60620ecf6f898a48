//! Excerpts command

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use super::Workspace;
use crate::cli::ExcerptsArgs;
use crate::output;

#[derive(Tabled, Serialize)]
struct ExcerptRow {
    #[tabled(rename = "type")]
    model_type: String,
    id: String,
    title: String,
}

pub async fn run(args: ExcerptsArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let excerpts = workspace.service.list_entity_excerpts().await?;

    if excerpts.is_empty() {
        output::info("No live entities");
        return Ok(());
    }

    let rows: Vec<ExcerptRow> = excerpts
        .into_iter()
        .map(|e| ExcerptRow {
            model_type: e.model_type.to_string(),
            id: e.id.to_string(),
            title: e.title,
        })
        .collect();

    if args.json {
        let json = serde_json::to_string_pretty(&rows)
            .context("Failed to serialize entities to JSON")?;
        println!("{}", json);
    } else {
        let mut table = Table::new(&rows);
        table.with(Style::sharp());
        println!("{}", table);
    }
    Ok(())
}
