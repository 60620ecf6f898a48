//! Plan command

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{parse_params, Workspace};
use crate::cli::PlanArgs;
use crate::output;

#[derive(Serialize)]
struct PlanView {
    content_pack_id: String,
    revision: u32,
    parameters: BTreeMap<String, String>,
    order: Vec<PlanStep>,
}

#[derive(Serialize)]
struct PlanStep {
    entity: String,
    depends_on: Vec<String>,
}

pub async fn run(args: PlanArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let pack = workspace.resolve_pack(&args.pack).await?;
    let params = parse_params(&args.pack.params, &pack)?;

    let plan = workspace.service.plan(&pack, &params)?;

    let view = PlanView {
        content_pack_id: plan.content_pack_id.to_string(),
        revision: plan.revision,
        parameters: plan
            .parameters
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect(),
        order: plan
            .order
            .iter()
            .map(|descriptor| PlanStep {
                entity: descriptor.to_string(),
                depends_on: plan
                    .dependencies
                    .get(descriptor)
                    .map(|deps| deps.iter().map(ToString::to_string).collect())
                    .unwrap_or_default(),
            })
            .collect(),
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&view).context("Failed to serialize plan to JSON")?;
        println!("{}", json);
        return Ok(());
    }

    output::header(&format!("Plan for {} rev {}", view.content_pack_id, view.revision));
    if view.parameters.is_empty() {
        output::info("No parameters");
    } else {
        for (name, value) in &view.parameters {
            output::kv(name, value);
        }
    }

    output::header("Creation order");
    for (i, step) in view.order.iter().enumerate() {
        if step.depends_on.is_empty() {
            output::step(i + 1, &step.entity);
        } else {
            output::step(i + 1, &format!("{} (after {})", step.entity, step.depends_on.join(", ")));
        }
    }

    output::success("All constraints fulfilled");
    Ok(())
}
