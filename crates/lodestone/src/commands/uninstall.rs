//! Uninstall command

use anyhow::{anyhow, Result};
use camino::Utf8Path;
use dialoguer::Confirm;

use super::Workspace;
use crate::cli::UninstallArgs;
use crate::output;

pub async fn run(args: UninstallArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let installation = workspace
        .service
        .installations()
        .find_by_id(&args.installation_id)
        .await?
        .ok_or_else(|| anyhow!("Installation '{}' not found", args.installation_id))?;

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove {} entities installed from {} rev {}?",
                installation.entities.len(),
                installation.content_pack_id,
                installation.content_pack_revision
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            output::info("Cancelled");
            return Ok(());
        }
    }

    output::header(&format!("Uninstalling {}", installation.id));

    let report = workspace.service.uninstall_content_pack(&installation).await;
    workspace.persist()?;

    for native in &report.removed {
        output::kv("removed", &native.to_string());
    }
    for native in &report.skipped {
        output::kv("kept", &native.to_string());
    }
    for notification in &report.notifications {
        let subject = notification
            .entity
            .as_ref()
            .map(|e| format!(" {}", e))
            .unwrap_or_default();
        output::warning(&format!("[{}]{} {}", notification.phase, subject, notification.message));
    }

    if report.is_clean() {
        output::success("Installation removed");
    } else {
        output::warning(&format!(
            "Uninstall finished with {} problem(s)",
            report.notifications.len()
        ));
    }
    Ok(())
}
