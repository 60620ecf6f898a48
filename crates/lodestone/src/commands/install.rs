//! Install command

use anyhow::Result;
use camino::Utf8Path;

use super::{parse_params, Workspace};
use crate::cli::InstallArgs;
use crate::output;

pub async fn run(args: InstallArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let pack = workspace.resolve_pack(&args.pack).await?;
    let params = parse_params(&args.pack.params, &pack)?;

    output::header(&format!("Installing {} rev {}", pack.id(), pack.revision()));

    let spinner = output::spinner("Creating entities...");
    let result = workspace
        .service
        .install_content_pack(&pack, &params, &args.comment, &args.user)
        .await;
    spinner.finish_and_clear();

    // Unwound installs also changed state before rolling back
    workspace.persist()?;

    let installation = result?;
    for native in &installation.entities {
        if native.found_on_system {
            output::kv("reused", &native.to_string());
        } else {
            output::kv("created", &native.to_string());
        }
    }

    output::success(&format!("Installed as {}", installation.id));
    Ok(())
}
