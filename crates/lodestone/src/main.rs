//! Lodestone CLI - Content pack installation for log-management platforms
//!
//! This is the main entry point for the Lodestone command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Plan(args) => commands::plan::run(args, config).await,
        Commands::Install(args) => commands::install::run(args, config).await,
        Commands::Uninstall(args) => commands::uninstall::run(args, config).await,
        Commands::Installations(args) => commands::installations::run(args, config).await,
        Commands::Excerpts(args) => commands::excerpts::run(args, config).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            // Progress of each install is logged at info
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
