//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Lodestone - Install and uninstall content packs
#[derive(Parser, Debug)]
#[command(name = "lodestone")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to lodestone.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a content pack and show what an install would create
    Plan(PlanArgs),

    /// Install a content pack
    Install(InstallArgs),

    /// Remove everything an installation created
    Uninstall(UninstallArgs),

    /// List installation records
    Installations(InstallationsArgs),

    /// List live platform objects
    Excerpts(ExcerptsArgs),
}

/// Which pack to operate on
#[derive(Args, Debug)]
pub struct PackArgs {
    /// Pack file, or the id of a stored pack
    pub pack: String,

    /// Revision of a stored pack (defaults to the latest)
    #[arg(short, long)]
    pub revision: Option<u32>,

    /// Parameter binding, repeatable
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub pack: PackArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    #[command(flatten)]
    pub pack: PackArgs,

    /// Comment stored with the installation record
    #[arg(long, default_value = "")]
    pub comment: String,

    /// User recorded as the installer
    #[arg(long, env = "USER", default_value = "admin")]
    pub user: String,
}

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Installation record id
    pub installation_id: String,

    /// Skip confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct InstallationsArgs {
    /// Only show installations of this pack
    #[arg(long)]
    pub pack: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExcerptsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
