//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::AppContext;
use crate::commands;

/// Bootstrap and manage Terraform-backed cloud infrastructure
#[derive(Parser)]
#[command(
    name = "groundwork",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Skip interactive prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision the state backend and IAM layers
    Bootstrap(commands::bootstrap::BootstrapArgs),

    /// Destroy all managed infrastructure
    Destroy(commands::destroy::DestroyArgs),

    /// List managed resources
    Resources(commands::resources::ResourcesArgs),
}

impl Cli {
    /// Dispatch the parsed command.
    ///
    /// # Errors
    ///
    /// Returns an error when the command fails; the caller prints it and
    /// exits non-zero.
    pub async fn run(self) -> Result<()> {
        let ctx = AppContext::new(self.json, self.quiet, self.no_color, self.yes);
        match self.command {
            Command::Bootstrap(args) => commands::bootstrap::run(&ctx, &args).await,
            Command::Destroy(args) => commands::destroy::run(&ctx, &args).await,
            Command::Resources(args) => commands::resources::run(&ctx, &args).await,
        }
    }
}
