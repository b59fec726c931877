//! `groundwork resources` — read-only report of managed resources.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::{
    ConfigArgs, build_executor, connect_aws, finish, render_config_errors, reporter_for,
};
use crate::domain::{CloudProvider, TerraformResult};
use crate::terraform::orchestrator::Orchestrator;

/// Arguments for the resources command.
#[derive(Args)]
pub struct ResourcesArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Rebuild the workspace from scratch before reading state
    #[arg(long)]
    pub force_clean: bool,
}

/// Run `groundwork resources`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the listing fails.
pub async fn run(ctx: &AppContext, args: &ResourcesArgs) -> Result<()> {
    let config = match args.config.to_config() {
        Ok(config) => config,
        Err(errors) => return render_config_errors(ctx, &errors),
    };

    if config.provider != CloudProvider::Aws {
        return finish(
            ctx,
            TerraformResult::failed(format!(
                "{} resource listing is not supported yet",
                config.provider
            )),
        );
    }

    let executor = build_executor(ctx)?;
    let session = connect_aws(&config).await?;
    let orchestrator = Orchestrator::new(&config, &executor, &session, reporter_for(ctx))?;

    let result = orchestrator.list_resources(args.force_clean).await;
    finish(ctx, result)
}
