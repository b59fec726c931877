//! `groundwork destroy` — tear down all managed infrastructure.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::{
    ConfigArgs, build_executor, connect_aws, finish, render_config_errors, reporter_for,
};
use crate::domain::{CloudProvider, TerraformResult};
use crate::terraform::orchestrator::Orchestrator;

/// Arguments for the destroy command.
#[derive(Args)]
pub struct DestroyArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Run `groundwork destroy`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the user declines the
/// confirmation, or the destroy fails.
pub async fn run(ctx: &AppContext, args: &DestroyArgs) -> Result<()> {
    let config = match args.config.to_config() {
        Ok(config) => config,
        Err(errors) => return render_config_errors(ctx, &errors),
    };

    if config.provider != CloudProvider::Aws {
        return finish(
            ctx,
            TerraformResult::failed(format!(
                "{} destroy is not supported yet",
                config.provider
            )),
        );
    }

    if !ctx.confirm(
        "This permanently destroys the state backend and IAM role. Continue?",
        false,
    )? {
        ctx.output.info("Cancelled.");
        return Ok(());
    }

    let executor = build_executor(ctx)?;
    let session = connect_aws(&config).await?;
    let orchestrator = Orchestrator::new(&config, &executor, &session, reporter_for(ctx))?;

    let result = orchestrator.destroy().await;
    finish(ctx, result)
}
