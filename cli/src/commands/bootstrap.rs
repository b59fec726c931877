//! `groundwork bootstrap` — converge the backend and IAM layers.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::{
    ConfigArgs, build_executor, connect_aws, finish, render_config_errors, reporter_for,
};
use crate::domain::{CloudProvider, TerraformResult};
use crate::terraform::orchestrator::Orchestrator;

/// Arguments for the bootstrap command.
#[derive(Args)]
pub struct BootstrapArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Run `groundwork bootstrap`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the bootstrap fails.
pub async fn run(ctx: &AppContext, args: &BootstrapArgs) -> Result<()> {
    let config = match args.config.to_config() {
        Ok(config) => config,
        Err(errors) => return render_config_errors(ctx, &errors),
    };

    if config.provider != CloudProvider::Aws {
        return finish(
            ctx,
            TerraformResult::failed(format!(
                "{} bootstrap is not supported yet",
                config.provider
            )),
        );
    }

    let executor = build_executor(ctx)?;
    let session = connect_aws(&config).await?;
    let orchestrator = Orchestrator::new(&config, &executor, &session, reporter_for(ctx))?;

    let result = orchestrator.bootstrap().await;
    finish(ctx, result)
}
