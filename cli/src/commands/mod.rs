//! Command implementations

pub mod bootstrap;
pub mod destroy;
pub mod resources;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use crate::app::AppContext;
use crate::cloud::AwsCliSession;
use crate::domain::{CloudProvider, TerraformConfig, TerraformResult};
use crate::output::ProgressReporter;
use crate::terraform::binary::TerraformBinary;
use crate::terraform::executor::TerraformExecutor;
use crate::terraform::orchestrator::{ResourceEntry, ResourceStatus};

/// Provider/region selection shared by every command.
#[derive(Args)]
pub struct ConfigArgs {
    /// Cloud provider ('aws' or 'gcp')
    #[arg(long, default_value = "aws")]
    pub provider: String,

    /// Target cloud region
    #[arg(long)]
    pub region: String,

    /// AWS profile to authenticate with
    #[arg(long)]
    pub profile: Option<String>,

    /// GCP project ID (required for gcp)
    #[arg(long)]
    pub project_id: Option<String>,

    /// Override the workspace cache directory
    #[arg(long)]
    pub workspace_dir: Option<PathBuf>,
}

impl ConfigArgs {
    /// Build and validate the config, collecting every violation.
    ///
    /// # Errors
    ///
    /// Returns the full list of violated rules.
    pub fn to_config(&self) -> Result<TerraformConfig, Vec<String>> {
        let provider = match self.provider.parse::<CloudProvider>() {
            Ok(provider) => provider,
            Err(e) => return Err(vec![e]),
        };
        let config = TerraformConfig {
            provider,
            region: self.region.clone(),
            profile: self.profile.clone(),
            project_id: self.project_id.clone(),
            workspace_dir: self.workspace_dir.clone(),
        };
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

/// Report configuration violations and fail the command.
pub(crate) fn render_config_errors(ctx: &AppContext, errors: &[String]) -> Result<()> {
    if ctx.is_json() {
        let result = TerraformResult::failed("Invalid configuration")
            .with_data("errors", Value::from(errors.to_vec()));
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        ctx.output.error("Invalid configuration:");
        for error in errors {
            eprintln!("    - {error}");
        }
    }
    anyhow::bail!("invalid configuration")
}

/// Resolve the terraform binary and build the production executor.
pub(crate) fn build_executor(ctx: &AppContext) -> Result<TerraformExecutor> {
    let binary = TerraformBinary::new()?;
    let path = binary.ensure(ctx.output.show_progress())?;
    Ok(TerraformExecutor::new(path).with_echo(ctx.echo_terraform()))
}

/// Connect the cloud session for an AWS config.
pub(crate) async fn connect_aws(
    config: &TerraformConfig,
) -> Result<AwsCliSession<crate::cloud::TokioCommandRunner>> {
    AwsCliSession::connect(config.profile.as_deref(), &config.region).await
}

/// The reporter commands hand to the orchestrator: silent in JSON mode.
pub(crate) fn reporter_for(ctx: &AppContext) -> &dyn ProgressReporter {
    if ctx.is_json() {
        &crate::output::SilentReporter
    } else {
        &ctx.output
    }
}

/// Render the uniform result and translate failure into a non-zero exit.
pub(crate) fn finish(ctx: &AppContext, result: TerraformResult) -> Result<()> {
    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&result)?);
        if result.success {
            return Ok(());
        }
        anyhow::bail!("{}", result.message);
    }

    if result.success {
        ctx.output.success(&result.message);
        render_data(ctx, &result);
        return Ok(());
    }

    if let Some(error) = &result.error {
        ctx.output.detail(error);
    }
    if !result.stderr.trim().is_empty() {
        eprintln!("{}", result.stderr.trim_end());
    }
    anyhow::bail!("{}", result.message)
}

/// Human rendering for the operation-specific payloads.
fn render_data(ctx: &AppContext, result: &TerraformResult) {
    if let Some(backend) = result.data.get("backend_config") {
        ctx.output.header("State backend");
        for (label, key) in [
            ("bucket", "bucket"),
            ("region", "region"),
            ("lock table", "lock_table"),
        ] {
            if let Some(value) = backend.get(key).and_then(Value::as_str) {
                ctx.output.detail(&format!("{label}: {value}"));
            }
        }
    }

    let destroyed = result.destroyed_resources();
    if !destroyed.is_empty() {
        ctx.output.header("Destroyed resources");
        for address in destroyed {
            ctx.output.detail(&address);
        }
    }

    if let Some(value) = result.data.get("resources") {
        if let Ok(entries) = serde_json::from_value::<Vec<ResourceEntry>>(value.clone()) {
            for entry in entries {
                let line = format!("{} ({})", entry.name, entry.resource_type);
                match entry.status {
                    ResourceStatus::Found => ctx.output.success(&line),
                    ResourceStatus::Managed => ctx.output.success(&format!("{line} — in state")),
                    ResourceStatus::NotFound => ctx.output.warn(&format!("{line} — not found")),
                }
            }
        }
    }
}
