//! AWS session adapter — identity and existence probes via the `aws` CLI.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::cloud::CloudSession;
use crate::cloud::runner::{CommandRunner, TokioCommandRunner};

/// Production session backed by the `aws` CLI.
///
/// Probes run as `aws <service> <op> --output json`; exit status and parsed
/// JSON drive the answers. Construction verifies credentials up front so
/// that later probe failures mean "missing resource", not "missing login".
pub struct AwsCliSession<R: CommandRunner> {
    runner: R,
    profile: Option<String>,
    region: String,
}

impl AwsCliSession<TokioCommandRunner> {
    /// Create a session and verify its credentials with STS.
    ///
    /// # Errors
    ///
    /// Returns an error if the `aws` CLI is unavailable or the credentials
    /// do not resolve to an account identity.
    pub async fn connect(profile: Option<&str>, region: &str) -> Result<Self> {
        let session = Self::with_runner(TokioCommandRunner::default(), profile, region);
        session.account_id().await.context(
            "AWS credentials check failed. Run 'aws configure' or pass --profile with a configured profile",
        )?;
        Ok(session)
    }
}

impl<R: CommandRunner> AwsCliSession<R> {
    /// Session over an explicit runner (used in tests).
    #[must_use]
    pub fn with_runner(runner: R, profile: Option<&str>, region: &str) -> Self {
        Self {
            runner,
            profile: profile.map(ToString::to_string),
            region: region.to_string(),
        }
    }

    async fn aws(&self, args: &[&str]) -> Result<std::process::Output> {
        let mut full: Vec<&str> = args.to_vec();
        full.extend_from_slice(&["--output", "json"]);
        if let Some(profile) = &self.profile {
            full.extend_from_slice(&["--profile", profile]);
        }
        full.extend_from_slice(&["--region", &self.region]);
        self.runner
            .run("aws", &full)
            .await
            .context("failed to run aws CLI")
    }

    /// Existence probe: exit 0 means the resource exists; any non-zero exit
    /// is treated as absent.
    async fn probe(&self, args: &[&str]) -> Result<bool> {
        let output = self.aws(args).await?;
        Ok(output.status.success())
    }
}

impl<R: CommandRunner> CloudSession for AwsCliSession<R> {
    async fn account_id(&self) -> Result<String> {
        let output = self.aws(&["sts", "get-caller-identity"]).await?;
        if !output.status.success() {
            anyhow::bail!(
                "could not resolve AWS account identity: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let value: Value = serde_json::from_slice(&output.stdout)
            .context("parsing sts get-caller-identity output")?;
        parse_account_id(&value)
            .map(ToString::to_string)
            .ok_or_else(|| anyhow::anyhow!("sts get-caller-identity returned no Account field"))
    }

    async fn bucket_exists(&self, name: &str) -> Result<bool> {
        self.probe(&["s3api", "head-bucket", "--bucket", name]).await
    }

    async fn lock_table_exists(&self, name: &str) -> Result<bool> {
        self.probe(&["dynamodb", "describe-table", "--table-name", name])
            .await
    }

    async fn role_exists(&self, name: &str) -> Result<bool> {
        self.probe(&["iam", "get-role", "--role-name", name]).await
    }
}

/// Extract the account id from `sts get-caller-identity` JSON.
///
/// Returns `None` if the JSON structure is invalid or the field is missing.
#[must_use]
pub fn parse_account_id(json: &Value) -> Option<&str> {
    json.get("Account")?.as_str()
}
