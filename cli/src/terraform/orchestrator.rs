//! Bootstrap, destroy, and list-resources workflows across layers.
//!
//! Provider dispatch is a plain match on the provider tag; the two providers
//! share no implementation. Each workflow reconciles live cloud state (via
//! the [`CloudSession`] capability) with what Terraform manages, one layer at
//! a time.

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::cloud::CloudSession;
use crate::domain::{BackendConfig, CloudProvider, Layer, TerraformConfig, TerraformResult};
use crate::output::ProgressReporter;
use crate::terraform::executor::TerraformRunner;
use crate::terraform::layers::LayerOps;
use crate::terraform::workspace::WorkspaceManager;

/// Fixed IAM role reconciled into the `iam` layer.
pub const ADMIN_ROLE_NAME: &str = "groundwork-admin";

/// Terraform address of the admin role inside the `iam` layer.
pub const ADMIN_ROLE_ADDRESS: &str = "aws_iam_role.admin";

const STATE_BUCKET_PREFIX: &str = "groundwork-tf-state";

/// One row in the `list_resources` report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub resource_type: String,
    pub name: String,
    pub status: ResourceStatus,
    pub source: ResourceSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Confirmed to exist by a direct cloud API probe.
    Found,
    /// Confirmed absent by a direct cloud API probe.
    NotFound,
    /// Listed in Terraform state.
    Managed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceSource {
    CloudApi,
    TerraformState,
}

/// Top-level workflows sequencing the layers and reconciling against live
/// cloud state.
pub struct Orchestrator<'a, R: TerraformRunner, C: CloudSession> {
    config: &'a TerraformConfig,
    runner: &'a R,
    cloud: &'a C,
    reporter: &'a dyn ProgressReporter,
    workspaces: WorkspaceManager,
}

impl<'a, R: TerraformRunner, C: CloudSession> Orchestrator<'a, R, C> {
    /// # Errors
    ///
    /// Returns an error if the workspace root cannot be determined.
    pub fn new(
        config: &'a TerraformConfig,
        runner: &'a R,
        cloud: &'a C,
        reporter: &'a dyn ProgressReporter,
    ) -> Result<Self> {
        let workspaces =
            WorkspaceManager::new(config.provider, config.workspace_dir.as_deref())?;
        Ok(Self {
            config,
            runner,
            cloud,
            reporter,
            workspaces,
        })
    }

    /// Converge the backend and IAM layers; returns the backend config
    /// (bucket/region/lock table) as the durable output callers persist.
    pub async fn bootstrap(&self) -> TerraformResult {
        match self.config.provider {
            CloudProvider::Aws => match self.bootstrap_aws().await {
                Ok(result) => result,
                Err(e) => {
                    TerraformResult::failed(format!("Bootstrap failed: {e:#}"))
                        .with_error(format!("{e:#}"))
                }
            },
            CloudProvider::Gcp => TerraformResult::failed("GCP bootstrap is not supported yet"),
        }
    }

    /// Tear everything down in reverse dependency order and wipe the local
    /// workspace caches.
    pub async fn destroy(&self) -> TerraformResult {
        match self.config.provider {
            CloudProvider::Aws => match self.destroy_aws().await {
                Ok(result) => result,
                Err(e) => {
                    TerraformResult::failed(format!("Destroy failed: {e:#}"))
                        .with_error(format!("{e:#}"))
                }
            },
            CloudProvider::Gcp => TerraformResult::failed("GCP destroy is not supported yet"),
        }
    }

    /// Read-only resource report: direct cloud probes merged with the `iam`
    /// layer's state listing.
    ///
    /// The two sources are not reconciled — a resource deleted out-of-band
    /// still shows as managed in state.
    pub async fn list_resources(&self, force_clean: bool) -> TerraformResult {
        match self.config.provider {
            CloudProvider::Aws => match self.list_aws_resources(force_clean).await {
                Ok(result) => result,
                Err(e) => {
                    TerraformResult::failed(format!("Failed to list resources: {e:#}"))
                        .with_error(format!("{e:#}"))
                }
            },
            CloudProvider::Gcp => {
                TerraformResult::failed("GCP resource listing is not supported yet")
            }
        }
    }

    /// Deterministic backend resource names derived from the account id and
    /// region — bootstrap converges across runs without persisted local
    /// state.
    fn backend_names(&self, account_id: &str) -> (String, String) {
        let bucket = format!("{STATE_BUCKET_PREFIX}-{account_id}-{}", self.config.region);
        let lock_table = format!("{bucket}-locks");
        (bucket, lock_table)
    }

    /// Remote-state config for a layer, or `None` for layers that keep
    /// local state.
    fn layer_backend(
        &self,
        layer: Layer,
        bucket: &str,
        lock_table: &str,
    ) -> Option<BackendConfig> {
        layer.state_key().map(|key| BackendConfig {
            bucket: bucket.to_string(),
            key: key.to_string(),
            region: self.config.region.clone(),
            lock_table: Some(lock_table.to_string()),
        })
    }

    fn layer_ops(&self) -> LayerOps<'_, R> {
        let mut env = HashMap::new();
        if self.config.provider == CloudProvider::Aws {
            if let Some(profile) = &self.config.profile {
                env.insert("AWS_PROFILE".to_string(), profile.clone());
            }
        }
        LayerOps::new(self.runner, &self.workspaces, env)
    }

    async fn bootstrap_aws(&self) -> Result<TerraformResult> {
        self.reporter.step("Bootstrapping AWS infrastructure...");

        let account_id = self.cloud.account_id().await?;
        let (bucket, lock_table) = self.backend_names(&account_id);
        let ops = self.layer_ops();

        // The backend layer keeps local state, so the only ground truth for
        // "does the backend exist" is the cloud itself.
        let bucket_exists = self.cloud.bucket_exists(&bucket).await?;
        let table_exists = self.cloud.lock_table_exists(&lock_table).await?;
        if !(bucket_exists && table_exists) {
            self.reporter.step("Setting up terraform backend...");
            let result = ops
                .apply(
                    Layer::Backend,
                    &backend_layer_vars(&self.config.region, &bucket),
                    None,
                    false,
                )
                .await?;
            if !result.success {
                return Ok(result);
            }
        }

        self.reporter.step("Setting up IAM permissions...");
        let iam_backend = self.layer_backend(Layer::Iam, &bucket, &lock_table);
        let iam_vars = iam_layer_vars(&self.config.region);

        // A role created outside Terraform (or by an older release) is
        // imported into the layer's state before applying.
        if self.cloud.role_exists(ADMIN_ROLE_NAME).await? {
            let state = ops.list_state(Layer::Iam, iam_backend.as_ref(), false).await?;
            if !state.iter().any(|addr| addr == ADMIN_ROLE_ADDRESS) {
                self.reporter
                    .step(&format!("Importing existing role {ADMIN_ROLE_NAME}..."));
                let import = ops
                    .import(
                        Layer::Iam,
                        ADMIN_ROLE_ADDRESS,
                        ADMIN_ROLE_NAME,
                        &iam_vars,
                        iam_backend.as_ref(),
                    )
                    .await?;
                if !import.success {
                    return Ok(import);
                }
            }
        }

        // Applied even when nothing changed upstream, so drift gets
        // corrected on every bootstrap.
        let iam_result = ops
            .apply(Layer::Iam, &iam_vars, iam_backend.as_ref(), false)
            .await?;
        if !iam_result.success {
            return Ok(iam_result);
        }

        self.reporter.success("AWS infrastructure bootstrapped");
        Ok(
            TerraformResult::ok("AWS infrastructure bootstrapped successfully").with_data(
                "backend_config",
                json!({
                    "bucket": bucket,
                    "region": self.config.region,
                    "lock_table": lock_table,
                }),
            ),
        )
    }

    async fn destroy_aws(&self) -> Result<TerraformResult> {
        self.reporter.step("Destroying AWS infrastructure...");

        let account_id = self.cloud.account_id().await?;
        let (bucket, lock_table) = self.backend_names(&account_id);
        let ops = self.layer_ops();

        let mut destroyed: Vec<String> = Vec::new();

        // Reverse dependency order. The iam layer is best-effort: a failure
        // here must not leave the backend resources behind.
        let iam_backend = self.layer_backend(Layer::Iam, &bucket, &lock_table);
        match ops
            .destroy(
                Layer::Iam,
                &iam_layer_vars(&self.config.region),
                iam_backend.as_ref(),
                false,
            )
            .await
        {
            Ok(result) if result.success => destroyed.extend(result.destroyed_resources()),
            Ok(result) => self
                .reporter
                .warn(&format!("could not destroy iam layer: {}", result.message)),
            Err(e) => self
                .reporter
                .warn(&format!("could not destroy iam layer: {e:#}")),
        }

        let backend_result = ops
            .destroy(
                Layer::Backend,
                &backend_layer_vars(&self.config.region, &bucket),
                None,
                false,
            )
            .await?;
        let backend_ok = backend_result.success;
        if backend_ok {
            destroyed.extend(backend_result.destroyed_resources());
        }

        self.workspaces.wipe()?;

        let mut result = if backend_ok {
            self.reporter.success("AWS infrastructure destroyed");
            TerraformResult::ok("AWS infrastructure destroyed successfully")
        } else {
            let mut failed = TerraformResult::failed("Failed to destroy backend layer");
            failed.stdout = backend_result.stdout;
            failed.stderr = backend_result.stderr;
            failed.returncode = backend_result.returncode;
            failed
        };
        result
            .data
            .insert("destroyed_resources".to_string(), Value::from(destroyed));
        Ok(result)
    }

    async fn list_aws_resources(&self, force_clean: bool) -> Result<TerraformResult> {
        let account_id = self.cloud.account_id().await?;
        let (bucket, lock_table) = self.backend_names(&account_id);

        let mut resources = Vec::new();

        // Fast path: direct existence probes, always fresh.
        resources.push(ResourceEntry {
            resource_type: "S3 Bucket".to_string(),
            name: bucket.clone(),
            status: probe_status(self.cloud.bucket_exists(&bucket).await?),
            source: ResourceSource::CloudApi,
        });
        resources.push(ResourceEntry {
            resource_type: "DynamoDB Lock Table".to_string(),
            name: lock_table.clone(),
            status: probe_status(self.cloud.lock_table_exists(&lock_table).await?),
            source: ResourceSource::CloudApi,
        });

        // State-backed listing; may prepare or sync the iam workspace as a
        // side effect. An unreadable state is reported, not fatal.
        let ops = self.layer_ops();
        let iam_backend = self.layer_backend(Layer::Iam, &bucket, &lock_table);
        match ops
            .list_state(Layer::Iam, iam_backend.as_ref(), force_clean)
            .await
        {
            Ok(addresses) => {
                for address in addresses {
                    resources.push(ResourceEntry {
                        resource_type: state_resource_type(&address),
                        name: address,
                        status: ResourceStatus::Managed,
                        source: ResourceSource::TerraformState,
                    });
                }
            }
            Err(e) => self
                .reporter
                .warn(&format!("could not read iam layer state: {e:#}")),
        }

        Ok(
            TerraformResult::ok(format!("Found {} resources", resources.len())).with_data(
                "resources",
                serde_json::to_value(&resources).unwrap_or_else(|_| Value::Array(Vec::new())),
            ),
        )
    }
}

fn probe_status(exists: bool) -> ResourceStatus {
    if exists {
        ResourceStatus::Found
    } else {
        ResourceStatus::NotFound
    }
}

fn backend_layer_vars(region: &str, bucket: &str) -> Map<String, Value> {
    let mut vars = Map::new();
    vars.insert("region".to_string(), Value::from(region));
    vars.insert("bucket_name".to_string(), Value::from(bucket));
    vars.insert("enable_dynamodb_locking".to_string(), Value::from(true));
    vars
}

fn iam_layer_vars(region: &str) -> Map<String, Value> {
    let mut vars = Map::new();
    vars.insert("region".to_string(), Value::from(region));
    vars
}

/// Human resource-type label from a state address, e.g.
/// `aws_iam_role.admin` → `Iam Role`.
fn state_resource_type(address: &str) -> String {
    let type_part = address.split('.').next().unwrap_or(address);
    let trimmed = type_part.strip_prefix("aws_").unwrap_or(type_part);
    trimmed
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
