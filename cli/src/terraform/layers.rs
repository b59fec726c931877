//! Layer operations — apply, destroy, import, and state listing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::domain::{BackendConfig, Layer, TerraformResult};
use crate::terraform::executor::TerraformRunner;
use crate::terraform::workspace::WorkspaceManager;

/// Transient variables file name within a workspace.
pub const VARS_FILE_NAME: &str = "terraform.tfvars.json";

/// Terraform's marker for an import of an already-managed resource.
const ALREADY_IN_STATE: &str = "already in state";

/// Terraform's marker for an empty state listing.
const NO_RESOURCES_IN_STATE: &str = "No resources found";

/// Scoped `terraform.tfvars.json` — written on creation, removed on drop, so
/// the variables never outlive the operation that needed them, success or
/// failure.
struct VarsFile {
    path: PathBuf,
}

impl VarsFile {
    fn write(workspace: &Path, variables: &Map<String, Value>) -> Result<Self> {
        let path = workspace.join(VARS_FILE_NAME);
        let contents =
            serde_json::to_string_pretty(variables).context("serializing terraform variables")?;
        std::fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(Self { path })
    }
}

impl Drop for VarsFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Drives apply/destroy/import/state-list for single layers against prepared
/// workspaces.
pub struct LayerOps<'a, R: TerraformRunner> {
    runner: &'a R,
    workspaces: &'a WorkspaceManager,
    env: HashMap<String, String>,
}

impl<'a, R: TerraformRunner> LayerOps<'a, R> {
    #[must_use]
    pub fn new(
        runner: &'a R,
        workspaces: &'a WorkspaceManager,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            runner,
            workspaces,
            env,
        }
    }

    /// Apply a layer and collect its outputs into `data.outputs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be prepared or the runner
    /// rejects the invocation; an apply that runs and fails comes back as a
    /// failed result.
    pub async fn apply(
        &self,
        layer: Layer,
        variables: &Map<String, Value>,
        backend: Option<&BackendConfig>,
        force_clean: bool,
    ) -> Result<TerraformResult> {
        let workspace = self
            .workspaces
            .prepare(self.runner, layer, backend, force_clean, &self.env)
            .await?;
        let _vars = VarsFile::write(&workspace, variables)?;

        let apply = self
            .runner
            .execute(
                &["apply", "-auto-approve", "-var-file", VARS_FILE_NAME],
                &workspace,
                &self.env,
                false,
            )
            .await?;
        if !apply.success {
            let mut failed = TerraformResult::failed(format!("Failed to apply {layer}"));
            failed.stdout = apply.stdout;
            failed.stderr = apply.stderr;
            failed.returncode = apply.returncode;
            return Ok(failed);
        }

        // The infrastructure change already succeeded; unparseable outputs
        // degrade to an empty map instead of failing the apply.
        let output = self
            .runner
            .execute(&["output", "-json"], &workspace, &self.env, true)
            .await?;
        let outputs = if output.success {
            serde_json::from_str::<Value>(output.stdout.trim())
                .unwrap_or_else(|_| Value::Object(Map::new()))
        } else {
            Value::Object(Map::new())
        };

        Ok(TerraformResult::ok(format!("Successfully applied {layer}"))
            .with_data("outputs", outputs))
    }

    /// Destroy a layer.
    ///
    /// The state is listed *before* destroying so the result can report
    /// exactly which resource addresses were removed — they no longer exist
    /// afterward to query.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be prepared or the runner
    /// rejects the invocation.
    pub async fn destroy(
        &self,
        layer: Layer,
        variables: &Map<String, Value>,
        backend: Option<&BackendConfig>,
        force_clean: bool,
    ) -> Result<TerraformResult> {
        let workspace = self
            .workspaces
            .prepare(self.runner, layer, backend, force_clean, &self.env)
            .await?;
        let _vars = VarsFile::write(&workspace, variables)?;

        let resources = self.state_resources(&workspace).await.unwrap_or_default();

        let destroy = self
            .runner
            .execute(
                &["destroy", "-auto-approve", "-var-file", VARS_FILE_NAME],
                &workspace,
                &self.env,
                false,
            )
            .await?;
        if !destroy.success {
            let mut failed = TerraformResult::failed(format!("Failed to destroy {layer}"));
            failed.stdout = destroy.stdout;
            failed.stderr = destroy.stderr;
            failed.returncode = destroy.returncode;
            return Ok(failed);
        }

        Ok(
            TerraformResult::ok(format!("Successfully destroyed {layer}"))
                .with_data("destroyed_resources", Value::from(resources)),
        )
    }

    /// Import an existing resource into the layer's state.
    ///
    /// Terraform import is not idempotent on its own — importing a resource
    /// that is already managed exits non-zero. That outcome is normalized to
    /// a successful no-op here, with no second attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be prepared or the runner
    /// rejects the invocation.
    pub async fn import(
        &self,
        layer: Layer,
        address: &str,
        resource_id: &str,
        variables: &Map<String, Value>,
        backend: Option<&BackendConfig>,
    ) -> Result<TerraformResult> {
        let workspace = self
            .workspaces
            .prepare(self.runner, layer, backend, false, &self.env)
            .await?;
        let _vars = VarsFile::write(&workspace, variables)?;

        let import = self
            .runner
            .execute(
                &["import", "-var-file", VARS_FILE_NAME, address, resource_id],
                &workspace,
                &self.env,
                false,
            )
            .await?;
        if import.success {
            return Ok(TerraformResult::ok(format!(
                "Imported {resource_id} into {address}"
            )));
        }
        if import.output().contains(ALREADY_IN_STATE) {
            return Ok(TerraformResult::ok(format!(
                "{address} is already managed; no import needed"
            )));
        }

        let mut failed = TerraformResult::failed(format!("Failed to import {address}"));
        failed.stdout = import.stdout;
        failed.stderr = import.stderr;
        failed.returncode = import.returncode;
        Ok(failed)
    }

    /// Resource addresses currently in the layer's state, in `state list`
    /// order. An empty or absent state yields an empty list, never an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be prepared or the state
    /// cannot be read for any other reason.
    pub async fn list_state(
        &self,
        layer: Layer,
        backend: Option<&BackendConfig>,
        force_clean: bool,
    ) -> Result<Vec<String>> {
        let workspace = self
            .workspaces
            .prepare(self.runner, layer, backend, force_clean, &self.env)
            .await?;
        self.state_resources(&workspace).await
    }

    async fn state_resources(&self, workspace: &Path) -> Result<Vec<String>> {
        let listing = self
            .runner
            .execute(&["state", "list"], workspace, &self.env, true)
            .await?;

        if listing.success {
            return Ok(parse_addresses(&listing.stdout));
        }
        if listing.output().contains(NO_RESOURCES_IN_STATE)
            || listing.output().trim().is_empty()
        {
            return Ok(Vec::new());
        }
        anyhow::bail!("terraform state list failed: {}", listing.output().trim())
    }
}

fn parse_addresses(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}
