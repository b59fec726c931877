//! Workspace materialization and the full-reinit vs incremental-sync decision.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::assets;
use crate::domain::backend::BACKEND_FILE_NAME;
use crate::domain::{BackendConfig, CloudProvider, Layer};
use crate::terraform::executor::TerraformRunner;

/// How a workspace gets initialized.
///
/// `Sync` may transition to `Full` exactly once, on failure; `Full` is
/// terminal. Explicit states keep the single-retry guarantee visible here
/// instead of buried in error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitStrategy {
    /// Wipe the directory, re-copy sources, write the backend file, run
    /// plain `init`.
    Full,
    /// Keep the existing directory, run `init -upgrade=false`.
    Sync,
}

/// Materializes per-layer working directories and keeps them initialized.
///
/// The workspace cache is the only shared mutable resource in the tool and
/// is not safe for concurrent callers — single process, one invocation at a
/// time.
pub struct WorkspaceManager {
    provider: CloudProvider,
    root: PathBuf,
}

impl WorkspaceManager {
    /// Manager rooted at the override directory when given, otherwise
    /// `~/.groundwork/workspaces/<provider>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new(provider: CloudProvider, workspace_dir: Option<&Path>) -> Result<Self> {
        let root = match workspace_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?
                .join(".groundwork")
                .join("workspaces")
                .join(provider.as_str()),
        };
        Ok(Self { provider, root })
    }

    /// Directory a layer's workspace lives in.
    #[must_use]
    pub fn workspace_path(&self, layer: Layer) -> PathBuf {
        self.root.join(layer.workspace_dir())
    }

    /// Prepare `layer`'s workspace: materialized, backend-configured, and
    /// `init`-ed, ready for apply/destroy.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be materialized, or if
    /// `init` fails after a full reinitialization — there is no further
    /// fallback past that point.
    pub async fn prepare(
        &self,
        runner: &impl TerraformRunner,
        layer: Layer,
        backend: Option<&BackendConfig>,
        force_clean: bool,
        env: &HashMap<String, String>,
    ) -> Result<PathBuf> {
        let path = self.workspace_path(layer);

        let strategy = if force_clean || self.needs_full_initialization(&path, layer, backend) {
            InitStrategy::Full
        } else {
            InitStrategy::Sync
        };

        if strategy == InitStrategy::Sync {
            let sync = runner
                .execute(&["init", "-upgrade=false"], &path, env, false)
                .await?;
            if sync.success {
                return Ok(path);
            }
            // Sync -> Full is the only retry; the full path below is terminal.
        }

        self.materialize_clean(&path, layer, backend)?;
        let init = runner.execute(&["init"], &path, env, false).await?;
        if !init.success {
            anyhow::bail!(
                "failed to initialize {layer} workspace: {}",
                init.output().trim()
            );
        }
        Ok(path)
    }

    /// Decide between a cheap `init -upgrade=false` sync and a full rebuild.
    ///
    /// Full reinitialization whenever the workspace is missing or invalid,
    /// the remote-state target changed (a quick init cannot reliably
    /// re-point it), or the materialized sources no longer match the bundled
    /// ones.
    #[must_use]
    pub fn needs_full_initialization(
        &self,
        path: &Path,
        layer: Layer,
        backend: Option<&BackendConfig>,
    ) -> bool {
        !workspace_valid(path) || backend_changed(path, backend) || self.sources_stale(path, layer)
    }

    /// The bundled `.tf` sources must all be present in the workspace with
    /// identical content; any drift forces a rebuild.
    fn sources_stale(&self, path: &Path, layer: Layer) -> bool {
        let Ok(sources) = assets::layer_sources(self.provider, layer) else {
            return true;
        };
        sources
            .iter()
            .any(|(name, contents)| match fs::read(path.join(name)) {
                Ok(bytes) => bytes != *contents,
                Err(_) => true,
            })
    }

    /// Delete the workspace entirely and rebuild it from the bundled
    /// sources. No partial reuse.
    fn materialize_clean(
        &self,
        path: &Path,
        layer: Layer,
        backend: Option<&BackendConfig>,
    ) -> Result<()> {
        if path.exists() {
            fs::remove_dir_all(path)
                .with_context(|| format!("removing workspace {}", path.display()))?;
        }
        fs::create_dir_all(path)
            .with_context(|| format!("creating workspace {}", path.display()))?;

        for (name, contents) in assets::layer_sources(self.provider, layer)? {
            fs::write(path.join(name), contents)
                .with_context(|| format!("writing {name} into {}", path.display()))?;
        }

        if let Some(backend) = backend {
            fs::write(path.join(BACKEND_FILE_NAME), backend.render())
                .with_context(|| format!("writing {BACKEND_FILE_NAME} into {}", path.display()))?;
        }

        Ok(())
    }

    /// Remove every workspace for this provider. An already-absent directory
    /// is not an error.
    pub fn wipe(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)
                .with_context(|| format!("removing workspaces {}", self.root.display()))?;
        }
        Ok(())
    }
}

fn workspace_valid(path: &Path) -> bool {
    path.exists() && path.join(".terraform").exists() && has_tf_files(path)
}

fn has_tf_files(path: &Path) -> bool {
    fs::read_dir(path).is_ok_and(|entries| {
        entries
            .flatten()
            .any(|e| e.path().extension().is_some_and(|ext| ext == "tf"))
    })
}

/// Whether the existing backend file matches what would be generated now.
///
/// No expected backend but a file on disk also counts as changed — the
/// workspace must stop pointing at remote state.
fn backend_changed(path: &Path, backend: Option<&BackendConfig>) -> bool {
    let backend_file = path.join(BACKEND_FILE_NAME);
    let Some(backend) = backend else {
        return backend_file.exists();
    };
    let Ok(existing) = fs::read_to_string(&backend_file) else {
        return true;
    };
    existing.trim() != backend.render().trim()
}
