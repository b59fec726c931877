//! Embedded Terraform layer sources, compiled into the binary.
//!
//! At compile time, `include_dir!` embeds everything under `assets/terraform/`:
//! one directory of `.tf` files per provider layer, e.g.
//! `aws/layers/00-backend/main.tf`. Workspaces are materialized from these
//! bundles, never from files on the host.

use anyhow::{Result, anyhow};
use include_dir::{Dir, include_dir};

use crate::domain::{CloudProvider, Layer};

/// All bundled layer sources, compiled in at build time.
static LAYER_SOURCES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets/terraform");

/// The bundled `.tf` files for one layer as `(file name, contents)` pairs,
/// in stable (alphabetical) order.
///
/// # Errors
///
/// Returns an error if no sources are bundled for the provider/layer pair.
pub fn layer_sources(
    provider: CloudProvider,
    layer: Layer,
) -> Result<Vec<(&'static str, &'static [u8])>> {
    let dir_path = format!("{}/layers/{}", provider.as_str(), layer.source_dir());
    let dir = LAYER_SOURCES.get_dir(&dir_path).ok_or_else(|| {
        anyhow!("no bundled terraform sources for {provider} layer '{layer}'")
    })?;

    let mut files: Vec<(&'static str, &'static [u8])> = dir
        .files()
        .filter(|f| f.path().extension().is_some_and(|ext| ext == "tf"))
        .filter_map(|f| {
            f.path()
                .file_name()
                .and_then(|n| n.to_str())
                .map(|name| (name, f.contents()))
        })
        .collect();
    files.sort_by_key(|(name, _)| *name);
    Ok(files)
}
