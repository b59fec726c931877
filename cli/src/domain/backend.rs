//! Remote-state backend configuration and its generated HCL.

use serde::{Deserialize, Serialize};

/// Name of the generated backend file within a workspace.
pub const BACKEND_FILE_NAME: &str = "_backend.tf";

/// Identifies one Terraform remote-state location.
///
/// Distinct layers share the bucket and lock table but use different `key`
/// values (state file paths within the bucket).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub bucket: String,
    pub key: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_table: Option<String>,
}

impl BackendConfig {
    /// Render the `_backend.tf` contents.
    ///
    /// The output is a pure function of the fields — byte-for-byte identical
    /// for equal configs — because workspace reinitialization decisions
    /// compare this text against the file on disk.
    #[must_use]
    pub fn render(&self) -> String {
        let mut content = format!(
            "terraform {{\n  backend \"s3\" {{\n    bucket = \"{}\"\n    key    = \"{}\"\n    region = \"{}\"\n",
            self.bucket, self.key, self.region
        );
        if let Some(table) = &self.lock_table {
            content.push_str(&format!("    dynamodb_table = \"{table}\"\n"));
        }
        content.push_str("  }\n}\n");
        content
    }
}
