//! Operation configuration — provider, region, and optional settings.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported cloud providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Gcp,
}

impl CloudProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Gcp => "gcp",
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloudProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws" => Ok(Self::Aws),
            "gcp" => Ok(Self::Gcp),
            other => Err(format!(
                "Provider '{other}' is not supported. Supported providers: 'aws', 'gcp'"
            )),
        }
    }
}

/// Unified configuration for all terraform operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerraformConfig {
    /// Target cloud provider.
    pub provider: CloudProvider,
    /// Target cloud region.
    pub region: String,
    /// Provider profile (AWS profile name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// GCP project ID; required when `provider` is GCP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Override for the workspace cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_dir: Option<PathBuf>,
}

impl TerraformConfig {
    /// Returns every violated rule, or an empty list when the config is
    /// valid. Callers get the full picture in one pass instead of fixing
    /// violations one at a time.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.region.trim().is_empty() {
            errors.push("Region is required".to_string());
        }

        if self.provider == CloudProvider::Gcp
            && self.project_id.as_deref().is_none_or(|p| p.trim().is_empty())
        {
            errors.push("project_id is required for GCP".to_string());
        }

        errors
    }
}
