//! The fixed Terraform layers this tool ships, in dependency order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named, bundled Terraform source directory.
///
/// `Backend` must exist before any layer that keys its remote state under it,
/// so [`Layer::ALL`] iterates in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// S3 state bucket and DynamoDB lock table.
    Backend,
    /// Admin IAM role and its policy attachments.
    Iam,
}

impl Layer {
    /// All layers in dependency order.
    pub const ALL: [Self; 2] = [Self::Backend, Self::Iam];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Iam => "iam",
        }
    }

    /// Directory name of the bundled `.tf` sources for this layer.
    #[must_use]
    pub fn source_dir(self) -> &'static str {
        match self {
            Self::Backend => "00-backend",
            Self::Iam => "01-iam",
        }
    }

    /// Workspace-relative directory the layer is materialized into.
    #[must_use]
    pub fn workspace_dir(self) -> &'static str {
        self.source_dir()
    }

    /// State file path within the remote-state bucket, for layers that store
    /// their state remotely. The backend layer itself keeps local state — it
    /// cannot point at a bucket it has not created yet.
    #[must_use]
    pub fn state_key(self) -> Option<&'static str> {
        match self {
            Self::Backend => None,
            Self::Iam => Some("iam/terraform.tfstate"),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
