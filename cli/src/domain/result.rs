//! The single result type returned by every terraform operation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unified result for all terraform operations.
///
/// `data` carries operation-specific payloads (`outputs`,
/// `destroyed_resources`, `backend_config`, `resources`) instead of a
/// distinct result type per operation; callers know which keys to expect for
/// a given call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformResult {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Human-readable result message.
    pub message: String,
    /// Captured command output.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    /// Captured command error output.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    /// Process exit code; `-1` when no exit code was observed.
    #[serde(default)]
    pub returncode: i32,
    /// Operation-specific payload.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
    /// Detailed error information, when the operation failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TerraformResult {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            stdout: String::new(),
            stderr: String::new(),
            returncode: 0,
            data: Map::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::ok(message)
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Combined output for display — stdout when present, stderr otherwise.
    #[must_use]
    pub fn output(&self) -> &str {
        if self.stdout.is_empty() {
            &self.stderr
        } else {
            &self.stdout
        }
    }

    /// Resource addresses removed by a destroy operation.
    #[must_use]
    pub fn destroyed_resources(&self) -> Vec<String> {
        self.data
            .get("destroyed_resources")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
