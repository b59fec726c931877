//! Pure domain types.
//!
//! This module has zero imports from `crate::terraform`, `crate::cloud`,
//! `crate::commands`, `tokio`, `std::fs`, or `std::process`. Everything here
//! is constructible and testable without touching the outside world.

pub mod backend;
pub mod config;
pub mod error;
pub mod layer;
pub mod result;

pub use backend::BackendConfig;
pub use config::{CloudProvider, TerraformConfig};
pub use error::{ExecError, ProvisionError};
pub use layer::Layer;
pub use result::TerraformResult;
