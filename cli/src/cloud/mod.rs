//! Cloud session capability — account identity and existence probes.
//!
//! The terraform workflows consume cloud access through this narrow trait.
//! The production adapter drives the `aws` CLI through a command-runner
//! seam; SDK-level concerns stay behind that process boundary.

pub mod aws;
pub mod runner;

pub use aws::AwsCliSession;
pub use runner::{CommandRunner, TokioCommandRunner};

use anyhow::Result;

/// An authenticated cloud session capable of identity and existence checks.
#[allow(async_fn_in_trait)]
pub trait CloudSession {
    /// Account id of the authenticated principal.
    async fn account_id(&self) -> Result<String>;
    /// Whether the named bucket exists.
    async fn bucket_exists(&self, name: &str) -> Result<bool>;
    /// Whether the named lock table exists.
    async fn lock_table_exists(&self, name: &str) -> Result<bool>;
    /// Whether the named IAM role exists.
    async fn role_exists(&self, name: &str) -> Result<bool>;
}
