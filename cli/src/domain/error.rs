//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

// ── Executor validation errors ────────────────────────────────────────────────

/// Rejected terraform invocations.
///
/// These indicate a programming error in the caller, not an environment
/// problem: they are raised before any process is spawned and are never
/// retried or ignored.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("terraform subcommand '{0}' is not allowed")]
    SubcommandNotAllowed(String),

    #[error("argument contains shell metacharacters: {0}")]
    UnsafeArgument(String),

    #[error("environment override contains shell metacharacters: {0}")]
    UnsafeEnvOverride(String),

    #[error("working directory does not exist: {0}")]
    MissingWorkingDir(PathBuf),

    #[error("working directory is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("working directory path is not allowed: {0}")]
    UnsafeWorkingDir(PathBuf),
}

// ── Binary provisioning errors ────────────────────────────────────────────────

/// Failures while resolving the terraform executable.
///
/// `Download` is a connection-level failure a caller may retry;
/// `UnsupportedPlatform` and `CorruptArchive` are fatal.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("unsupported platform: {os}-{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("failed to download terraform {version}: {reason}")]
    Download { version: String, reason: String },

    #[error("downloaded terraform archive is invalid: {reason}")]
    CorruptArchive { reason: String },
}
