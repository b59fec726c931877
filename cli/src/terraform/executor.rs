//! Validated Terraform command execution.
//!
//! Every invocation is checked against a subcommand allow-list and scanned
//! for shell metacharacters before a process is spawned. The process itself
//! never goes through a shell — arguments are passed as a discrete list.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::domain::{ExecError, TerraformResult};

/// Hard wall-clock limit for captured-mode commands.
pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Terraform subcommands this tool is allowed to invoke.
const ALLOWED_SUBCOMMANDS: [&str; 14] = [
    "init",
    "apply",
    "destroy",
    "refresh",
    "output",
    "state",
    "plan",
    "validate",
    "workspace",
    "import",
    "taint",
    "untaint",
    "force-unlock",
    "console",
];

/// Characters rejected in every argument and env override. A second line of
/// defense against argument injection on top of the no-shell spawn.
const SHELL_METACHARACTERS: [char; 16] = [
    ';', '&', '|', '>', '<', '`', '$', '(', ')', '{', '}', '[', ']', '\\', '"', '\'',
];

/// Runs a validated Terraform subcommand against a working directory.
///
/// Implementations either stream output line-by-line (apply/destroy/init) or
/// capture it with a hard timeout (output/state list). Test doubles return
/// canned results without spawning processes.
#[allow(async_fn_in_trait)]
pub trait TerraformRunner {
    /// Execute `terraform <args...>` with `cwd` set to `working_dir` and the
    /// environment augmented with `env_overrides`.
    ///
    /// # Errors
    ///
    /// Returns an error for rejected invocations ([`ExecError`]); execution
    /// failures (non-zero exit, timeout, spawn failure) come back as an `Ok`
    /// result with `success == false`.
    async fn execute(
        &self,
        args: &[&str],
        working_dir: &Path,
        env_overrides: &HashMap<String, String>,
        capture_output: bool,
    ) -> Result<TerraformResult>;
}

/// Production runner — spawns the cached Terraform binary via tokio.
pub struct TerraformExecutor {
    binary_path: PathBuf,
    echo: bool,
}

impl TerraformExecutor {
    #[must_use]
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            echo: true,
        }
    }

    /// Control line-by-line echo of streamed output (off for quiet/JSON).
    #[must_use]
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }
}

impl TerraformRunner for TerraformExecutor {
    async fn execute(
        &self,
        args: &[&str],
        working_dir: &Path,
        env_overrides: &HashMap<String, String>,
        capture_output: bool,
    ) -> Result<TerraformResult> {
        validate_args(args)?;
        validate_working_dir(working_dir)?;
        validate_env(env_overrides)?;

        let mut command = tokio::process::Command::new(&self.binary_path);
        command
            .args(args)
            .current_dir(working_dir)
            .envs(env_overrides)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let label = describe(args);
        if capture_output {
            Ok(run_captured(command, &label).await)
        } else {
            Ok(run_streaming(command, &label, self.echo).await)
        }
    }
}

fn validate_args(args: &[&str]) -> Result<(), ExecError> {
    let subcommand = args.first().copied().unwrap_or_default();
    if !ALLOWED_SUBCOMMANDS.contains(&subcommand) {
        return Err(ExecError::SubcommandNotAllowed(subcommand.to_string()));
    }
    for arg in args {
        if arg.contains(&SHELL_METACHARACTERS[..]) {
            return Err(ExecError::UnsafeArgument((*arg).to_string()));
        }
    }
    Ok(())
}

fn validate_working_dir(dir: &Path) -> Result<(), ExecError> {
    if dir.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(ExecError::UnsafeWorkingDir(dir.to_path_buf()));
    }
    if dir.is_symlink() {
        return Err(ExecError::UnsafeWorkingDir(dir.to_path_buf()));
    }
    if !dir.exists() {
        return Err(ExecError::MissingWorkingDir(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ExecError::NotADirectory(dir.to_path_buf()));
    }
    Ok(())
}

fn validate_env(env: &HashMap<String, String>) -> Result<(), ExecError> {
    for (key, value) in env {
        if key.contains(&SHELL_METACHARACTERS[..]) || value.contains(&SHELL_METACHARACTERS[..]) {
            return Err(ExecError::UnsafeEnvOverride(key.clone()));
        }
    }
    Ok(())
}

/// Human label for a command, e.g. `terraform state list`.
fn describe(args: &[&str]) -> String {
    match args {
        [first, second, ..] if *first == "state" || *first == "workspace" => {
            format!("terraform {first} {second}")
        }
        [first, ..] => format!("terraform {first}"),
        [] => "terraform".to_string(),
    }
}

fn exit_result(label: &str, status: std::process::ExitStatus, stdout: String, stderr: String) -> TerraformResult {
    let mut result = if status.success() {
        TerraformResult::ok(format!("{label} completed"))
    } else {
        TerraformResult::failed(format!("{label} failed"))
    };
    result.stdout = stdout;
    result.stderr = stderr;
    result.returncode = status.code().unwrap_or(-1);
    result
}

fn spawn_failure(label: &str, error: &std::io::Error) -> TerraformResult {
    let mut result = TerraformResult::failed(format!("{label} failed"))
        .with_error(error.to_string());
    result.stderr = format!("failed to execute terraform: {error}");
    result.returncode = -1;
    result
}

/// Run to completion with buffered output and a hard timeout.
///
/// `tokio::time::timeout` around `.output().await` does not kill the child
/// when the timer fires on all platforms — the future is dropped but the OS
/// process keeps running — so this uses `select!` with an explicit kill. A
/// timed-out command reports `returncode == -1` and no partial output is
/// trusted.
async fn run_captured(mut command: tokio::process::Command, label: &str) -> TerraformResult {
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return spawn_failure(label, &e),
    };

    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();

    // Drain stdout/stderr concurrently with wait(); a child writing more
    // than the OS pipe buffer would otherwise block forever against wait().
    tokio::select! {
        (status, stdout, stderr) = async {
            tokio::join!(
                child.wait(),
                read_to_string(&mut stdout_pipe),
                read_to_string(&mut stderr_pipe),
            )
        } => {
            match status {
                Ok(status) => exit_result(label, status, stdout, stderr),
                Err(e) => spawn_failure(label, &e),
            }
        }
        () = tokio::time::sleep(CAPTURE_TIMEOUT) => {
            let _ = child.kill().await;
            let mut result = TerraformResult::failed(format!("{label} timed out"));
            result.stderr = format!(
                "{label} timed out after {} minutes",
                CAPTURE_TIMEOUT.as_secs() / 60
            );
            result.returncode = -1;
            result
        }
    }
}

/// Stream output line-by-line as it arrives; no timeout.
///
/// A long-running apply must be allowed to finish or fail on its own —
/// killing it mid-flight risks an inconsistent state file.
async fn run_streaming(
    mut command: tokio::process::Command,
    label: &str,
    echo: bool,
) -> TerraformResult {
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return spawn_failure(label, &e),
    };

    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let (status, stdout, stderr) = tokio::join!(
        child.wait(),
        stream_lines(stdout_pipe, echo, false),
        stream_lines(stderr_pipe, echo, true),
    );

    match status {
        Ok(status) => exit_result(label, status, stdout, stderr),
        Err(e) => spawn_failure(label, &e),
    }
}

async fn read_to_string(pipe: &mut Option<impl AsyncRead + Unpin>) -> String {
    let mut buf = Vec::new();
    if let Some(pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    String::from_utf8_lossy(&buf).into_owned()
}

async fn stream_lines(pipe: Option<impl AsyncRead + Unpin>, echo: bool, to_stderr: bool) -> String {
    let mut collected = String::new();
    let Some(pipe) = pipe else {
        return collected;
    };
    let mut lines = BufReader::new(pipe).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if echo {
            if to_stderr {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
        collected.push_str(&line);
        collected.push('\n');
    }
    collected
}
