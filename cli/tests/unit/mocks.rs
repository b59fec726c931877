//! Shared mock infrastructure for unit tests.
//!
//! Provides a scripted [`TerraformRunner`] and a canned [`CloudSession`] so
//! each test file doesn't re-define the same boilerplate.

#![allow(dead_code)] // Not every helper is used by every test module
#![allow(clippy::expect_used)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use groundwork_cli::cloud::CloudSession;
use groundwork_cli::domain::TerraformResult;
use groundwork_cli::terraform::executor::TerraformRunner;

/// One recorded terraform invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub args: Vec<String>,
    pub dir: PathBuf,
    pub capture: bool,
    /// Whether `terraform.tfvars.json` existed in the workspace at call time.
    pub vars_present: bool,
}

impl RecordedCall {
    pub fn subcommand(&self) -> &str {
        self.args.first().map_or("", String::as_str)
    }

    /// `state list` and `workspace`-style two-word keys, plain subcommand
    /// otherwise.
    pub fn key(&self) -> String {
        match self.args.as_slice() {
            [first, second, ..] if first == "state" => format!("{first} {second}"),
            [first, ..] => first.clone(),
            [] => String::new(),
        }
    }
}

enum Canned {
    Result(TerraformResult),
    Error(String),
}

/// Records every invocation and pops canned responses per command key;
/// commands with no queued response succeed with empty output.
pub struct ScriptedRunner {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<HashMap<String, Vec<Canned>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(HashMap::new()),
        }
    }

    /// Queue a canned result for the next invocation matching `key`
    /// (`"init"`, `"apply"`, `"state list"`, ...).
    pub fn enqueue(&self, key: &str, result: TerraformResult) {
        self.responses
            .lock()
            .expect("lock")
            .entry(key.to_string())
            .or_default()
            .push(Canned::Result(result));
    }

    /// Queue a runner-level error (as opposed to a failed result) for the
    /// next invocation matching `key`.
    pub fn enqueue_error(&self, key: &str, message: &str) {
        self.responses
            .lock()
            .expect("lock")
            .entry(key.to_string())
            .or_default()
            .push(Canned::Error(message.to_string()));
    }

    /// Queue a successful result whose stdout is `stdout`.
    pub fn enqueue_stdout(&self, key: &str, stdout: &str) {
        let mut result = TerraformResult::ok(format!("terraform {key} completed"));
        result.stdout = stdout.to_string();
        self.enqueue(key, result);
    }

    /// Queue a failed result carrying `output` on stdout.
    pub fn enqueue_failure(&self, key: &str, output: &str) {
        let mut result = TerraformResult::failed(format!("terraform {key} failed"));
        result.stdout = output.to_string();
        result.returncode = 1;
        self.enqueue(key, result);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn calls_with_key(&self, key: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.key() == key)
            .collect()
    }

    /// Calls matching `key` whose workspace directory ends with `dir_suffix`.
    pub fn calls_in_dir(&self, key: &str, dir_suffix: &str) -> Vec<RecordedCall> {
        self.calls_with_key(key)
            .into_iter()
            .filter(|c| c.dir.to_string_lossy().ends_with(dir_suffix))
            .collect()
    }

    /// Index of the first call matching `key`, if any.
    pub fn first_index(&self, key: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.key() == key)
    }
}

impl TerraformRunner for ScriptedRunner {
    async fn execute(
        &self,
        args: &[&str],
        working_dir: &Path,
        _env_overrides: &HashMap<String, String>,
        capture_output: bool,
    ) -> Result<TerraformResult> {
        let call = RecordedCall {
            args: args.iter().map(ToString::to_string).collect(),
            dir: working_dir.to_path_buf(),
            capture: capture_output,
            vars_present: working_dir.join("terraform.tfvars.json").exists(),
        };
        let key = call.key();
        self.calls.lock().expect("lock").push(call);

        let mut responses = self.responses.lock().expect("lock");
        if let Some(queue) = responses.get_mut(&key) {
            if !queue.is_empty() {
                match queue.remove(0) {
                    Canned::Result(result) => return Ok(result),
                    Canned::Error(message) => anyhow::bail!("{message}"),
                }
            }
        }
        Ok(TerraformResult::ok(format!("terraform {key} completed")))
    }
}

/// Cloud session with fixed answers.
pub struct CannedCloud {
    pub account: String,
    pub bucket: bool,
    pub table: bool,
    pub role: bool,
}

impl CannedCloud {
    pub fn new(bucket: bool, table: bool, role: bool) -> Self {
        Self {
            account: "123456789012".to_string(),
            bucket,
            table,
            role,
        }
    }
}

impl CloudSession for CannedCloud {
    async fn account_id(&self) -> Result<String> {
        Ok(self.account.clone())
    }

    async fn bucket_exists(&self, _name: &str) -> Result<bool> {
        Ok(self.bucket)
    }

    async fn lock_table_exists(&self, _name: &str) -> Result<bool> {
        Ok(self.table)
    }

    async fn role_exists(&self, _name: &str) -> Result<bool> {
        Ok(self.role)
    }
}

/// Reporter that swallows everything (re-exported for convenience).
pub use groundwork_cli::output::SilentReporter;
