//! Application context — flags and output state shared by every command.

use anyhow::Result;

use crate::output::OutputContext;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or
    /// `GROUNDWORK_YES` environment variables are present.
    pub non_interactive: bool,
}

impl AppContext {
    #[must_use]
    pub fn new(json: bool, quiet: bool, no_color: bool, yes: bool) -> Self {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("GROUNDWORK_YES").is_ok();
        Self {
            output: OutputContext::new(no_color, quiet),
            mode: if json {
                OutputMode::Json
            } else {
                OutputMode::Human
            },
            non_interactive: yes || ci_env,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Whether streamed terraform output should be echoed to the terminal.
    #[must_use]
    pub fn echo_terraform(&self) -> bool {
        !self.is_json() && !self.output.quiet
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true`, returns `default` immediately
    /// without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}
