//! Running saved commands through the host shell.
//!
//! The store never interprets a command string; it hands it to a
//! [`CommandRunner`], which either waits for the shell to exit or launches
//! it and returns immediately.

use std::process::{Command, Stdio};

/// Environment variable overriding the shell prefix, e.g. `bash -lc`.
pub const SHELL_ENV: &str = "LAZYRUN_SHELL";

/// Whether the caller waits for a launched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Wait,
    /// Spawn and return at once. The child is never waited on, so a
    /// long-lived embedder keeps one zombie per finished launch until it
    /// exits. The CLI exits right after launching, which reaps them.
    Detach,
}

/// What happened to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Ran to completion; `None` when terminated by a signal.
    Exited(Option<i32>),
    /// Launched without waiting.
    Detached,
    /// Could not be launched.
    Failed(String),
}

impl RunOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exited(Some(0)) | Self::Detached)
    }
}

/// One command of a batch and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub name: String,
    pub cmd: String,
    pub outcome: RunOutcome,
}

/// Executes command strings.
pub trait CommandRunner {
    /// Run `cmd`, waiting for it or not according to `mode`.
    ///
    /// # Errors
    ///
    /// Returns the launch error if the command could not be started.
    fn run(&self, cmd: &str, mode: RunMode) -> std::io::Result<RunOutcome>;
}

/// Runs commands as `<program> <args...> <cmd>`, by default `sh -c <cmd>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellRunner {
    program: String,
    args: Vec<String>,
}

impl Default for ShellRunner {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                program: "cmd".to_string(),
                args: vec!["/C".to_string()],
            }
        } else {
            Self {
                program: "sh".to_string(),
                args: vec!["-c".to_string()],
            }
        }
    }
}

impl ShellRunner {
    /// Build from a whitespace-separated prefix such as `/bin/zsh -l -c`.
    ///
    /// Returns `None` for an empty prefix.
    #[must_use]
    pub fn with_prefix(prefix: &str) -> Option<Self> {
        let mut parts = prefix.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// `$LAZYRUN_SHELL` if set and non-empty, else the platform default.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(SHELL_ENV)
            .ok()
            .and_then(|prefix| Self::with_prefix(&prefix))
            .unwrap_or_default()
    }

    fn command(&self, cmd: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(cmd);
        command
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, cmd: &str, mode: RunMode) -> std::io::Result<RunOutcome> {
        let mut command = self.command(cmd);
        match mode {
            RunMode::Wait => {
                let status = command.status()?;
                Ok(RunOutcome::Exited(status.code()))
            }
            RunMode::Detach => {
                // Detached children must not compete for the terminal's input.
                command.stdin(Stdio::null()).spawn()?;
                Ok(RunOutcome::Detached)
            }
        }
    }
}
