//! Subprocess execution behind a narrow trait so tests can use canned output.

use anyhow::{Context, Result};
use tracing::debug;

/// What a finished command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// stdout and stderr, interleaved in the order the command wrote them.
    pub output: String,
    /// None when the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl ExecutionOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs one shell command to completion.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Err means the command could not be started at all.
    async fn run(&self, command: &str) -> Result<ExecutionOutcome>;
}

/// Runs commands through `sh -c` with stderr merged into stdout.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

#[async_trait::async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<ExecutionOutcome> {
        // `exec 2>&1` points the shell's stderr at the stdout pipe before the
        // command starts, so both streams land in one buffer in write order.
        let script = format!("exec 2>&1\n{command}");
        let output = tokio::process::Command::new(&self.shell)
            .arg("-c")
            .arg(&script)
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .with_context(|| format!("failed to execute '{}' via {}", command, self.shell))?;

        let outcome = ExecutionOutcome {
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
            exit_code: output.status.code(),
        };
        debug!(
            command,
            exit_code = ?outcome.exit_code,
            bytes = outcome.output.len(),
            "command finished"
        );
        Ok(outcome)
    }
}
