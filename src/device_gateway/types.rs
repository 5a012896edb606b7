//! Device gateway type definitions

use serde::Serialize;

/// Why an invocation did not produce a normal exit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// Process ran to completion (any exit code)
    None,
    /// Process could not be started (executable missing, permissions, ...)
    SpawnError { message: String },
    /// Process exceeded the gateway timeout and was killed
    Timeout {
        #[serde(rename = "timeoutMs")]
        timeout_ms: u64,
    },
}

/// Outcome of one external command invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalProcessOutcome {
    /// Exit code; None if the process never exited normally (spawn error, timeout, signal)
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub failure: FailureKind,
}

impl ExternalProcessOutcome {
    /// Outcome for a process that could not be started
    pub fn spawn_error(message: impl Into<String>) -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            failure: FailureKind::SpawnError {
                message: message.into(),
            },
        }
    }

    /// Outcome for a process killed after the timeout
    pub fn timeout(timeout_ms: u64) -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            failure: FailureKind::Timeout { timeout_ms },
        }
    }

    /// Outcome for a process that exited on its own
    pub fn exited(exit_code: Option<i32>, stdout: String, stderr: String) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            failure: FailureKind::None,
        }
    }

    /// Ran to completion with exit code 0
    pub fn is_success(&self) -> bool {
        self.failure == FailureKind::None && self.exit_code == Some(0)
    }

    /// stderr if non-empty, otherwise stdout
    pub fn diagnostic_output(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}
