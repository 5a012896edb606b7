//! DeviceGateway - External camera CLI invocation
//!
//! ## Responsibilities
//!
//! - Run the camera command-line tool as a child process (stdin closed)
//! - Capture stdout/stderr and the exit code
//! - Bound every invocation with a timeout; the child is killed when it expires
//! - Report spawn failures and timeouts as outcomes, never as errors

mod types;

pub use types::*;

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Seam between the camera logic and the operating system's process table
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    /// Run `command` with `args`, waiting at most `timeout` for it to exit
    async fn invoke(&self, command: &str, args: &[String], timeout: Duration)
        -> ExternalProcessOutcome;
}

/// Gateway backed by real child processes
#[derive(Debug, Default, Clone)]
pub struct ProcessGateway;

impl ProcessGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeviceGateway for ProcessGateway {
    /// Uses kill_on_drop(true): when the timeout fires (or the calling request
    /// is dropped) the Child is dropped and the process receives SIGKILL.
    async fn invoke(
        &self,
        command: &str,
        args: &[String],
        timeout: Duration,
    ) -> ExternalProcessOutcome {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        let child = match Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(command = %command, error = %e, "Camera command spawn failed");
                return ExternalProcessOutcome::spawn_error(e.to_string());
            }
        };

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let outcome = ExternalProcessOutcome::exited(
                    output.status.code(),
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                );
                tracing::debug!(
                    command = %command,
                    exit_code = ?outcome.exit_code,
                    stdout_len = outcome.stdout.len(),
                    stderr_len = outcome.stderr.len(),
                    "Camera command finished"
                );
                outcome
            }
            Ok(Err(e)) => {
                // Spawned, but waiting on it failed
                tracing::warn!(command = %command, error = %e, "Camera command execution failed");
                ExternalProcessOutcome::spawn_error(e.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    command = %command,
                    timeout_ms = timeout_ms,
                    "Camera command timeout, process killed via kill_on_drop"
                );
                ExternalProcessOutcome::timeout(timeout_ms)
            }
        }
    }
}
