//! Error handling for the photo booth server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::device_gateway::ExternalProcessOutcome;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Another capture holds the capture slot
    #[error("Capture already in progress")]
    CaptureInProgress,

    /// External capture tool could not be started
    #[error("Camera command unavailable: {0}")]
    DeviceUnavailable(String),

    /// External capture tool ran and exited non-zero, or was killed by a signal
    #[error("Camera command failed with code {}: {output}", exit_code_label(.exit_code))]
    DeviceCommand {
        /// None when the process was terminated without an exit code
        exit_code: Option<i32>,
        /// stderr if non-empty, else stdout
        output: String,
        outcome: ExternalProcessOutcome,
    },

    /// External capture tool did not finish in time and was killed
    #[error("Camera command timed out after {timeout_ms}ms")]
    DeviceTimeout {
        timeout_ms: u64,
        outcome: ExternalProcessOutcome,
    },

    /// Photo directory or artifact I/O failure
    #[error("Filesystem error ({context}): {source}")]
    Filesystem {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Photo directory could not be listed
    #[error("Failed to read photos: {0}")]
    Catalog(String),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn exit_code_label(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => code.to_string(),
        None => "null".to_string(),
    }
}

impl Error {
    /// Wrap an I/O error with a short description of what was being done
    pub fn fs(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Filesystem {
            context: context.into(),
            source,
        }
    }

    /// Process outcome attached to device failures, if any
    pub fn outcome(&self) -> Option<&ExternalProcessOutcome> {
        match self {
            Error::DeviceCommand { outcome, .. } | Error::DeviceTimeout { outcome, .. } => {
                Some(outcome)
            }
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::CaptureInProgress => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, message = %message, "Request error");
        } else {
            tracing::warn!(status = %status, message = %message, "Request rejected");
        }

        let body = match self.outcome() {
            Some(outcome) => json!({ "error": message, "details": outcome }),
            None => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}
