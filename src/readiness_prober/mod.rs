//! ReadinessProber - Is a camera attached and addressable?
//!
//! Runs `<camera_cmd> --auto-detect` and looks for a known device in the
//! listing. In mock mode the probe is skipped entirely.

use crate::device_gateway::{DeviceGateway, FailureKind};
use crate::state::AppConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Auto-detect argument understood by gphoto2-compatible tools
const AUTO_DETECT_ARG: &str = "--auto-detect";

/// Tokens (lowercase) that mark a detected device in the auto-detect listing
const DEVICE_TOKENS: &[&str] = &["canon", "usb"];

/// Readiness snapshot, recomputed on every health query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessStatus {
    pub ready: bool,
    pub mock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Listing mentioned a device token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReadinessStatus {
    fn mock() -> Self {
        Self {
            ready: true,
            mock: true,
            message: Some("Using mock camera".to_string()),
            ..Default::default()
        }
    }

    fn failed(error: String) -> Self {
        Self {
            ready: false,
            mock: false,
            error: Some(error),
            ..Default::default()
        }
    }
}

/// Whether an auto-detect listing names a device
pub fn listing_mentions_device(stdout: &str) -> bool {
    let lower = stdout.to_lowercase();
    DEVICE_TOKENS.iter().any(|token| lower.contains(token))
}

/// ReadinessProber instance
pub struct ReadinessProber {
    gateway: Arc<dyn DeviceGateway>,
    camera_cmd: String,
    use_mock: bool,
    probe_timeout: Duration,
}

impl ReadinessProber {
    pub fn new(config: &AppConfig, gateway: Arc<dyn DeviceGateway>) -> Self {
        Self {
            gateway,
            camera_cmd: config.camera_cmd.clone(),
            use_mock: config.use_mock,
            probe_timeout: config.probe_timeout,
        }
    }

    /// Probe the camera
    ///
    /// Ready only when the probe exits 0 AND the listing names a device.
    /// Probe failures come back as `ready: false`, never as an error.
    pub async fn check_readiness(&self) -> ReadinessStatus {
        if self.use_mock {
            return ReadinessStatus::mock();
        }

        let outcome = self
            .gateway
            .invoke(
                &self.camera_cmd,
                &[AUTO_DETECT_ARG.to_string()],
                self.probe_timeout,
            )
            .await;

        match &outcome.failure {
            FailureKind::SpawnError { message } => {
                tracing::debug!(command = %self.camera_cmd, error = %message, "Readiness probe could not start");
                return ReadinessStatus::failed(message.clone());
            }
            FailureKind::Timeout { timeout_ms } => {
                return ReadinessStatus::failed(format!(
                    "Camera probe timed out after {}ms",
                    timeout_ms
                ));
            }
            FailureKind::None => {}
        }

        let detected = listing_mentions_device(&outcome.stdout);
        let ready = outcome.exit_code == Some(0) && detected;

        tracing::debug!(
            command = %self.camera_cmd,
            exit_code = ?outcome.exit_code,
            detected = detected,
            ready = ready,
            "Readiness probe finished"
        );

        ReadinessStatus {
            ready,
            mock: false,
            message: None,
            detected: Some(detected),
            stdout: Some(outcome.stdout.trim().to_string()),
            stderr: Some(outcome.stderr.trim().to_string()),
            exit_code: outcome.exit_code,
            error: None,
        }
    }
}
