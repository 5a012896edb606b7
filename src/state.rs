//! Application state
//!
//! Holds the startup configuration and the shared components

use crate::capture_orchestrator::CaptureOrchestrator;
use crate::device_gateway::DeviceGateway;
use crate::error::{Error, Result};
use crate::photo_catalog::PhotoCatalog;
use crate::readiness_prober::ReadinessProber;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Application configuration
///
/// Read once at startup and handed to each component; nothing reads the
/// environment after this.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Photo storage directory (absolute)
    pub photos_dir: PathBuf,
    /// Camera CLI tool (gphoto2-compatible)
    pub camera_cmd: String,
    /// Write a placeholder image instead of talking to a camera
    pub use_mock: bool,
    /// Upper bound for one capture invocation
    pub capture_timeout: Duration,
    /// Upper bound for one readiness probe
    pub probe_timeout: Duration,
    /// How long a capture waits for an in-flight capture (zero = reject immediately)
    pub capture_wait: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            photos_dir: PathBuf::from("photos"),
            camera_cmd: "gphoto2".to_string(),
            use_mock: false,
            capture_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(10),
            capture_wait: Duration::ZERO,
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let launch_dir = std::env::current_dir()
            .map_err(|e| Error::Config(format!("cannot resolve current directory: {}", e)))?;
        let photos_dir = resolve_photos_dir(
            std::env::var("PHOTOS_DIR").map(PathBuf::from).ok(),
            &defaults.photos_dir,
            &launch_dir,
        );

        let camera_cmd = std::env::var("CAMERA_CMD").unwrap_or(defaults.camera_cmd);
        if camera_cmd.trim().is_empty() {
            return Err(Error::Config("CAMERA_CMD must not be empty".to_string()));
        }

        Ok(Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT", defaults.port),
            photos_dir,
            camera_cmd,
            use_mock: std::env::var("USE_MOCK_CAMERA")
                .map(|v| v == "true")
                .unwrap_or(defaults.use_mock),
            capture_timeout: Duration::from_secs(env_parse(
                "CAMERA_TIMEOUT_SEC",
                defaults.capture_timeout.as_secs(),
            )),
            probe_timeout: Duration::from_secs(env_parse(
                "CAMERA_PROBE_TIMEOUT_SEC",
                defaults.probe_timeout.as_secs(),
            )),
            capture_wait: Duration::from_millis(env_parse(
                "CAPTURE_WAIT_MS",
                u64::try_from(defaults.capture_wait.as_millis()).unwrap_or(0),
            )),
        })
    }

    /// Listen address (host:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parse<T: FromStr + std::fmt::Display + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key = %key, value = %raw, default = %default, "Invalid value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// ReadinessProber (health)
    pub prober: Arc<ReadinessProber>,
    /// CaptureOrchestrator (capture)
    pub orchestrator: Arc<CaptureOrchestrator>,
    /// PhotoCatalog (listing)
    pub catalog: Arc<PhotoCatalog>,
}

impl AppState {
    /// Wire all components against one gateway
    pub fn new(config: AppConfig, gateway: Arc<dyn DeviceGateway>) -> Self {
        let prober = Arc::new(ReadinessProber::new(&config, gateway.clone()));
        let orchestrator = Arc::new(CaptureOrchestrator::new(&config, gateway));
        let catalog = Arc::new(PhotoCatalog::new(config.photos_dir.clone()));

        Self {
            config,
            prober,
            orchestrator,
            catalog,
        }
    }
}

/// Absolute photo directory
///
/// Relative values (including the `photos` default) are taken relative to the
/// directory the service is launched from, so a booth started from its
/// install directory keeps its photos beside it.
fn resolve_photos_dir(configured: Option<PathBuf>, default: &Path, launch_dir: &Path) -> PathBuf {
    let dir = configured.unwrap_or_else(|| default.to_path_buf());
    if dir.is_absolute() {
        dir
    } else {
        launch_dir.join(dir)
    }
}
