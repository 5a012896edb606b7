//! CaptureOrchestrator - One photo per request
//!
//! ## Responsibilities
//!
//! - Serialize captures through the CaptureGuard
//! - Allocate a unique `photo-<epoch-ms>.jpg` name
//! - Mock mode: write the placeholder JPEG
//! - Real mode: run `<camera_cmd> --capture-image-and-download --filename=<path>`
//! - Publish atomically: stage as `.<name>.part`, rename into place on success
//!
//! ## Flow
//!
//! ```text
//! acquire slot -> ensure dir -> allocate name -> write staging file
//!   -> (ok) rename -> CaptureResult
//!   -> (err / cancelled) staging file removed on drop -> Error
//! ```

mod types;

pub use types::*;

use crate::capture_guard::CaptureGuard;
use crate::device_gateway::{DeviceGateway, FailureKind};
use crate::error::{Error, Result};
use crate::photo_catalog::public_path;
use crate::state::AppConfig;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

const CAPTURE_ARG: &str = "--capture-image-and-download";

/// CaptureOrchestrator instance
pub struct CaptureOrchestrator {
    gateway: Arc<dyn DeviceGateway>,
    photos_dir: PathBuf,
    camera_cmd: String,
    use_mock: bool,
    capture_timeout: Duration,
    guard: CaptureGuard,
    /// Last issued millisecond stamp; names are strictly increasing
    last_stamp: AtomicI64,
}

impl CaptureOrchestrator {
    pub fn new(config: &AppConfig, gateway: Arc<dyn DeviceGateway>) -> Self {
        Self {
            gateway,
            photos_dir: config.photos_dir.clone(),
            camera_cmd: config.camera_cmd.clone(),
            use_mock: config.use_mock,
            capture_timeout: config.capture_timeout,
            guard: CaptureGuard::new(config.capture_wait),
            last_stamp: AtomicI64::new(0),
        }
    }

    /// Whether a capture is currently running
    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Take one photo
    pub async fn capture(&self) -> Result<CaptureResult> {
        let _lease = self.guard.acquire().await?;

        fs::create_dir_all(&self.photos_dir)
            .await
            .map_err(|e| Error::fs("create photo directory", e))?;

        let filename = self.allocate_filename().await?;
        let storage_path = self.photos_dir.join(&filename);
        // removed on every exit path except a successful rename, including
        // a dropped future (client disconnect)
        let staging = StagingFile::new(self.photos_dir.join(format!(".{}.part", filename)));

        if self.use_mock {
            write_placeholder(staging.path()).await?;
        } else {
            self.run_device_capture(staging.path()).await?;
        }

        fs::rename(staging.path(), &storage_path)
            .await
            .map_err(|e| Error::fs("publish captured photo", e))?;
        staging.disarm();

        let result = CaptureResult {
            public_path: public_path(&filename),
            filename,
            storage_path,
            created_at: Utc::now(),
            is_mock: self.use_mock,
        };

        tracing::info!(
            filename = %result.filename,
            mock = result.is_mock,
            "Photo captured"
        );

        Ok(result)
    }

    /// Next stamp: wall-clock millis, but always past the last one issued
    fn next_stamp(&self, now_ms: i64) -> i64 {
        let prev = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now_ms.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now_ms.max(prev + 1)
    }

    /// Unique name in the photo directory (also survives clock steps across restarts)
    async fn allocate_filename(&self) -> Result<String> {
        let mut stamp = self.next_stamp(Utc::now().timestamp_millis());
        loop {
            let filename = format!("photo-{}.jpg", stamp);
            let taken = fs::try_exists(self.photos_dir.join(&filename))
                .await
                .map_err(|e| Error::fs("check photo name", e))?;
            if !taken {
                return Ok(filename);
            }
            tracing::debug!(filename = %filename, "Photo name taken, bumping stamp");
            stamp = self.next_stamp(stamp + 1);
        }
    }

    /// Let the camera tool write straight to `target`
    async fn run_device_capture(&self, target: &Path) -> Result<()> {
        let args = [
            CAPTURE_ARG.to_string(),
            format!("--filename={}", target.display()),
        ];

        let outcome = self
            .gateway
            .invoke(&self.camera_cmd, &args, self.capture_timeout)
            .await;

        match outcome.failure {
            FailureKind::SpawnError { ref message } => {
                return Err(Error::DeviceUnavailable(message.clone()));
            }
            FailureKind::Timeout { timeout_ms } => {
                return Err(Error::DeviceTimeout {
                    timeout_ms,
                    outcome,
                });
            }
            FailureKind::None => {}
        }

        if !outcome.is_success() {
            let exit_code = outcome.exit_code;
            let output = outcome.diagnostic_output().to_string();
            tracing::warn!(
                command = %self.camera_cmd,
                exit_code = ?exit_code,
                output = %output,
                "Camera capture failed"
            );
            return Err(Error::DeviceCommand {
                exit_code,
                output,
                outcome,
            });
        }

        Ok(())
    }
}

async fn write_placeholder(target: &Path) -> Result<()> {
    let bytes = placeholder_jpeg()?;
    fs::write(target, &bytes)
        .await
        .map_err(|e| Error::fs("write placeholder photo", e))
}

/// Staging file of an in-flight capture - removed on drop unless disarmed
struct StagingFile {
    path: PathBuf,
    armed: bool,
}

impl StagingFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// The file was published; keep nothing to clean up
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed partial capture");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove partial capture");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_gateway::ExternalProcessOutcome;
    use crate::photo_catalog::PhotoCatalog;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Stand-in for the camera tool: optionally writes the --filename target
    struct StubCamera {
        exit_code: i32,
        stderr: String,
        writes_file: bool,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StubCamera {
        fn succeeding() -> Arc<Self> {
            Arc::new(Self {
                exit_code: 0,
                stderr: String::new(),
                writes_file: true,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(stderr: &str) -> Arc<Self> {
            Arc::new(Self {
                exit_code: 1,
                stderr: stderr.to_string(),
                writes_file: true,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DeviceGateway for StubCamera {
        async fn invoke(
            &self,
            _command: &str,
            args: &[String],
            _timeout: Duration,
        ) -> ExternalProcessOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(args[0], CAPTURE_ARG);
            if self.writes_file {
                let target = args[1].trim_start_matches("--filename=");
                std::fs::write(target, b"\xFF\xD8camera\xFF\xD9").unwrap();
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            ExternalProcessOutcome::exited(
                Some(self.exit_code),
                String::new(),
                self.stderr.clone(),
            )
        }
    }

    /// Gateway returning a canned outcome without touching the disk
    struct CannedGateway(ExternalProcessOutcome);

    #[async_trait]
    impl DeviceGateway for CannedGateway {
        async fn invoke(
            &self,
            _command: &str,
            _args: &[String],
            _timeout: Duration,
        ) -> ExternalProcessOutcome {
            self.0.clone()
        }
    }

    fn config(dir: &Path, use_mock: bool) -> AppConfig {
        AppConfig {
            photos_dir: dir.to_path_buf(),
            use_mock,
            ..Default::default()
        }
    }

    fn is_photo_name(name: &str) -> bool {
        name.strip_prefix("photo-")
            .and_then(|rest| rest.strip_suffix(".jpg"))
            .map(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_mock_capture_writes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = StubCamera::succeeding();
        let orchestrator = CaptureOrchestrator::new(&config(dir.path(), true), gateway.clone());

        let placeholder = placeholder_jpeg().unwrap();
        for _ in 0..3 {
            let result = orchestrator.capture().await.unwrap();
            assert!(result.is_mock);
            assert!(is_photo_name(&result.filename));
            assert_eq!(result.public_path, format!("/photos/{}", result.filename));
            assert_eq!(std::fs::read(&result.storage_path).unwrap(), placeholder);
        }

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        // back-to-back captures never share a name, and no staging files remain
        assert_eq!(dir_names(dir.path()).len(), 3);
    }

    #[tokio::test]
    async fn test_capture_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let photos_dir = dir.path().join("photos");
        let orchestrator =
            CaptureOrchestrator::new(&config(&photos_dir, true), StubCamera::succeeding());

        let result = orchestrator.capture().await.unwrap();
        assert!(result.storage_path.starts_with(&photos_dir));
        assert!(result.storage_path.is_file());
    }

    #[tokio::test]
    async fn test_real_capture_success() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = StubCamera::succeeding();
        let orchestrator = CaptureOrchestrator::new(&config(dir.path(), false), gateway.clone());

        let result = orchestrator.capture().await.unwrap();

        assert!(!result.is_mock);
        assert!(is_photo_name(&result.filename));
        assert_eq!(
            std::fs::read(&result.storage_path).unwrap(),
            b"\xFF\xD8camera\xFF\xD9"
        );
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert_eq!(dir_names(dir.path()), [result.filename]);
    }

    #[tokio::test]
    async fn test_real_capture_failure_reports_stderr_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = CaptureOrchestrator::new(
            &config(dir.path(), false),
            StubCamera::failing("*** Error: Could not detect any camera"),
        );

        let err = orchestrator.capture().await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("code 1"));
        assert!(msg.contains("Could not detect any camera"));
        assert!(matches!(err, Error::DeviceCommand { exit_code: Some(1), .. }));
        // partial output from the failed run is not left behind
        assert!(dir_names(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_failure_message_falls_back_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = CaptureOrchestrator::new(
            &config(dir.path(), false),
            Arc::new(CannedGateway(ExternalProcessOutcome::exited(
                Some(2),
                "PTP I/O error\n".to_string(),
                String::new(),
            ))),
        );

        let msg = orchestrator.capture().await.unwrap_err().to_string();
        assert!(msg.contains("code 2"));
        assert!(msg.contains("PTP I/O error"));
    }

    #[tokio::test]
    async fn test_signal_killed_tool_reports_null_code() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = CaptureOrchestrator::new(
            &config(dir.path(), false),
            Arc::new(CannedGateway(ExternalProcessOutcome::exited(
                None,
                String::new(),
                "Killed".to_string(),
            ))),
        );

        let err = orchestrator.capture().await.unwrap_err();
        assert!(matches!(err, Error::DeviceCommand { exit_code: None, .. }));
        assert!(err.to_string().contains("code null: Killed"));
    }

    #[tokio::test]
    async fn test_cancelled_capture_removes_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(StubCamera {
            exit_code: 0,
            stderr: String::new(),
            writes_file: true,
            delay: Duration::from_secs(5),
            calls: AtomicUsize::new(0),
        });
        let orchestrator = CaptureOrchestrator::new(&config(dir.path(), false), gateway.clone());

        // the tool has written its output and is still running when the request goes away
        let result = tokio::time::timeout(Duration::from_millis(200), orchestrator.capture()).await;

        assert!(result.is_err());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert!(dir_names(dir.path()).is_empty());
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_spawn_error_is_device_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = CaptureOrchestrator::new(
            &config(dir.path(), false),
            Arc::new(CannedGateway(ExternalProcessOutcome::spawn_error(
                "No such file or directory (os error 2)",
            ))),
        );

        let err = orchestrator.capture().await.unwrap_err();
        assert!(matches!(err, Error::DeviceUnavailable(_)));
        assert!(err.outcome().is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_device_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = CaptureOrchestrator::new(
            &config(dir.path(), false),
            Arc::new(CannedGateway(ExternalProcessOutcome::timeout(30_000))),
        );

        let err = orchestrator.capture().await.unwrap_err();
        assert!(matches!(err, Error::DeviceTimeout { timeout_ms: 30_000, .. }));
    }

    #[tokio::test]
    async fn test_zero_exit_without_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = CaptureOrchestrator::new(
            &config(dir.path(), false),
            Arc::new(CannedGateway(ExternalProcessOutcome::exited(
                Some(0),
                String::new(),
                String::new(),
            ))),
        );

        let err = orchestrator.capture().await.unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }

    #[tokio::test]
    async fn test_overlapping_capture_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(StubCamera {
            exit_code: 0,
            stderr: String::new(),
            writes_file: true,
            delay: Duration::from_millis(300),
            calls: AtomicUsize::new(0),
        });
        let orchestrator = Arc::new(CaptureOrchestrator::new(
            &config(dir.path(), false),
            gateway.clone(),
        ));

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.capture().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(orchestrator.is_busy());

        let second = orchestrator.capture().await;
        assert!(matches!(second, Err(Error::CaptureInProgress)));

        assert!(first.await.unwrap().is_ok());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert_eq!(dir_names(dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_mock_captures_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig {
            capture_wait: Duration::from_secs(5),
            ..config(dir.path(), true)
        };
        let orchestrator = CaptureOrchestrator::new(&cfg, StubCamera::succeeding());

        let (a, b) = tokio::join!(orchestrator.capture(), orchestrator.capture());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.filename, b.filename);
        assert_eq!(dir_names(dir.path()).len(), 2);
    }

    #[tokio::test]
    async fn test_existing_file_name_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            CaptureOrchestrator::new(&config(dir.path(), true), StubCamera::succeeding());

        // occupy the next few milliseconds worth of names
        let now = Utc::now().timestamp_millis();
        for offset in 0..50 {
            std::fs::write(dir.path().join(format!("photo-{}.jpg", now + offset)), b"old").unwrap();
        }

        let result = orchestrator.capture().await.unwrap();
        assert_eq!(
            std::fs::read(&result.storage_path).unwrap(),
            placeholder_jpeg().unwrap()
        );
        assert_eq!(dir_names(dir.path()).len(), 51);
    }

    #[tokio::test]
    async fn test_capture_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            CaptureOrchestrator::new(&config(dir.path(), true), StubCamera::succeeding());
        let catalog = PhotoCatalog::new(dir.path().to_path_buf());

        let result = orchestrator.capture().await.unwrap();
        let photos = catalog.list_photos().await.unwrap();

        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].filename, result.filename);
        assert_eq!(photos[0].public_path, result.public_path);
        assert_eq!(
            photos[0].size_bytes,
            placeholder_jpeg().unwrap().len() as u64
        );
    }
}
