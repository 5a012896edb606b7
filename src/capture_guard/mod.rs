//! CaptureGuard - one capture at a time
//!
//! ## Purpose
//!
//! - Serialize captures: the camera and the photo directory have one writer
//! - Optionally wait a bounded time for the in-flight capture to finish
//! - Reject with `CaptureInProgress` when the slot stays taken

use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;

/// Single-slot capture lock
pub struct CaptureGuard {
    slot: Arc<Mutex<()>>,
    /// Wait before rejecting (zero = reject immediately)
    wait_timeout: Duration,
}

impl CaptureGuard {
    pub fn new(wait_timeout: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(())),
            wait_timeout,
        }
    }

    /// Take the capture slot
    ///
    /// - Free slot: granted immediately
    /// - Busy slot: waits up to `wait_timeout`, then `CaptureInProgress`
    /// - The returned lease releases the slot on drop
    pub async fn acquire(&self) -> Result<CaptureLease> {
        if let Some(lease) = self.try_acquire() {
            return Ok(lease);
        }

        if self.wait_timeout.is_zero() {
            tracing::warn!("Capture rejected - another capture is in progress");
            return Err(Error::CaptureInProgress);
        }

        match timeout(self.wait_timeout, self.slot.clone().lock_owned()).await {
            Ok(guard) => {
                tracing::debug!("Capture slot acquired after wait");
                Ok(CaptureLease { _guard: guard })
            }
            Err(_) => {
                tracing::warn!(
                    wait_ms = self.wait_timeout.as_millis(),
                    "Capture rejected - slot still busy after wait"
                );
                Err(Error::CaptureInProgress)
            }
        }
    }

    /// Take the capture slot without waiting
    pub fn try_acquire(&self) -> Option<CaptureLease> {
        match self.slot.clone().try_lock_owned() {
            Ok(guard) => {
                tracing::debug!("Capture slot acquired");
                Some(CaptureLease { _guard: guard })
            }
            Err(_) => None,
        }
    }

    /// Whether a capture currently holds the slot
    pub fn is_busy(&self) -> bool {
        self.slot.try_lock().is_err()
    }
}

/// Capture slot lease - released on drop
pub struct CaptureLease {
    _guard: OwnedMutexGuard<()>,
}

impl Drop for CaptureLease {
    fn drop(&mut self) {
        tracing::debug!("Capture slot released");
    }
}
