//! Capture type definitions

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// 8x8 baseline JPEG written in mock mode so the UI flow works without a camera
const PLACEHOLDER_JPEG_B64: &str = "/9j/4AAQSkZJRgABAQAAAQABAAD/2wBDABALCwsMCxQNDQ0VEBISFhUVFRUYGBgVFRYVFRUYFxgYGBgYGBgYGBgYGBgYGBgYGBgYGBgYGBj/2wBDAQwNDQ0UExYUFxgYGBgYGBgYGBgYGBgYGBgYGBgYGBgYGBgYGBgYGBgYGBgYGBgYGBgYGBj/wAARCAAIAAgDASIAAhEBAxEB/8QAFQABAQAAAAAAAAAAAAAAAAAAAAb/xAAUEAEAAAAAAAAAAAAAAAAAAAAA/8QAFQEBAQAAAAAAAAAAAAAAAAAAAwT/xAAUEQEAAAAAAAAAAAAAAAAAAAAA/9oADAMBAAIRAxEAPwCfAAH/2Q==";

/// Bytes of the mock-mode placeholder image
pub fn placeholder_jpeg() -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(PLACEHOLDER_JPEG_B64)
        .map_err(|e| Error::Internal(format!("placeholder image decode failed: {}", e)))
}

/// A finished capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    /// `photo-<epoch-ms>.jpg`, unique within the photo directory
    pub filename: String,
    #[serde(rename = "filepath")]
    pub storage_path: PathBuf,
    #[serde(rename = "url")]
    pub public_path: String,
    /// Wall clock at capture time
    pub created_at: DateTime<Utc>,
    #[serde(rename = "mock")]
    pub is_mock: bool,
}
