//! HTTP response bodies
//!
//! Field names follow the booth client that consumes this API.

use crate::photo_catalog::PhotoEntry;
use crate::readiness_prober::ReadinessStatus;
use serde::Serialize;

/// `GET /api/health`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub ready: bool,
    pub mock: bool,
    pub camera_command: String,
    pub photos_dir: String,
    /// True while a capture holds the capture slot
    pub capturing: bool,
    pub detail: ReadinessStatus,
}

/// `GET /api/photos`
#[derive(Debug, Clone, Serialize)]
pub struct PhotosResponse {
    pub photos: Vec<PhotoEntry>,
}
