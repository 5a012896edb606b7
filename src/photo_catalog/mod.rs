//! PhotoCatalog - The photo directory as the catalog
//!
//! ## Responsibilities
//!
//! - Enumerate image files (.jpg / .jpeg / .png, any case) in the photo directory
//! - Derive size and creation time from filesystem metadata
//! - Return entries newest first
//!
//! Nothing is cached: every listing is a fresh scan. Creation time is the
//! file birth time where the filesystem records one, otherwise the inode
//! change time, so ordering is only as good as the filesystem's timestamps.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::Metadata;
use std::path::PathBuf;
use tokio::fs;

/// URL prefix under which the photo directory is served
pub const PHOTOS_URL_PREFIX: &str = "/photos";

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];

/// One photo in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoEntry {
    pub filename: String,
    #[serde(rename = "url")]
    pub public_path: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "size")]
    pub size_bytes: u64,
}

/// Public URL path of a stored photo
pub fn public_path(filename: &str) -> String {
    format!("{}/{}", PHOTOS_URL_PREFIX, filename)
}

/// Whether a file name carries a recognised image extension
pub fn is_image_file(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Birth time, falling back to the metadata change time
fn creation_time(meta: &Metadata) -> Option<DateTime<Utc>> {
    if let Ok(birth) = meta.created() {
        return Some(DateTime::<Utc>::from(birth));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let nanos = u32::try_from(meta.ctime_nsec()).unwrap_or(0);
        DateTime::from_timestamp(meta.ctime(), nanos)
    }

    #[cfg(not(unix))]
    {
        meta.modified().ok().map(DateTime::<Utc>::from)
    }
}

/// Newest first; ties keep their enumeration order
pub(crate) fn sort_newest_first(entries: &mut [PhotoEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// PhotoCatalog instance
pub struct PhotoCatalog {
    photos_dir: PathBuf,
}

impl PhotoCatalog {
    pub fn new(photos_dir: PathBuf) -> Self {
        Self { photos_dir }
    }

    /// List photos, newest first
    ///
    /// Fails only when the directory itself cannot be created or read.
    /// Entries that vanish or cannot be stat'ed mid-scan are skipped.
    pub async fn list_photos(&self) -> Result<Vec<PhotoEntry>> {
        fs::create_dir_all(&self.photos_dir)
            .await
            .map_err(|e| Error::Catalog(e.to_string()))?;

        let mut dir = fs::read_dir(&self.photos_dir)
            .await
            .map_err(|e| Error::Catalog(e.to_string()))?;

        let mut photos = Vec::new();
        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => return Err(Error::Catalog(e.to_string())),
            };

            let filename = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if !is_image_file(&filename) {
                continue;
            }

            // follows symlinks, like a static file server would
            let meta = match fs::metadata(entry.path()).await {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::warn!(filename = %filename, error = %e, "Skipping unreadable photo");
                    continue;
                }
            };
            if !meta.is_file() {
                continue;
            }

            let Some(created_at) = creation_time(&meta) else {
                tracing::warn!(filename = %filename, "Skipping photo without usable timestamp");
                continue;
            };

            photos.push(PhotoEntry {
                public_path: public_path(&filename),
                filename,
                created_at,
                size_bytes: meta.len(),
            });
        }

        sort_newest_first(&mut photos);

        tracing::debug!(
            photos_dir = %self.photos_dir.display(),
            count = photos.len(),
            "Photo catalog scanned"
        );

        Ok(photos)
    }
}
