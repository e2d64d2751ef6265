//! Poster image storage
//!
//! Uploaded posters are written to the uploads directory under a generated
//! unique name and referenced from the table by their public URL path.

use axum::body::Bytes;
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// URL prefix under which stored posters are served
pub const PUBLIC_PREFIX: &str = "/api/uploads/";

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// A poster accepted from a form but not yet written to disk
#[derive(Debug, Clone)]
pub struct PendingPoster {
    file_name: String,
    bytes: Bytes,
}

impl PendingPoster {
    /// Generated file name (`<epoch-ms>-<random><ext>`)
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Public URL path recorded in the `poster` column
    pub fn public_path(&self) -> String {
        format!("{}{}", PUBLIC_PREFIX, self.file_name)
    }
}

/// Directory-backed poster store
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(dir: PathBuf, max_bytes: usize) -> Self {
        Self { dir, max_bytes }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Rejection for a poster over the size limit
    pub fn too_large(&self) -> ApiError {
        ApiError::BadRequest(format!(
            "Poster exceeds the {} byte upload limit",
            self.max_bytes
        ))
    }

    /// Validate an uploaded file and assign it a unique name
    ///
    /// Only `.jpg`, `.jpeg`, `.png` and `.gif` files within the size limit are accepted.
    pub fn accept(&self, original_name: &str, bytes: Bytes) -> ApiResult<PendingPoster> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Only image files (jpg, jpeg, png, gif) may be uploaded: {}",
                    original_name
                ))
            })?;

        if bytes.len() > self.max_bytes {
            return Err(self.too_large());
        }

        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        let file_name = format!(
            "{}-{}.{}",
            perfmap_common::time::epoch_millis(),
            suffix,
            extension
        );

        Ok(PendingPoster { file_name, bytes })
    }

    /// Write a pending poster to disk
    pub async fn save(&self, poster: &PendingPoster) -> ApiResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&poster.file_name), &poster.bytes).await?;
        debug!("Stored poster {} ({} bytes)", poster.file_name, poster.bytes.len());
        Ok(())
    }

    /// Remove a stored poster given its public path (best effort)
    ///
    /// Paths outside the uploads prefix are ignored.
    pub async fn remove(&self, public_path: &str) {
        let Some(file_name) = public_path.strip_prefix(PUBLIC_PREFIX) else {
            return;
        };
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(self.dir.join(file_name)).await {
            warn!("Failed to remove poster {}: {}", file_name, e);
        }
    }
}
