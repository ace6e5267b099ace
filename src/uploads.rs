//! # Uploads
//!
//! Photos and product images land on local disk under the configured uploads
//! tree and are served back as static files.
//!
//! - Filenames are server-generated (uuid + extension from the declared
//!   content type); client-supplied names never touch the filesystem.
//! - Documents store paths relative to the tree (`emergency/<uuid>.jpg`);
//!   responses rewrite them against the public base URL.
//! - When a request fails validation after files were already written, the
//!   files are removed best-effort. A leaked file on a crashed delete is not
//!   an error, just a warning in the log.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;

pub const MAX_PHOTOS: usize = 5;
pub const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

/// Maps an upload's declared content type to a stored extension. Anything
/// outside the allow-list is rejected.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Joins a stored relative path onto the public base URL.
pub fn public_url(base: &str, relative: &str) -> String {
    format!("{}/uploads/{relative}", base.trim_end_matches('/'))
}

/// Writes one upload under `<upload_dir>/<subdir>/` and returns the stored
/// relative path.
pub async fn save_file(
    upload_dir: &str,
    subdir: &str,
    content_type: &str,
    data: Bytes,
) -> Result<String, AppError> {
    let ext = extension_for(content_type).ok_or_else(|| {
        AppError::BadRequest(format!("unsupported file type: {content_type}"))
    })?;

    if data.len() > MAX_FILE_BYTES {
        return Err(AppError::BadRequest(format!(
            "file exceeds {} bytes",
            MAX_FILE_BYTES
        )));
    }

    let relative = format!("{subdir}/{}.{ext}", Uuid::new_v4());
    let path = Path::new(upload_dir).join(&relative);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&path, &data).await?;

    Ok(relative)
}

/// Best-effort removal of a stored file. Used for cleanup after rejected
/// requests and when replacing or deleting a document's image.
pub async fn remove_quietly(upload_dir: &str, relative: &str) {
    let path: PathBuf = Path::new(upload_dir).join(relative);

    if let Err(e) = fs::remove_file(&path).await {
        warn!("Failed to remove {}: {e}", path.display());
    }
}

/// Cleanup for a batch of already-written files.
pub async fn remove_all_quietly(upload_dir: &str, relatives: &[String]) {
    for relative in relatives {
        remove_quietly(upload_dir, relative).await;
    }
}
