//! Object storage for product images.
//!
//! Blobs live as plain files in one bucket directory and are served back through the
//! router at `/storage/<bucket>/<name>`. The store never renames or overwrites: callers
//! pick collision-resistant names with [`unique_name`].

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::errors::AppError;

/// Bucket holding product images.
pub const BUCKET: &str = "product-images";

/// Filesystem-backed image bucket.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl ImageStore {
    /// Open (creating if needed) the bucket under `upload_dir`.
    pub async fn open(
        upload_dir: &Path,
        public_base_url: &str,
        max_bytes: usize,
    ) -> Result<Self, AppError> {
        let root = upload_dir.join(BUCKET);
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_bytes,
        })
    }

    /// Directory served under the public storage route.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL for a stored name.
    pub fn public_url(&self, name: &str) -> String {
        format!("{}/storage/{}/{}", self.public_base_url, BUCKET, name)
    }

    /// Reverse of [`public_url`](Self::public_url); `None` for URLs outside this bucket.
    pub fn name_from_url(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/storage/{}/", self.public_base_url, BUCKET);
        url.strip_prefix(&prefix)
            .filter(|name| is_valid_name(name))
            .map(str::to_string)
    }

    /// Store `bytes` under `name` and return its public URL.
    pub async fn upload(&self, bytes: &[u8], name: &str) -> Result<String, AppError> {
        if !is_valid_name(name) {
            return Err(AppError::Storage(format!("Invalid object name '{}'", name)));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::Storage(format!(
                "Object exceeds storage quota of {} bytes",
                self.max_bytes
            )));
        }

        let path = self.root.join(name);
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(AppError::Storage(format!(
                    "An object named '{}' already exists",
                    name
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;
        drop(file);
        discard_partial(&path, written).await?;

        tracing::info!(name = %name, size = bytes.len(), "Image stored");
        Ok(self.public_url(name))
    }

    /// Delete a stored object.
    pub async fn remove(&self, name: &str) -> Result<(), AppError> {
        if !is_valid_name(name) {
            return Err(AppError::Storage(format!("Invalid object name '{}'", name)));
        }
        tokio::fs::remove_file(self.root.join(name)).await?;
        tracing::info!(name = %name, "Image removed");
        Ok(())
    }

    /// Names of stored objects last written at least `min_age` ago, sorted.
    pub async fn list_older_than(&self, min_age: Duration) -> Result<Vec<String>, AppError> {
        let now = SystemTime::now();
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age >= min_age {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

/// Build a collision-resistant object name: `<unix-millis>-<sanitized filename>`.
pub fn unique_name(original_filename: &str) -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        sanitize_filename(original_filename)
    )
}

fn sanitize_filename(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Reject non-image content types, empty files and oversize files.
pub fn validate_image(
    content_type: Option<&str>,
    size: usize,
    max_bytes: usize,
) -> Result<(), AppError> {
    let is_image = content_type
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false);
    if !is_image {
        return Err(AppError::Validation(
            "Please select a valid image file (PNG, JPG, WEBP)".to_string(),
        ));
    }
    if size == 0 {
        return Err(AppError::Validation("Empty file provided".to_string()));
    }
    if size > max_bytes {
        return Err(AppError::Validation(format!(
            "Image file size must be less than {}MB",
            max_bytes / 1024 / 1024
        )));
    }
    Ok(())
}

/// Remove a half-written object so a failed upload leaves nothing in the bucket.
async fn discard_partial(path: &Path, written: std::io::Result<()>) -> Result<(), AppError> {
    let Err(err) = written else {
        return Ok(());
    };
    if let Err(cleanup) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), "Could not remove partial upload: {}", cleanup);
    }
    Err(err.into())
}
