//! Local image storage for uploaded pictures and avatars.

use axum::body::Bytes;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::errors::AppError;

/// Accepted image MIME types.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpg", "image/jpeg", "image/png"];

/// Upload size limit in bytes (1.5 MB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 1_500_000;

/// Placeholder images that are never deleted from disk.
pub const DEFAULT_IMAGES: &[&str] = &["no-pic.png", "nopic.png"];

/// Upload storage configuration.
///
/// Loaded from environment variables:
/// - `UPLOAD_PATH` (default `./public/uploads`)
/// - `UPLOAD_MAX_BYTES` (default 1500000)
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub path: PathBuf,
    pub max_bytes: usize,
}

impl UploadConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self::new("./public/uploads")
    }
}

impl FromEnv for UploadConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            path: PathBuf::from(env_or_default("UPLOAD_PATH", "./public/uploads")),
            max_bytes: env_parse_or("UPLOAD_MAX_BYTES", "1500000")?,
        })
    }
}

/// A file part received with a form, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Form field the file arrived in (`image`, `avatar`)
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Writes validated images under the configured directory as
/// `{unix-millis}-{original-name}`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    config: UploadConfig,
}

impl ImageStore {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        &self.config.path
    }

    /// Type and size checks; nothing touches the disk.
    pub fn validate(&self, image: &UploadedImage) -> Result<(), AppError> {
        if !ALLOWED_IMAGE_TYPES.contains(&image.content_type.as_str()) {
            return Err(AppError::InvalidUpload(format!(
                "File type {} is not allowed. Please upload a jpg, jpeg or png image",
                image.content_type
            )));
        }
        if image.bytes.len() > self.config.max_bytes {
            return Err(AppError::InvalidUpload("File size over 1.5Mb".to_string()));
        }
        Ok(())
    }

    /// Validate and write `image`, returning the stored file name.
    pub async fn save(&self, image: &UploadedImage) -> Result<String, AppError> {
        self.validate(image)?;

        let name = format!(
            "{}-{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_filename(&image.file_name)
        );
        fs::create_dir_all(&self.config.path).await?;
        fs::write(self.config.path.join(&name), &image.bytes).await?;

        debug!(file = %name, size = image.bytes.len(), "Image stored");
        Ok(name)
    }

    /// Best-effort delete of a stored file. Placeholders, missing files and
    /// names that would escape the upload directory are ignored.
    pub async fn remove(&self, name: &str) {
        if name.is_empty() || DEFAULT_IMAGES.contains(&name) || !is_plain_file_name(name) {
            return;
        }

        match fs::remove_file(self.config.path.join(name)).await {
            Ok(()) => debug!(file = %name, "Image removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(file = %name, error = %e, "Failed to remove image"),
        }
    }
}

/// Base name only, with whitespace collapsed to `-`.
pub fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");

    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' || c == '\\' { '-' } else { c })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "upload".to_string()
    } else {
        cleaned
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}
