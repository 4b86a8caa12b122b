//! Image uploads into the local media directory.
//!
//! Files are stored under a random name with an extension derived from the
//! declared content type. The directory is served at `/media`.

use std::path::Path;

use axum::extract::multipart::{Multipart, MultipartError};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::MediaConfig;

/// Errors while accepting an upload.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("upload exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),
    #[error("no file field in upload")]
    MissingFile,
    #[error("malformed upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredMedia {
    pub file_name: String,
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

/// Writes uploads to disk.
#[derive(Debug, Clone)]
pub struct MediaStore {
    config: MediaConfig,
}

impl MediaStore {
    #[must_use]
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Directory served at `/media`.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Largest accepted upload in bytes.
    #[must_use]
    pub const fn max_upload_bytes(&self) -> usize {
        self.config.max_upload_bytes
    }

    /// Store the first field named `file` from a multipart body.
    ///
    /// # Errors
    ///
    /// Returns `MediaError` when the field is missing, too large, not an
    /// image, or cannot be written.
    pub async fn store_multipart(&self, mut multipart: Multipart) -> Result<StoredMedia, MediaError> {
        while let Some(field) = multipart.next_field().await? {
            if field.name() != Some("file") {
                continue;
            }
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_owned();
            let bytes = field.bytes().await?;
            return self.store(&content_type, &bytes).await;
        }
        Err(MediaError::MissingFile)
    }

    /// Store raw bytes of the given content type.
    ///
    /// # Errors
    ///
    /// Returns `MediaError` for oversized or non-image uploads and write failures.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn store(&self, content_type: &str, bytes: &[u8]) -> Result<StoredMedia, MediaError> {
        let limit = self.config.max_upload_bytes;
        if bytes.len() > limit {
            return Err(MediaError::TooLarge { limit });
        }
        let extension = extension_for(content_type)
            .ok_or_else(|| MediaError::UnsupportedType(content_type.to_owned()))?;

        tokio::fs::create_dir_all(self.dir()).await?;
        let file_name = format!("{}.{extension}", Uuid::new_v4().simple());
        tokio::fs::write(self.dir().join(&file_name), bytes).await?;

        tracing::info!(file_name = %file_name, "Stored upload");
        Ok(StoredMedia {
            url: self.config.url_for(&file_name),
            file_name,
            content_type: content_type.to_owned(),
            size: bytes.len(),
        })
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(limit: usize) -> MediaStore {
        let dir = std::env::temp_dir().join(format!("marigold-media-{}", Uuid::new_v4()));
        MediaStore::new(MediaConfig {
            dir,
            base_url: "http://localhost:3001/media".to_owned(),
            max_upload_bytes: limit,
        })
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("IMAGE/JPEG; charset=binary"), Some("jpg"));
        assert_eq!(extension_for("text/html"), None);
    }

    #[tokio::test]
    async fn test_store_writes_file() {
        let media = store(1024);
        let stored = media.store("image/png", b"\x89PNG fake").await.unwrap();

        assert!(stored.file_name.ends_with(".png"));
        assert_eq!(stored.url, format!("http://localhost:3001/media/{}", stored.file_name));
        let written = tokio::fs::read(media.dir().join(&stored.file_name)).await.unwrap();
        assert_eq!(written, b"\x89PNG fake");

        tokio::fs::remove_dir_all(media.dir()).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_rejects_oversized_and_non_images() {
        let media = store(4);
        assert!(matches!(
            media.store("image/png", b"too long").await,
            Err(MediaError::TooLarge { limit: 4 })
        ));
        assert!(matches!(
            media.store("text/html", b"<p>").await,
            Err(MediaError::UnsupportedType(_))
        ));
    }
}
