//! Uploaded message images.

use std::sync::Arc;

use grupa_domain::{StorageId, UserId};

use crate::infrastructure::ports::{BlobError, BlobStore, StoredBlob};

/// Raster image formats accepted for upload and served inline.
const IMAGE_CONTENT_TYPES: &[&str] = &[
    "image/avif",
    "image/bmp",
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/webp",
];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload is empty")]
    Empty,
    #[error("Upload exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Storage error: {0}")]
    Blob(#[from] BlobError),
}

/// Public URL a stored image is served from.
pub fn image_url(id: StorageId) -> String {
    format!("/api/uploads/{}", id)
}

/// Best-effort removal of images whose messages are gone. Failures are
/// logged and otherwise ignored; the records are already deleted.
pub async fn discard_blobs(blobs: &dyn BlobStore, ids: &[StorageId]) {
    for id in ids {
        if let Err(e) = blobs.delete(*id).await {
            tracing::warn!(storage_id = %id, error = %e, "Failed to delete orphaned upload");
        }
    }
}

pub struct UploadUseCases {
    blobs: Arc<dyn BlobStore>,
    max_bytes: usize,
}

impl UploadUseCases {
    pub fn new(blobs: Arc<dyn BlobStore>, max_bytes: usize) -> Self {
        Self { blobs, max_bytes }
    }

    pub async fn upload(
        &self,
        user_id: UserId,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StorageId, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                limit: self.max_bytes,
            });
        }
        let content_type = normalize_content_type(content_type)?;

        let id = StorageId::new();
        self.blobs.put(id, &content_type, bytes).await?;
        tracing::debug!(storage_id = %id, user_id = %user_id, size = bytes.len(), "Stored upload");
        Ok(id)
    }

    pub async fn download(&self, id: StorageId) -> Result<Option<StoredBlob>, UploadError> {
        Ok(self.blobs.get(id).await?)
    }
}

/// Whether a stored content type is one of the accepted image formats.
pub fn is_image_content_type(content_type: &str) -> bool {
    IMAGE_CONTENT_TYPES.contains(&content_type)
}

/// Media type without parameters, lowercased. Only image formats pass.
fn normalize_content_type(raw: Option<&str>) -> Result<String, UploadError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Err(UploadError::InvalidInput(
            "Content-Type is required".to_string(),
        ));
    };
    let media_type = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !is_image_content_type(&media_type) {
        return Err(UploadError::InvalidInput(format!(
            "Unsupported content type: {}",
            raw.escape_debug()
        )));
    }
    Ok(media_type)
}
