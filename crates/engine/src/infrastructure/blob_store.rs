//! Filesystem storage for uploaded message images.
//!
//! Each blob is `<dir>/<id>` with its media type in `<dir>/<id>.type`.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

use grupa_domain::StorageId;

use crate::infrastructure::ports::{BlobError, BlobStore, StoredBlob};

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create the store, making the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn data_path(&self, id: StorageId) -> PathBuf {
        self.root.join(id.to_string())
    }

    fn type_path(&self, id: StorageId) -> PathBuf {
        self.root.join(format!("{}.type", id))
    }
}

async fn remove_if_exists(path: PathBuf) -> Result<(), BlobError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, id: StorageId, content_type: &str, bytes: &[u8]) -> Result<(), BlobError> {
        tokio::fs::write(self.data_path(id), bytes).await?;
        tokio::fs::write(self.type_path(id), content_type.as_bytes()).await?;
        Ok(())
    }

    async fn get(&self, id: StorageId) -> Result<Option<StoredBlob>, BlobError> {
        let bytes = match tokio::fs::read(self.data_path(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let content_type = match tokio::fs::read_to_string(self.type_path(id)).await {
            Ok(value) => value,
            Err(e) if e.kind() == ErrorKind::NotFound => "application/octet-stream".to_string(),
            Err(e) => return Err(BlobError::Corrupt(e.to_string())),
        };
        Ok(Some(StoredBlob {
            content_type,
            bytes,
        }))
    }

    async fn delete(&self, id: StorageId) -> Result<(), BlobError> {
        remove_if_exists(self.data_path(id)).await?;
        remove_if_exists(self.type_path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path().join("uploads")).await.expect("store");
        let id = StorageId::new();

        store.put(id, "image/png", b"\x89PNG").await.expect("put");
        let blob = store.get(id).await.expect("get").expect("present");
        assert_eq!(blob.content_type, "image/png");
        assert_eq!(blob.bytes, b"\x89PNG".to_vec());

        store.delete(id).await.expect("delete");
        assert!(store.get(id).await.expect("get").is_none());
        store.delete(id).await.expect("second delete is a no-op");
    }
}
