use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::key::BlobKey;
use super::traits::BlobStore;

/// Filesystem-backed blob store.
///
/// Blobs live at `{base_path}/{key}` and are served from
/// `{public_base_url}/{key}` by whatever fronts the directory.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    public_base_url: String,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(
        base_path: PathBuf,
        public_base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    /// Compute the filesystem path for a given key.
    fn blob_path(&self, key: &BlobKey) -> PathBuf {
        key.segments()
            .fold(self.base_path.clone(), |path, segment| path.join(segment))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_file(&self, key: &BlobKey, local_path: &Path) -> Result<(), StorageError> {
        let size = match fs::metadata(local_path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(local_path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        if size > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::copy(local_path, &temp_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        let blob_path = self.blob_path(key);
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn delete_key(&self, key: &BlobKey) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(key);
        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &BlobKey) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
