use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;

use super::error::StorageError;
use super::key::BlobKey;

/// Location of an uploaded blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredBlob {
    /// Publicly reachable URL of the blob.
    pub url: String,
    /// Opaque identifier used to delete the blob later.
    pub blob_id: String,
}

/// Remote blob storage addressed by [`BlobKey`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Copy a local file into the store under `key`.
    async fn put_file(&self, key: &BlobKey, local_path: &Path) -> Result<(), StorageError>;

    /// Delete a blob by key.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete_key(&self, key: &BlobKey) -> Result<bool, StorageError>;

    /// Public URL under which `key` is served.
    fn public_url(&self, key: &BlobKey) -> String;

    /// Upload a local file into `folder`, returning its URL and identifier.
    async fn upload_file(
        &self,
        local_path: &Path,
        folder: &str,
        original_name: &str,
    ) -> Result<StoredBlob, StorageError> {
        let key = BlobKey::generate(folder, original_name)?;
        self.put_file(&key, local_path).await?;
        Ok(StoredBlob {
            url: self.public_url(&key),
            blob_id: key.into_string(),
        })
    }

    /// Delete a blob by the identifier returned from [`BlobStore::upload_file`].
    async fn delete(&self, blob_id: &str) -> Result<bool, StorageError> {
        let key = BlobKey::parse(blob_id)?;
        self.delete_key(&key).await
    }
}
