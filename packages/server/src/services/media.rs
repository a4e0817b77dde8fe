//! Blob lifecycle around record mutations.
//!
//! Uploads are part of the owning operation: a failure aborts it. Deletes are
//! side effects: they run after the document change is durable, and a failure
//! is logged and swallowed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::multipart::Field;
use common::storage::{BlobStore, StoredBlob};
use futures::future::join_all;
use tracing::instrument;

use crate::error::AppError;
use crate::utils::upload::{StagedFile, UploadRules, remove_quietly, stage_field};

/// Folder for operator and artisan avatars.
pub const AVATAR_FOLDER: &str = "avatars";
/// Folder for signed agreement documents.
pub const AGREEMENT_FOLDER: &str = "agreements";

/// Blob identifiers to delete once a transaction has committed.
#[derive(Debug, Default)]
pub struct BlobCleanup {
    blob_ids: Vec<String>,
}

impl BlobCleanup {
    /// Add an identifier to the plan. `None` is ignored.
    pub fn schedule(&mut self, blob_id: Option<String>) {
        if let Some(id) = blob_id.filter(|id| !id.is_empty()) {
            self.blob_ids.push(id);
        }
    }

    pub fn len(&self) -> usize {
        self.blob_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blob_ids.is_empty()
    }
}

#[derive(Clone)]
pub struct MediaService {
    store: Arc<dyn BlobStore>,
    upload_tmp_dir: PathBuf,
    max_upload_size: u64,
}

impl MediaService {
    pub fn new(store: Arc<dyn BlobStore>, upload_tmp_dir: PathBuf, max_upload_size: u64) -> Self {
        Self {
            store,
            upload_tmp_dir,
            max_upload_size,
        }
    }

    pub fn upload_tmp_dir(&self) -> &Path {
        &self.upload_tmp_dir
    }

    /// Stage a multipart file field on local disk.
    pub async fn stage(
        &self,
        field: Field<'_>,
        allowed_types: &[&str],
    ) -> Result<StagedFile, AppError> {
        stage_field(
            field,
            &self.upload_tmp_dir,
            UploadRules {
                max_size: self.max_upload_size,
                allowed_types,
            },
        )
        .await
    }

    /// Upload a staged file into `folder`.
    ///
    /// The staged file is removed whether or not the upload succeeds.
    #[instrument(skip(self, staged), fields(file = %staged.original_name, size = staged.size))]
    pub async fn upload(&self, staged: StagedFile, folder: &str) -> Result<StoredBlob, AppError> {
        let result = self
            .store
            .upload_file(&staged.path, folder, &staged.original_name)
            .await;
        remove_quietly(&staged.path).await;

        match result {
            Ok(stored) => {
                tracing::debug!(blob_id = %stored.blob_id, "Uploaded blob");
                Ok(stored)
            }
            Err(e) => {
                tracing::warn!("Blob upload failed: {e}");
                Err(AppError::from(e))
            }
        }
    }

    /// Best-effort delete of a single blob.
    ///
    /// Returns `true` only if the store reported the blob as deleted. `None`
    /// performs no remote call.
    pub async fn discard(&self, blob_id: Option<&str>) -> bool {
        let Some(blob_id) = blob_id.filter(|id| !id.is_empty()) else {
            return false;
        };
        match self.store.delete(blob_id).await {
            Ok(deleted) => {
                if !deleted {
                    tracing::debug!(blob_id, "Blob already absent");
                }
                deleted
            }
            Err(e) => {
                tracing::warn!(blob_id, "Failed to delete blob: {e}");
                false
            }
        }
    }

    /// Run a cleanup plan, deleting every blob concurrently.
    ///
    /// Returns the number of blobs actually deleted.
    #[instrument(skip(self, cleanup), fields(scheduled = cleanup.len()))]
    pub async fn purge(&self, cleanup: BlobCleanup) -> usize {
        if cleanup.is_empty() {
            return 0;
        }
        let results = join_all(
            cleanup
                .blob_ids
                .iter()
                .map(|blob_id| self.discard(Some(blob_id.as_str()))),
        )
        .await;
        results.into_iter().filter(|deleted| *deleted).count()
    }
}
