use std::path::Path;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use serde::Deserialize;
use tokio::fs;

use super::error::StorageError;
use super::key::BlobKey;
use super::traits::BlobStore;

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, R2, ...).
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    /// Use `{endpoint}/{bucket}/{key}` addressing instead of virtual hosts.
    #[serde(default)]
    pub path_style: bool,
}

/// Blob store backed by an S3-compatible bucket.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    public_base_url: String,
    max_size: u64,
}

impl S3BlobStore {
    pub fn new(
        settings: &S3Settings,
        public_base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        let region = match &settings.endpoint {
            Some(endpoint) => Region::Custom {
                region: settings.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => settings
                .region
                .parse()
                .map_err(|e| StorageError::Config(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            Some(&settings.access_key),
            Some(&settings.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(e.to_string()))?;

        let mut bucket = Bucket::new(&settings.bucket, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;
        if settings.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_file(&self, key: &BlobKey, local_path: &Path) -> Result<(), StorageError> {
        let data = match fs::read(local_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(local_path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let content_type = mime_guess::from_path(key.as_str()).first_or_octet_stream();
        let response = self
            .bucket
            .put_object_with_content_type(key.as_str(), &data, content_type.essence_str())
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        match response.status_code() {
            200..=299 => Ok(()),
            status => Err(StorageError::Remote(format!(
                "upload of {key} returned HTTP {status}"
            ))),
        }
    }

    async fn delete_key(&self, key: &BlobKey) -> Result<bool, StorageError> {
        let response = self
            .bucket
            .delete_object(key.as_str())
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        match response.status_code() {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(StorageError::Remote(format!(
                "delete of {key} returned HTTP {status}"
            ))),
        }
    }

    fn public_url(&self, key: &BlobKey) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
