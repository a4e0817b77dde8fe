use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AppError;

/// Image types accepted for avatars.
pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Types accepted for signed agreement scans.
pub const DOCUMENT_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/png"];

/// Limits applied while staging a multipart file field.
#[derive(Debug, Clone, Copy)]
pub struct UploadRules<'a> {
    pub max_size: u64,
    pub allowed_types: &'a [&'a str],
}

/// A multipart file written to the local staging directory.
///
/// The staged file is owned by whoever holds this value; `MediaService::upload`
/// consumes it and removes the file whatever the upload outcome.
#[derive(Debug)]
pub struct StagedFile {
    pub path: PathBuf,
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
}

impl StagedFile {
    /// Remove the staged file without uploading it.
    pub async fn discard(self) {
        remove_quietly(&self.path).await;
    }
}

pub(crate) async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), "Failed to remove staged upload: {e}");
    }
}

/// Stream a multipart file field to a uniquely named file under `tmp_dir`.
pub async fn stage_field(
    mut field: Field<'_>,
    tmp_dir: &Path,
    rules: UploadRules<'_>,
) -> Result<StagedFile, AppError> {
    let raw_name = field
        .file_name()
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?
        .to_string();
    let original_name = validate_upload_filename(&raw_name)?.to_string();

    let content_type = mime_guess::from_path(&original_name)
        .first()
        .map(|m| m.essence_str().to_string())
        .or_else(|| field.content_type().map(str::to_string))
        .unwrap_or_else(|| "application/octet-stream".into());
    if !rules.allowed_types.contains(&content_type.as_str()) {
        return Err(AppError::Validation(format!(
            "Unsupported file type '{content_type}'. Allowed: {}",
            rules.allowed_types.join(", ")
        )));
    }

    tokio::fs::create_dir_all(tmp_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create staging dir: {e}")))?;
    let temp_path = tmp_dir.join(format!("hunarkart-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > rules.max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {} bytes",
                    rules.max_size
                )));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        if total_size == 0 {
            return Err(AppError::Validation("Uploaded file is empty".into()));
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

        Ok(total_size)
    }
    .await;

    match result {
        Ok(size) => Ok(StagedFile {
            path: temp_path,
            original_name,
            content_type,
            size,
        }),
        Err(e) => {
            remove_quietly(&temp_path).await;
            Err(e)
        }
    }
}

/// Validate a client-supplied filename (no directory components, no control characters).
pub fn validate_upload_filename(filename: &str) -> Result<&str, AppError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation("Filename cannot be empty".into()));
    }
    if trimmed.len() > 255 {
        return Err(AppError::Validation(
            "Filename exceeds maximum length of 255 characters".into(),
        ));
    }
    // Also covers NUL and CR/LF.
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(AppError::Validation(
            "Invalid filename: control characters are not allowed".into(),
        ));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(AppError::Validation(
            "Invalid filename: path separators are not allowed".into(),
        ));
    }
    if trimmed.starts_with('.') {
        return Err(AppError::Validation(
            "Invalid filename: hidden files are not allowed".into(),
        ));
    }

    Ok(trimmed)
}
