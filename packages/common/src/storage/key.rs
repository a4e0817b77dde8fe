use std::fmt;

use uuid::Uuid;

use super::error::StorageError;

const MAX_KEY_LEN: usize = 256;
const MAX_EXTENSION_LEN: usize = 10;

/// A validated object key of the form `folder[/sub]/name`.
///
/// Keys double as the opaque blob identifier persisted next to a record, so
/// they are validated on the way back in before any backend touches them.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlobKey(String);

impl BlobKey {
    /// Generate a fresh key under `folder`, keeping the (normalized) extension
    /// of `original_name` so served files keep a sensible content type.
    pub fn generate(folder: &str, original_name: &str) -> Result<Self, StorageError> {
        let folder = folder.trim_matches('/');
        validate_segments(folder)?;

        let mut name = Uuid::now_v7().simple().to_string();
        if let Some(ext) = extension_of(original_name) {
            name.push('.');
            name.push_str(&ext);
        }

        Ok(Self(format!("{folder}/{name}")))
    }

    /// Parse a previously issued identifier.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        validate_segments(raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Path segments of the key, for backends that map keys onto directories.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({})", self.0)
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_segments(raw: &str) -> Result<(), StorageError> {
    if raw.is_empty() {
        return Err(StorageError::InvalidKey("key must not be empty".into()));
    }
    if raw.len() > MAX_KEY_LEN {
        return Err(StorageError::InvalidKey(format!(
            "key exceeds {MAX_KEY_LEN} bytes"
        )));
    }
    for segment in raw.split('/') {
        if segment.is_empty() {
            return Err(StorageError::InvalidKey(format!("empty segment in '{raw}'")));
        }
        if segment.starts_with('.') {
            return Err(StorageError::InvalidKey(format!(
                "segment '{segment}' must not start with '.'"
            )));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(StorageError::InvalidKey(format!(
                "segment '{segment}' contains unsupported characters"
            )));
        }
    }
    Ok(())
}

fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
