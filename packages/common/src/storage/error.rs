use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested blob was not found.
    #[error("blob not found: {0}")]
    NotFound(String),
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The blob identifier is malformed or escapes the store namespace.
    #[error("invalid blob key: {0}")]
    InvalidKey(String),
    /// The blob exceeds the configured size limit.
    #[error("blob exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The backend is misconfigured.
    #[error("storage configuration error: {0}")]
    Config(String),
    /// The remote provider rejected or failed the request.
    #[error("remote storage error: {0}")]
    Remote(String),
}
