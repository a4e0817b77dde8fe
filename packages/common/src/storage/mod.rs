mod error;
mod key;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use key::BlobKey;
pub use traits::{BlobStore, StoredBlob};
