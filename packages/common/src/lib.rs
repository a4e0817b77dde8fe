pub mod storage;

pub use storage::{BlobKey, BlobStore, StorageError, StoredBlob};
