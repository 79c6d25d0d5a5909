use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::{
    errors::StorageResult,
    models::{ObjectMetadata, ObjectStream},
};
use async_trait::async_trait;

/// Port for object operations of the storage facade
#[async_trait]
pub trait ObjectService: Send + Sync + 'static {
    /// Get size, ETag, content type and user metadata of an object
    async fn stat_object(&self, name: &str, bucket: &str) -> StorageResult<ObjectMetadata>;

    /// Open an object as a stream; the caller owns it and closes it by dropping it
    async fn download_as_stream(&self, name: &str, bucket: &str) -> StorageResult<ObjectStream>;

    /// Copy an object into a local file, creating or truncating it.
    ///
    /// A partially written file is left in place when the copy fails.
    async fn download_to_path(
        &self,
        destination: &Path,
        name: &str,
        bucket: &str,
    ) -> StorageResult<PathBuf>;

    /// Upload a local file; `metadata` is attached only when present
    async fn upload(
        &self,
        source: &Path,
        name: &str,
        bucket: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> StorageResult<()>;

    /// Delete an object
    async fn remove_object(&self, name: &str, bucket: &str) -> StorageResult<()>;
}
