use crate::domain::{
    errors::StorageResult,
    models::{BucketConfiguration, BucketState},
};
use async_trait::async_trait;

/// Port for bucket operations of the storage facade
#[async_trait]
pub trait BucketService: Send + Sync + 'static {
    /// Check if a bucket exists; a missing bucket is not an error
    async fn bucket_exists(&self, name: &str) -> StorageResult<bool>;

    /// List all buckets
    async fn list_buckets(&self) -> StorageResult<Vec<BucketState>>;

    /// Find a bucket by exact name
    async fn get_bucket(&self, name: &str) -> StorageResult<BucketState>;

    /// Create a bucket and return its state as listed by the backend
    async fn create_bucket(&self, name: &str) -> StorageResult<BucketState>;

    /// Remove an empty bucket
    async fn remove_bucket(&self, name: &str) -> StorageResult<()>;

    /// Fetch the versioning, object lock and policy state of a bucket
    async fn describe_bucket(&self, name: &str) -> StorageResult<BucketConfiguration>;
}
