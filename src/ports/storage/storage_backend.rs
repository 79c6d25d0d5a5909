use crate::domain::{
    errors::BackendResult,
    models::{
        BucketState, ObjectLockConfiguration, ObjectLockStatus, ObjectMetadata, ObjectStream,
        PutObjectRequest, VersioningConfiguration, VersioningStatus,
    },
};
use async_trait::async_trait;

/// Port for an authenticated S3-compatible backend client.
///
/// Implementations must be safe for concurrent use once constructed; the
/// provisioner and the storage facade share one handle without locking.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Check if a bucket exists; a missing bucket is `Ok(false)`
    async fn bucket_exists(&self, bucket: &str) -> BackendResult<bool>;

    /// Create a bucket, enabling object lock when asked (only possible at creation)
    async fn make_bucket(&self, bucket: &str, object_lock: bool) -> BackendResult<()>;

    /// List every bucket owned by the caller
    async fn list_buckets(&self) -> BackendResult<Vec<BucketState>>;

    /// Delete an empty bucket
    async fn remove_bucket(&self, bucket: &str) -> BackendResult<()>;

    async fn set_bucket_versioning(
        &self,
        bucket: &str,
        config: &VersioningConfiguration,
    ) -> BackendResult<()>;

    /// `None` when versioning was never configured
    async fn get_bucket_versioning(&self, bucket: &str) -> BackendResult<Option<VersioningStatus>>;

    /// Set the default retention of an object-lock enabled bucket
    async fn set_object_lock_configuration(
        &self,
        bucket: &str,
        config: &ObjectLockConfiguration,
    ) -> BackendResult<()>;

    async fn get_object_lock_configuration(&self, bucket: &str) -> BackendResult<ObjectLockStatus>;

    /// Attach a policy document, replacing the current one
    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> BackendResult<()>;

    /// `None` when the bucket has no policy
    async fn get_bucket_policy(&self, bucket: &str) -> BackendResult<Option<String>>;

    /// Fetch object metadata without the body
    async fn stat_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectMetadata>;

    /// Open the object body as a stream
    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectStream>;

    /// Store an object
    async fn put_object(&self, request: PutObjectRequest) -> BackendResult<()>;

    /// Delete an object
    async fn remove_object(&self, bucket: &str, key: &str) -> BackendResult<()>;
}
