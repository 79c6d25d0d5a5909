use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, info};

use crate::{
    domain::{
        errors::{BackendError, Operation, StorageError, StorageResult},
        models::{
            BucketConfiguration, BucketState, ObjectBody, ObjectMetadata, ObjectStream,
            PutObjectRequest,
        },
    },
    ports::{
        services::{BucketService, ObjectService},
        storage::StorageBackend,
    },
};

/// Storage facade over a shared backend client.
///
/// Every backend or local I/O failure is reported as
/// [`StorageError::Request`] naming the operation; nothing is retried.
#[derive(Clone)]
pub struct StorageService {
    backend: Arc<dyn StorageBackend>,
}

impl StorageService {
    /// Create a new StorageService over an established backend client
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// The backend client shared by this facade
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Linear scan of the bucket listing for an exact name
    async fn find_bucket(&self, name: &str, operation: Operation) -> StorageResult<BucketState> {
        let buckets = self
            .backend
            .list_buckets()
            .await
            .map_err(StorageError::request(operation))?;

        buckets
            .into_iter()
            .find(|bucket| bucket.name == name)
            .ok_or_else(|| StorageError::Request {
                operation,
                source: BackendError::not_found(format!("bucket {}", name)),
            })
    }
}

fn io_failure(operation: Operation) -> impl FnOnce(io::Error) -> StorageError {
    move |err| StorageError::Request {
        operation,
        source: BackendError::Io(err),
    }
}

/// Copy a reader into a freshly created (or truncated) file.
///
/// The file is flushed even when the copy fails, so no write is still in
/// flight once the handle is dropped.
async fn copy_to_file<R>(reader: &mut R, destination: &Path) -> io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut file = tokio::fs::File::create(destination).await?;
    let copied = tokio::io::copy(reader, &mut file).await;
    let flushed = file.flush().await;
    let copied = copied?;
    flushed?;
    Ok(copied)
}

#[async_trait]
impl BucketService for StorageService {
    async fn bucket_exists(&self, name: &str) -> StorageResult<bool> {
        debug!(bucket = name, "Checking bucket existence");
        self.backend
            .bucket_exists(name)
            .await
            .map_err(StorageError::request(Operation::BucketExists))
    }

    async fn list_buckets(&self) -> StorageResult<Vec<BucketState>> {
        self.backend
            .list_buckets()
            .await
            .map_err(StorageError::request(Operation::ListBuckets))
    }

    async fn get_bucket(&self, name: &str) -> StorageResult<BucketState> {
        self.find_bucket(name, Operation::GetBucket).await
    }

    async fn create_bucket(&self, name: &str) -> StorageResult<BucketState> {
        self.backend
            .make_bucket(name, false)
            .await
            .map_err(StorageError::request(Operation::CreateBucket))?;

        // The listing is the authoritative state; a miss here means the
        // backend acknowledged a bucket it does not report.
        let bucket = self.find_bucket(name, Operation::CreateBucket).await?;
        info!(bucket = name, "Bucket created");
        Ok(bucket)
    }

    async fn remove_bucket(&self, name: &str) -> StorageResult<()> {
        self.backend
            .remove_bucket(name)
            .await
            .map_err(StorageError::request(Operation::RemoveBucket))?;
        info!(bucket = name, "Bucket removed");
        Ok(())
    }

    async fn describe_bucket(&self, name: &str) -> StorageResult<BucketConfiguration> {
        let describe_failed = || StorageError::request(Operation::DescribeBucket);

        let versioning = self
            .backend
            .get_bucket_versioning(name)
            .await
            .map_err(describe_failed())?;
        let object_lock = self
            .backend
            .get_object_lock_configuration(name)
            .await
            .map_err(describe_failed())?;
        let policy = self
            .backend
            .get_bucket_policy(name)
            .await
            .map_err(describe_failed())?;

        Ok(BucketConfiguration {
            name: name.to_string(),
            versioning,
            object_lock,
            policy,
        })
    }
}

#[async_trait]
impl ObjectService for StorageService {
    async fn stat_object(&self, name: &str, bucket: &str) -> StorageResult<ObjectMetadata> {
        self.backend
            .stat_object(bucket, name)
            .await
            .map_err(StorageError::request(Operation::StatObject))
    }

    async fn download_as_stream(&self, name: &str, bucket: &str) -> StorageResult<ObjectStream> {
        debug!(bucket, object = name, "Opening object stream");
        self.backend
            .get_object(bucket, name)
            .await
            .map_err(StorageError::request(Operation::Download))
    }

    async fn download_to_path(
        &self,
        destination: &Path,
        name: &str,
        bucket: &str,
    ) -> StorageResult<PathBuf> {
        let stream = self.download_as_stream(name, bucket).await?;

        // The reader owns the object stream and the file lives inside
        // `copy_to_file`, so both are dropped on success and on every error.
        let mut reader = StreamReader::new(stream);
        let copied = copy_to_file(&mut reader, destination)
            .await
            .map_err(io_failure(Operation::Download))?;

        debug!(
            bucket,
            object = name,
            destination = %destination.display(),
            bytes = copied,
            "Object downloaded"
        );
        Ok(destination.to_path_buf())
    }

    async fn upload(
        &self,
        source: &Path,
        name: &str,
        bucket: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> StorageResult<()> {
        let file = tokio::fs::File::open(source)
            .await
            .map_err(io_failure(Operation::Upload))?;
        let content_length = file
            .metadata()
            .await
            .map_err(io_failure(Operation::Upload))?
            .len();

        let content_type = mime_guess::from_path(name)
            .first_or_octet_stream()
            .to_string();

        let request = PutObjectRequest {
            bucket: bucket.to_string(),
            key: name.to_string(),
            body: ObjectBody::new(Box::pin(ReaderStream::new(file)), content_length),
            content_type: Some(content_type),
            user_metadata: metadata,
        };

        self.backend
            .put_object(request)
            .await
            .map_err(StorageError::request(Operation::Upload))?;

        info!(
            bucket,
            object = name,
            bytes = content_length,
            "Object uploaded"
        );
        Ok(())
    }

    async fn remove_object(&self, name: &str, bucket: &str) -> StorageResult<()> {
        self.backend
            .remove_object(bucket, name)
            .await
            .map_err(StorageError::request(Operation::RemoveObject))?;
        debug!(bucket, object = name, "Object removed");
        Ok(())
    }
}
