//! In-memory storage backend for testing and development.
//!
//! Mirrors the S3 semantics the provisioner relies on (error codes, object
//! lock only at creation, non-empty bucket removal) and records every call so
//! tests can assert exactly which requests were issued.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

use crate::{
    domain::{
        errors::{BackendError, BackendResult},
        models::{
            BucketState, ObjectLockConfiguration, ObjectLockStatus, ObjectMetadata, ObjectStream,
            PutObjectRequest, VersioningConfiguration, VersioningStatus,
        },
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::StorageBackend,
};

const CHUNK_SIZE: usize = 8 * 1024;

/// Kind of backend request, used to filter the call log and inject faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    BucketExists,
    MakeBucket,
    ListBuckets,
    RemoveBucket,
    SetBucketVersioning,
    GetBucketVersioning,
    SetObjectLockConfiguration,
    GetObjectLockConfiguration,
    SetBucketPolicy,
    GetBucketPolicy,
    StatObject,
    GetObject,
    PutObject,
    RemoveObject,
}

/// A request received by the in-memory backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    BucketExists {
        bucket: String,
    },
    MakeBucket {
        bucket: String,
        object_lock: bool,
    },
    ListBuckets,
    RemoveBucket {
        bucket: String,
    },
    SetBucketVersioning {
        bucket: String,
        status: VersioningStatus,
    },
    GetBucketVersioning {
        bucket: String,
    },
    SetObjectLockConfiguration {
        bucket: String,
        config: ObjectLockConfiguration,
    },
    GetObjectLockConfiguration {
        bucket: String,
    },
    SetBucketPolicy {
        bucket: String,
        policy: String,
    },
    GetBucketPolicy {
        bucket: String,
    },
    StatObject {
        bucket: String,
        key: String,
    },
    GetObject {
        bucket: String,
        key: String,
    },
    PutObject {
        bucket: String,
        key: String,
        content_type: Option<String>,
        user_metadata: Option<HashMap<String, String>>,
    },
    RemoveObject {
        bucket: String,
        key: String,
    },
}

impl BackendCall {
    pub fn kind(&self) -> CallKind {
        match self {
            BackendCall::BucketExists { .. } => CallKind::BucketExists,
            BackendCall::MakeBucket { .. } => CallKind::MakeBucket,
            BackendCall::ListBuckets => CallKind::ListBuckets,
            BackendCall::RemoveBucket { .. } => CallKind::RemoveBucket,
            BackendCall::SetBucketVersioning { .. } => CallKind::SetBucketVersioning,
            BackendCall::GetBucketVersioning { .. } => CallKind::GetBucketVersioning,
            BackendCall::SetObjectLockConfiguration { .. } => CallKind::SetObjectLockConfiguration,
            BackendCall::GetObjectLockConfiguration { .. } => CallKind::GetObjectLockConfiguration,
            BackendCall::SetBucketPolicy { .. } => CallKind::SetBucketPolicy,
            BackendCall::GetBucketPolicy { .. } => CallKind::GetBucketPolicy,
            BackendCall::StatObject { .. } => CallKind::StatObject,
            BackendCall::GetObject { .. } => CallKind::GetObject,
            BackendCall::PutObject { .. } => CallKind::PutObject,
            BackendCall::RemoveObject { .. } => CallKind::RemoveObject,
        }
    }

    /// The bucket the call targeted, if any
    pub fn bucket(&self) -> Option<&str> {
        match self {
            BackendCall::ListBuckets => None,
            BackendCall::BucketExists { bucket }
            | BackendCall::MakeBucket { bucket, .. }
            | BackendCall::RemoveBucket { bucket }
            | BackendCall::SetBucketVersioning { bucket, .. }
            | BackendCall::GetBucketVersioning { bucket }
            | BackendCall::SetObjectLockConfiguration { bucket, .. }
            | BackendCall::GetObjectLockConfiguration { bucket }
            | BackendCall::SetBucketPolicy { bucket, .. }
            | BackendCall::GetBucketPolicy { bucket }
            | BackendCall::StatObject { bucket, .. }
            | BackendCall::GetObject { bucket, .. }
            | BackendCall::PutObject { bucket, .. }
            | BackendCall::RemoveObject { bucket, .. } => Some(bucket),
        }
    }
}

#[derive(Debug, Clone)]
struct Fault {
    kind: CallKind,
    bucket: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    user_metadata: HashMap<String, String>,
    etag: String,
    last_modified: DateTime<Utc>,
    version_id: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredBucket {
    created: DateTime<Utc>,
    object_lock_enabled: bool,
    versioning: Option<VersioningStatus>,
    default_retention: Option<ObjectLockConfiguration>,
    policy: Option<String>,
    objects: BTreeMap<String, StoredObject>,
}

#[derive(Default)]
struct BackendState {
    buckets: BTreeMap<String, StoredBucket>,
}

/// In-memory implementation of StorageBackend
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<RwLock<BackendState>>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
    faults: Arc<Mutex<Vec<Fault>>>,
    truncate_downloads_after: Arc<Mutex<Option<usize>>>,
    open_streams: Arc<AtomicUsize>,
    version_counter: Arc<AtomicU64>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Calls of one kind received so far, in order
    pub fn calls_of(&self, kind: CallKind) -> Vec<BackendCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.kind() == kind)
            .collect()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    /// Make every call of `kind` fail, optionally only for one bucket
    pub fn inject_fault(&self, kind: CallKind, bucket: Option<&str>) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.push(Fault {
                kind,
                bucket: bucket.map(str::to_string),
            });
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.clear();
        }
    }

    /// Make downloads fail with an I/O error after `bytes` bytes
    pub fn truncate_downloads_after(&self, bytes: Option<usize>) {
        if let Ok(mut limit) = self.truncate_downloads_after.lock() {
            *limit = bytes;
        }
    }

    /// Number of download streams that have not been dropped yet
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    /// Seed an object directly, bypassing the call log
    pub async fn insert_object(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        let data = data.into();
        let mut state = self.state.write().await;
        let stored = state
            .buckets
            .entry(bucket.to_string())
            .or_insert_with(|| StoredBucket::new(false));
        stored.objects.insert(
            key.to_string(),
            StoredObject {
                etag: format!("{:x}", md5::compute(&data)),
                data,
                content_type: None,
                user_metadata: HashMap::new(),
                last_modified: Utc::now(),
                version_id: None,
            },
        );
    }

    fn record(&self, call: BackendCall) -> BackendResult<()> {
        let kind = call.kind();
        let bucket = call.bucket().map(str::to_string);

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }

        let faults = self
            .faults
            .lock()
            .map(|faults| faults.clone())
            .unwrap_or_default();
        let injected = faults.iter().any(|fault| {
            fault.kind == kind
                && (fault.bucket.is_none() || fault.bucket.as_deref() == bucket.as_deref())
        });

        if injected {
            return Err(BackendError::service(
                500,
                "InternalError",
                format!("Injected failure for {:?}", kind),
            ));
        }
        Ok(())
    }

    fn next_version_id(&self) -> String {
        let next = self.version_counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{:032x}", next)
    }
}

impl StoredBucket {
    fn new(object_lock_enabled: bool) -> Self {
        Self {
            created: Utc::now(),
            object_lock_enabled,
            versioning: None,
            default_retention: None,
            policy: None,
            objects: BTreeMap::new(),
        }
    }
}

fn validate_bucket(bucket: &str) -> BackendResult<()> {
    BucketName::new(bucket)?;
    Ok(())
}

fn validate_key(key: &str) -> BackendResult<()> {
    ObjectKey::new(key)?;
    Ok(())
}

fn no_such_bucket(bucket: &str) -> BackendError {
    BackendError::service(404, "NoSuchBucket", format!("The specified bucket does not exist: {}", bucket))
}

fn no_such_key(key: &str) -> BackendError {
    BackendError::service(404, "NoSuchKey", format!("The specified key does not exist: {}", key))
}

/// Decrements the open stream counter when the download stream is dropped
struct StreamGuard(Arc<AtomicUsize>);

impl StreamGuard {
    fn open(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn bucket_exists(&self, bucket: &str) -> BackendResult<bool> {
        self.record(BackendCall::BucketExists {
            bucket: bucket.to_string(),
        })?;
        validate_bucket(bucket)?;

        Ok(self.state.read().await.buckets.contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &str, object_lock: bool) -> BackendResult<()> {
        self.record(BackendCall::MakeBucket {
            bucket: bucket.to_string(),
            object_lock,
        })?;
        validate_bucket(bucket)?;

        let mut state = self.state.write().await;
        if state.buckets.contains_key(bucket) {
            return Err(BackendError::service(
                409,
                "BucketAlreadyOwnedByYou",
                format!("Your previous request to create the named bucket succeeded: {}", bucket),
            ));
        }

        let mut stored = StoredBucket::new(object_lock);
        if object_lock {
            // S3 turns versioning on together with object lock
            stored.versioning = Some(VersioningStatus::Enabled);
        }
        state.buckets.insert(bucket.to_string(), stored);
        Ok(())
    }

    async fn list_buckets(&self) -> BackendResult<Vec<BucketState>> {
        self.record(BackendCall::ListBuckets)?;

        let state = self.state.read().await;
        Ok(state
            .buckets
            .iter()
            .map(|(name, bucket)| BucketState::new(name.clone(), Some(bucket.created)))
            .collect())
    }

    async fn remove_bucket(&self, bucket: &str) -> BackendResult<()> {
        self.record(BackendCall::RemoveBucket {
            bucket: bucket.to_string(),
        })?;
        validate_bucket(bucket)?;

        let mut state = self.state.write().await;
        let stored = state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        if !stored.objects.is_empty() {
            return Err(BackendError::service(
                409,
                "BucketNotEmpty",
                format!("The bucket you tried to delete is not empty: {}", bucket),
            ));
        }

        state.buckets.remove(bucket);
        Ok(())
    }

    async fn set_bucket_versioning(
        &self,
        bucket: &str,
        config: &VersioningConfiguration,
    ) -> BackendResult<()> {
        self.record(BackendCall::SetBucketVersioning {
            bucket: bucket.to_string(),
            status: config.status,
        })?;
        validate_bucket(bucket)?;

        let mut state = self.state.write().await;
        let stored = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;

        if stored.object_lock_enabled && config.status == VersioningStatus::Suspended {
            return Err(BackendError::service(
                409,
                "InvalidBucketState",
                "An Object Lock configuration is present on this bucket, so the versioning state cannot be changed.",
            ));
        }

        stored.versioning = Some(config.status);
        Ok(())
    }

    async fn get_bucket_versioning(&self, bucket: &str) -> BackendResult<Option<VersioningStatus>> {
        self.record(BackendCall::GetBucketVersioning {
            bucket: bucket.to_string(),
        })?;
        validate_bucket(bucket)?;

        let state = self.state.read().await;
        let stored = state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        Ok(stored.versioning)
    }

    async fn set_object_lock_configuration(
        &self,
        bucket: &str,
        config: &ObjectLockConfiguration,
    ) -> BackendResult<()> {
        self.record(BackendCall::SetObjectLockConfiguration {
            bucket: bucket.to_string(),
            config: *config,
        })?;
        validate_bucket(bucket)?;

        let mut state = self.state.write().await;
        let stored = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;

        if !stored.object_lock_enabled {
            return Err(BackendError::service(
                409,
                "InvalidBucketState",
                "Object Lock configuration cannot be enabled on existing buckets",
            ));
        }

        stored.default_retention = Some(*config);
        Ok(())
    }

    async fn get_object_lock_configuration(&self, bucket: &str) -> BackendResult<ObjectLockStatus> {
        self.record(BackendCall::GetObjectLockConfiguration {
            bucket: bucket.to_string(),
        })?;
        validate_bucket(bucket)?;

        let state = self.state.read().await;
        let stored = state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        Ok(ObjectLockStatus {
            enabled: stored.object_lock_enabled,
            default_retention: stored.default_retention,
        })
    }

    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> BackendResult<()> {
        self.record(BackendCall::SetBucketPolicy {
            bucket: bucket.to_string(),
            policy: policy.to_string(),
        })?;
        validate_bucket(bucket)?;

        let mut state = self.state.write().await;
        let stored = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        stored.policy = Some(policy.to_string());
        Ok(())
    }

    async fn get_bucket_policy(&self, bucket: &str) -> BackendResult<Option<String>> {
        self.record(BackendCall::GetBucketPolicy {
            bucket: bucket.to_string(),
        })?;
        validate_bucket(bucket)?;

        let state = self.state.read().await;
        let stored = state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        Ok(stored.policy.clone())
    }

    async fn stat_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectMetadata> {
        self.record(BackendCall::StatObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;
        validate_bucket(bucket)?;
        validate_key(key)?;

        let state = self.state.read().await;
        let stored = state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        let object = stored.objects.get(key).ok_or_else(|| no_such_key(key))?;

        Ok(ObjectMetadata {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: object.data.len() as u64,
            etag: Some(object.etag.clone()),
            content_type: object.content_type.clone(),
            last_modified: Some(object.last_modified),
            version_id: object.version_id.clone(),
            user_metadata: object.user_metadata.clone(),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectStream> {
        self.record(BackendCall::GetObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;
        validate_bucket(bucket)?;
        validate_key(key)?;

        let data = {
            let state = self.state.read().await;
            let stored = state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
            stored
                .objects
                .get(key)
                .ok_or_else(|| no_such_key(key))?
                .data
                .clone()
        };

        let truncate_after = self
            .truncate_downloads_after
            .lock()
            .map(|limit| *limit)
            .unwrap_or(None);

        let mut items: Vec<io::Result<Bytes>> = Vec::new();
        match truncate_after {
            Some(limit) if limit < data.len() => {
                items.extend(
                    data.slice(..limit)
                        .chunks(CHUNK_SIZE)
                        .map(|chunk| Ok(Bytes::copy_from_slice(chunk))),
                );
                items.push(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before the object was fully read",
                )));
            }
            _ => items.extend(
                data.chunks(CHUNK_SIZE)
                    .map(|chunk| Ok(Bytes::copy_from_slice(chunk))),
            ),
        }

        let guard = StreamGuard::open(self.open_streams.clone());
        let stream = futures::stream::iter(items).map(move |item| {
            let _open = &guard;
            item
        });
        Ok(Box::pin(stream))
    }

    async fn put_object(&self, request: PutObjectRequest) -> BackendResult<()> {
        let PutObjectRequest {
            bucket,
            key,
            body,
            content_type,
            user_metadata,
        } = request;

        self.record(BackendCall::PutObject {
            bucket: bucket.clone(),
            key: key.clone(),
            content_type: content_type.clone(),
            user_metadata: user_metadata.clone(),
        })?;
        validate_bucket(&bucket)?;
        validate_key(&key)?;

        if !self.state.read().await.buckets.contains_key(&bucket) {
            return Err(no_such_bucket(&bucket));
        }

        let mut data = BytesMut::new();
        let mut stream = body.stream;
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk?);
        }
        if data.len() as u64 != body.content_length {
            return Err(BackendError::service(
                400,
                "IncompleteBody",
                "You did not provide the number of bytes specified by the Content-Length HTTP header.",
            ));
        }
        let data = data.freeze();

        let version_id = {
            let state = self.state.read().await;
            let versioned = state
                .buckets
                .get(&bucket)
                .map_or(false, |stored| stored.versioning == Some(VersioningStatus::Enabled));
            versioned.then(|| self.next_version_id())
        };

        let mut state = self.state.write().await;
        let stored = state
            .buckets
            .get_mut(&bucket)
            .ok_or_else(|| no_such_bucket(&bucket))?;
        stored.objects.insert(
            key,
            StoredObject {
                etag: format!("{:x}", md5::compute(&data)),
                data,
                content_type,
                user_metadata: user_metadata.unwrap_or_default(),
                last_modified: Utc::now(),
                version_id,
            },
        );
        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> BackendResult<()> {
        self.record(BackendCall::RemoveObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;
        validate_bucket(bucket)?;
        validate_key(key)?;

        let mut state = self.state.write().await;
        let stored = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        // Deleting a missing key succeeds, as on S3
        stored.objects.remove(key);
        Ok(())
    }
}
