use bytes::Bytes;
use futures::StreamExt;
use object_store_provisioner::{
    adapters::outbound::storage::{BackendCall, CallKind, InMemoryBackend},
    domain::{
        errors::{BackendError, Operation},
        models::{ObjectBody, PutObjectRequest},
    },
    ports::{
        services::{BucketService, ObjectService},
        storage::StorageBackend,
    },
    services::StorageService,
    StorageError,
};
use std::collections::HashMap;
use std::sync::Arc;

fn service() -> (Arc<InMemoryBackend>, StorageService) {
    let backend = Arc::new(InMemoryBackend::new());
    (backend.clone(), StorageService::new(backend))
}

fn write_source(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_get_bucket_after_create() {
    let (_, storage) = service();

    let created = storage.create_bucket("x-bucket").await.unwrap();
    assert_eq!(created.name, "x-bucket");

    let fetched = storage.get_bucket("x-bucket").await.unwrap();
    assert_eq!(fetched.name, "x-bucket");
    assert!(fetched.creation_date.is_some());
    assert!(storage.bucket_exists("x-bucket").await.unwrap());
}

#[tokio::test]
async fn test_missing_bucket() {
    let (_, storage) = service();

    assert!(!storage.bucket_exists("nowhere").await.unwrap());

    let err = storage.get_bucket("nowhere").await.unwrap_err();
    assert_eq!(err.operation(), Some(Operation::GetBucket));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_buckets_is_complete() {
    let (_, storage) = service();
    for name in ["alpha", "beta", "gamma"] {
        storage.create_bucket(name).await.unwrap();
    }

    let names = storage
        .list_buckets()
        .await
        .unwrap()
        .into_iter()
        .map(|bucket| bucket.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);
}

#[tokio::test]
async fn test_create_existing_bucket_fails() {
    let (_, storage) = service();
    storage.create_bucket("logs").await.unwrap();

    let err = storage.create_bucket("logs").await.unwrap_err();
    match err {
        StorageError::Request { operation, source } => {
            assert_eq!(operation, Operation::CreateBucket);
            assert_eq!(source.code(), Some("BucketAlreadyOwnedByYou"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_upload_without_metadata_sends_none() {
    let (backend, storage) = service();
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "report.csv", b"a,b\n1,2\n");
    storage.create_bucket("reports").await.unwrap();

    storage
        .upload(&source, "2024/report.csv", "reports", None)
        .await
        .unwrap();

    assert_eq!(
        backend.calls_of(CallKind::PutObject),
        vec![BackendCall::PutObject {
            bucket: "reports".to_string(),
            key: "2024/report.csv".to_string(),
            content_type: Some("text/csv".to_string()),
            user_metadata: None,
        }]
    );

    let metadata = storage
        .stat_object("2024/report.csv", "reports")
        .await
        .unwrap();
    assert_eq!(metadata.size, 8);
    assert!(metadata.user_metadata.is_empty());
    assert_eq!(metadata.content_type.as_deref(), Some("text/csv"));
}

#[tokio::test]
async fn test_upload_with_metadata() {
    let (_, storage) = service();
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "blob", b"\x00\x01\x02");
    storage.create_bucket("blobs").await.unwrap();

    let metadata = HashMap::from([("owner".to_string(), "data-team".to_string())]);
    storage
        .upload(&source, "raw/blob", "blobs", Some(metadata.clone()))
        .await
        .unwrap();

    let stat = storage.stat_object("raw/blob", "blobs").await.unwrap();
    assert_eq!(stat.user_metadata, metadata);
    assert_eq!(stat.content_type.as_deref(), Some("application/octet-stream"));
    assert!(stat.etag.is_some());
}

#[tokio::test]
async fn test_upload_missing_file_fails() {
    let (backend, storage) = service();
    let dir = tempfile::tempdir().unwrap();
    storage.create_bucket("blobs").await.unwrap();

    let err = storage
        .upload(&dir.path().join("missing"), "missing", "blobs", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StorageError::Request {
            operation: Operation::Upload,
            source: BackendError::Io(_),
        }
    ));
    assert!(backend.calls_of(CallKind::PutObject).is_empty());
}

#[tokio::test]
async fn test_download_to_path_copies_every_byte() {
    let (backend, storage) = service();
    let content = (0..100_000u32).map(|i| (i % 251) as u8).collect::<Vec<_>>();
    storage.create_bucket("data").await.unwrap();
    backend.insert_object("data", "big.bin", content.clone()).await;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("big.bin");
    std::fs::write(&destination, b"stale content that is longer than nothing").unwrap();

    let path = storage
        .download_to_path(&destination, "big.bin", "data")
        .await
        .unwrap();

    assert_eq!(path, destination);
    assert_eq!(std::fs::read(&destination).unwrap(), content);
    assert_eq!(backend.open_streams(), 0);
}

#[tokio::test]
async fn test_truncated_download_releases_stream_and_file() {
    let (backend, storage) = service();
    storage.create_bucket("data").await.unwrap();
    backend
        .insert_object("data", "log.txt", "0123456789abcdef")
        .await;
    backend.truncate_downloads_after(Some(4));

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("log.txt");

    let err = storage
        .download_to_path(&destination, "log.txt", "data")
        .await
        .unwrap_err();

    match &err {
        StorageError::Request { operation, source } => {
            assert_eq!(*operation, Operation::Download);
            assert!(matches!(source, BackendError::Io(_)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(backend.open_streams(), 0);

    // The partial file is left in place and is no longer held open
    assert_eq!(std::fs::read(&destination).unwrap(), b"0123");
    std::fs::remove_file(&destination).unwrap();
}

#[tokio::test]
async fn test_download_as_stream_is_released_on_drop() {
    let (backend, storage) = service();
    storage.create_bucket("data").await.unwrap();
    backend.insert_object("data", "a.txt", "hello").await;

    let mut stream = storage.download_as_stream("a.txt", "data").await.unwrap();
    assert_eq!(backend.open_streams(), 1);

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first, Bytes::from_static(b"hello"));
    drop(stream);
    assert_eq!(backend.open_streams(), 0);
}

#[tokio::test]
async fn test_stat_and_remove_object() {
    let (backend, storage) = service();
    storage.create_bucket("data").await.unwrap();
    backend.insert_object("data", "a.txt", "hello").await;

    assert_eq!(storage.stat_object("a.txt", "data").await.unwrap().size, 5);

    storage.remove_object("a.txt", "data").await.unwrap();

    let err = storage.stat_object("a.txt", "data").await.unwrap_err();
    assert_eq!(err.operation(), Some(Operation::StatObject));
    assert!(err.is_not_found());

    let err = storage.download_as_stream("a.txt", "data").await.err().expect("expected download to fail");
    assert_eq!(err.operation(), Some(Operation::Download));
}

#[tokio::test]
async fn test_remove_non_empty_bucket_fails() {
    let (backend, storage) = service();
    storage.create_bucket("data").await.unwrap();
    backend.insert_object("data", "a.txt", "hello").await;

    let err = storage.remove_bucket("data").await.unwrap_err();
    match err {
        StorageError::Request { operation, source } => {
            assert_eq!(operation, Operation::RemoveBucket);
            assert_eq!(source.code(), Some("BucketNotEmpty"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    storage.remove_object("a.txt", "data").await.unwrap();
    storage.remove_bucket("data").await.unwrap();
    assert!(!storage.bucket_exists("data").await.unwrap());
}

#[tokio::test]
async fn test_remove_missing_bucket_fails() {
    let (_, storage) = service();

    let err = storage.remove_bucket("ghost").await.unwrap_err();
    assert_eq!(err.operation(), Some(Operation::RemoveBucket));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_describe_fresh_bucket() {
    let (_, storage) = service();
    storage.create_bucket("plain").await.unwrap();

    let configuration = storage.describe_bucket("plain").await.unwrap();
    assert_eq!(configuration.name, "plain");
    assert_eq!(configuration.versioning, None);
    assert!(!configuration.object_lock.enabled);
    assert_eq!(configuration.policy, None);

    let err = storage.describe_bucket("ghost").await.unwrap_err();
    assert_eq!(err.operation(), Some(Operation::DescribeBucket));
}

#[tokio::test]
async fn test_failing_body_stream_aborts_upload() {
    let backend = InMemoryBackend::new();
    backend.make_bucket("data", false).await.unwrap();

    let body = async_stream::stream! {
        yield Ok(Bytes::from_static(b"partial"));
        yield Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "source went away"));
    };
    let request = PutObjectRequest {
        bucket: "data".to_string(),
        key: "broken.bin".to_string(),
        body: ObjectBody::new(Box::pin(body), 1024),
        content_type: None,
        user_metadata: None,
    };

    let err = backend.put_object(request).await.unwrap_err();
    assert!(matches!(err, BackendError::Io(_)));
    assert!(backend.stat_object("data", "broken.bin").await.is_err());
}

#[tokio::test]
async fn test_short_body_is_rejected() {
    let backend = InMemoryBackend::new();
    backend.make_bucket("data", false).await.unwrap();

    let request = PutObjectRequest {
        bucket: "data".to_string(),
        key: "short.bin".to_string(),
        body: ObjectBody::new(ObjectBody::from_bytes("abc").stream, 10),
        content_type: None,
        user_metadata: None,
    };

    let err = backend.put_object(request).await.unwrap_err();
    assert_eq!(err.code(), Some("IncompleteBody"));
}

#[tokio::test]
async fn test_versioned_bucket_assigns_version_ids() {
    let (backend, storage) = service();
    backend.make_bucket("locked", true).await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "a.txt", b"v1");

    storage.upload(&source, "a.txt", "locked", None).await.unwrap();

    let stat = storage.stat_object("a.txt", "locked").await.unwrap();
    assert!(stat.version_id.is_some());
}

#[tokio::test]
async fn test_dot_segment_key_is_rejected() {
    let (backend, storage) = service();
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(&dir, "secret.txt", b"keep");
    storage.create_bucket("data").await.unwrap();
    storage.upload(&source, "secret.txt", "data", None).await.unwrap();

    let err = storage
        .upload(&source, "a/../secret.txt", "data", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Request {
            operation: Operation::Upload,
            source: BackendError::Validation(_),
        }
    ));

    let err = storage
        .remove_object("a/../secret.txt", "data")
        .await
        .unwrap_err();
    assert_eq!(err.operation(), Some(Operation::RemoveObject));
    assert_eq!(storage.stat_object("secret.txt", "data").await.unwrap().size, 4);
    assert!(backend.stat_object("data", "a/../secret.txt").await.is_err());
}
