use std::collections::HashMap;
use std::io;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::Serialize;

/// Lazily read, single pass object body.
///
/// The stream holds the backend connection open until it is exhausted or
/// dropped; it cannot be restarted.
pub type ObjectStream = BoxStream<'static, io::Result<Bytes>>;

/// Metadata about an object, fetched without transferring its body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMetadata {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub etag: Option<String>,
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub version_id: Option<String>,
    pub user_metadata: HashMap<String, String>,
}

/// Body of an object upload with its exact length
pub struct ObjectBody {
    pub stream: ObjectStream,
    pub content_length: u64,
}

impl ObjectBody {
    pub fn new(stream: ObjectStream, content_length: u64) -> Self {
        Self {
            stream,
            content_length,
        }
    }

    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let content_length = data.len() as u64;
        Self {
            stream: Box::pin(futures::stream::once(async move {
                Ok::<_, io::Error>(data)
            })),
            content_length,
        }
    }
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Request to store an object
#[derive(Debug)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: ObjectBody,
    pub content_type: Option<String>,
    /// `None` sends no metadata instruction at all
    pub user_metadata: Option<HashMap<String, String>>,
}
