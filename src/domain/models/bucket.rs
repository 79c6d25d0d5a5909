use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::models::retention::{ObjectLockStatus, VersioningStatus};

/// A bucket as reported by the backend's bucket listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketState {
    pub name: String,
    pub creation_date: Option<DateTime<Utc>>,
}

impl BucketState {
    pub fn new(name: impl Into<String>, creation_date: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            creation_date,
        }
    }
}

/// Feature configuration observed on a bucket, fetched fresh on every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketConfiguration {
    pub name: String,
    /// `None` when versioning was never configured on the bucket
    pub versioning: Option<VersioningStatus>,
    pub object_lock: ObjectLockStatus,
    pub policy: Option<String>,
}

impl BucketConfiguration {
    pub fn versioning_enabled(&self) -> bool {
        self.versioning == Some(VersioningStatus::Enabled)
    }
}
