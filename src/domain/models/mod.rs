pub mod bucket;
pub mod bucket_spec;
pub mod object;
pub mod retention;

pub use bucket::{BucketConfiguration, BucketState};
pub use bucket_spec::{BucketSpec, RetentionDurationSpec, RetentionSpec};
pub use object::{ObjectBody, ObjectMetadata, ObjectStream, PutObjectRequest};
pub use retention::{
    ObjectLockConfiguration, ObjectLockStatus, RetentionDuration, RetentionMode,
    VersioningConfiguration, VersioningStatus,
};
