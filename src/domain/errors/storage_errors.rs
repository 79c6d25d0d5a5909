use super::BackendError;

/// Logical facade operation named in request failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    BucketExists,
    ListBuckets,
    GetBucket,
    CreateBucket,
    RemoveBucket,
    DescribeBucket,
    StatObject,
    Download,
    Upload,
    RemoveObject,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::BucketExists => "BucketExists",
            Operation::ListBuckets => "ListBuckets",
            Operation::GetBucket => "GetBucket",
            Operation::CreateBucket => "CreateBucket",
            Operation::RemoveBucket => "RemoveBucket",
            Operation::DescribeBucket => "DescribeBucket",
            Operation::StatObject => "StatObject",
            Operation::Download => "Download",
            Operation::Upload => "Upload",
            Operation::RemoveObject => "RemoveObject",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced to callers of the provisioner and the storage facade
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A connection or proxy parameter failed local validation
    #[error("Invalid configuration parameter {parameter}. Expected {expected}")]
    InvalidConfiguration { parameter: String, expected: String },

    /// One step of reconciling a declared bucket failed
    #[error("Failed to create bucket '{bucket}': {source}")]
    BucketCreation {
        bucket: String,
        #[source]
        source: BackendError,
    },

    /// A facade operation failed against the backend or the local filesystem
    #[error("{operation} request failed: {source}")]
    Request {
        operation: Operation,
        #[source]
        source: BackendError,
    },

    /// At least one declared bucket could not be reconciled
    #[error("{} bucket(s) failed to reconcile", .failures.len())]
    Reconciliation { failures: Vec<StorageError> },
}

impl StorageError {
    pub fn invalid_configuration(parameter: impl Into<String>, expected: impl Into<String>) -> Self {
        StorageError::InvalidConfiguration {
            parameter: parameter.into(),
            expected: expected.into(),
        }
    }

    /// Wrap a backend failure as a failed facade request, for use with `map_err`
    pub fn request(operation: Operation) -> impl FnOnce(BackendError) -> StorageError {
        move |source| StorageError::Request { operation, source }
    }

    /// Wrap a backend failure as a failed bucket reconciliation, for use with `map_err`
    pub fn bucket_creation(bucket: &str) -> impl FnOnce(BackendError) -> StorageError + '_ {
        move |source| StorageError::BucketCreation {
            bucket: bucket.to_string(),
            source,
        }
    }

    /// The operation name for request failures
    pub fn operation(&self) -> Option<Operation> {
        match self {
            StorageError::Request { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::Request { source, .. } | StorageError::BucketCreation { source, .. } => {
                source.is_not_found()
            }
            _ => false,
        }
    }
}

/// Result type for provisioning and facade operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_message() {
        let err = StorageError::invalid_configuration("proxyPort", "valid port (ex: 9000)");
        assert_eq!(
            err.to_string(),
            "Invalid configuration parameter proxyPort. Expected valid port (ex: 9000)"
        );
    }

    #[test]
    fn test_request_error_carries_operation_and_cause() {
        let err = StorageError::request(Operation::StatObject)(BackendError::not_found(
            "object report.csv in bucket logs",
        ));

        assert_eq!(err.operation(), Some(Operation::StatObject));
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("StatObject request failed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_bucket_creation_error_names_bucket() {
        let err =
            StorageError::bucket_creation("logs")(BackendError::service(403, "AccessDenied", "no"));
        assert!(err.to_string().contains("'logs'"));
        assert_eq!(err.operation(), None);
    }

    #[test]
    fn test_reconciliation_error_counts_failures() {
        let err = StorageError::Reconciliation {
            failures: vec![
                StorageError::bucket_creation("a-bucket")(BackendError::Transport("x".into())),
                StorageError::bucket_creation("b-bucket")(BackendError::Transport("y".into())),
            ],
        };
        assert_eq!(err.to_string(), "2 bucket(s) failed to reconcile");
    }
}
