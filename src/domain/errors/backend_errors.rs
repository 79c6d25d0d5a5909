use super::ValidationError;

/// Failures reported by a storage backend client.
///
/// This is the underlying cause carried by every [`super::StorageError`]
/// that involved the backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Service error: {status} {code} - {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Request signing error: {0}")]
    Signing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    pub fn service(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        BackendError::Service {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        BackendError::NotFound {
            resource: resource.into(),
        }
    }

    /// The S3 error code, when the backend sent one
    pub fn code(&self) -> Option<&str> {
        match self {
            BackendError::Service { code, .. } if !code.is_empty() => Some(code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            BackendError::NotFound { .. } => true,
            BackendError::Service { status, code, .. } => {
                *status == 404 || code.starts_with("NoSuch")
            }
            _ => false,
        }
    }
}

/// Result type for backend client calls
pub type BackendResult<T> = Result<T, BackendError>;
