use http::StatusCode;

use crate::adapters::outbound::storage::s3::xml::parse_error;
use crate::domain::errors::BackendError;

/// Convert reqwest errors to backend errors
impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return BackendError::service(status.as_u16(), "", err.to_string());
        }
        if err.is_timeout() {
            return BackendError::Transport(format!("request timed out: {}", err));
        }
        BackendError::Transport(err.to_string())
    }
}

impl From<quick_xml::Error> for BackendError {
    fn from(err: quick_xml::Error) -> Self {
        BackendError::Xml(err.to_string())
    }
}

impl From<quick_xml::DeError> for BackendError {
    fn from(err: quick_xml::DeError) -> Self {
        BackendError::Xml(err.to_string())
    }
}

impl From<http::Error> for BackendError {
    fn from(err: http::Error) -> Self {
        BackendError::Transport(format!("invalid request: {}", err))
    }
}

/// Build the error for a non-success response from its status and body.
///
/// HEAD responses carry no body, so the status alone decides the code.
pub fn service_error(status: StatusCode, body: &str) -> BackendError {
    match parse_error(body) {
        Some(error) => BackendError::service(status.as_u16(), error.code, error.message),
        None => {
            let code = match status {
                StatusCode::NOT_FOUND => "NotFound",
                StatusCode::FORBIDDEN => "AccessDenied",
                _ => "",
            };
            let message = status
                .canonical_reason()
                .unwrap_or("Unexpected response")
                .to_string();
            BackendError::service(status.as_u16(), code, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_uses_error_document() {
        let err = service_error(
            StatusCode::CONFLICT,
            "<Error><Code>BucketNotEmpty</Code><Message>The bucket you tried to delete is not empty</Message></Error>",
        );
        assert_eq!(err.code(), Some("BucketNotEmpty"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_service_error_without_body() {
        let err = service_error(StatusCode::NOT_FOUND, "");
        assert!(err.is_not_found());
        assert_eq!(err.code(), Some("NotFound"));

        let err = service_error(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(err.code(), None);
        assert!(err.to_string().contains("Internal Server Error"));
    }
}
