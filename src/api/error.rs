use thiserror::Error;

/// Errors that can come out of the posts API client.
///
/// Every failure mode of a request is normalized into one of these variants;
/// nothing panics or escapes past the client boundary. `AuthFailure` is kept
/// distinct so a caller can prompt for re-authentication instead of showing
/// a generic error.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Credential rejected (401/403)
    #[error("Authentication failed: status {0}")]
    AuthFailure(u16),
    /// Endpoint or resource absent (404)
    #[error("Not found")]
    NotFound,
    /// Request rejected by the server as invalid (other 4xx)
    #[error("Invalid request: {0}")]
    Validation(String),
    /// Server-side failure: 5xx, or a 2xx envelope with `success: false`
    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },
    /// 2xx response whose body could not be parsed as the expected envelope
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// Response body exceeded the size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Insecure base URL: HTTPS required (except localhost for testing)
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
    /// Base URL could not be parsed
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// Returns true if this error is transient and the request may be retried.
    ///
    /// Validation-class failures (4xx) are never retryable: the request will
    /// fail the same way again, and retrying mutations risks duplicate side
    /// effects.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout | ApiError::Network(_) => true,
            ApiError::Server { status, .. } => *status >= 500,
            ApiError::AuthFailure(_)
            | ApiError::NotFound
            | ApiError::Validation(_)
            | ApiError::MalformedResponse(_)
            | ApiError::ResponseTooLarge(_)
            | ApiError::InsecureBaseUrl
            | ApiError::InvalidBaseUrl(_) => false,
        }
    }

    /// Classify a non-2xx HTTP status, attaching the server's message when
    /// the body carried one.
    pub(crate) fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            401 | 403 => ApiError::AuthFailure(status),
            404 => ApiError::NotFound,
            400..=499 => {
                ApiError::Validation(message.unwrap_or_else(|| format!("HTTP status {}", status)))
            }
            _ => ApiError::Server {
                status,
                message: message.unwrap_or_else(|| "Request failed".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_and_network_class_retryable() {
        assert!(ApiError::Timeout.is_retryable());
        assert!(ApiError::Server {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_validation_class_not_retryable() {
        assert!(!ApiError::AuthFailure(401).is_retryable());
        assert!(!ApiError::NotFound.is_retryable());
        assert!(!ApiError::Validation("bad filter".into()).is_retryable());
        assert!(!ApiError::MalformedResponse("truncated".into()).is_retryable());
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ApiError::from_status(401, None),
            ApiError::AuthFailure(401)
        ));
        assert!(matches!(ApiError::from_status(404, None), ApiError::NotFound));
        match ApiError::from_status(422, Some("missing content".into())) {
            ApiError::Validation(msg) => assert_eq!(msg, "missing content"),
            e => panic!("Expected Validation, got {:?}", e),
        }
        match ApiError::from_status(500, None) {
            ApiError::Server { status: 500, .. } => {}
            e => panic!("Expected Server, got {:?}", e),
        }
    }
}
