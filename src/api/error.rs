//! Error types for the AI Mastering API client.
//!
//! [`ApiError`] separates responses the service rejected from failures of the
//! transport itself. Both are fatal to a run; the distinction only matters
//! for the message shown to the operator.

use thiserror::Error;

/// Errors that can occur while talking to the AI Mastering API or fetching a
/// signed download URL.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success HTTP status.
    /// Carries the status code and the response body (or a placeholder).
    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },

    /// Underlying network failure (DNS, refused connection, broken body).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ApiError {
    /// True when the server reported that the addressed object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        let err = ApiError::Status {
            status: 401,
            message: "invalid access token".into(),
        };
        assert_eq!(
            err.to_string(),
            "API error (status 401): invalid access token"
        );
    }

    #[test]
    fn not_found_detection() {
        let missing = ApiError::Status {
            status: 404,
            message: String::new(),
        };
        let denied = ApiError::Status {
            status: 403,
            message: String::new(),
        };
        assert!(missing.is_not_found());
        assert!(!denied.is_not_found());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
    }
}
