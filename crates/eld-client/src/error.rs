//! Error types for vendor HTTP calls

use eld_core::{EldError, EldVendor};
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to a vendor API
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Path has a `.` or `..` segment and cannot name a resource
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Server returned an error response
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Credentials or token rejected (401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Timeout
    #[error("Request timed out")]
    Timeout,
}

impl ClientError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    /// Whether the vendor rejected our credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// Convert into the provider error taxonomy for `vendor`
    pub fn into_eld_error(self, vendor: EldVendor) -> EldError {
        match self {
            ClientError::Unauthorized(message) => EldError::authentication(vendor, message),
            ClientError::ServerError { status, message } => EldError::Vendor {
                vendor,
                status,
                message,
            },
            ClientError::NotFound(message) => EldError::Vendor {
                vendor,
                status: 404,
                message,
            },
            ClientError::ParseError(message) => EldError::Parse { vendor, message },
            ClientError::InvalidUrl(e) => {
                EldError::Configuration(format!("invalid {} URL: {}", vendor, e))
            }
            ClientError::InvalidPath(path) => {
                EldError::InvalidRequest(format!("{} cannot address a {} resource", path, vendor))
            }
            ClientError::Timeout => EldError::Transport {
                vendor,
                message: "request timed out".to_string(),
            },
            ClientError::HttpError(e) if e.is_decode() => EldError::Parse {
                vendor,
                message: e.to_string(),
            },
            ClientError::HttpError(e) => EldError::Transport {
                vendor,
                message: e.to_string(),
            },
            ClientError::IoError(e) => EldError::Transport {
                vendor,
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_authentication() {
        let err = ClientError::Unauthorized("invalid token".into()).into_eld_error(EldVendor::Motive);
        assert!(err.is_authentication());
        assert_eq!(err.vendor(), Some(EldVendor::Motive));
    }

    #[test]
    fn test_server_error_keeps_status() {
        let err = ClientError::server_error(503, "maintenance").into_eld_error(EldVendor::Samsara);
        match err {
            EldError::Vendor {
                status, message, ..
            } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_timeout_is_transport() {
        let err = ClientError::Timeout.into_eld_error(EldVendor::Geotab);
        assert!(matches!(err, EldError::Transport { .. }));
    }
}
