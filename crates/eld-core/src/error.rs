//! Common error types for ELD providers

use thiserror::Error;

use crate::models::EldVendor;

/// Result type for provider operations
pub type EldResult<T> = Result<T, EldError>;

/// Errors that can occur in ELD providers and the connection facade
#[derive(Debug, Error)]
pub enum EldError {
    /// Vendor rejected the supplied credentials or session
    #[error("Authentication failed for {vendor}: {message}")]
    Authentication {
        /// Vendor that rejected the credentials
        vendor: EldVendor,
        /// Vendor-supplied or synthesized reason
        message: String,
    },

    /// A delegated call was made while no vendor is connected
    #[error("No ELD provider connected")]
    NotConnected,

    /// Provider registry or credential mismatch
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Adapter used before `authenticate` succeeded
    #[error("No active {0} session; authenticate first")]
    MissingSession(EldVendor),

    /// Vendor returned a non-success response
    #[error("{vendor} returned HTTP {status}: {message}")]
    Vendor {
        /// Vendor that produced the response
        vendor: EldVendor,
        /// HTTP status (or 0 for RPC-level errors)
        status: u16,
        /// Error message from the response body
        message: String,
    },

    /// Network failure or timeout
    #[error("Transport error talking to {vendor}: {message}")]
    Transport {
        /// Vendor being contacted
        vendor: EldVendor,
        /// Underlying transport error
        message: String,
    },

    /// Vendor response could not be decoded
    #[error("Failed to parse {vendor} response: {message}")]
    Parse {
        /// Vendor that produced the response
        vendor: EldVendor,
        /// Decoder error
        message: String,
    },

    /// Invalid argument supplied by the caller
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl EldError {
    /// Build an authentication error
    pub fn authentication(vendor: EldVendor, message: impl Into<String>) -> Self {
        Self::Authentication {
            vendor,
            message: message.into(),
        }
    }

    /// Whether this error means the credentials or session were rejected
    pub fn is_authentication(&self) -> bool {
        matches!(self, EldError::Authentication { .. })
    }

    /// Vendor associated with this error, if any
    pub fn vendor(&self) -> Option<EldVendor> {
        match self {
            EldError::Authentication { vendor, .. }
            | EldError::Vendor { vendor, .. }
            | EldError::Transport { vendor, .. }
            | EldError::Parse { vendor, .. } => Some(*vendor),
            EldError::MissingSession(vendor) => Some(*vendor),
            EldError::NotConnected | EldError::Configuration(_) | EldError::InvalidRequest(_) => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_helper() {
        let err = EldError::authentication(EldVendor::Samsara, "bad key");
        assert!(err.is_authentication());
        assert_eq!(err.vendor(), Some(EldVendor::Samsara));
        assert_eq!(err.to_string(), "Authentication failed for samsara: bad key");
    }

    #[test]
    fn test_not_connected_has_no_vendor() {
        assert_eq!(EldError::NotConnected.vendor(), None);
        assert!(!EldError::NotConnected.is_authentication());
    }
}
