//! Vendor identity, credentials and tokens

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported telematics vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EldVendor {
    Samsara,
    Geotab,
    Motive,
}

impl EldVendor {
    /// All vendors, in catalog order
    pub const ALL: [EldVendor; 3] = [EldVendor::Samsara, EldVendor::Geotab, EldVendor::Motive];

    /// Lowercase tag used on the wire and in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            EldVendor::Samsara => "samsara",
            EldVendor::Geotab => "geotab",
            EldVendor::Motive => "motive",
        }
    }
}

impl fmt::Display for EldVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EldVendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "samsara" => Ok(EldVendor::Samsara),
            "geotab" => Ok(EldVendor::Geotab),
            // KeepTruckin rebranded to Motive; accept the old tag too
            "motive" | "keeptruckin" => Ok(EldVendor::Motive),
            _ => Err(format!("Unknown ELD vendor: '{}'", s)),
        }
    }
}

/// Credentials accepted by `authenticate`, keyed by vendor.
///
/// Only used at authentication time; the core never persists them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "vendor", rename_all = "lowercase")]
pub enum Credentials {
    /// Samsara API token
    Samsara { api_key: String },
    /// Geotab MyGeotab user, password and database
    Geotab {
        username: String,
        password: String,
        database: String,
        /// Federation server (e.g. "my.geotab.com"); adapter default when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        server: Option<String>,
    },
    /// Motive API key
    Motive { api_key: String },
}

impl Credentials {
    /// Vendor these credentials belong to
    pub fn vendor(&self) -> EldVendor {
        match self {
            Credentials::Samsara { .. } => EldVendor::Samsara,
            Credentials::Geotab { .. } => EldVendor::Geotab,
            Credentials::Motive { .. } => EldVendor::Motive,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Samsara { .. } => f
                .debug_struct("Samsara")
                .field("api_key", &"<redacted>")
                .finish(),
            Credentials::Geotab {
                username,
                database,
                server,
                ..
            } => f
                .debug_struct("Geotab")
                .field("username", username)
                .field("password", &"<redacted>")
                .field("database", database)
                .field("server", server)
                .finish(),
            Credentials::Motive { .. } => f
                .debug_struct("Motive")
                .field("api_key", &"<redacted>")
                .finish(),
        }
    }
}

/// Token issued by a provider after successful authentication.
///
/// Owned by the adapter that issued it; callers only check presence and
/// expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    /// Opaque token (API key or session id)
    pub access_token: String,
    /// Token kind label ("Bearer", "Session", "ApiKey")
    pub token_type: String,
    /// Absolute expiry instant
    pub expires_at: DateTime<Utc>,
    /// Refresh token, when the vendor issues one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}
