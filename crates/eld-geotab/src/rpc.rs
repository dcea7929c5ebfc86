//! MyGeotab JSON-RPC envelope

use eld_core::{EldError, EldVendor};
use serde::{Deserialize, Serialize};

/// Exceptions that mean the credentials or session were rejected
const AUTH_EXCEPTIONS: &[&str] = &["InvalidUserException", "DbUnavailableException"];

/// `path` value meaning "keep using the server you authenticated against"
pub const THIS_SERVER: &str = "ThisServer";

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub method: &'a str,
    pub params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

impl<T> RpcResponse<T> {
    /// Split into the result (absent for `Remove`-style calls) or the RPC error
    pub fn into_result(self) -> Result<Option<T>, RpcError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<RpcErrorDetail>,
    #[serde(default)]
    pub data: Option<RpcErrorData>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorDetail {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorData {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

impl RpcError {
    /// Exception names carried anywhere in the error
    fn exception_names(&self) -> impl Iterator<Item = &str> {
        self.name
            .as_deref()
            .into_iter()
            .chain(self.errors.iter().filter_map(|e| e.name.as_deref()))
            .chain(
                self.data
                    .as_ref()
                    .and_then(|d| d.error_type.as_deref()),
            )
    }

    pub fn is_authentication(&self) -> bool {
        self.exception_names()
            .any(|name| AUTH_EXCEPTIONS.contains(&name))
    }

    /// Most specific exception name, for messages
    fn exception_name(&self) -> &str {
        self.errors
            .iter()
            .find_map(|e| e.name.as_deref())
            .or_else(|| self.data.as_ref().and_then(|d| d.error_type.as_deref()))
            .or(self.name.as_deref())
            .unwrap_or("JSONRPCError")
    }

    fn detail_message(&self) -> String {
        if !self.message.is_empty() {
            return self.message.clone();
        }
        self.errors
            .iter()
            .find_map(|e| e.message.clone())
            .unwrap_or_else(|| self.exception_name().to_string())
    }

    pub fn into_eld_error(self) -> EldError {
        if self.is_authentication() {
            EldError::authentication(EldVendor::Geotab, self.detail_message())
        } else {
            EldError::Vendor {
                vendor: EldVendor::Geotab,
                status: 0,
                message: format!("{}: {}", self.exception_name(), self.detail_message()),
            }
        }
    }
}

/// Session credentials echoed on every call after `Authenticate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredentials {
    pub user_name: String,
    pub database: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthenticateResult {
    pub credentials: SessionCredentials,
    #[serde(default)]
    pub path: Option<String>,
}

impl AuthenticateResult {
    /// Server that must serve subsequent calls, when it differs from the
    /// one that authenticated
    pub fn redirect(&self) -> Option<&str> {
        self.path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty() && *p != THIS_SERVER)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn error(value: serde_json::Value) -> RpcError {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_invalid_user_is_authentication() {
        let err = error(json!({
            "message": "Incorrect login credentials",
            "name": "JSONRPCError",
            "errors": [{"name": "InvalidUserException", "message": "Incorrect login credentials"}]
        }));
        assert!(err.is_authentication());
        assert!(err.into_eld_error().is_authentication());
    }

    #[test]
    fn test_db_unavailable_in_data_type() {
        let err = error(json!({"message": "down", "data": {"type": "DbUnavailableException"}}));
        assert!(err.is_authentication());
    }

    #[test]
    fn test_other_errors_are_vendor_errors() {
        let err = error(json!({
            "message": "Unknown type",
            "errors": [{"name": "MissingMethodException"}]
        }));
        match err.into_eld_error() {
            EldError::Vendor {
                status, message, ..
            } => {
                assert_eq!(status, 0);
                assert_eq!(message, "MissingMethodException: Unknown type");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_result_or_error() {
        let ok: RpcResponse<u32> = serde_json::from_value(json!({"result": 3})).unwrap();
        assert_eq!(ok.into_result().unwrap(), Some(3));

        let empty: RpcResponse<u32> = serde_json::from_value(json!({"result": null})).unwrap();
        assert_eq!(empty.into_result().unwrap(), None);

        let failed: RpcResponse<u32> =
            serde_json::from_value(json!({"error": {"message": "boom"}})).unwrap();
        assert!(failed.into_result().is_err());
    }

    #[test]
    fn test_redirect_path() {
        let result = |path: serde_json::Value| -> AuthenticateResult {
            serde_json::from_value(json!({
                "credentials": {"userName": "u", "database": "db", "sessionId": "s"},
                "path": path
            }))
            .unwrap()
        };
        assert_eq!(result(json!("ThisServer")).redirect(), None);
        assert_eq!(result(json!(null)).redirect(), None);
        assert_eq!(result(json!("my3.geotab.com")).redirect(), Some("my3.geotab.com"));
    }
}
