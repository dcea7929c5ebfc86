//! Vendor-neutral JSON REST client

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ClientError, Result};

/// Percent-encode a vendor id for use as a single path segment.
///
/// Ids are opaque; everything outside the RFC 3986 unreserved set is
/// escaped so an id can never split into two segments. Ids made only of
/// dots still resolve as `.`/`..` and are rejected by [`RestClient::endpoint`].
pub fn encode_path_segment(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(char::from(byte))
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Whether URL parsing would treat `segment` as `.` or `..`
fn is_dot_segment(segment: &str) -> bool {
    let lowered = segment.to_ascii_lowercase().replace("%2e", ".");
    lowered == "." || lowered == ".."
}

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Authentication attached to a single request
#[derive(Debug, Clone, Copy)]
pub enum RequestAuth<'a> {
    /// No credentials (login calls, public endpoints)
    None,
    /// `Authorization: Bearer <token>`
    Bearer(&'a str),
    /// Vendor-specific API key header, e.g. `X-Api-Key`
    Header { name: &'static str, value: &'a str },
}

/// JSON REST client bound to one vendor base URL
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: Url,
}

impl RestClient {
    /// Create a client with default timeouts
    ///
    /// # Arguments
    /// * `base_url` - API root, may include a path prefix (e.g. "https://api.keeptruckin.com/v1")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a client with custom timeouts
    pub fn with_config(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        let base_url = Url::parse(base_url)?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` below the base URL.
    ///
    /// Unlike `Url::join`, a leading `/` in `path` does not discard the
    /// base URL's own path prefix.
    ///
    /// Paths with a `.` or `..` segment (literal or percent-encoded) are
    /// rejected with [`ClientError::InvalidPath`].
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        if path.split('/').any(is_dot_segment) {
            return Err(ClientError::InvalidPath(path.to_string()));
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, path))?)
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// GET `path` with query parameters and decode the JSON body
    #[instrument(skip(self, query, auth))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        auth: RequestAuth<'_>,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);

        let request = Self::apply_auth(self.client.get(url).query(query), auth);
        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// GET `path`, mapping 404 to `None`.
    ///
    /// A path that cannot address a resource (see [`Self::endpoint`]) is
    /// also `None`, without a request.
    #[instrument(skip(self, auth))]
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        auth: RequestAuth<'_>,
    ) -> Result<Option<T>> {
        match self.get_json(path, &[], auth).await {
            Ok(value) => Ok(Some(value)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(ClientError::InvalidPath(path)) => {
                debug!("No resource at dot-segment path {}", path);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// POST a JSON body to `path` and decode the JSON response
    #[instrument(skip(self, body, auth))]
    pub async fn post_json<B, T>(&self, path: &str, body: &B, auth: RequestAuth<'_>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        self.post_json_url(url, body, auth).await
    }

    /// POST a JSON body to an absolute URL (used when a vendor redirects
    /// subsequent calls to another host)
    #[instrument(skip(self, body, auth), fields(url = %url))]
    pub async fn post_json_url<B, T>(&self, url: Url, body: &B, auth: RequestAuth<'_>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", url);

        let request = Self::apply_auth(self.client.post(url).json(body), auth);
        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// DELETE `path`; any 2xx is success
    #[instrument(skip(self, auth))]
    pub async fn delete(&self, path: &str, auth: RequestAuth<'_>) -> Result<()> {
        let url = self.endpoint(path)?;
        debug!("DELETE {}", url);

        let request = Self::apply_auth(self.client.delete(url), auth);
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            Err(self.extract_error_from_status(response, status).await)
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn apply_auth(request: RequestBuilder, auth: RequestAuth<'_>) -> RequestBuilder {
        match auth {
            RequestAuth::None => request,
            RequestAuth::Bearer(token) => request.bearer_auth(token),
            RequestAuth::Header { name, value } => request.header(name, value),
        }
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ClientError::ParseError(e.to_string()))
        } else {
            Err(self.extract_error_from_status(response, status).await)
        }
    }

    async fn extract_error_from_status(
        &self,
        response: reqwest::Response,
        status: StatusCode,
    ) -> ClientError {
        let message = match response.json::<serde_json::Value>().await {
            Ok(body) => error_message(&body).unwrap_or_else(|| format!("HTTP {}", status)),
            Err(_) => format!("HTTP {}", status),
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ClientError::Timeout,
            _ => ClientError::server_error(status.as_u16(), message),
        }
    }
}

/// Pull a human-readable message out of a vendor error body
fn error_message(body: &serde_json::Value) -> Option<String> {
    ["message", "error_message", "error"]
        .iter()
        .find_map(|key| match body.get(*key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(inner) => inner
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = RestClient::new("http://localhost:9080");
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let client = RestClient::new("not a url");
        assert!(matches!(client, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = RestClient::new("https://api.keeptruckin.com/v1").unwrap();
        let url = client.endpoint("/vehicle_locations").unwrap();
        assert_eq!(url.as_str(), "https://api.keeptruckin.com/v1/vehicle_locations");

        let client = RestClient::new("https://api.samsara.com/").unwrap();
        let url = client.endpoint("fleet/vehicles").unwrap();
        assert_eq!(url.as_str(), "https://api.samsara.com/fleet/vehicles");
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("281474977075402"), "281474977075402");
        assert_eq!(encode_path_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(encode_path_segment("50%"), "50%25");
        assert_eq!(encode_path_segment("a\\b"), "a%5Cb");
        assert_eq!(encode_path_segment("v-1_x.~"), "v-1_x.~");
        assert_eq!(encode_path_segment("é"), "%C3%A9");
    }

    #[test]
    fn test_endpoint_rejects_dot_segments() {
        let client = RestClient::new("https://api.gomotive.com/v1").unwrap();

        for id in ["..", ".", "%2e%2E", ".%2E"] {
            let path = format!("/vehicles/{}", id);
            assert!(
                matches!(client.endpoint(&path), Err(ClientError::InvalidPath(_))),
                "{path}"
            );
        }
        let path = format!("/vehicles/{}", encode_path_segment(".."));
        assert!(matches!(client.endpoint(&path), Err(ClientError::InvalidPath(_))));

        // Dots inside an id are ordinary characters
        let url = client.endpoint("/vehicles/a..b").unwrap();
        assert_eq!(url.as_str(), "https://api.gomotive.com/v1/vehicles/a..b");
        let url = client
            .endpoint(&format!("/vehicles/{}", encode_path_segment("a\\..")))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.gomotive.com/v1/vehicles/a%5C..");
    }

    #[test]
    fn test_error_message_shapes() {
        let samsara = serde_json::json!({"message": "Invalid API token", "requestId": "x"});
        assert_eq!(error_message(&samsara).as_deref(), Some("Invalid API token"));

        let motive = serde_json::json!({"error_message": "Unauthorized"});
        assert_eq!(error_message(&motive).as_deref(), Some("Unauthorized"));

        let nested = serde_json::json!({"error": {"message": "boom"}});
        assert_eq!(error_message(&nested).as_deref(), Some("boom"));

        assert_eq!(error_message(&serde_json::json!({"ok": true})), None);
    }
}
