//! Integration tests for the ELD adapters
//!
//! Each vendor module serves a small stub of that vendor's API from an
//! `axum::Router` on an ephemeral port, so adapters and the connection
//! manager run against real HTTP without network access.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p eld-tests
//! ```
//!
//! # Test Structure
//!
//! - `samsara_test.rs` - REST adapter, cursor pagination, webhooks
//! - `geotab_test.rs` - JSON-RPC session, id-ordered pages, unit conversion
//! - `motive_test.rs` - API-key adapter, page numbers, feature gaps
//! - `connection_test.rs` - single-active-vendor facade

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use eld_client::testing::StubServer;
use eld_core::EldProvider;
use eld_gateway::EldConnectionManager;

pub mod geotab;
pub mod motive;
pub mod samsara;

/// Whether `headers` carry `Authorization: Bearer <token>`
pub fn has_bearer(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|v| v == token)
}

/// Whether `headers` carry `<name>: <value>`
pub fn has_header(headers: &HeaderMap, name: &str, value: &str) -> bool {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == value)
}

/// 401 with a vendor-style `{"message": ...}` body
pub fn rejected(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "message": message })),
    )
        .into_response()
}

/// 404 with a vendor-style body
pub fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "message": "Not found" })),
    )
        .into_response()
}

/// Start a stub; panics if no local port can be bound
pub async fn start_stub(router: axum::Router) -> StubServer {
    StubServer::start(router)
        .await
        .expect("failed to start stub vendor server")
}

/// Manager with the given adapters registered and nothing connected
pub fn manager_with(providers: Vec<Arc<dyn EldProvider>>) -> EldConnectionManager {
    EldConnectionManager::with_providers(providers)
}

/// Slice a fixture list the way a `limit`/offset API would
pub fn window<T: Clone>(items: &[T], offset: usize, limit: usize) -> (Vec<T>, bool) {
    let start = offset.min(items.len());
    let end = start.saturating_add(limit).min(items.len());
    (items[start..end].to_vec(), end < items.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window() {
        let items = [1, 2, 3];
        assert_eq!(window(&items, 0, 2), (vec![1, 2], true));
        assert_eq!(window(&items, 2, 2), (vec![3], false));
        assert_eq!(window(&items, 5, 2), (vec![], false));
    }

    #[test]
    fn test_has_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert!(has_bearer(&headers, "abc"));
        assert!(!has_bearer(&headers, "abd"));
        assert!(!has_bearer(&HeaderMap::new(), "abc"));
    }
}
