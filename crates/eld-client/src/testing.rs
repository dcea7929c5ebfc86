//! Test utilities for vendor adapters
//!
//! Runs an `axum::Router` standing in for a vendor API on an ephemeral
//! local port.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::Result;

/// A stub vendor server that shuts down when dropped
pub struct StubServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl StubServer {
    /// Serve `router` on 127.0.0.1 with an OS-assigned port
    pub async fn start(router: axum::Router) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Base URL of the stub, e.g. `http://127.0.0.1:40123`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL for `path` on the stub
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::get;
    use axum::Json;

    use super::*;
    use crate::{ClientError, RequestAuth, RestClient};

    #[tokio::test]
    async fn test_stub_round_trip() {
        let router = axum::Router::new().route(
            "/v1/ping",
            get(|| async { Json(serde_json::json!({"pong": true})) }),
        );
        let server = StubServer::start(router).await.unwrap();
        let client = RestClient::new(&server.url("/v1")).unwrap();

        let body: serde_json::Value = client
            .get_json("/ping", &[], RequestAuth::Bearer("t"))
            .await
            .unwrap();
        assert_eq!(body["pong"], true);

        let missing: Option<serde_json::Value> =
            client.get_optional("/nope", RequestAuth::None).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_status() {
        use axum::http::StatusCode;

        let router = axum::Router::new().route(
            "/secure",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"message": "Invalid API token"})),
                )
            }),
        );
        let server = StubServer::start(router).await.unwrap();
        let client = RestClient::new(&server.base_url()).unwrap();

        let err = client
            .get_json::<serde_json::Value>("/secure", &[], RequestAuth::None)
            .await
            .unwrap_err();
        match err {
            ClientError::Unauthorized(message) => assert_eq!(message, "Invalid API token"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
