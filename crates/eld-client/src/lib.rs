//! ELD HTTP Client Library
//!
//! Thin typed wrapper over `reqwest` used by every vendor adapter: one
//! base URL, default timeouts, per-request authentication, JSON
//! (de)serialization and mapping of HTTP failures into [`ClientError`],
//! which adapters convert into [`eld_core::EldError`] for their vendor.
//!
//! # Example
//!
//! ```rust,no_run
//! use eld_client::{RequestAuth, RestClient};
//!
//! # async fn run() -> eld_client::Result<()> {
//! let client = RestClient::new("https://api.samsara.com")?;
//! let body: serde_json::Value = client
//!     .get_json("/fleet/vehicles", &[("limit", "1".to_string())], RequestAuth::Bearer("token"))
//!     .await?;
//! # let _ = body;
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! The `testing` module starts an `axum::Router` on an ephemeral port so
//! adapters can be exercised against stub vendor APIs:
//!
//! ```rust,ignore
//! use eld_client::testing::StubServer;
//!
//! let server = StubServer::start(router).await?;
//! let provider = SamsaraProvider::new(SamsaraConfig::with_base_url(&server.base_url()))?;
//! ```

mod client;
mod error;
pub mod testing;

pub use client::{
    encode_path_segment, RequestAuth, RestClient, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT,
};
pub use error::{ClientError, Result};
