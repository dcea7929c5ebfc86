//! eld-gateway - ELD connection facade
//!
//! Holds one adapter per vendor and routes every read to the vendor the
//! fleet is currently connected to.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   EldConnectionManager                       │
//! │  - Registry of adapters keyed by vendor                      │
//! │  - One active vendor at a time                               │
//! │  - Delegates reads; NotConnected when nothing is active      │
//! └───────────────────────────┬──────────────────────────────────┘
//!                             │
//!             ┌───────────────┼───────────────┐
//!             ▼               ▼               ▼
//!   ┌────────────────┐ ┌────────────────┐ ┌────────────────┐
//!   │SamsaraProvider │ │ GeotabProvider │ │ MotiveProvider │
//!   │  REST + key    │ │ JSON-RPC + sid │ │  REST + key    │
//!   └────────────────┘ └────────────────┘ └────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use eld_gateway::{EldConfig, EldConnectionManager};
//! use eld_core::{Credentials, EldVendor};
//!
//! let manager = EldConnectionManager::from_config(&EldConfig::default())?;
//! manager
//!     .connect(EldVendor::Samsara, &Credentials::Samsara { api_key })
//!     .await?;
//! let locations = manager.get_vehicle_locations(None).await?;
//! manager.disconnect().await?;
//! ```

mod config;
mod manager;

pub use config::EldConfig;
pub use manager::EldConnectionManager;

// Re-export core types for convenience
pub use eld_core::{EldError, EldProvider, EldResult, EldVendor, ProviderFeature};
