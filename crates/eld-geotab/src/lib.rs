//! eld-geotab - Geotab adapter
//!
//! Implements [`eld_core::EldProvider`] over the MyGeotab JSON-RPC API.
//! Every call is a `POST` of `{method, params}` to a single endpoint,
//! carrying the session credentials obtained from `Authenticate`.

mod config;
mod mapping;
mod provider;
mod rpc;
mod types;

pub use config::GeotabConfig;
pub use provider::GeotabProvider;
