//! eld-motive - Motive (formerly KeepTruckin) adapter
//!
//! Implements [`eld_core::EldProvider`] over the Motive v1 REST API. The
//! API reports metric units; the mapping layer converts to the imperial
//! domain model. Maintenance, geofencing and stats history are not
//! offered by this integration and answer with empty results.

mod config;
mod mapping;
mod provider;
mod types;

pub use config::MotiveConfig;
pub use provider::MotiveProvider;
