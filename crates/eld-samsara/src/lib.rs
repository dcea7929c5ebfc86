//! eld-samsara - Samsara adapter
//!
//! Implements [`eld_core::EldProvider`] over the Samsara REST API
//! (bearer-token authentication, cursor pagination, imperial units with
//! metric odometer/fuel fields).

mod config;
mod mapping;
mod provider;
mod types;

pub use config::SamsaraConfig;
pub use provider::SamsaraProvider;
