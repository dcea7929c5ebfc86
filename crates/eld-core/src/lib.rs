//! eld-core - Core traits and types for ELD integrations
//!
//! This crate provides the vendor-independent domain model and the
//! [`EldProvider`] capability contract that every telematics adapter
//! (Samsara, Geotab, Motive, ...) implements.

pub mod base;
pub mod catalog;
pub mod error;
pub mod models;
pub mod provider;
pub mod units;

pub use catalog::{provider_catalog, provider_info, AuthType, ProviderFeature, ProviderInfo};
pub use error::{EldError, EldResult};
pub use models::*;
pub use provider::EldProvider;
