//! Command implementations for eld-cli

pub mod connection;
pub mod dvirs;
pub mod faults;
pub mod fleet;
pub mod geofences;
pub mod hos;
pub mod ifta;
pub mod locations;
pub mod providers;
pub mod webhook;

pub use connection::test;
pub use dvirs::dvirs;
pub use faults::faults;
pub use fleet::{drivers, trailers, vehicle, vehicles};
pub use geofences::geofences;
pub use hos::{clocks, logs, violations};
pub use ifta::ifta;
pub use locations::locations;
pub use providers::providers;
pub use webhook::parse_webhook;
