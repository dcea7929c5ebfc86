//! Normalized, vendor-independent ELD records

mod auth;
mod diagnostics;
mod event;
mod fleet;
mod geofence;
mod hos;
mod ifta;
mod inspection;
mod location;
mod page;

pub use auth::*;
pub use diagnostics::*;
pub use event::*;
pub use fleet::*;
pub use geofence::*;
pub use hos::*;
pub use ifta::*;
pub use inspection::*;
pub use location::*;
pub use page::*;
