//! System orchestration: configuration, shared feeds, per-user sessions and
//! tracing setup.

pub mod config;
pub mod marketplace;
pub mod session;
pub mod tracing;

pub use config::*;
pub use marketplace::Marketplace;
pub use session::*;
pub use self::tracing::setup_tracing;
