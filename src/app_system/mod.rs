//! System orchestration, startup, and shutdown logic.

pub mod config;
pub mod donation_system;
pub mod tracing;

pub use config::*;
pub use donation_system::*;
pub use self::tracing::*;
