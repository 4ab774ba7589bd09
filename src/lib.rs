//! Campus Blood Connect data service.
//!
//! A single repository service owns users, blood requests, donation history
//! and the login session. Callers talk to it through a cloneable
//! [`clients::RepositoryClient`]; [`app_system::DonationSystem`] wires it to a
//! store, a clock and the text assistant.

pub mod app_system;
pub mod assistant;
pub mod clients;
pub mod collection;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod messages;
pub mod profile;
pub mod repository;
pub mod session;
pub mod store;

#[cfg(test)]
mod mock_framework;

pub use app_system::{DonationSystem, SystemConfig};
pub use clients::RepositoryClient;
pub use error::{PersistenceWriteFailure, RepositoryError, Written};
