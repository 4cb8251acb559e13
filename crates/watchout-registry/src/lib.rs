//! WatchOut Registry
//!
//! The only centralized piece of WatchOut. Players register here to get a
//! starting cell and the list of players already in, and push their
//! heart-rate averages. The administrator reads statistics and starts
//! rounds through the broadcast hub. Rounds themselves never involve the
//! registry.
//!
//! # Architecture
//!
//! - **Registry**: players and heart-rate reports, owned by the API state
//! - **API**: axum HTTP endpoints under `/players` and `/broadcast`
//! - **Hub**: TCP fan-out of administrator messages to players

pub mod api;
pub mod config;
pub mod error;
pub mod hub;
pub mod registry;
pub mod server;

pub use api::{build_router, AppContext};
pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use hub::BroadcastHub;
pub use registry::Registry;
pub use server::run;
