//! WatchOut Player
//!
//! One participant in a game of WatchOut. A player registers with the
//! registry, learns about the other players, and from then on coordinates
//! with them directly: electing a seeker, racing for the home base and
//! agreeing on when a round is over.
//!
//! # Architecture
//!
//! - **Node**: per-player state and the round state machine
//! - **RPC**: newline-delimited JSON over TCP between peers
//! - **Registration**: HTTP client for the registry
//! - **Telemetry**: simulated heart-rate readings pushed to the registry
//! - **Signal**: start-of-round messages from the broadcast hub
//!
//! # Example
//!
//! ```no_run
//! use watchout_player::{run, PlayerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PlayerConfig::from_env()?;
//!     run(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod node;
pub mod player;
pub mod registration;
pub mod rpc;
pub mod signal;
pub mod telemetry;

pub use config::{GameTiming, PlayerConfig};
pub use error::{Error, Result};
pub use node::Node;
pub use player::run;
pub use registration::RegistryClient;
pub use rpc::{PeerClient, PeerServer};
