//! WatchOut Protocols - Peer Coordination Without a Coordinator
//!
//! This crate holds everything two WatchOut peers must agree on: the wire
//! contract they speak, and the two distributed algorithms that run on top
//! of it.
//!
//! # Overview
//!
//! ## Seeker Election
//!
//! The [`election`] module implements the decision step of the Bully
//! algorithm. Peers are ranked by their distance from the home base (closer
//! wins) and then by id (higher wins):
//!
//! - **No higher-ranked peer**: declare victory to everybody
//! - **Otherwise**: challenge every higher-ranked peer and wait to hear back
//!
//! ## Home Base Access
//!
//! The [`ExclusiveResource`] implements Ricart–Agrawala mutual exclusion:
//!
//! - **Timestamp order**: the oldest outstanding request is granted by every peer
//! - **Deferred grants**: requests that lose are queued and granted on release
//! - **Pre-emption**: a pending acquire can be cancelled by a tag
//!
//! # Example
//!
//! ```rust
//! use watchout_protocols::{ExclusiveResource, ResourceStatus};
//!
//! let home_base = ExclusiveResource::new();
//! assert!(home_base.request_access_at(0, 1_000));
//! assert_eq!(home_base.status(), ResourceStatus::Needed);
//! assert!(home_base.release().is_empty());
//! assert_eq!(home_base.status(), ResourceStatus::NotNeeded);
//! ```

pub mod election;
pub mod error;
pub mod message;
pub mod phase;
pub mod registry;
pub mod ricart_agrawala;

pub use election::{decide, higher_priority_peers, ElectionDecision, Rank};
pub use error::{Error, Result};
pub use message::{decode_line, encode_line, PeerInfo, PeerRequest, PeerResponse, PlayerOutcome};
pub use phase::Phase;
pub use registry::{
    AddPlayerResponse, AverageResponse, BroadcastRequest, HeartRateReport, RegisterRequest,
};
pub use ricart_agrawala::{now_micros, ExclusiveResource, ResourceStatus};
