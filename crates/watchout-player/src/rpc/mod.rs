//! Peer RPC over TCP.
//!
//! One connection per call: the caller writes one request line and reads one
//! reply line. See [`watchout_protocols::message`] for the frames.

mod client;
mod server;

pub use client::{ack, PeerClient};
pub use server::PeerServer;
