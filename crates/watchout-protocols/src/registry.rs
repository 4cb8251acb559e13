//! Messages exchanged with the registry server over HTTP.

use serde::{Deserialize, Serialize};

use crate::message::PeerInfo;

/// Body of `POST /players/add`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub id: u32,
    pub address: String,
    pub port: u16,
}

/// Reply to a successful registration: the assigned cell and every player
/// registered before this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPlayerResponse {
    pub x: u8,
    pub y: u8,
    pub players: Vec<PeerInfo>,
}

/// Body of `POST /players/heart-rate`: window averages computed by a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateReport {
    pub id: u32,
    /// Milliseconds since the Unix epoch when the report was sent.
    pub timestamp: u64,
    pub averages: Vec<f64>,
}

/// Reply carrying a single average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageResponse {
    pub average: f64,
}

/// Body of `POST /broadcast`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub message: String,
}
