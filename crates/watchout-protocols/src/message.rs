//! Peer RPC wire contract.
//!
//! Every call is one request frame answered by exactly one response frame.
//! Frames are JSON objects terminated by a newline, internally tagged so the
//! pairing is visible on the wire:
//!
//! ```text
//! → {"rpc":"acquire_home_base","requester":{...},"timestamp":1700000000000000}
//! ← {"reply":"grant","granted":false}
//! ```
//!
//! | Request | Reply |
//! |---|---|
//! | `present_self` | `greet { phase }` |
//! | `election` | `ack` |
//! | `coordinator` | `ack` |
//! | `tag` | `tag { tagged }` |
//! | `acquire_home_base` | `grant { granted }` |
//! | `release_home_base` | `ack` |
//! | `notify_outcome` | `ack` |
//! | `end_game` | `ack` |
//! | `go_to_preparation` | `ack` |

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use watchout_grid::GridPos;

use crate::error::{Error, Result};
use crate::phase::Phase;

/// How to reach a peer and where it stands on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerInfo {
    /// Unique id assigned at registration
    pub id: u32,
    /// Host the peer's RPC server listens on
    pub address: String,
    /// Port the peer's RPC server listens on
    pub port: u16,
    /// Cell assigned at registration
    pub position: GridPos,
}

impl PeerInfo {
    /// `host:port` of the peer's RPC server.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Distance from the home base, in cells.
    pub fn distance_from_center(&self) -> f64 {
        self.position.distance_from_center()
    }
}

impl std::fmt::Display for PeerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {} @ {} {}", self.id, self.endpoint(), self.position)
    }
}

/// The result of one round for one hider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerOutcome {
    pub player: PeerInfo,
    /// `true` if the hider reached the home base, `false` if it was tagged
    pub safe: bool,
}

/// Requests a peer can send to another peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rpc", rename_all = "snake_case")]
pub enum PeerRequest {
    /// Introduce the sender; the receiver answers with its phase.
    PresentSelf { peer: PeerInfo },
    /// Bully challenge from a lower-ranked peer.
    Election,
    /// Bully victory announcement.
    Coordinator { id: u32 },
    /// The seeker reached the receiver and tries to tag it.
    Tag,
    /// Ricart–Agrawala request for the home base.
    AcquireHomeBase { requester: PeerInfo, timestamp: u64 },
    /// Deferred Ricart–Agrawala grant, sent when the sender releases.
    ReleaseHomeBase { from: u32, granted: bool },
    /// A hider's result for this round.
    NotifyOutcome { outcome: PlayerOutcome },
    /// The seeker ends the round.
    EndGame,
    /// The seeker moves everybody back to preparation.
    GoToPreparation,
}

impl PeerRequest {
    /// Short name of the call, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PresentSelf { .. } => "present_self",
            Self::Election => "election",
            Self::Coordinator { .. } => "coordinator",
            Self::Tag => "tag",
            Self::AcquireHomeBase { .. } => "acquire_home_base",
            Self::ReleaseHomeBase { .. } => "release_home_base",
            Self::NotifyOutcome { .. } => "notify_outcome",
            Self::EndGame => "end_game",
            Self::GoToPreparation => "go_to_preparation",
        }
    }
}

/// Replies to [`PeerRequest`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum PeerResponse {
    /// Reply to `present_self`.
    Greet { phase: Phase },
    /// Plain acknowledgement.
    Ack,
    /// Reply to `acquire_home_base`.
    Grant { granted: bool },
    /// Reply to `tag`.
    Tag { tagged: bool },
    /// The request could not be understood.
    Error { error: String },
}

/// Encode a frame, including the trailing newline.
pub fn encode_line<T: Serialize>(frame: &T) -> Result<String> {
    let mut line = serde_json::to_string(frame)?;
    line.push('\n');
    Ok(line)
}

/// Decode one frame. Surrounding whitespace is ignored.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T> {
    let line = line.trim();
    if line.is_empty() {
        return Err(Error::InvalidMessage("empty frame".to_string()));
    }
    Ok(serde_json::from_str(line)?)
}
