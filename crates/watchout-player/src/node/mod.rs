//! The player node: shared state plus the round state machine.
//!
//! A [`Node`] is shared between the round loop and every inbound RPC
//! handler. Each piece of state has its own lock:
//!
//! | Lock | Guards |
//! |---|---|
//! | `phase` | current phase, election entry |
//! | `tagged` | tagged flag, start of hiding, tag handler |
//! | `peers` | known peers and the in-round subset |
//! | `outcomes` | outcome log and the seeker's outcome quorum |
//!
//! The home base resource has its own internal lock, always taken last.
//! `tagged` may be held while taking any other lock; no other pair is ever
//! nested. No guard is held across an `.await`.
//!
//! ```text
//! ┌─────────────┐  consensus  ┌──────┐  end  ┌────────────────────┐
//! │ PREPARATION │────────────▶│ GAME │──────▶│ END → PREPARATION  │
//! │ / ELECTION  │             └──────┘       └────────────────────┘
//! └─────────────┘◀──────────────────────────────────┘
//! ```

mod election;
mod handlers;
mod round;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;
use watchout_protocols::{ExclusiveResource, Phase, PeerInfo, PlayerOutcome};
use watchout_sync::{PhaseMailbox, QuorumBarrier};

use crate::config::GameTiming;
use crate::rpc::PeerClient;

#[derive(Debug, Default)]
struct Peers {
    all: BTreeMap<u32, PeerInfo>,
    /// Peers still being chased this round. Always a subset of `all`.
    in_round: BTreeMap<u32, PeerInfo>,
}

#[derive(Debug, Default)]
struct Outcomes {
    log: Vec<PlayerOutcome>,
    collecting: Option<Arc<QuorumBarrier<PlayerOutcome>>>,
}

/// One player taking part in the game.
#[derive(Debug)]
pub struct Node {
    me: PeerInfo,
    timing: GameTiming,
    client: PeerClient,

    phase: Mutex<Phase>,
    tagged: Mutex<bool>,
    peers: Mutex<Peers>,
    outcomes: Mutex<Outcomes>,

    is_seeker: AtomicBool,
    is_safe: AtomicBool,
    rounds_completed: AtomicU64,

    home_base: ExclusiveResource,
    mailbox: PhaseMailbox,
}

impl Node {
    /// Create a node for a registered player. The phase starts `Unknown`.
    pub fn new(me: PeerInfo, timing: GameTiming) -> Arc<Self> {
        Arc::new(Self {
            me,
            timing,
            client: PeerClient::new(),
            phase: Mutex::new(Phase::Unknown),
            tagged: Mutex::new(false),
            peers: Mutex::new(Peers::default()),
            outcomes: Mutex::new(Outcomes::default()),
            is_seeker: AtomicBool::new(false),
            is_safe: AtomicBool::new(false),
            rounds_completed: AtomicU64::new(0),
            home_base: ExclusiveResource::new(),
            mailbox: PhaseMailbox::new(),
        })
    }

    /// Take in the players the registry returned.
    ///
    /// With fewer than two of them no round can be underway, so the node
    /// goes straight to `Preparation`. Otherwise the phase is learned from
    /// the peers while joining.
    pub fn adopt_registration(&self, players: Vec<PeerInfo>) {
        let phase = if players.len() < 2 {
            Phase::Preparation
        } else {
            Phase::Unknown
        };
        for player in players {
            self.add_peer(player);
        }
        self.set_phase(phase);
    }

    /// This player.
    pub fn me(&self) -> &PeerInfo {
        &self.me
    }

    pub fn id(&self) -> u32 {
        self.me.id
    }

    pub fn timing(&self) -> GameTiming {
        self.timing
    }

    pub fn phase(&self) -> Phase {
        *self.lock_phase()
    }

    pub fn set_phase(&self, phase: Phase) {
        let mut current = self.lock_phase();
        if *current != phase {
            info!("Player {}: phase {} -> {}", self.me.id, *current, phase);
            *current = phase;
        }
    }

    pub fn is_seeker(&self) -> bool {
        self.is_seeker.load(Ordering::SeqCst)
    }

    pub fn is_safe(&self) -> bool {
        self.is_safe.load(Ordering::SeqCst)
    }

    pub fn is_tagged(&self) -> bool {
        *self.lock_tagged()
    }

    /// Number of rounds this node has played to the end.
    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed.load(Ordering::SeqCst)
    }

    /// Add a peer to the known set and to the current round.
    ///
    /// Returns `false` if the peer was already known or is this node.
    pub fn add_peer(&self, peer: PeerInfo) -> bool {
        if peer.id == self.me.id {
            return false;
        }
        let mut peers = self.lock_peers();
        peers.in_round.insert(peer.id, peer.clone());
        let added = peers.all.insert(peer.id, peer.clone()).is_none();
        if added {
            info!("Player {}: new peer {}", self.me.id, peer);
        }
        added
    }

    /// Every known peer, in id order.
    pub fn peers(&self) -> Vec<PeerInfo> {
        self.lock_peers().all.values().cloned().collect()
    }

    /// Ids of the peers still in play this round.
    pub fn in_round(&self) -> Vec<u32> {
        self.lock_peers().in_round.keys().copied().collect()
    }

    /// Outcomes received this round.
    pub fn outcomes(&self) -> Vec<PlayerOutcome> {
        self.lock_outcomes().log.clone()
    }

    /// The home base as seen by this node.
    pub fn home_base(&self) -> &ExclusiveResource {
        &self.home_base
    }

    /// Signals from the handlers to the round loop.
    pub fn mailbox(&self) -> &PhaseMailbox {
        &self.mailbox
    }

    fn lock_phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tagged(&self) -> MutexGuard<'_, bool> {
        self.tagged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_peers(&self) -> MutexGuard<'_, Peers> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_outcomes(&self) -> MutexGuard<'_, Outcomes> {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
