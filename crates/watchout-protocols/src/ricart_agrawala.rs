//! Ricart–Agrawala mutual exclusion for the home base.
//!
//! One [`ExclusiveResource`] lives on every peer and records that peer's own
//! intent on the shared resource:
//!
//! ```text
//! NOT_NEEDED ──request_access──▶ NEEDED ──acquire──▶ HELD
//!      ▲                            │                  │
//!      └──────────release───────────┴──────────────────┘
//! ```
//!
//! Incoming requests are answered immediately. A request that loses is not
//! answered later on the same call: it is queued and the requester gets a
//! fresh `release_home_base` grant when this peer releases. The caller of
//! [`release`](ExclusiveResource::release) receives the queue and is
//! responsible for sending those grants.
//!
//! # Invariants
//!
//! - deferred queue and grant barrier exist only while status ≠ `NotNeeded`
//! - the request timestamp is `Some` iff status ≠ `NotNeeded`

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, trace};
use watchout_sync::QuorumBarrier;

use crate::error::Result;
use crate::message::PeerInfo;

/// This peer's intent on the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    /// Not requested.
    NotNeeded,
    /// Requested, waiting for grants.
    Needed,
    /// Every peer granted access.
    Held,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotNeeded => write!(f, "NotNeeded"),
            Self::Needed => write!(f, "Needed"),
            Self::Held => write!(f, "Held"),
        }
    }
}

/// Wall-clock microseconds since the Unix epoch, used as request timestamp.
pub fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or_default()
}

#[derive(Debug)]
struct ResourceState {
    status: ResourceStatus,
    /// `None` stands for "+∞": no outstanding request.
    timestamp: Option<u64>,
    deferred: VecDeque<PeerInfo>,
    /// Ids of the peers that granted the outstanding request.
    grants: Option<Arc<QuorumBarrier<u32>>>,
}

/// One peer's side of a resource arbitrated with Ricart–Agrawala.
#[derive(Debug)]
pub struct ExclusiveResource {
    state: Mutex<ResourceState>,
}

impl Default for ExclusiveResource {
    fn default() -> Self {
        Self::new()
    }
}

impl ExclusiveResource {
    /// Create a resource nobody here needs yet.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ResourceState {
                status: ResourceStatus::NotNeeded,
                timestamp: None,
                deferred: VecDeque::new(),
                grants: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ResourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current status.
    pub fn status(&self) -> ResourceStatus {
        self.lock().status
    }

    /// Whether this peer holds the resource.
    pub fn is_held(&self) -> bool {
        self.status() == ResourceStatus::Held
    }

    /// Timestamp of the outstanding request, `None` if there is none.
    pub fn acquire_timestamp(&self) -> Option<u64> {
        self.lock().timestamp
    }

    /// Number of requesters waiting for a grant from this peer.
    pub fn deferred_count(&self) -> usize {
        self.lock().deferred.len()
    }

    /// Start requesting the resource from `peer_count` peers, stamped now.
    ///
    /// Returns the request timestamp the caller must send to every peer, or
    /// `None` if a request is already outstanding.
    pub fn request_access(&self, peer_count: usize) -> Option<u64> {
        let timestamp = now_micros();
        self.request_access_at(peer_count, timestamp)
            .then_some(timestamp)
    }

    /// Start requesting the resource with an explicit timestamp.
    ///
    /// Returns `false` without effect unless the status is `NotNeeded`.
    pub fn request_access_at(&self, peer_count: usize, timestamp: u64) -> bool {
        let mut state = self.lock();
        if state.status != ResourceStatus::NotNeeded {
            return false;
        }
        state.status = ResourceStatus::Needed;
        state.timestamp = Some(timestamp);
        state.grants = Some(Arc::new(QuorumBarrier::new(peer_count)));
        debug!(timestamp, peer_count, "requesting home base");
        true
    }

    /// Answer another peer's request.
    ///
    /// Returns `true` to grant now. On `false` the requester has been queued
    /// and will be granted on [`release`](Self::release).
    pub fn handle_incoming_request(&self, requester: PeerInfo, requester_timestamp: u64) -> bool {
        let mut state = self.lock();
        let grant = match (state.status, state.timestamp) {
            (ResourceStatus::NotNeeded, _) => true,
            (ResourceStatus::Held, _) => false,
            // The older request wins; equal timestamps keep the local one.
            (ResourceStatus::Needed, Some(local)) => local > requester_timestamp,
            (ResourceStatus::Needed, None) => true,
        };
        if !grant {
            trace!(requester = requester.id, requester_timestamp, "deferring home base grant");
            state.deferred.push_back(requester);
        }
        grant
    }

    /// Record a grant received from peer `from`.
    ///
    /// Denials are ignored, and so is everything while nothing is requested.
    pub fn record_grant(&self, from: u32, granted: bool) {
        let state = self.lock();
        if state.status == ResourceStatus::NotNeeded || !granted {
            return;
        }
        if let Some(grants) = &state.grants {
            grants.add(from);
        }
    }

    /// Wait for every grant, then take the resource.
    ///
    /// Does nothing unless the status is `Needed`. The wait also ends when a
    /// pending acquire is cancelled; check
    /// [`did_cancel_early`](Self::did_cancel_early) afterwards.
    pub async fn acquire(&self) -> Result<()> {
        let grants = {
            let state = self.lock();
            if state.status != ResourceStatus::Needed {
                return Ok(());
            }
            match &state.grants {
                Some(grants) => Arc::clone(grants),
                None => return Ok(()),
            }
        };

        let granted_by = grants.await_all().await?;

        let mut state = self.lock();
        if state.status == ResourceStatus::Needed {
            state.status = ResourceStatus::Held;
        }
        debug!(granted_by = granted_by.len(), cancelled = grants.did_cancel_early(), "home base acquired");
        Ok(())
    }

    /// Whether the last acquire was cut short by a cancellation.
    pub fn did_cancel_early(&self) -> bool {
        self.lock()
            .grants
            .as_ref()
            .is_some_and(|g| g.did_cancel_early())
    }

    /// Stop waiting for grants. No-op unless the status is `Needed`.
    pub fn cancel_pending_acquire(&self) {
        let state = self.lock();
        Self::cancel_locked(&state);
    }

    fn cancel_locked(state: &ResourceState) {
        if state.status != ResourceStatus::Needed {
            return;
        }
        if let Some(grants) = &state.grants {
            grants.cancel_early();
        }
    }

    /// Atomically refuse if held, otherwise cancel any pending acquire.
    ///
    /// Returns `true` when the owner of this resource may be tagged.
    pub fn preempt(&self) -> bool {
        let state = self.lock();
        if state.status == ResourceStatus::Held {
            return false;
        }
        Self::cancel_locked(&state);
        true
    }

    /// Give the resource back.
    ///
    /// Returns the deferred requesters, in arrival order. Each of them must be
    /// sent exactly one grant.
    pub fn release(&self) -> Vec<PeerInfo> {
        let mut state = self.lock();
        state.status = ResourceStatus::NotNeeded;
        state.grants = None;
        state.timestamp = None;
        let owed: Vec<PeerInfo> = state.deferred.drain(..).collect();
        debug!(owed = owed.len(), "home base released");
        owed
    }
}
