//! Phase mailbox: hand control from RPC handlers to the round loop.
//!
//! Handlers run on their own tasks and must never block on the round loop,
//! so they `post` a signal and return. The round loop `wait`s for the signal
//! it needs next and consumes it.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;
use tracing::debug;

/// The signals exchanged between handlers and the round loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// A seeker has been agreed on; the round can be played.
    Consensus,
    /// The round is over.
    End,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Consensus => write!(f, "consensus"),
            Self::End => write!(f, "end"),
        }
    }
}

/// A set of pending signals with single-consumer delivery.
#[derive(Debug, Default)]
pub struct PhaseMailbox {
    pending: Mutex<HashSet<Signal>>,
    notify: Notify,
}

impl PhaseMailbox {
    /// Create an empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a signal. Posting a signal that is already pending is a no-op.
    pub fn post(&self, signal: Signal) {
        let inserted = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(signal);
        debug!(%signal, inserted, "posted phase signal");
        self.notify.notify_waiters();
    }

    /// Consume `signal` if it is pending.
    pub fn try_take(&self, signal: Signal) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&signal)
    }

    /// Whether `signal` has been posted and not yet consumed.
    pub fn is_pending(&self, signal: Signal) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&signal)
    }

    /// Wait until `signal` is posted, then consume it.
    pub async fn wait(&self, signal: Signal) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a post in between is not lost.
            notified.as_mut().enable();

            if self.try_take(signal) {
                debug!(%signal, "consumed phase signal");
                return;
            }
            notified.await;
        }
    }
}
