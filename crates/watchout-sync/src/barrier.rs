//! Quorum barrier: wait for a fixed number of peers to answer.
//!
//! # Contract
//!
//! ```text
//! add(r)         append r unless cancelled or already full
//! cancel_early() release every waiter now, whatever was collected
//! await_all()    block until len == expected or cancelled
//! ```
//!
//! Once released, the collected responses never change again, so every
//! waiter observes the same snapshot.

use tokio::sync::watch;
use tracing::trace;

use crate::error::{Error, Result};

#[derive(Debug)]
struct Collected<T> {
    responses: Vec<T>,
    cancelled: bool,
}

/// Collects responses from exactly `expected` participants.
#[derive(Debug)]
pub struct QuorumBarrier<T> {
    expected: usize,
    state: watch::Sender<Collected<T>>,
}

impl<T> Collected<T> {
    fn is_released(&self, expected: usize) -> bool {
        self.cancelled || self.responses.len() >= expected
    }
}

impl<T: Clone> QuorumBarrier<T> {
    /// Create a barrier waiting for `expected` responses.
    pub fn new(expected: usize) -> Self {
        let (state, _) = watch::channel(Collected {
            responses: Vec::with_capacity(expected),
            cancelled: false,
        });
        Self { expected, state }
    }

    /// Number of responses this barrier waits for.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Number of responses collected so far.
    pub fn received(&self) -> usize {
        self.state.borrow().responses.len()
    }

    /// Record a response.
    ///
    /// Returns `false` if the response was dropped because the barrier is
    /// already full or was cancelled.
    pub fn add(&self, response: T) -> bool {
        let expected = self.expected;
        let added = self.state.send_if_modified(|s| {
            if s.is_released(expected) {
                return false;
            }
            s.responses.push(response);
            true
        });
        trace!(added, received = self.received(), expected, "quorum response");
        added
    }

    /// Release every waiter without waiting for the remaining responses.
    pub fn cancel_early(&self) {
        self.state.send_modify(|s| s.cancelled = true);
    }

    /// Whether [`cancel_early`](Self::cancel_early) was called.
    pub fn did_cancel_early(&self) -> bool {
        self.state.borrow().cancelled
    }

    /// Whether waiters would be released right now.
    pub fn is_released(&self) -> bool {
        self.state.borrow().is_released(self.expected)
    }

    /// Wait until every expected response arrived or the barrier was cancelled.
    pub async fn await_all(&self) -> Result<Vec<T>> {
        let expected = self.expected;
        let mut rx = self.state.subscribe();
        let collected = rx
            .wait_for(|s| s.is_released(expected))
            .await
            .map_err(|_| Error::Interrupted("quorum barrier"))?;
        Ok(collected.responses.clone())
    }
}
