//! Synchronization primitives for WatchOut peers.
//!
//! Peers never block on a single reply. Every broadcast is paired with a
//! [`QuorumBarrier`] that collects the answers as they come back, and the
//! main coordination loop is handed control through a [`PhaseMailbox`].
//!
//! # Quorum Barrier
//!
//! A barrier is sized once, to the number of peers addressed by a broadcast:
//! - `n` expected → released by the `n`-th response
//! - `0` expected → released immediately
//! - cancelled → released immediately, whatever has been collected
//!
//! # Phase Mailbox
//!
//! Named, consumable signals. A signal posted before anyone waits is kept
//! until the next waiter takes it.

mod barrier;
mod error;
mod mailbox;

pub use barrier::QuorumBarrier;
pub use error::{Error, Result};
pub use mailbox::{PhaseMailbox, Signal};
