//! Seeker election.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, info};
use watchout_protocols::{decide, ElectionDecision, PeerRequest, Phase};
use watchout_sync::{QuorumBarrier, Signal};

use super::Node;
use crate::error::Result;
use crate::rpc::ack;

impl Node {
    /// Run the Bully algorithm from this node.
    ///
    /// Without `force` nothing happens while an election or a round is
    /// underway, while the phase is unknown, or if this node is already the
    /// seeker. The winner waits until every peer acknowledged its victory,
    /// then becomes the seeker. Everybody else challenges the peers ranked
    /// above it and returns at once.
    pub async fn start_election(self: &Arc<Self>, force: bool) -> Result<()> {
        if !self.enter_election(force) {
            return Ok(());
        }
        self.run_election().await
    }

    fn enter_election(&self, force: bool) -> bool {
        let mut phase = self.lock_phase();
        let busy = matches!(*phase, Phase::Election | Phase::Game | Phase::Unknown);
        if (busy || self.is_seeker()) && !force {
            debug!("Player {}: not starting election in {}", self.id(), *phase);
            return false;
        }
        *phase = Phase::Election;
        true
    }

    /// The election proper. The phase must already be `Election`.
    pub(super) async fn run_election(self: &Arc<Self>) -> Result<()> {
        info!("Player {}: starting election", self.id());

        let peers = self.peers();
        match decide(&self.me, &peers) {
            ElectionDecision::Victory => {
                info!("Player {}: won the election", self.id());
                let acks = Arc::new(QuorumBarrier::new(peers.len()));
                self.client.fan_out(
                    &peers,
                    &PeerRequest::Coordinator { id: self.id() },
                    &acks,
                    ack,
                );
                acks.await_all().await?;

                self.is_seeker.store(true, Ordering::SeqCst);
                self.set_phase(Phase::Game);
                self.mailbox.post(Signal::Consensus);
            }
            ElectionDecision::Challenge(higher) => {
                let ids: Vec<u32> = higher.iter().map(|p| p.id).collect();
                info!("Player {}: challenging {:?}", self.id(), ids);
                self.client.notify_all(&higher, &PeerRequest::Election);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::peer;
    use super::*;
    use crate::config::GameTiming;

    #[tokio::test]
    async fn lone_player_wins_immediately() {
        let node = Node::new(peer(4, 0, 0), GameTiming::default());
        node.set_phase(Phase::Preparation);
        node.start_election(false).await.unwrap();

        assert!(node.is_seeker());
        assert_eq!(node.phase(), Phase::Game);
        assert!(node.mailbox().try_take(Signal::Consensus));
    }

    #[tokio::test]
    async fn busy_phases_block_unforced_elections() {
        for phase in [Phase::Unknown, Phase::Election, Phase::Game] {
            let node = Node::new(peer(4, 0, 0), GameTiming::default());
            node.set_phase(phase);
            node.start_election(false).await.unwrap();
            assert!(!node.is_seeker(), "{phase}");
            assert_eq!(node.phase(), phase);
        }
    }

    #[tokio::test]
    async fn forced_election_runs_anyway() {
        let node = Node::new(peer(4, 0, 0), GameTiming::default());
        node.set_phase(Phase::Unknown);
        node.start_election(true).await.unwrap();
        assert!(node.is_seeker());
    }

    #[tokio::test]
    async fn lower_ranked_player_waits_for_the_winner() {
        let node = Node::new(peer(2, 0, 0), GameTiming::default());
        node.add_peer(peer(7, 4, 3));
        node.set_phase(Phase::Preparation);

        node.start_election(false).await.unwrap();
        assert!(!node.is_seeker());
        assert_eq!(node.phase(), Phase::Election);
        assert!(!node.mailbox().is_pending(Signal::Consensus));
    }
}
