//! Inbound RPC handlers.
//!
//! Handlers never block: anything long-running is spawned or handed to the
//! round loop through the mailbox.

use std::sync::Arc;

use tracing::{debug, info, warn};
use watchout_protocols::{PeerInfo, PeerRequest, PeerResponse, Phase, PlayerOutcome};
use watchout_sync::Signal;

use super::Node;

impl Node {
    /// Answer one request from a peer.
    pub fn handle(self: &Arc<Self>, request: PeerRequest) -> PeerResponse {
        match request {
            PeerRequest::PresentSelf { peer } => self.on_present(peer),
            PeerRequest::Election => {
                let node = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(e) = node.start_election(false).await {
                        warn!("Player {}: election failed: {}", node.id(), e);
                    }
                });
                PeerResponse::Ack
            }
            PeerRequest::Coordinator { id } => {
                info!("Player {}: player {} is the seeker", self.id(), id);
                self.mailbox.post(Signal::Consensus);
                PeerResponse::Ack
            }
            PeerRequest::Tag => PeerResponse::Tag {
                tagged: self.on_tag(),
            },
            PeerRequest::AcquireHomeBase {
                requester,
                timestamp,
            } => {
                let from = requester.id;
                let granted = self.home_base.handle_incoming_request(requester, timestamp);
                debug!("Player {}: home base request from {} at {}: granted={}", self.id(), from, timestamp, granted);
                PeerResponse::Grant { granted }
            }
            PeerRequest::ReleaseHomeBase { from, granted } => {
                self.home_base.record_grant(from, granted);
                PeerResponse::Ack
            }
            PeerRequest::NotifyOutcome { outcome } => {
                self.on_outcome(outcome);
                PeerResponse::Ack
            }
            PeerRequest::EndGame => {
                self.set_phase(Phase::End);
                self.mailbox.post(Signal::End);
                PeerResponse::Ack
            }
            PeerRequest::GoToPreparation => {
                let mut phase = self.lock_phase();
                if *phase == Phase::End {
                    *phase = Phase::Preparation;
                    info!("Player {}: phase END -> PREPARATION", self.me.id);
                }
                PeerResponse::Ack
            }
        }
    }

    /// React to the administrator's start-of-round signal.
    ///
    /// Forces an election unless an election, a round or the end of a round
    /// is already in progress. The phase check and the switch to `Election`
    /// are one step, so a late signal cannot restart a finished election.
    pub fn on_start_signal(self: &Arc<Self>) {
        {
            let mut phase = self.lock_phase();
            if !matches!(*phase, Phase::Preparation | Phase::Unknown) {
                info!("Player {}: start signal ignored in {}", self.id(), *phase);
                return;
            }
            *phase = Phase::Election;
        }
        let node = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = node.run_election().await {
                warn!("Player {}: election failed: {}", node.id(), e);
            }
        });
    }

    fn on_present(&self, peer: PeerInfo) -> PeerResponse {
        self.add_peer(peer);
        PeerResponse::Greet {
            phase: self.phase(),
        }
    }

    /// The seeker reached us. Either we are caught, or we hold the home base
    /// or are already safe.
    fn on_tag(&self) -> bool {
        let mut tagged = self.lock_tagged();
        if self.is_safe() || self.phase() != Phase::Game {
            return false;
        }
        if !self.home_base.preempt() {
            info!("Player {}: tag denied, home base held", self.id());
            return false;
        }
        *tagged = true;
        info!("Player {}: tagged", self.id());
        true
    }

    fn on_outcome(&self, outcome: PlayerOutcome) {
        info!(
            "Player {}: player {} is {}",
            self.id(),
            outcome.player.id,
            if outcome.safe { "safe" } else { "tagged" }
        );
        if outcome.safe {
            self.lock_peers().in_round.remove(&outcome.player.id);
        }
        let mut outcomes = self.lock_outcomes();
        outcomes.log.push(outcome.clone());
        if let Some(collecting) = &outcomes.collecting {
            collecting.add(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::peer;
    use super::*;
    use crate::config::GameTiming;
    use watchout_protocols::ResourceStatus;

    fn node() -> Arc<Node> {
        let node = Node::new(peer(1, 0, 4), GameTiming::default());
        node.add_peer(peer(2, 9, 4));
        node.add_peer(peer(3, 4, 0));
        node.set_phase(Phase::Preparation);
        node
    }

    #[test]
    fn present_self_adds_peer_and_reports_phase() {
        let node = node();
        node.set_phase(Phase::Election);
        let reply = node.handle(PeerRequest::PresentSelf { peer: peer(8, 9, 9) });
        assert_eq!(reply, PeerResponse::Greet { phase: Phase::Election });
        assert!(node.in_round().contains(&8));
    }

    #[test]
    fn coordinator_posts_consensus() {
        let node = node();
        assert_eq!(node.handle(PeerRequest::Coordinator { id: 2 }), PeerResponse::Ack);
        assert!(node.mailbox().is_pending(Signal::Consensus));
    }

    #[test]
    fn tag_denied_outside_game() {
        let node = node();
        assert_eq!(node.handle(PeerRequest::Tag), PeerResponse::Tag { tagged: false });
        assert!(!node.is_tagged());
    }

    #[test]
    fn tag_cancels_pending_home_base_request() {
        let node = node();
        node.set_phase(Phase::Game);
        assert!(node.home_base().request_access_at(2, 10));

        assert_eq!(node.handle(PeerRequest::Tag), PeerResponse::Tag { tagged: true });
        assert!(node.is_tagged());
        assert!(node.home_base().did_cancel_early());
    }

    #[test]
    fn tag_denied_while_home_base_held_or_safe() {
        let node = node();
        node.set_phase(Phase::Game);
        node.home_base().request_access_at(2, 10);
        node.handle(PeerRequest::ReleaseHomeBase { from: 2, granted: true });
        node.handle(PeerRequest::ReleaseHomeBase { from: 3, granted: true });
        let mut acquire = tokio_test::task::spawn(node.home_base().acquire());
        tokio_test::assert_ready!(acquire.poll()).unwrap();
        drop(acquire);
        assert_eq!(node.home_base().status(), ResourceStatus::Held);

        assert_eq!(node.handle(PeerRequest::Tag), PeerResponse::Tag { tagged: false });
        assert!(!node.home_base().did_cancel_early());

        node.home_base().release();
        node.is_safe.store(true, std::sync::atomic::Ordering::SeqCst);
        assert_eq!(node.handle(PeerRequest::Tag), PeerResponse::Tag { tagged: false });
        assert!(!node.is_tagged());
    }

    #[test]
    fn home_base_requests_follow_local_request() {
        let node = node();
        let reply = node.handle(PeerRequest::AcquireHomeBase {
            requester: peer(2, 9, 4),
            timestamp: 50,
        });
        assert_eq!(reply, PeerResponse::Grant { granted: true });

        node.home_base().request_access_at(2, 40);
        let reply = node.handle(PeerRequest::AcquireHomeBase {
            requester: peer(3, 4, 0),
            timestamp: 60,
        });
        assert_eq!(reply, PeerResponse::Grant { granted: false });
        assert_eq!(node.home_base().deferred_count(), 1);
    }

    #[test]
    fn safe_outcome_leaves_the_round() {
        let node = node();
        node.handle(PeerRequest::NotifyOutcome {
            outcome: PlayerOutcome { player: peer(2, 9, 4), safe: true },
        });
        node.handle(PeerRequest::NotifyOutcome {
            outcome: PlayerOutcome { player: peer(3, 4, 0), safe: false },
        });
        assert_eq!(node.in_round(), vec![3]);
        assert_eq!(node.outcomes().len(), 2);
    }

    #[test]
    fn preparation_only_follows_end() {
        let node = node();
        node.set_phase(Phase::Game);
        node.handle(PeerRequest::GoToPreparation);
        assert_eq!(node.phase(), Phase::Game);

        node.handle(PeerRequest::EndGame);
        assert_eq!(node.phase(), Phase::End);
        assert!(node.mailbox().is_pending(Signal::End));

        node.handle(PeerRequest::GoToPreparation);
        assert_eq!(node.phase(), Phase::Preparation);
    }

    #[tokio::test]
    async fn start_signal_ignored_during_a_round() {
        for phase in [Phase::Election, Phase::Game, Phase::End] {
            let node = node();
            node.set_phase(phase);
            node.on_start_signal();
            tokio::task::yield_now().await;
            assert_eq!(node.phase(), phase);
        }
    }

    #[tokio::test]
    async fn start_signal_forces_election_from_unknown() {
        let node = Node::new(peer(1, 0, 4), GameTiming::default());
        assert_eq!(node.phase(), Phase::Unknown);
        node.on_start_signal();
        tokio::time::timeout(std::time::Duration::from_secs(5), node.mailbox().wait(Signal::Consensus))
            .await
            .unwrap();
        assert!(node.is_seeker());
    }
}
