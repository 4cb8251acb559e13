//! Joining, playing and finishing rounds.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info};
use watchout_grid::nearest;
use watchout_protocols::{PeerInfo, PeerRequest, PeerResponse, Phase, PlayerOutcome};
use watchout_sync::{QuorumBarrier, Signal};

use super::Node;
use crate::error::Result;
use crate::rpc::ack;

impl Node {
    /// Introduce this node to every known peer and collect their phases.
    pub async fn present_to_peers(self: &Arc<Self>) -> Result<Vec<Phase>> {
        let peers = self.peers();
        let greetings = Arc::new(QuorumBarrier::new(peers.len()));
        self.client.fan_out(
            &peers,
            &PeerRequest::PresentSelf {
                peer: self.me.clone(),
            },
            &greetings,
            |reply| match reply {
                PeerResponse::Greet { phase } => Some(phase),
                _ => None,
            },
        );
        Ok(greetings.await_all().await?)
    }

    /// Settle the phase after joining and catch up with a running round.
    ///
    /// An unknown phase becomes the most advanced one reported by the peers,
    /// or `Preparation` if nobody knows better. A node that adopts an
    /// election forces its own; one that adopts a round plays it to the end.
    /// A phase reached some other way, such as a start signal that arrived
    /// before joining finished, is left to whoever set it.
    pub async fn bootstrap(self: &Arc<Self>, replies: &[Phase]) -> Result<()> {
        let (phase, adopted) = {
            let mut phase = self.lock_phase();
            let adopted = *phase == Phase::Unknown;
            if adopted {
                *phase = match Phase::most_advanced(replies.iter().copied()) {
                    Phase::Unknown => Phase::Preparation,
                    learned => learned,
                };
            }
            (*phase, adopted)
        };
        info!("Player {}: joined in phase {}", self.id(), phase);

        match phase {
            Phase::Election if adopted => self.start_election(true).await,
            Phase::Game if adopted => self.finish_round().await,
            _ => Ok(()),
        }
    }

    /// Play rounds forever.
    pub async fn run_rounds(self: &Arc<Self>) -> Result<()> {
        loop {
            self.play_round().await?;
        }
    }

    /// Wait for a seeker to be agreed on, then play one round.
    pub async fn play_round(self: &Arc<Self>) -> Result<()> {
        self.mailbox.wait(Signal::Consensus).await;
        self.finish_round().await
    }

    async fn finish_round(self: &Arc<Self>) -> Result<()> {
        self.set_phase(Phase::Game);
        if self.is_seeker() {
            self.play_seeker().await?;
        } else {
            self.play_hider().await?;
        }
        self.mailbox.wait(Signal::End).await;
        self.reset_round();
        Ok(())
    }

    fn reset_round(&self) {
        let mut tagged = self.lock_tagged();
        *tagged = false;
        self.is_safe.store(false, Ordering::SeqCst);
        let mut outcomes = self.lock_outcomes();
        outcomes.log.clear();
        outcomes.collecting = None;
        let rounds = self.rounds_completed.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Player {}: round {} complete", self.id(), rounds);
    }

    /// Chase the nearest remaining hider until nobody is left, then close
    /// the round.
    async fn play_seeker(self: &Arc<Self>) -> Result<()> {
        info!("Player {}: seeking", self.id());
        let mut position = self.me.position;
        {
            let mut peers = self.lock_peers();
            peers.in_round = peers.all.clone();
        }

        loop {
            let target = {
                let peers = self.lock_peers();
                nearest(position, peers.in_round.values(), |p| p.position)
                    .map(|(p, distance)| (p.clone(), distance))
            };
            let Some((target, distance)) = target else {
                break;
            };

            let travel = self.timing.travel(distance);
            info!(
                "Player {}: moving towards player {}, distance {:.2}, {} ms",
                self.id(),
                target.id,
                distance,
                travel.as_millis()
            );
            sleep(travel).await;

            self.try_tag(&target);
            // the target is out of the chase whether or not the tag succeeded
            self.lock_peers().in_round.remove(&target.id);
            position = target.position;
        }

        self.close_round().await
    }

    fn try_tag(&self, target: &PeerInfo) {
        let me = self.id();
        let id = target.id;
        self.client
            .spawn_call(target.clone(), PeerRequest::Tag, move |reply| {
                let tagged = matches!(reply, PeerResponse::Tag { tagged: true });
                info!("Player {}: tag on player {}: {}", me, id, if tagged { "caught" } else { "missed" });
            });
    }

    async fn close_round(self: &Arc<Self>) -> Result<()> {
        let peers = self.peers();
        let results = {
            let mut outcomes = self.lock_outcomes();
            let results = Arc::new(QuorumBarrier::new(peers.len()));
            for outcome in &outcomes.log {
                results.add(outcome.clone());
            }
            outcomes.collecting = Some(Arc::clone(&results));
            results
        };
        self.set_phase(Phase::End);

        info!("Player {}: game over, waiting for every outcome", self.id());
        for outcome in results.await_all().await? {
            info!(
                "Player {}: {}",
                outcome.player.id,
                if outcome.safe { "safe" } else { "tagged" }
            );
        }

        let acks = Arc::new(QuorumBarrier::new(peers.len()));
        self.client.fan_out(&peers, &PeerRequest::EndGame, &acks, ack);
        acks.await_all().await?;

        info!("Player {}: everybody saw the end, back to preparation", self.id());
        self.is_seeker.store(false, Ordering::SeqCst);
        self.set_phase(Phase::Preparation);
        self.client.notify_all(&peers, &PeerRequest::GoToPreparation);
        self.mailbox.post(Signal::End);
        Ok(())
    }

    /// Race for the home base unless already caught.
    async fn play_hider(self: &Arc<Self>) -> Result<()> {
        info!("Player {}: hiding", self.id());
        let Some((peers, timestamp)) = self.begin_hiding() else {
            self.broadcast_outcome(false);
            return Ok(());
        };

        self.request_home_base(&peers, timestamp);
        debug!("Player {}: waiting for home base, timestamp {}", self.id(), timestamp);
        self.home_base.acquire().await?;

        if self.home_base.did_cancel_early() {
            self.release_home_base();
            self.broadcast_outcome(false);
            return Ok(());
        }

        let travel = self.timing.travel(self.me.distance_from_center());
        info!("Player {}: running to the home base, {} ms", self.id(), travel.as_millis());
        sleep(travel).await;
        sleep(self.timing.dwell()).await;

        self.is_safe.store(true, Ordering::SeqCst);
        info!("Player {}: safe", self.id());
        self.release_home_base();
        self.broadcast_outcome(true);
        Ok(())
    }

    /// Check the tagged flag and request the home base in one step, so a
    /// concurrent tag lands either before (and we stop) or after (and
    /// cancels the wait).
    fn begin_hiding(&self) -> Option<(Vec<PeerInfo>, u64)> {
        let tagged = self.lock_tagged();
        if *tagged {
            return None;
        }
        let peers = self.peers();
        let timestamp = self.home_base.request_access(peers.len())?;
        drop(tagged);
        Some((peers, timestamp))
    }

    fn request_home_base(self: &Arc<Self>, peers: &[PeerInfo], timestamp: u64) {
        let request = PeerRequest::AcquireHomeBase {
            requester: self.me.clone(),
            timestamp,
        };
        for peer in peers {
            let node = Arc::clone(self);
            let from = peer.id;
            self.client.spawn_call(peer.clone(), request.clone(), move |reply| {
                if let PeerResponse::Grant { granted } = reply {
                    node.home_base.record_grant(from, granted);
                }
            });
        }
    }

    fn release_home_base(&self) {
        for owed in self.home_base.release() {
            self.client.spawn_call(
                owed,
                PeerRequest::ReleaseHomeBase {
                    from: self.id(),
                    granted: true,
                },
                |_| {},
            );
        }
    }

    fn broadcast_outcome(&self, safe: bool) {
        let outcome = PlayerOutcome {
            player: self.me.clone(),
            safe,
        };
        self.client
            .notify_all(&self.peers(), &PeerRequest::NotifyOutcome { outcome });
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::peer;
    use super::*;
    use crate::config::GameTiming;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;
    use tokio::time::timeout;
    use watchout_grid::GridPos;
    use watchout_protocols::{decode_line, encode_line, ResourceStatus};

    async fn listening_peer(id: u32, x: u8, y: u8) -> (PeerInfo, TcpListener) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let info = PeerInfo {
            id,
            address: "127.0.0.1".into(),
            port: listener.local_addr().unwrap().port(),
            position: GridPos::new(x, y),
        };
        (info, listener)
    }

    /// Accept one call, acknowledge it and return what was asked.
    async fn answer(listener: &TcpListener) -> PeerRequest {
        let (stream, _) = timeout(Duration::from_secs(5), listener.accept())
            .await
            .unwrap()
            .unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut line = String::new();
        BufReader::new(reader).read_line(&mut line).await.unwrap();
        writer
            .write_all(encode_line(&PeerResponse::Ack).unwrap().as_bytes())
            .await
            .unwrap();
        decode_line(&line).unwrap()
    }

    #[tokio::test]
    async fn tag_while_waiting_for_home_base_releases_it() {
        let node = Node::new(peer(1, 0, 0), GameTiming::scaled(0.0));
        let (other, other_calls) = listening_peer(2, 9, 9).await;
        let (waiting, waiting_calls) = listening_peer(3, 0, 9).await;
        node.add_peer(other);
        node.set_phase(Phase::Game);

        let hider = {
            let node = Arc::clone(&node);
            tokio::spawn(async move { node.play_hider().await })
        };
        assert!(matches!(
            answer(&other_calls).await,
            PeerRequest::AcquireHomeBase { requester, .. } if requester.id == 1
        ));
        assert_eq!(node.home_base().status(), ResourceStatus::Needed);

        let reply = node.handle(PeerRequest::AcquireHomeBase {
            requester: waiting,
            timestamp: u64::MAX,
        });
        assert_eq!(reply, PeerResponse::Grant { granted: false });
        assert_eq!(node.home_base().deferred_count(), 1);

        assert_eq!(node.handle(PeerRequest::Tag), PeerResponse::Tag { tagged: true });
        timeout(Duration::from_secs(5), hider)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(node.home_base().status(), ResourceStatus::NotNeeded);
        assert_eq!(node.home_base().deferred_count(), 0);
        assert!(node.is_tagged());
        assert!(!node.is_safe());
        assert_eq!(
            answer(&waiting_calls).await,
            PeerRequest::ReleaseHomeBase { from: 1, granted: true }
        );
        assert_eq!(
            answer(&other_calls).await,
            PeerRequest::NotifyOutcome {
                outcome: PlayerOutcome { player: node.me().clone(), safe: false },
            }
        );
    }

    #[tokio::test]
    async fn seeker_collects_outcomes_sent_after_the_round_closed() {
        let node = Node::new(peer(1, 4, 4), GameTiming::scaled(0.0));
        let (early, early_calls) = listening_peer(2, 0, 0).await;
        let (late, late_calls) = listening_peer(3, 9, 9).await;
        node.add_peer(early.clone());
        node.add_peer(late.clone());
        node.is_seeker.store(true, Ordering::SeqCst);
        node.set_phase(Phase::Game);

        node.handle(PeerRequest::NotifyOutcome {
            outcome: PlayerOutcome { player: early, safe: true },
        });

        let closing = {
            let node = Arc::clone(&node);
            tokio::spawn(async move { node.close_round().await })
        };
        timeout(Duration::from_secs(5), async {
            while node.phase() != Phase::End {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        tokio::task::yield_now().await;
        assert!(!closing.is_finished());

        node.handle(PeerRequest::NotifyOutcome {
            outcome: PlayerOutcome { player: late, safe: false },
        });

        assert_eq!(answer(&early_calls).await, PeerRequest::EndGame);
        assert_eq!(answer(&late_calls).await, PeerRequest::EndGame);
        timeout(Duration::from_secs(5), closing)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert!(!node.is_seeker());
        assert_eq!(node.phase(), Phase::Preparation);
        assert!(node.mailbox().is_pending(Signal::End));
        assert_eq!(node.outcomes().len(), 2);
        assert_eq!(answer(&early_calls).await, PeerRequest::GoToPreparation);
        assert_eq!(answer(&late_calls).await, PeerRequest::GoToPreparation);
    }

    #[tokio::test]
    async fn bootstrap_leaves_an_election_it_did_not_adopt() {
        let node = Node::new(peer(1, 0, 0), GameTiming::default());
        node.adopt_registration(vec![]);
        node.set_phase(Phase::Election);

        node.bootstrap(&[Phase::Election]).await.unwrap();
        assert_eq!(node.phase(), Phase::Election);
        assert!(!node.is_seeker());
        assert!(!node.mailbox().is_pending(Signal::Consensus));
    }

    #[tokio::test]
    async fn bootstrap_forces_an_adopted_election() {
        let node = Node::new(peer(1, 0, 0), GameTiming::default());
        node.bootstrap(&[Phase::Election]).await.unwrap();
        assert!(node.is_seeker());
        assert!(node.mailbox().is_pending(Signal::Consensus));
    }

    #[tokio::test]
    async fn bootstrap_adopts_most_advanced_phase() {
        let node = Node::new(peer(1, 0, 0), GameTiming::default());
        node.adopt_registration(vec![peer(2, 0, 9), peer(3, 9, 0)]);
        node.bootstrap(&[Phase::Preparation, Phase::End]).await.unwrap();
        assert_eq!(node.phase(), Phase::End);
    }

    #[tokio::test]
    async fn bootstrap_falls_back_to_preparation() {
        let node = Node::new(peer(1, 0, 0), GameTiming::default());
        node.adopt_registration(vec![peer(2, 0, 9), peer(3, 9, 0)]);
        node.bootstrap(&[Phase::Unknown, Phase::Unknown]).await.unwrap();
        assert_eq!(node.phase(), Phase::Preparation);
    }

    #[tokio::test]
    async fn bootstrap_keeps_a_known_phase() {
        let node = Node::new(peer(1, 0, 0), GameTiming::default());
        node.adopt_registration(vec![]);
        node.bootstrap(&[Phase::Game]).await.unwrap();
        assert_eq!(node.phase(), Phase::Preparation);
    }

    #[test]
    fn tagged_hider_does_not_request_the_home_base() {
        let node = Node::new(peer(1, 0, 0), GameTiming::default());
        *node.lock_tagged() = true;
        assert!(node.begin_hiding().is_none());
        assert_eq!(node.home_base().status(), ResourceStatus::NotNeeded);
    }

    #[tokio::test]
    async fn lone_seeker_closes_the_round() {
        let node = Node::new(peer(1, 0, 0), GameTiming::scaled(0.0));
        node.set_phase(Phase::Preparation);
        node.start_election(false).await.unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(5), node.play_round())
            .await
            .unwrap()
            .unwrap();

        assert!(!node.is_seeker());
        assert_eq!(node.phase(), Phase::Preparation);
        assert_eq!(node.rounds_completed(), 1);
        assert!(node.outcomes().is_empty());
    }
}
