//! Bully election: who should be the seeker.
//!
//! Only the local decision lives here. Sending challenges, announcing
//! victory and waiting for acknowledgments is the node's job.
//!
//! Peers are ordered by distance from the home base, closest first. Equal
//! distances go to the higher id.

use std::cmp::Ordering;

use crate::message::PeerInfo;

/// Election priority of one peer. Greater ranks win.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rank {
    pub distance: f64,
    pub id: u32,
}

impl Rank {
    /// Rank of `peer` from its assigned position.
    pub fn of(peer: &PeerInfo) -> Self {
        Self {
            distance: peer.distance_from_center(),
            id: peer.id,
        }
    }

    /// Whether `self` has a higher priority than `other`.
    pub fn outranks(&self, other: &Rank) -> bool {
        self.cmp_priority(other) == Ordering::Greater
    }

    fn cmp_priority(&self, other: &Rank) -> Ordering {
        // closer is better, so compare distances reversed
        other
            .distance
            .total_cmp(&self.distance)
            .then(self.id.cmp(&other.id))
    }
}

/// What a peer does when it starts an election.
#[derive(Debug, Clone, PartialEq)]
pub enum ElectionDecision {
    /// Nobody outranks us: announce victory to every peer.
    Victory,
    /// Send an election message to each of these peers.
    Challenge(Vec<PeerInfo>),
}

/// Peers that outrank `me`, in input order.
pub fn higher_priority_peers<'a, I>(me: &PeerInfo, peers: I) -> Vec<PeerInfo>
where
    I: IntoIterator<Item = &'a PeerInfo>,
{
    let mine = Rank::of(me);
    peers
        .into_iter()
        .filter(|p| p.id != me.id && Rank::of(p).outranks(&mine))
        .cloned()
        .collect()
}

/// Decide the next election step for `me`.
pub fn decide<'a, I>(me: &PeerInfo, peers: I) -> ElectionDecision
where
    I: IntoIterator<Item = &'a PeerInfo>,
{
    let higher = higher_priority_peers(me, peers);
    if higher.is_empty() {
        ElectionDecision::Victory
    } else {
        ElectionDecision::Challenge(higher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use watchout_grid::GridPos;

    fn peer(id: u32, x: u8, y: u8) -> PeerInfo {
        PeerInfo {
            id,
            address: "127.0.0.1".into(),
            port: 50_000 + id as u16,
            position: GridPos::new(x, y),
        }
    }

    #[test]
    fn closer_peer_outranks() {
        let near = Rank::of(&peer(1, 4, 3));
        let far = Rank::of(&peer(9, 0, 0));
        assert!(near.outranks(&far));
        assert!(!far.outranks(&near));
    }

    #[test]
    fn equal_distance_goes_to_higher_id() {
        let a = Rank::of(&peer(5, 3, 4));
        let b = Rank::of(&peer(7, 4, 3));
        assert_eq!(a.distance, b.distance);
        assert!(b.outranks(&a));
        assert!(!a.outranks(&b));
        assert!(!a.outranks(&a));
    }

    #[test]
    fn three_peer_scenario() {
        let p5 = peer(5, 3, 4);
        let p7 = peer(7, 4, 3);
        let p2 = peer(2, 2, 4);
        let all = [p5.clone(), p7.clone(), p2.clone()];

        assert_eq!(decide(&p7, &all), ElectionDecision::Victory);
        assert_eq!(decide(&p5, &all), ElectionDecision::Challenge(vec![p7.clone()]));
        assert_eq!(decide(&p2, &all), ElectionDecision::Challenge(vec![p5, p7]));
    }

    #[test]
    fn self_is_never_a_challenger() {
        let me = peer(3, 0, 0);
        assert_eq!(decide(&me, [&me]), ElectionDecision::Victory);
        assert_eq!(decide(&me, std::iter::empty()), ElectionDecision::Victory);
    }

    #[test]
    fn center_cells_all_rank_by_id() {
        let cells = [peer(1, 4, 4), peer(2, 4, 5), peer(3, 5, 4), peer(4, 5, 5)];
        let winners: Vec<u32> = cells
            .iter()
            .filter(|p| decide(p, &cells) == ElectionDecision::Victory)
            .map(|p| p.id)
            .collect();
        assert_eq!(winners, vec![4]);
    }

    proptest! {
        #[test]
        fn exactly_one_winner(cells in prop::collection::vec((0u8..10, 0u8..10), 1..12)) {
            let peers: Vec<PeerInfo> = cells
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| peer(i as u32 + 1, x, y))
                .collect();

            let winners: Vec<&PeerInfo> = peers
                .iter()
                .filter(|p| decide(p, &peers) == ElectionDecision::Victory)
                .collect();
            prop_assert_eq!(winners.len(), 1);

            let best = winners[0];
            for p in &peers {
                prop_assert!(best.distance_from_center() <= p.distance_from_center());
                if p.distance_from_center() == best.distance_from_center() {
                    prop_assert!(best.id >= p.id);
                }
            }
        }
    }
}
