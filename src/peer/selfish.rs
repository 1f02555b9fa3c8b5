//! The selfish peer: an honest peer whose own blocks sit in a rotating
//! publication buffer before broadcast.

use std::collections::BTreeMap;
use std::mem;

use rand::rngs::StdRng;

use crate::block::{BlockKey, BlockRef};
use crate::peer::{HonestPeer, MinerId, Peer, PeerIdx, UnclePolicy};
use crate::store::BlockStore;

/// Composes an [`HonestPeer`] with a ring of `delay` publication
/// buckets. Freshly mined blocks land in the slot under the cursor and
/// surface once the cursor has wrapped all the way around; relayed
/// blocks land in the next slot and leave on the very next communicate
/// phase. With `delay == 1` the peer is observationally honest.
#[derive(Debug)]
pub struct SelfishPeer {
    inner: HonestPeer,
    ring: Vec<Vec<BlockRef>>,
    cursor: usize,
}

impl SelfishPeer {
    /// Creates a selfish peer withholding its own blocks for `delay`
    /// ticks. `delay` must be at least 1; the simulation builder
    /// enforces this.
    pub fn new(
        id: MinerId,
        mining_power: u64,
        genesis: BlockRef,
        delay: usize,
    ) -> Self {
        debug_assert!(delay >= 1, "publication ring needs at least one slot");

        SelfishPeer {
            inner: HonestPeer::new(id, mining_power, genesis),
            ring: vec![Vec::new(); delay],
            cursor: 0,
        }
    }

    #[inline]
    fn next_slot(&self) -> usize {
        (self.cursor + 1) % self.ring.len()
    }
}

impl Peer for SelfishPeer {
    fn id(&self) -> MinerId {
        self.inner.id()
    }

    fn mining_power(&self) -> u64 {
        self.inner.mining_power()
    }

    fn neighbors(&self) -> &[PeerIdx] {
        self.inner.neighbors()
    }

    fn add_neighbor(&mut self, peer: PeerIdx) {
        self.inner.add_neighbor(peer);
    }

    fn tick_mine(
        &mut self,
        store: &mut BlockStore,
        rng: &mut StdRng,
        total_power: u64,
        now: u64,
        policy: UnclePolicy,
    ) {
        if let Some(block) =
            self.inner.mine(store, rng, total_power, now, policy)
        {
            self.inner.append_block(block);
            self.ring[self.cursor].push(block);
        }
    }

    fn tick_communicate(&mut self) -> Vec<BlockRef> {
        self.cursor = self.next_slot();
        mem::take(&mut self.ring[self.cursor])
    }

    fn send_block(&mut self, store: &BlockStore, block: BlockRef) {
        self.inner.send_block(store, block);
    }

    fn tick_receive(&mut self, store: &BlockStore) {
        let next = self.next_slot();
        for block in self.inner.drain_inbound() {
            if self.inner.accept(store, block) {
                self.ring[next].push(block);
            }
        }
    }

    fn chain(&self) -> &[BlockRef] {
        self.inner.chain()
    }

    fn pending_uncles(&self) -> &BTreeMap<BlockKey, BlockRef> {
        self.inner.pending_uncles()
    }

    fn seen_blocks(&self) -> usize {
        self.inner.seen_blocks()
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::SelfishPeer;
    use crate::params::TICK_LENGTH;
    use crate::peer::{MinerId, Peer, UnclePolicy};
    use crate::store::BlockStore;

    const POLICY: UnclePolicy = UnclePolicy { max_uncles: 2, max_depth: 7 };

    fn selfish(store: &BlockStore, delay: usize) -> SelfishPeer {
        SelfishPeer::new(MinerId::Selfish(0), 1, store.genesis(), delay)
    }

    /// Drives mine/communicate until the first block is mined, then
    /// counts the communicate phases until it surfaces.
    fn phases_until_publication(delay: usize) -> usize {
        let mut store = BlockStore::new();
        let mut peer = selfish(&store, delay);
        let mut rng = StdRng::seed_from_u64(7);

        let mut mined_at = None;
        for tick in 1..=1_000u64 {
            let before = peer.chain().len();
            peer.tick_mine(&mut store, &mut rng, 1, tick * TICK_LENGTH, POLICY);
            if mined_at.is_none() && peer.chain().len() > before {
                mined_at = Some(tick);
            }

            let published = peer.tick_communicate();
            if let Some(mined_tick) = mined_at {
                if !published.is_empty() {
                    return (tick - mined_tick + 1) as usize;
                }
            }
        }

        panic!("no block mined within the test horizon");
    }

    #[test]
    fn own_blocks_surface_after_delay_communicates() {
        for delay in [1, 2, 4, 10] {
            assert_eq!(phases_until_publication(delay), delay);
        }
    }

    #[test]
    fn delay_one_publishes_in_the_mining_tick() {
        assert_eq!(phases_until_publication(1), 1);
    }

    #[test]
    fn relayed_blocks_leave_on_the_next_communicate() {
        let mut store = BlockStore::new();
        let mut peer = selfish(&store, 5);
        let foreign =
            store.push(MinerId::Honest(1), Some(store.genesis()), vec![], 150);

        peer.send_block(&store, foreign);
        peer.tick_receive(&store);
        assert_eq!(peer.chain().last(), Some(&foreign));

        assert_eq!(peer.tick_communicate(), vec![foreign]);
        // The slot was drained, not republished.
        for _ in 0..10 {
            assert!(peer.tick_communicate().is_empty());
        }
    }

    #[test]
    fn duplicate_relays_are_not_forwarded() {
        let mut store = BlockStore::new();
        let mut peer = selfish(&store, 3);
        let foreign =
            store.push(MinerId::Honest(1), Some(store.genesis()), vec![], 150);

        peer.send_block(&store, foreign);
        peer.tick_receive(&store);
        peer.send_block(&store, foreign);
        peer.tick_receive(&store);

        assert_eq!(peer.tick_communicate(), vec![foreign]);
        assert!(peer.tick_communicate().is_empty());
        assert!(peer.tick_communicate().is_empty());
    }
}
