//! The honest peer: mines at the tip of its local chain and publishes
//! everything as soon as possible.

use std::collections::{BTreeMap, HashSet};
use std::mem;

use rand::{rngs::StdRng, Rng};

use crate::block::{BlockKey, BlockRef};
use crate::params::{BLOCK_CHANCE, TICK_LENGTH};
use crate::peer::{MinerId, Peer, PeerIdx, UnclePolicy};
use crate::store::BlockStore;

/// Peer state machine for the honest strategy.
///
/// Owns a local chain view, a pending-uncle pool, the set of block
/// identifiers ever observed, and the inbound/outbound queues. The
/// observer is an `HonestPeer` with zero mining power and no outbound
/// neighbors.
#[derive(Debug)]
pub struct HonestPeer {
    id: MinerId,
    mining_power: u64,
    neighbors: Vec<PeerIdx>,
    chain: Vec<BlockRef>,
    pending_uncles: BTreeMap<BlockKey, BlockRef>,
    seen: HashSet<BlockKey>,
    read_queue: Vec<BlockRef>,
    publish_queue: Vec<BlockRef>,
}

impl HonestPeer {
    /// Creates a peer whose chain starts at the shared genesis block.
    pub fn new(id: MinerId, mining_power: u64, genesis: BlockRef) -> Self {
        HonestPeer {
            id,
            mining_power,
            neighbors: Vec::new(),
            chain: vec![genesis],
            pending_uncles: BTreeMap::new(),
            seen: HashSet::new(),
            read_queue: Vec::new(),
            publish_queue: Vec::new(),
        }
    }

    /// Current chain tip.
    #[inline]
    pub fn tip(&self) -> BlockRef {
        *self.chain.last().expect("chain always holds genesis")
    }

    /// Runs one mining trial. With probability
    /// `BLOCK_CHANCE * mining_power / total_power` a block is sealed at
    /// the tip and returned; the caller decides where it goes.
    pub fn mine(
        &mut self,
        store: &mut BlockStore,
        rng: &mut StdRng,
        total_power: u64,
        now: u64,
        policy: UnclePolicy,
    ) -> Option<BlockRef> {
        let odds =
            BLOCK_CHANCE * self.mining_power as f64 / total_power as f64;

        if rng.gen::<f64>() < odds {
            Some(self.seal(store, rng, now, policy))
        } else {
            None
        }
    }

    /// Seals a block on top of the current tip, pulling eligible uncles
    /// out of the pending pool. The timestamp gets a uniform intra-tick
    /// offset so same-tick blocks tie-break by time rather than by peer
    /// order.
    fn seal(
        &mut self,
        store: &mut BlockStore,
        rng: &mut StdRng,
        now: u64,
        policy: UnclePolicy,
    ) -> BlockRef {
        let parent = self.tip();
        let depth = store[parent].depth + 1;

        let mut included: Vec<(BlockKey, BlockRef)> = Vec::new();
        for (&key, &candidate) in self.pending_uncles.iter() {
            if included.len() == policy.max_uncles {
                break;
            }
            // Eligibility window: 1 <= depth - uncle.depth <= max_depth.
            let eligible = key.depth < depth
                && depth - key.depth <= policy.max_depth;
            if eligible {
                included.push((key, candidate));
            }
        }

        for (key, _) in &included {
            self.pending_uncles.remove(key);
        }

        let uncles = included.into_iter().map(|(_, block)| block).collect();
        let timestamp = now + rng.gen_range(0..TICK_LENGTH - 1);
        let sealed = store.push(self.id, Some(parent), uncles, timestamp);
        self.seen.insert(store[sealed].key());

        sealed
    }

    /// Appends `block` to the local chain without re-checking parentage;
    /// callers guarantee it extends the tip (or arrive here through
    /// [`accept`](Self::accept), which verified lineage by walking
    /// parents).
    pub fn append_block(&mut self, block: BlockRef) {
        self.chain.push(block);
    }

    /// Stages `block` for broadcast on the next communicate phase.
    pub fn enqueue_block(&mut self, block: BlockRef) {
        self.publish_queue.push(block);
    }

    pub(crate) fn drain_inbound(&mut self) -> Vec<BlockRef> {
        mem::take(&mut self.read_queue)
    }

    /// Idempotent acceptance protocol. Returns whether `block` was
    /// fresh, in which case the caller forwards it per its publication
    /// policy.
    pub(crate) fn accept(
        &mut self,
        store: &BlockStore,
        block: BlockRef,
    ) -> bool {
        let key = store[block].key();
        if !self.seen.insert(key) {
            return false;
        }

        // Walk each uncle's ancestor line: every block it proves the
        // existence of is known now, and used candidates leave the pool.
        for &uncle in &store[block].uncles {
            let mut cursor = Some(uncle);
            while let Some(ancestor) = cursor {
                let ancestor_key = store[ancestor].key();
                let fresh = self.seen.insert(ancestor_key);
                self.pending_uncles.remove(&ancestor_key);
                if !fresh {
                    break;
                }
                cursor = store[ancestor].parent;
            }
        }

        let tip = self.tip();
        if store[block].depth <= store[tip].depth {
            self.pending_uncles.insert(key, block);
            return true;
        }

        self.reorg(store, block);
        true
    }

    /// Swaps the chain suffix for the deeper fork ending at `block`.
    /// Walks `block` and the tip toward their common ancestor, then
    /// adopts the new family and evicts the displaced one.
    fn reorg(&mut self, store: &BlockStore, block: BlockRef) {
        let mut new_family: Vec<BlockRef> = Vec::new();
        let mut old_family: Vec<BlockRef> = Vec::new();

        let mut new = block;
        let mut old = self.tip();

        while store[new].depth > store[old].depth {
            new_family.push(new);
            new = store[new].parent.expect("deeper than genesis");
        }
        while store[new].key() != store[old].key() {
            new_family.push(new);
            old_family.push(old);
            new = store[new].parent.expect("walk ends at shared genesis");
            old = store[old].parent.expect("walk ends at shared genesis");
        }

        for &adopted in new_family.iter().rev() {
            let adopted_key = store[adopted].key();
            self.chain.push(adopted);
            self.seen.insert(adopted_key);
            self.pending_uncles.remove(&adopted_key);
        }

        for &evicted in old_family.iter().rev() {
            let evicted_key = store[evicted].key();
            if let Some(pos) = self
                .chain
                .iter()
                .position(|&resident| store[resident].key() == evicted_key)
            {
                self.chain.remove(pos);
            }
            self.pending_uncles.remove(&evicted_key);
        }
    }
}

impl Peer for HonestPeer {
    fn id(&self) -> MinerId {
        self.id
    }

    fn mining_power(&self) -> u64 {
        self.mining_power
    }

    fn neighbors(&self) -> &[PeerIdx] {
        &self.neighbors
    }

    fn add_neighbor(&mut self, peer: PeerIdx) {
        self.neighbors.push(peer);
    }

    fn tick_mine(
        &mut self,
        store: &mut BlockStore,
        rng: &mut StdRng,
        total_power: u64,
        now: u64,
        policy: UnclePolicy,
    ) {
        if let Some(block) = self.mine(store, rng, total_power, now, policy) {
            self.append_block(block);
            self.enqueue_block(block);
        }
    }

    fn tick_communicate(&mut self) -> Vec<BlockRef> {
        mem::take(&mut self.publish_queue)
    }

    fn send_block(&mut self, store: &BlockStore, block: BlockRef) {
        let timestamp = store[block].timestamp;
        let pos = self
            .read_queue
            .iter()
            .position(|&queued| timestamp > store[queued].timestamp)
            .unwrap_or(self.read_queue.len());
        self.read_queue.insert(pos, block);
    }

    fn tick_receive(&mut self, store: &BlockStore) {
        for block in self.drain_inbound() {
            if self.accept(store, block) {
                self.enqueue_block(block);
            }
        }
    }

    fn chain(&self) -> &[BlockRef] {
        &self.chain
    }

    fn pending_uncles(&self) -> &BTreeMap<BlockKey, BlockRef> {
        &self.pending_uncles
    }

    fn seen_blocks(&self) -> usize {
        self.seen.len()
    }
}
