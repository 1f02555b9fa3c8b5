//! Definitions for peer implementations

use std::collections::BTreeMap;
use std::fmt::{self, Debug};

use rand::rngs::StdRng;

use crate::block::{BlockKey, BlockRef};
use crate::store::BlockStore;

pub mod honest;
pub mod selfish;

pub use honest::HonestPeer;
pub use selfish::SelfishPeer;

/// Position of a peer within the driver's registration order, used to
/// address neighbors.
pub type PeerIdx = usize;

/// Identity of a block producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MinerId {
    /// Producer of the shared genesis block; never mines.
    Genesis,
    /// Honest miner at registration index `i`, rendered `m<i>`.
    Honest(u32),
    /// Selfish miner `i`, rendered `s<i>`.
    Selfish(u32),
    /// The zero-power observer holding the canonical chain.
    Observer,
}

impl fmt::Display for MinerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinerId::Genesis => write!(f, "genesis"),
            MinerId::Honest(i) => write!(f, "m{}", i),
            MinerId::Selfish(i) => write!(f, "s{}", i),
            MinerId::Observer => write!(f, "observer"),
        }
    }
}

/// Per-block uncle inclusion rules.
#[derive(Debug, Clone, Copy)]
pub struct UnclePolicy {
    /// Maximum uncles referenced by one block.
    pub max_uncles: usize,
    /// Maximum `block.depth - uncle.depth` for an uncle to be eligible;
    /// also the denominator of the reward decay.
    pub max_depth: usize,
}

/// A network participant driven through the three tick phases.
///
/// Two implementations exist: [`HonestPeer`] publishes everything as
/// soon as it can, [`SelfishPeer`] defers its own blocks behind a
/// rotating buffer. The driver calls the `tick_*` methods in phase
/// order for every peer before moving to the next phase.
pub trait Peer: Debug {
    /// This peer's identity.
    fn id(&self) -> MinerId;

    /// Relative hash-rate weight.
    fn mining_power(&self) -> u64;

    /// Broadcast targets, in insertion order. Duplicates and self-links
    /// are permitted; the observer is appended as a one-way neighbor.
    fn neighbors(&self) -> &[PeerIdx];

    /// Register an outbound neighbor.
    fn add_neighbor(&mut self, peer: PeerIdx);

    /// Mine phase: run one mining trial and, on success, seal the block
    /// onto the local chain and stage it for publication.
    fn tick_mine(
        &mut self,
        store: &mut BlockStore,
        rng: &mut StdRng,
        total_power: u64,
        now: u64,
        policy: UnclePolicy,
    );

    /// Communicate phase: blocks leaving this peer in this tick. The
    /// driver delivers each to every neighbor.
    fn tick_communicate(&mut self) -> Vec<BlockRef>;

    /// Inbound endpoint: queue `block` for this tick's receive phase,
    /// keeping the queue in descending timestamp order.
    fn send_block(&mut self, store: &BlockStore, block: BlockRef);

    /// Receive phase: drain the inbound queue, accepting each block and
    /// staging fresh ones for re-broadcast.
    fn tick_receive(&mut self, store: &BlockStore);

    /// Current canonical view, genesis first.
    fn chain(&self) -> &[BlockRef];

    /// Blocks observed but not on the chain that remain uncle
    /// candidates.
    fn pending_uncles(&self) -> &BTreeMap<BlockKey, BlockRef>;

    /// Number of distinct blocks this peer has ever observed.
    fn seen_blocks(&self) -> usize;
}
