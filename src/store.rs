//! Per-run arena of immutable blocks.

use std::ops::Index;

use crate::block::{Block, BlockRef};
use crate::params::FEES_PER_SECOND;
use crate::peer::MinerId;

/// Append-only store holding every block produced during one run.
///
/// Peers reference blocks by [`BlockRef`] and read them through this
/// store; no block is ever mutated or removed after insertion. The
/// genesis block is created with the store and shared by every peer.
#[derive(Debug)]
pub struct BlockStore {
    blocks: Vec<Block>,
}

impl BlockStore {
    /// Creates a store containing only the genesis block.
    pub fn new() -> Self {
        let genesis = Block {
            miner: MinerId::Genesis,
            parent: None,
            uncles: Vec::new(),
            timestamp: 0,
            fees: 0,
            depth: 0,
        };

        BlockStore { blocks: vec![genesis] }
    }

    /// The shared genesis block.
    #[inline]
    pub fn genesis(&self) -> BlockRef {
        BlockRef(0)
    }

    /// Seals and inserts a new block, deriving depth and fees from the
    /// parent. A `None` parent produces a genesis-shaped block; the
    /// normal path always supplies one.
    pub fn push(
        &mut self,
        miner: MinerId,
        parent: Option<BlockRef>,
        uncles: Vec<BlockRef>,
        timestamp: u64,
    ) -> BlockRef {
        let (depth, fees) = match parent {
            Some(parent) => {
                let parent = &self[parent];
                debug_assert!(
                    timestamp > parent.timestamp,
                    "block timestamp {} not after parent timestamp {}",
                    timestamp,
                    parent.timestamp,
                );

                (
                    parent.depth + 1,
                    (timestamp - parent.timestamp) * FEES_PER_SECOND,
                )
            }
            None => (0, 0),
        };

        let block = Block { miner, parent, uncles, timestamp, fees, depth };
        self.blocks.push(block);

        BlockRef(self.blocks.len() - 1)
    }

    /// Returns a reference to the block at `block`, if present.
    #[inline]
    pub fn get(&self, block: BlockRef) -> Option<&Block> {
        self.blocks.get(block.0)
    }

    /// Number of blocks ever produced, genesis included.
    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<BlockRef> for BlockStore {
    type Output = Block;

    fn index(&self, index: BlockRef) -> &Self::Output {
        &self.blocks[index.0]
    }
}
