//! Reward accounting over the canonical chain.

use std::collections::HashMap;

use crate::block::BlockRef;
use crate::params::BLOCK_REWARD;
use crate::peer::MinerId;
use crate::store::BlockStore;

/// Reward rules applied by the end-of-run accounting walk.
#[derive(Debug, Clone, Copy)]
pub struct RewardParams {
    /// Decay denominator: an uncle at distance `d` earns a
    /// `1 - d / max_depth` share, clamped at zero.
    pub max_depth: usize,
    /// Static divisor applied to the decayed uncle reward.
    pub uncle_divisor: f64,
    /// Fraction of a block reward the includer earns per uncle.
    pub nephew_reward: f64,
}

/// Earnings of a single miner.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Gains {
    /// Total reward from blocks, fees, uncle payouts, and nephew
    /// bonuses.
    pub reward: f64,
    /// Blocks on the canonical chain.
    pub main_blocks: u64,
    /// Blocks referenced as uncles by the canonical chain.
    pub uncle_blocks: u64,
}

/// Per-miner earnings derived from one run's canonical chain.
#[derive(Debug, Default)]
pub struct RewardLedger {
    gains: HashMap<MinerId, Gains>,
}

impl RewardLedger {
    /// Walks `chain` from its tip toward genesis, crediting each block's
    /// producer with `BLOCK_REWARD` plus fees, each included uncle's
    /// producer with the distance-decayed uncle reward, and the
    /// including producer with the nephew bonus. Genesis earns nothing.
    pub fn tally(
        store: &BlockStore,
        chain: &[BlockRef],
        params: RewardParams,
    ) -> Self {
        let mut ledger = RewardLedger::default();
        let Some(&tip) = chain.last() else {
            return ledger;
        };

        let mut cursor = tip;
        while let Some(parent) = store[cursor].parent {
            let block = &store[cursor];
            let mut block_reward = BLOCK_REWARD + block.fees as f64;

            for &uncle in &block.uncles {
                block_reward += BLOCK_REWARD * params.nephew_reward;

                let uncle = &store[uncle];
                let distance = (block.depth - uncle.depth) as f64;
                let decayed = BLOCK_REWARD
                    * (1.0 - distance / params.max_depth as f64);
                let uncle_reward = decayed.max(0.0) / params.uncle_divisor;

                let gains = ledger.gains.entry(uncle.miner).or_default();
                gains.reward += uncle_reward;
                gains.uncle_blocks += 1;
            }

            let gains = ledger.gains.entry(block.miner).or_default();
            gains.reward += block_reward;
            gains.main_blocks += 1;

            cursor = parent;
        }

        ledger
    }

    /// Earnings of `miner`; zeros for miners that never earned.
    pub fn get(&self, miner: MinerId) -> Gains {
        self.gains.get(&miner).copied().unwrap_or_default()
    }

    /// Miners with any recorded earnings.
    pub fn len(&self) -> usize {
        self.gains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{RewardLedger, RewardParams};
    use crate::params::BLOCK_REWARD;
    use crate::peer::MinerId;
    use crate::store::BlockStore;

    const PARAMS: RewardParams = RewardParams {
        max_depth: 7,
        uncle_divisor: 1.0,
        nephew_reward: 1.0 / 32.0,
    };

    const M0: MinerId = MinerId::Honest(0);
    const M1: MinerId = MinerId::Honest(1);

    #[test]
    fn genesis_only_chain_earns_nothing() {
        let store = BlockStore::new();
        let ledger =
            RewardLedger::tally(&store, &[store.genesis()], PARAMS);

        assert!(ledger.is_empty());
    }

    #[test]
    fn blocks_fees_uncles_and_nephews_are_credited() {
        let mut store = BlockStore::new();
        let genesis = store.genesis();
        let a1 = store.push(M0, Some(genesis), vec![], 150);
        let u1 = store.push(M1, Some(genesis), vec![], 170);
        let a2 = store.push(M0, Some(a1), vec![u1], 250);
        let chain = vec![genesis, a1, a2];

        let ledger = RewardLedger::tally(&store, &chain, PARAMS);

        let m0 = ledger.get(M0);
        let expected_m0 = (BLOCK_REWARD + 150.0)
            + (BLOCK_REWARD + 100.0)
            + BLOCK_REWARD / 32.0;
        assert!((m0.reward - expected_m0).abs() < 1e-9);
        assert_eq!(m0.main_blocks, 2);
        assert_eq!(m0.uncle_blocks, 0);

        let m1 = ledger.get(M1);
        let expected_m1 = BLOCK_REWARD * (1.0 - 1.0 / 7.0);
        assert!((m1.reward - expected_m1).abs() < 1e-9);
        assert_eq!(m1.main_blocks, 0);
        assert_eq!(m1.uncle_blocks, 1);
    }

    #[test]
    fn uncle_reward_clamps_to_zero_beyond_the_window() {
        let mut store = BlockStore::new();
        let genesis = store.genesis();
        let uncle = store.push(M1, Some(genesis), vec![], 110);

        let mut parent = store.push(M0, Some(genesis), vec![], 150);
        for tick in 2..=8u64 {
            parent = store.push(M0, Some(parent), vec![], tick * 100 + 50);
        }
        let nephew = store.push(M0, Some(parent), vec![uncle], 950);

        let mut chain = vec![genesis];
        let mut cursor = Some(nephew);
        let mut suffix = vec![];
        while let Some(block) = cursor {
            if block == genesis {
                break;
            }
            suffix.push(block);
            cursor = store[block].parent;
        }
        suffix.reverse();
        chain.extend(suffix);

        let params = RewardParams { max_depth: 7, ..PARAMS };
        let ledger = RewardLedger::tally(&store, &chain, params);

        // Distance 9 - 1 = 8 exceeds the window; the producer is still
        // counted but paid nothing.
        let m1 = ledger.get(M1);
        assert_eq!(m1.reward, 0.0);
        assert_eq!(m1.uncle_blocks, 1);

        // The includer keeps its nephew bonus regardless.
        let m0 = ledger.get(M0);
        assert_eq!(m0.main_blocks, 9);
        assert!(m0.reward > 9.0 * BLOCK_REWARD);
    }

    #[test]
    fn uncle_divisor_scales_the_payout() {
        let mut store = BlockStore::new();
        let genesis = store.genesis();
        let u1 = store.push(M1, Some(genesis), vec![], 170);
        let a1 = store.push(M0, Some(genesis), vec![], 150);
        let a2 = store.push(M0, Some(a1), vec![u1], 250);
        let chain = vec![genesis, a1, a2];

        let halved =
            RewardParams { uncle_divisor: 2.0, ..PARAMS };
        let full = RewardLedger::tally(&store, &chain, PARAMS);
        let half = RewardLedger::tally(&store, &chain, halved);

        assert!(
            (full.get(M1).reward - 2.0 * half.get(M1).reward).abs() < 1e-9
        );
    }
}
