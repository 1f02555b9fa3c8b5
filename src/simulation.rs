//! Building and running simulations.

use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

use crate::params::{NEIGHBOR_FANOUT, SEED_BASE, TICK_LENGTH};
use crate::peer::{HonestPeer, MinerId, Peer, SelfishPeer, UnclePolicy};
use crate::power_dist::{scaled_power, PowerValue};
use crate::rewards::{RewardLedger, RewardParams};
use crate::store::BlockStore;

pub mod builder;

pub use builder::{SimulationBuildError, SimulationBuilder};

/// Publication strategy of the single selfish peer, when configured.
#[derive(Debug, Clone, Copy)]
pub struct SelfishParams {
    /// Ring length of the publication buffer, in ticks.
    pub delay: usize,
    /// Fraction in (0, 1); the peer at `floor(miners * power)` turns
    /// selfish while keeping that index's mining power.
    pub power: f64,
}

/// A fully validated simulation, ready to run.
///
/// Each run is independent and reproducible: run `i` draws every random
/// decision from one stream seeded with `SEED_BASE + i`. Runs fan out
/// across threads via [`run_all`](Simulation::run_all); all state of a
/// single run stays on one thread.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(crate) runs: usize,
    pub(crate) time: u64,
    pub(crate) miners: usize,
    pub(crate) power_scaling: f64,
    pub(crate) policy: UnclePolicy,
    pub(crate) rewards: RewardParams,
    pub(crate) selfish: Option<SelfishParams>,
}

/// Identity and weight of one peer, in registration order.
#[derive(Debug, Clone, Copy)]
pub struct PeerStats {
    pub id: MinerId,
    pub power: PowerValue,
}

/// Results of one completed run.
#[derive(Debug)]
pub struct RunOutput {
    /// Zero-based run index.
    pub run: usize,
    /// Real peers in registration order; the observer is excluded.
    pub peers: Vec<PeerStats>,
    /// Earnings tallied over the observer's canonical chain.
    pub ledger: RewardLedger,
    /// Depth of the canonical chain tip.
    pub canonical_depth: usize,
    /// Distinct blocks the observer saw, genesis excluded.
    pub blocks_seen: usize,
}

impl RunOutput {
    /// Share of produced blocks that landed on the canonical chain.
    pub fn power_utilization(&self) -> f64 {
        if self.blocks_seen == 0 {
            return 0.0;
        }
        self.canonical_depth as f64 / self.blocks_seen as f64
    }
}

impl Simulation {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    /// Executes all configured runs, in parallel, in run order.
    pub fn run_all(&self) -> Vec<RunOutput> {
        (0..self.runs).into_par_iter().map(|run| self.run(run)).collect()
    }

    /// Executes a single seeded run and tallies its rewards.
    pub fn run(&self, run: usize) -> RunOutput {
        let (store, peers, observer) = self.execute(run);

        let ledger = RewardLedger::tally(
            &store,
            peers[observer].chain(),
            self.rewards,
        );
        let canonical_depth = peers[observer].chain().len() - 1;
        let blocks_seen = peers[observer].seen_blocks();
        let peer_stats = peers[..observer]
            .iter()
            .map(|peer| PeerStats {
                id: peer.id(),
                power: peer.mining_power(),
            })
            .collect();

        RunOutput {
            run,
            peers: peer_stats,
            ledger,
            canonical_depth,
            blocks_seen,
        }
    }

    /// Builds the peer population and drives the tick loop to
    /// completion. Returns the block store, the peers, and the
    /// observer's index (always last).
    pub(crate) fn execute(
        &self,
        run: usize,
    ) -> (BlockStore, Vec<Box<dyn Peer>>, usize) {
        let mut rng = StdRng::seed_from_u64(SEED_BASE + run as u64);
        let mut store = BlockStore::new();
        let genesis = store.genesis();

        let selfish_index = self
            .selfish
            .map(|params| (self.miners as f64 * params.power) as usize);

        let mut peers: Vec<Box<dyn Peer>> =
            Vec::with_capacity(self.miners + 1);
        let mut total_power: PowerValue = 0;
        for index in 0..self.miners {
            let power = scaled_power(self.power_scaling, index);
            total_power += power;

            if selfish_index == Some(index) {
                let delay =
                    self.selfish.expect("index implies params").delay;
                peers.push(Box::new(SelfishPeer::new(
                    MinerId::Selfish(0),
                    power,
                    genesis,
                    delay,
                )));
            } else {
                peers.push(Box::new(HonestPeer::new(
                    MinerId::Honest(index as u32),
                    power,
                    genesis,
                )));
            }
        }

        let observer = peers.len();
        peers.push(Box::new(HonestPeer::new(MinerId::Observer, 0, genesis)));

        // Random mutual topology; duplicates and self-links are allowed
        // and raise effective fan-out variance. The observer hangs off
        // every peer one-way.
        for index in 0..observer {
            for _ in 0..NEIGHBOR_FANOUT {
                let neighbor = rng.gen_range(0..observer);
                peers[index].add_neighbor(neighbor);
                peers[neighbor].add_neighbor(index);
            }
            peers[index].add_neighbor(observer);
        }

        let ticks = self.time / TICK_LENGTH;
        let mut now = 0u64;
        for _ in 0..ticks {
            now += TICK_LENGTH;

            for index in 0..observer {
                peers[index].tick_mine(
                    &mut store,
                    &mut rng,
                    total_power,
                    now,
                    self.policy,
                );
            }

            for index in 0..observer {
                let outgoing = peers[index].tick_communicate();
                if outgoing.is_empty() {
                    continue;
                }
                let targets = peers[index].neighbors().to_vec();
                for &block in &outgoing {
                    for &target in &targets {
                        peers[target].send_block(&store, block);
                    }
                }
            }

            for index in 0..observer {
                peers[index].tick_receive(&store);
            }
            peers[observer].tick_receive(&store);
        }

        (store, peers, observer)
    }
}

#[cfg(test)]
mod tests {
    use super::Simulation;
    use crate::peer::MinerId;

    fn uniform(miners: usize, time: u64) -> Simulation {
        Simulation::builder()
            .runs(1)
            .time(time)
            .miners(miners)
            .build()
            .expect("valid simulation")
    }

    #[test]
    fn trivial_single_miner_run() {
        let sim = Simulation::builder()
            .runs(1)
            .time(100)
            .miners(1)
            .max_uncles(0)
            .build()
            .unwrap();

        let output = sim.run(0);

        assert_eq!(output.peers.len(), 1);
        assert_eq!(output.peers[0].id, MinerId::Honest(0));
        assert_eq!(output.peers[0].power, 1);
        // One tick, one trial: at most one block exists anywhere.
        assert!(output.canonical_depth <= 1);
        let gains = output.ledger.get(MinerId::Honest(0));
        assert_eq!(gains.main_blocks as usize, output.canonical_depth);
        assert_eq!(gains.uncle_blocks, 0);
    }

    #[test]
    fn uniform_honest_production_near_expectation() {
        // 100 ticks at BLOCK_CHANCE 0.2: about 20 blocks end to end.
        let output = uniform(10, 10_000).run(0);

        let produced: u64 = output
            .peers
            .iter()
            .map(|peer| output.ledger.get(peer.id).main_blocks)
            .sum();

        assert_eq!(produced as usize, output.canonical_depth);
        assert!(
            (5..=40).contains(&produced),
            "canonical production {} far from expectation",
            produced
        );
        assert!(output.blocks_seen >= output.canonical_depth);
    }

    #[test]
    fn runs_are_deterministic() {
        let sim = uniform(10, 20_000);
        let first = sim.run(0);
        let second = sim.run(0);

        assert_eq!(first.canonical_depth, second.canonical_depth);
        assert_eq!(first.blocks_seen, second.blocks_seen);
        for peer in &first.peers {
            assert_eq!(
                first.ledger.get(peer.id),
                second.ledger.get(peer.id)
            );
        }
    }

    #[test]
    fn observer_chain_holds_structural_invariants() {
        let sim = uniform(2, 100_000);
        let (store, peers, observer) = sim.execute(0);

        for peer in &peers {
            let chain = peer.chain();
            for (depth, &block) in chain.iter().enumerate() {
                assert_eq!(store[block].depth, depth);
                if depth > 0 {
                    let parent = store[block]
                        .parent
                        .expect("non-genesis block has a parent");
                    assert_eq!(
                        store[parent].key(),
                        store[chain[depth - 1]].key()
                    );
                }
            }
            for key in peer.pending_uncles().keys() {
                assert!(chain
                    .iter()
                    .all(|&resident| store[resident].key() != *key));
            }
        }

        // Forks happened: the observer saw more blocks than the chain
        // kept.
        let canonical = peers[observer].chain().len() - 1;
        assert!(peers[observer].seen_blocks() >= canonical);
    }

    #[test]
    fn production_ranks_with_mining_power() {
        let sim = Simulation::builder()
            .runs(1)
            .time(400_000)
            .miners(5)
            .power_scaling(1.5)
            .build()
            .unwrap();

        let output = sim.run(0);
        let strongest = output.ledger.get(MinerId::Honest(4)).main_blocks;
        let weakest = output.ledger.get(MinerId::Honest(0)).main_blocks;

        // Power 5 vs power 1 over thousands of trials.
        assert!(
            strongest > weakest,
            "strongest {} <= weakest {}",
            strongest,
            weakest
        );
    }

    #[test]
    fn selfish_peer_takes_the_configured_slot() {
        let sim = Simulation::builder()
            .runs(1)
            .time(10_000)
            .miners(10)
            .selfish(10, 0.9)
            .build()
            .unwrap();

        let output = sim.run(0);

        assert_eq!(output.peers.len(), 10);
        assert_eq!(output.peers[9].id, MinerId::Selfish(0));
        assert!(output
            .peers
            .iter()
            .all(|peer| peer.id != MinerId::Honest(9)));
    }

    #[test]
    fn run_all_preserves_run_order() {
        let sim = Simulation::builder()
            .runs(3)
            .time(1_000)
            .miners(3)
            .build()
            .unwrap();

        let outputs = sim.run_all();
        let indices: Vec<_> =
            outputs.iter().map(|output| output.run).collect();

        assert_eq!(indices, vec![0, 1, 2]);
    }
}
