//! Fixed protocol constants shared by every simulation run.

/// Simulated time units per tick. Every mining trial, broadcast, and
/// delivery happens on this quantum.
pub const TICK_LENGTH: u64 = 100;

/// Network-wide probability that some block is produced in a tick.
pub const BLOCK_CHANCE: f64 = 0.2;

/// Fee income accrued per simulated time unit since the parent block.
pub const FEES_PER_SECOND: u64 = 1;

/// Base reward per canonical block: `TICK_LENGTH / BLOCK_CHANCE * 10`,
/// sized so block rewards dominate fees by roughly 10x in expectation.
pub const BLOCK_REWARD: f64 = 5000.0;

/// Random mutual neighbors generated per peer.
pub const NEIGHBOR_FANOUT: usize = 5;

/// Run `i` draws from a stream seeded with `SEED_BASE + i`.
pub const SEED_BASE: u64 = 1230;
