//! Loading simulation configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default directory that config file names resolve against.
pub const CONFIG_DIR: &str = "config";

/// One simulation configuration, as stored in the JSON sweep files.
///
/// Field names serialize in PascalCase (`Runs`, `PowerScaling`, ...).
/// Missing fields default to zero values; the simulation builder
/// rejects configurations that make no sense.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SimConfig {
    /// Independent runs, seeded `SEED_BASE + i`.
    pub runs: usize,
    /// Total simulated time units; `Time / TICK_LENGTH` ticks.
    pub time: u64,
    /// Honest-peer count.
    pub miners: usize,
    /// Per-block uncle inclusion limit.
    pub max_uncles: usize,
    /// Peer `i` mines with power `floor(PowerScaling^i)`.
    pub power_scaling: f64,
    /// Maximum uncle distance, and the reward-decay denominator.
    pub max_depth: usize,
    /// Static divisor applied to uncle rewards.
    pub uncle_divisor: f64,
    /// Fraction of a block reward granted per included uncle.
    pub nephew_reward: f64,
    /// Zero or one.
    pub selfish_miners: usize,
    /// Ring length of the selfish publication buffer.
    pub selfish_delay: usize,
    /// The peer at index `floor(Miners * SelfishPower)` turns selfish.
    pub selfish_power: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SimConfig {
    /// Loads a configuration from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| {
            ConfigError::Read { path: path.to_path_buf(), source }
        })?;

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `name` from the config directory `dir`.
    pub fn load_named(dir: &Path, name: &str) -> Result<Self, ConfigError> {
        Self::load(&dir.join(name))
    }
}
