/*!
Re-export of common values and datatypes used for running and analyzing
simulations. Must be imported manually.

```
use uncle_sim::prelude::*;
```
*/

use crate::{
    averaging, block, config, peer, power_dist, results, rewards,
    simulation, store,
};

pub use averaging::{accumulate, render_canonical, MinerAverages};

pub use block::{Block, BlockKey, BlockRef};

pub use config::{ConfigError, SimConfig, CONFIG_DIR};

pub use peer::{
    HonestPeer, MinerId, Peer, PeerIdx, SelfishPeer, UnclePolicy,
};

pub use power_dist::{scaled_power, total_power, PowerValue};

pub use results::{RunTable, CSV_HEADER};

pub use rewards::{Gains, RewardLedger, RewardParams};

pub use simulation::{
    PeerStats, RunOutput, SelfishParams, Simulation, SimulationBuildError,
    SimulationBuilder,
};

pub use store::BlockStore;
