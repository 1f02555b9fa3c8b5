//! Validation and construction of [`Simulation`] instances.

use crate::config::SimConfig;
use crate::peer::UnclePolicy;
use crate::rewards::RewardParams;

use super::{SelfishParams, Simulation};

/// Builds a [`Simulation`].
#[derive(Debug, Clone)]
pub struct SimulationBuilder {
    runs: usize,
    time: u64,
    miners: usize,
    max_uncles: usize,
    power_scaling: f64,
    max_depth: usize,
    uncle_divisor: f64,
    nephew_reward: f64,
    selfish_miners: usize,
    selfish_delay: usize,
    selfish_power: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationBuildError {
    #[error("number of runs must be greater than 0")]
    ZeroRuns,
    #[error("simulated time must be greater than 0")]
    ZeroTime,
    #[error("no miners were configured")]
    ZeroMiners,
    #[error("power scaling {0} is not a finite value >= 1.0")]
    BadPowerScaling(f64),
    #[error("max uncle depth must be greater than 0")]
    ZeroMaxDepth,
    #[error("uncle divisor {0} is not a finite positive value")]
    BadUncleDivisor(f64),
    #[error("nephew reward {0} is not a finite non-negative value")]
    BadNephewReward(f64),
    #[error("at most one selfish miner is supported, got {0}")]
    TooManySelfishMiners(usize),
    #[error("selfish publication delay must be at least 1 tick")]
    ZeroSelfishDelay,
    #[error("selfish power {0} must lie strictly between 0 and 1")]
    BadSelfishPower(f64),
}

impl SimulationBuilder {
    /// Creates a builder with a small uniform honest network.
    pub fn new() -> Self {
        SimulationBuilder {
            runs: 1,
            time: 10_000,
            miners: 10,
            max_uncles: 2,
            power_scaling: 1.0,
            max_depth: 7,
            uncle_divisor: 1.0,
            nephew_reward: 1.0 / 32.0,
            selfish_miners: 0,
            selfish_delay: 0,
            selfish_power: 0.0,
        }
    }

    /// Copies every knob from a loaded configuration file.
    pub fn from_config(config: &SimConfig) -> Self {
        SimulationBuilder {
            runs: config.runs,
            time: config.time,
            miners: config.miners,
            max_uncles: config.max_uncles,
            power_scaling: config.power_scaling,
            max_depth: config.max_depth,
            uncle_divisor: config.uncle_divisor,
            nephew_reward: config.nephew_reward,
            selfish_miners: config.selfish_miners,
            selfish_delay: config.selfish_delay,
            selfish_power: config.selfish_power,
        }
    }

    pub fn runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn time(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    pub fn miners(mut self, miners: usize) -> Self {
        self.miners = miners;
        self
    }

    pub fn max_uncles(mut self, max_uncles: usize) -> Self {
        self.max_uncles = max_uncles;
        self
    }

    pub fn power_scaling(mut self, scaling: f64) -> Self {
        self.power_scaling = scaling;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn uncle_divisor(mut self, divisor: f64) -> Self {
        self.uncle_divisor = divisor;
        self
    }

    pub fn nephew_reward(mut self, reward: f64) -> Self {
        self.nephew_reward = reward;
        self
    }

    /// Replaces one honest peer with a selfish one holding its blocks
    /// for `delay` ticks, positioned at `floor(miners * power)`.
    pub fn selfish(mut self, delay: usize, power: f64) -> Self {
        self.selfish_miners = 1;
        self.selfish_delay = delay;
        self.selfish_power = power;
        self
    }

    /// Validates the configuration and produces a [`Simulation`].
    pub fn build(self) -> Result<Simulation, SimulationBuildError> {
        use SimulationBuildError::*;

        if self.runs == 0 {
            return Err(ZeroRuns);
        }
        if self.time == 0 {
            return Err(ZeroTime);
        }
        if self.miners == 0 {
            return Err(ZeroMiners);
        }
        if !self.power_scaling.is_finite() || self.power_scaling < 1.0 {
            return Err(BadPowerScaling(self.power_scaling));
        }
        if self.max_depth == 0 {
            return Err(ZeroMaxDepth);
        }
        if !self.uncle_divisor.is_finite() || self.uncle_divisor <= 0.0 {
            return Err(BadUncleDivisor(self.uncle_divisor));
        }
        if !self.nephew_reward.is_finite() || self.nephew_reward < 0.0 {
            return Err(BadNephewReward(self.nephew_reward));
        }

        let selfish = match self.selfish_miners {
            0 => None,
            1 => {
                if self.selfish_delay == 0 {
                    return Err(ZeroSelfishDelay);
                }
                if !self.selfish_power.is_finite()
                    || self.selfish_power <= 0.0
                    || self.selfish_power >= 1.0
                {
                    return Err(BadSelfishPower(self.selfish_power));
                }
                Some(SelfishParams {
                    delay: self.selfish_delay,
                    power: self.selfish_power,
                })
            }
            n => return Err(TooManySelfishMiners(n)),
        };

        Ok(Simulation {
            runs: self.runs,
            time: self.time,
            miners: self.miners,
            power_scaling: self.power_scaling,
            policy: UnclePolicy {
                max_uncles: self.max_uncles,
                max_depth: self.max_depth,
            },
            rewards: RewardParams {
                max_depth: self.max_depth,
                uncle_divisor: self.uncle_divisor,
                nephew_reward: self.nephew_reward,
            },
            selfish,
        })
    }
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{SimulationBuildError, SimulationBuilder};
    use crate::config::SimConfig;

    #[test]
    fn default_build_succeeds() {
        SimulationBuilder::new().build().expect("valid default build");
    }

    #[test]
    fn zeroed_config_is_rejected() {
        let config = SimConfig::default();
        let err = SimulationBuilder::from_config(&config).build();

        assert!(matches!(err, Err(SimulationBuildError::ZeroRuns)));
    }

    #[test]
    fn selfish_knobs_are_validated() {
        let err = SimulationBuilder::new().selfish(0, 0.5).build();
        assert!(matches!(err, Err(SimulationBuildError::ZeroSelfishDelay)));

        let err = SimulationBuilder::new().selfish(10, 1.0).build();
        assert!(matches!(
            err,
            Err(SimulationBuildError::BadSelfishPower(_))
        ));

        SimulationBuilder::new()
            .selfish(10, 0.9)
            .build()
            .expect("valid selfish build");
    }

    #[test]
    fn power_scaling_below_one_is_rejected() {
        let err = SimulationBuilder::new().power_scaling(0.5).build();
        assert!(matches!(
            err,
            Err(SimulationBuildError::BadPowerScaling(_))
        ));
    }
}
