//! Write the uncle-option configuration sweep as JSON config files:
//! the MaxDepth grid at unit uncle divisor, the divisor grid with the
//! depth cap disabled, each crossed with the selfish delay/power grid.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use uncle_sim::config::{SimConfig, CONFIG_DIR};

const RUNS: usize = 20;
const TIME: u64 = 100_000_000;
const MINERS: usize = 100;
const MAX_UNCLES: &[usize] = &[2];
const POWER_SCALING: &[f64] = &[1.2];
const MAX_DEPTH: &[usize] = &[7, 3, 15];
const UNCLE_DIVISOR: &[f64] = &[1.0, 2.0];
const NEPHEW_REWARD: f64 = 1.0 / 32.0;
const SELFISH_MINERS: &[usize] = &[0, 1];
const SELFISH_DELAY: &[usize] = &[10, 30];
const SELFISH_POWER: &[f64] = &[0.1, 0.9];

/// Effectively disables the uncle depth cap for the divisor sweep.
const NO_DEPTH_CAP: usize = 10_000_000_000_000;

#[derive(Parser, Debug)]
#[command(name = "sweep", version)]
#[command(about = "Generate the configuration-sweep matrix")]
struct Cli {
    /// Directory the config files are written into
    #[arg(long, default_value = CONFIG_DIR)]
    out_dir: PathBuf,
}

fn write_config(
    dir: &Path,
    name: &str,
    config: &SimConfig,
) -> anyhow::Result<()> {
    let path = dir.join(format!("config_{}.json", name));
    let json = serde_json::to_string(config)?;
    fs::write(&path, json)
        .with_context(|| format!("cannot write {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    fs::create_dir_all(&cli.out_dir).with_context(|| {
        format!("cannot create {}", cli.out_dir.display())
    })?;

    let base = SimConfig {
        runs: RUNS,
        time: TIME,
        miners: MINERS,
        nephew_reward: NEPHEW_REWARD,
        ..Default::default()
    };

    let mut written = 0usize;
    for &max_uncles in MAX_UNCLES {
        for &power_scaling in POWER_SCALING {
            for &uncle_divisor in UNCLE_DIVISOR {
                // The depth cap is only swept at unit divisor; the
                // divisor sweep runs with the cap disabled.
                let depths: &[usize] = if uncle_divisor == 1.0 {
                    MAX_DEPTH
                } else {
                    &[NO_DEPTH_CAP]
                };

                for &max_depth in depths {
                    for &selfish_miners in SELFISH_MINERS {
                        let config = SimConfig {
                            max_uncles,
                            power_scaling,
                            uncle_divisor,
                            max_depth,
                            selfish_miners,
                            ..base.clone()
                        };

                        if selfish_miners == 0 {
                            let name = if uncle_divisor == 1.0 {
                                format!(
                                    "uncles_{}_scaling_{:.6}_maxdepth_{}_selfish_0",
                                    max_uncles, power_scaling, max_depth
                                )
                            } else {
                                format!(
                                    "uncles_{}_scaling_{:.6}_unclediv_{:.6}_selfish_0",
                                    max_uncles, power_scaling, uncle_divisor
                                )
                            };
                            write_config(&cli.out_dir, &name, &config)?;
                            written += 1;
                            continue;
                        }

                        for &selfish_delay in SELFISH_DELAY {
                            for &selfish_power in SELFISH_POWER {
                                let config = SimConfig {
                                    selfish_delay,
                                    selfish_power,
                                    ..config.clone()
                                };
                                let name = if uncle_divisor == 1.0 {
                                    format!(
                                        "uncles_{}_scaling_{:.6}_maxdepth_{}_selfish_1_sdelay_{}_spower_{:.6}",
                                        max_uncles,
                                        power_scaling,
                                        max_depth,
                                        selfish_delay,
                                        selfish_power
                                    )
                                } else {
                                    format!(
                                        "uncles_{}_scaling_{:.6}_uncledivisor_{:.6}_selfish_1_sdelay_{}_spower_{:.6}",
                                        max_uncles,
                                        power_scaling,
                                        uncle_divisor,
                                        selfish_delay,
                                        selfish_power
                                    )
                                };
                                write_config(&cli.out_dir, &name, &config)?;
                                written += 1;
                            }
                        }
                    }
                }
            }
        }
    }

    info!(files = written, dir = %cli.out_dir.display(), "sweep written");
    Ok(())
}
