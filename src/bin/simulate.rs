//! Run seeded uncle-reward mining simulations from a JSON config file
//! and emit one CSV results block per run on stdout.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use uncle_sim::config::{SimConfig, CONFIG_DIR};
use uncle_sim::results::RunTable;
use uncle_sim::simulation::SimulationBuilder;

#[derive(Parser, Debug)]
#[command(name = "simulate", version)]
#[command(about = "Simulate a proof-of-work network with uncle rewards")]
struct Cli {
    /// Config file name, resolved inside the config directory
    config: String,

    /// Directory holding simulation config files
    #[arg(long, default_value = CONFIG_DIR)]
    config_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = SimConfig::load_named(&cli.config_dir, &cli.config)?;
    info!(
        config = %cli.config,
        runs = config.runs,
        miners = config.miners,
        time = config.time,
        "loaded simulation config"
    );

    let simulation = SimulationBuilder::from_config(&config).build()?;
    let outputs = simulation.run_all();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for output in &outputs {
        info!(
            run = output.run,
            canonical_depth = output.canonical_depth,
            blocks_seen = output.blocks_seen,
            power_utilization = output.power_utilization(),
            "run complete"
        );

        if let Err(err) = write!(out, "{}", RunTable::new(output)) {
            warn!(%err, run = output.run, "failed to emit run results");
        }
    }

    Ok(())
}
