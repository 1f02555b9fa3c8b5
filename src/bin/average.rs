//! Reduce per-run `*.json.csv` result files to per-miner means, writing
//! an `output-<name>` table of 101 canonical rows next to each input.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use uncle_sim::averaging::{accumulate, render_canonical, MinerAverages};

#[derive(Parser, Debug)]
#[command(name = "average", version)]
#[command(about = "Average per-miner results across simulation run files")]
struct Cli {
    /// Directory scanned for *.json.csv run files
    #[arg(long, default_value = ".")]
    dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let entries = fs::read_dir(&cli.dir)
        .with_context(|| format!("cannot scan {}", cli.dir.display()))?;

    let mut reduced = 0usize;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".json.csv") || !entry.file_type()?.is_file() {
            continue;
        }

        let content = match fs::read_to_string(entry.path()) {
            Ok(content) => content,
            Err(err) => {
                warn!(file = %name, %err, "skipping unreadable run file");
                continue;
            }
        };

        let mut miners: HashMap<String, MinerAverages> = HashMap::new();
        accumulate(&content, &mut miners);

        let target = cli.dir.join(format!("output-{}", name));
        if let Err(err) = fs::write(&target, render_canonical(&miners)) {
            warn!(
                file = %target.display(),
                %err,
                "failed to write averaged results"
            );
            continue;
        }

        info!(file = %name, miners = miners.len(), "reduced run file");
        reduced += 1;
    }

    info!(files = reduced, "averaging complete");
    Ok(())
}
