//! Reducing multi-run CSV output to per-miner means.
//!
//! Consumes the per-run tables emitted by [`RunTable`]
//! (crate::results::RunTable) and produces one canonical table of 101
//! rows: `m0..m99` followed by `s0`, with miners absent from the input
//! written as integer zeros.

use std::collections::HashMap;
use std::fmt::Write;

/// Canonical honest-miner rows emitted regardless of input (`m0..m99`).
pub const CANONICAL_MINERS: usize = 100;

/// Incrementally averaged results of a single miner across runs.
///
/// Mining power is kept from the first occurrence; the remaining fields
/// converge on the arithmetic mean of all observed rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct MinerAverages {
    pub power: f64,
    pub reward: f64,
    pub main_blocks: f64,
    pub uncle_blocks: f64,
    count: f64,
}

impl MinerAverages {
    /// Folds one CSV row into the running means.
    pub fn observe(
        &mut self,
        power: f64,
        reward: f64,
        main_blocks: f64,
        uncle_blocks: f64,
    ) {
        if self.count == 0.0 {
            self.power = power;
            self.reward = reward;
            self.main_blocks = main_blocks;
            self.uncle_blocks = uncle_blocks;
        } else {
            let count = self.count;
            let next = count + 1.0;
            self.reward = self.reward * count / next + reward / next;
            self.main_blocks =
                self.main_blocks * count / next + main_blocks / next;
            self.uncle_blocks =
                self.uncle_blocks * count / next + uncle_blocks / next;
        }

        self.count += 1.0;
    }
}

/// Folds the rows of one CSV file into `miners`, keyed by minerID.
/// Header lines and short rows are skipped; unparseable fields count as
/// zero.
pub fn accumulate(content: &str, miners: &mut HashMap<String, MinerAverages>) {
    for line in content.lines() {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 5 || fields[0] == "minerID" {
            continue;
        }

        let value =
            |field: &str| field.trim().parse::<f64>().unwrap_or_default();

        miners.entry(fields[0].to_string()).or_default().observe(
            value(fields[1]),
            value(fields[2]),
            value(fields[3]),
            value(fields[4]),
        );
    }
}

/// Renders the canonical 101-row table: `m0..m99` then `s0`. Absent
/// miners are written as integer zeros, present ones as floats.
pub fn render_canonical(miners: &HashMap<String, MinerAverages>) -> String {
    let ids = (0..CANONICAL_MINERS)
        .map(|index| format!("m{}", index))
        .chain(std::iter::once("s0".to_string()));

    let mut out = String::new();
    for id in ids {
        match miners.get(&id) {
            Some(avg) => writeln!(
                out,
                "{},{:.6},{:.6},{:.6},{:.6}",
                id, avg.power, avg.reward, avg.main_blocks, avg.uncle_blocks
            ),
            None => writeln!(out, "{},0,0,0,0", id),
        }
        .expect("writing to a String cannot fail");
    }

    out
}
