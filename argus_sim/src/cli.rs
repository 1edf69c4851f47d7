// argus_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Argus: occupancy mapping from a simulated UAV camera survey.
///
/// Runs the observe -> infer -> plan -> act loop described by a scenario
/// file and writes per-step metrics to the run log.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "scenarios/default.toml")]
    pub scenario: PathBuf,

    /// Override the number of observation steps from the scenario file.
    #[arg(long)]
    pub steps: Option<usize>,

    /// Override the RNG seed from the scenario file.
    #[arg(long)]
    pub seed: Option<u64>,
}
