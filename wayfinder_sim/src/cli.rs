// wayfinder_sim/src/cli.rs

use bevy::prelude::Resource;
use clap::Parser;
use std::path::PathBuf;

/// Wayfinder: replays a scripted AR visit against the wayfinding engine.
///
/// This struct defines the command-line arguments accepted by any binary that
/// runs a Wayfinder scenario.
#[derive(Parser, Debug, Resource, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/expo_visit.toml")]
    pub scenario: PathBuf,

    /// Overrides the scenario's PRNG seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stops after this many frames instead of the scenario duration.
    #[arg(long)]
    pub frames: Option<u32>,
}
