// wayfinder_sim/examples/01_scripted_visit.rs

//! Replays a scripted visit end to end, headless.
//!
//! This example demonstrates how to:
//! 1. Load a scenario from a TOML file (with `WAYFINDER_` environment overrides).
//! 2. Run Bevy without a window, one fixed step per simulated render frame.
//! 3. Add the `WayfinderSimulationPlugin`, which drives the engine from the script.
//!
//! To run this example:
//! `cargo run --example 01_scripted_visit -- --scenario assets/scenarios/expo_visit.toml`

use std::time::Duration;

// --- Bevy Imports ---
use bevy::{app::ScheduleRunnerPlugin, log::LogPlugin, prelude::*, time::TimeUpdateStrategy};
use clap::Parser;

// --- Project-Specific Imports ---
use wayfinder_sim::cli::Cli;
use wayfinder_sim::prelude::FrameBudget;
use wayfinder_sim::simulation::config::load_scenario;
use wayfinder_sim::WayfinderSimulationPlugin;

fn main() {
    let cli = Cli::parse();

    // --- 1. Load Scenario Configuration ---
    let mut config = load_scenario(&cli.scenario).unwrap_or_else(|err| {
        panic!(
            "Failed to load scenario '{}': {}",
            cli.scenario.display(),
            err
        );
    });
    if let Some(seed) = cli.seed {
        config.simulation.seed = Some(seed);
    }
    let frame_period = Duration::from_secs_f64(1.0 / config.simulation.frame_rate_hz.max(1.0));

    let mut app = App::new();

    // --- 2. Add Core Bevy Plugins & Resources ---
    app.add_plugins((
        // No window: the runner loops as fast as it can and virtual time advances
        // by exactly one frame per update.
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)),
        LogPlugin {
            level: bevy::log::Level::INFO,
            filter: "info,wayfinder_sim=debug,wayfinder_core=debug".to_string(),
            ..default()
        },
    ))
    .insert_resource(TimeUpdateStrategy::ManualDuration(frame_period))
    // Insert the loaded configuration as a Bevy resource so all systems can access it.
    .insert_resource(config)
    .insert_resource(FrameBudget(cli.frames))
    .insert_resource(cli);

    // --- 3. Add the Main Wayfinder Simulation Plugin ---
    app.add_plugins(WayfinderSimulationPlugin);

    // --- 4. Run the App ---
    println!("Starting Wayfinder scenario...");
    app.run();
}
