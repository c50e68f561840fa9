// wayfinder_sim/src/lib.rs

use bevy::prelude::*;

// Import the plugins defined within the simulation crate.
use crate::simulation::core::simulation_setup::SimulationSetupPlugin;
use crate::simulation::plugins::assets::ScenarioAssetsPlugin;
use crate::simulation::plugins::compass::CompassSensorPlugin;
use crate::simulation::plugins::interaction::PointerScriptPlugin;
use crate::simulation::plugins::presentation::PresentationPlugin;
use crate::simulation::plugins::session::SessionScriptPlugin;

// This prelude is for convenience for other files WITHIN the wayfinder_sim crate.
pub mod prelude;

pub mod cli;
pub mod simulation;

/// Drives a `WayfinderEngine` through a scripted visit inside a headless Bevy app.
/// Insert a `ScenarioConfig` before adding it.
pub struct WayfinderSimulationPlugin;

impl Plugin for WayfinderSimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            // Engine, resources, schedule.
            SimulationSetupPlugin,
            // Host callbacks replayed from the scenario.
            SessionScriptPlugin,
            CompassSensorPlugin,
            PointerScriptPlugin,
            ScenarioAssetsPlugin,
            // Engine outputs back into the host.
            PresentationPlugin,
        ));
    }
}
