// wayfinder_sim/src/simulation/core/simulation_setup.rs

use std::time::Duration;

use rand::rngs::OsRng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::prelude::*;
use crate::simulation::core::app_state::SimulationSet;
use crate::simulation::core::events::BevyEngineEvent;
use crate::simulation::core::resources::{
    now_ms, EngineResource, FrameBudget, RewardStore, ScriptCursor, SimulationRng,
};

pub struct SimulationSetupPlugin;

impl Plugin for SimulationSetupPlugin {
    fn build(&self, app: &mut App) {
        // This plugin's job is to read the config and add resources and startup systems.
        // Scenarios inserted without going through the loader still replay in time order.
        if let Some(mut config) = app.world_mut().get_resource_mut::<ScenarioConfig>() {
            config.sort_tracks();
        }
        let config = match app.world().get_resource::<ScenarioConfig>() {
            Some(config) => config.clone(),
            None => {
                warn!("No ScenarioConfig inserted; running the empty default scenario");
                ScenarioConfig::default()
            }
        };

        // --- 1. Add the Deterministic PRNG Resource ---
        let rng = match config.simulation.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(OsRng).unwrap_or_else(|err| {
                warn!("OS RNG failed ({}); falling back to seed 0", err);
                ChaCha8Rng::seed_from_u64(0)
            }),
        };
        app.insert_resource(SimulationRng(rng));

        // --- 2. Build the engine from the scenario data ---
        let mut engine = WayfinderEngine::new(config.engine.clone());
        engine.set_points(config.points.iter().cloned());
        match toml::to_string_pretty(engine.config()) {
            Ok(dump) => debug!("Effective engine config:\n{}", dump),
            Err(err) => warn!("Could not render engine config: {}", err),
        }

        // --- INITIALIZE RESOURCES & EVENTS ---
        app.insert_resource(EngineResource(engine))
            // Stand-in for the prize backend. Redemptions write back into it.
            .insert_resource(RewardStore(CatalogSnapshot {
                visitor: config.visitor.clone(),
                prizes: config.prizes.clone(),
            }))
            .init_resource::<ScriptCursor>()
            .init_resource::<FrameBudget>()
            .add_event::<BevyEngineEvent>();

        // One fixed step per render-loop frame.
        let frame_rate = if config.simulation.frame_rate_hz > 0.0 {
            config.simulation.frame_rate_hz
        } else {
            warn!(
                "frame_rate_hz must be positive (got {}); using 60 Hz",
                config.simulation.frame_rate_hz
            );
            60.0
        };
        app.insert_resource(Time::<Fixed>::from_duration(Duration::from_secs_f64(
            1.0 / frame_rate,
        )));

        // Configure the runtime schedule graph.
        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Input,
                SimulationSet::Engine,
                SimulationSet::Assets,
                SimulationSet::Presentation,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            engine_frame_system.in_set(SimulationSet::Engine),
        );
    }
}

/// Hands the fixed-step clock to the engine as its render-loop timestamp.
fn engine_frame_system(mut engine: ResMut<EngineResource>, time: Res<Time>) {
    engine.0.frame(now_ms(&time));
}
