// wayfinder_sim/src/simulation/core/resources.rs

use bevy::prelude::{Resource, Time};
use rand_chacha::ChaCha8Rng;
use wayfinder_core::engine::WayfinderEngine;
use wayfinder_core::reward::CatalogSnapshot;

/// The engine instance this host drives.
#[derive(Resource, Debug)]
pub struct EngineResource(pub WayfinderEngine);

/// Seeded from the scenario; every reward draw and every bit of sensor noise
/// comes from here.
#[derive(Resource)]
pub struct SimulationRng(pub ChaCha8Rng);

/// Stand-in for the external prize store: the catalog snapshot and the visitor's
/// eligibility, updated when a prize is redeemed.
#[derive(Resource, Debug, Default, Clone)]
pub struct RewardStore(pub CatalogSnapshot);

/// Caps how many frames run before the app exits. `None` runs for the scenario duration.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct FrameBudget(pub Option<u32>);

/// How far each replayed scenario track has progressed.
#[derive(Resource, Debug, Default)]
pub struct ScriptCursor {
    pub calibrated: bool,
    pub session: usize,
    pub compass: usize,
    pub pointer: usize,
    pub frames: u32,
}

/// Host time in milliseconds, as handed to the engine's frame callback.
pub fn now_ms(time: &Time) -> f64 {
    time.elapsed_secs_f64() * 1000.0
}
