// wayfinder_sim/src/simulation/plugins/assets.rs

use nalgebra::Vector3;

use crate::prelude::*;
use crate::simulation::config::structs::AssetsConfig;
use crate::simulation::core::app_state::SimulationSet;
use crate::simulation::core::resources::{now_ms, EngineResource};

// =========================================================================
// == Asset Loader ==
// =========================================================================

/// Resolves marker model paths against the scenario's `[assets]` section.
/// Paths listed in `failing` behave like a missing file.
#[derive(Resource, Debug, Clone)]
pub struct ScenarioAssetLoader {
    failing: Vec<String>,
    pin_half_extents: Vector3<f64>,
}

impl ScenarioAssetLoader {
    pub fn new(config: &AssetsConfig) -> Self {
        Self {
            failing: config.failing.clone(),
            pin_half_extents: Vector3::from(config.pin_half_extents),
        }
    }
}

impl AssetLoader for ScenarioAssetLoader {
    fn load(&mut self, path: &str) -> Result<ModelAsset, AssetLoadError> {
        if self.failing.iter().any(|p| p == path) {
            return Err(AssetLoadError::Missing(path.to_string()));
        }
        Ok(ModelAsset {
            path: path.to_string(),
            parts: vec![MeshPart {
                name: "pin".into(),
                offset: Vector3::zeros(),
                half_extents: self.pin_half_extents,
            }],
        })
    }
}

/// Loads requested by the engine that have not completed yet.
#[derive(Resource, Debug, Default)]
pub struct InFlightLoads {
    pub latency_ms: f64,
    pending: Vec<(f64, LoadRequest)>,
}

impl InFlightLoads {
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// =========================================================================
// == Plugin ==
// =========================================================================

pub struct ScenarioAssetsPlugin;

impl Plugin for ScenarioAssetsPlugin {
    fn build(&self, app: &mut App) {
        let assets = app
            .world()
            .get_resource::<ScenarioConfig>()
            .map(|c| c.assets.clone())
            .unwrap_or_default();

        app.insert_resource(ScenarioAssetLoader::new(&assets))
            .insert_resource(InFlightLoads {
                latency_ms: assets.load_latency_ms.max(0.0),
                pending: Vec::new(),
            })
            .add_systems(
                FixedUpdate,
                (queue_load_requests_system, deliver_loads_system)
                    .chain()
                    .in_set(SimulationSet::Assets),
            );
    }
}

fn queue_load_requests_system(
    time: Res<Time>,
    mut engine: ResMut<EngineResource>,
    mut in_flight: ResMut<InFlightLoads>,
) {
    let due = now_ms(&time) + in_flight.latency_ms;
    for request in engine.0.take_load_requests() {
        debug!("[ASSETS] Loading '{}' for {:?}", request.path, request.ticket.entity);
        in_flight.pending.push((due, request));
    }
}

fn deliver_loads_system(
    time: Res<Time>,
    mut engine: ResMut<EngineResource>,
    mut loader: ResMut<ScenarioAssetLoader>,
    mut in_flight: ResMut<InFlightLoads>,
) {
    let now = now_ms(&time);
    let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut in_flight.pending)
        .into_iter()
        .partition(|(due, _)| *due <= now);
    in_flight.pending = waiting;

    for (_, request) in ready {
        let result = loader.load(&request.path);
        if let Err(err) = &result {
            warn!("[ASSETS] {}; the fallback marker will be used", err);
        }
        match engine.0.complete_load(request.ticket, result) {
            Some(marker) => debug!("[ASSETS] Marker {:?} rendered", marker),
            // The session that asked for it is gone.
            None => debug!("[ASSETS] Discarded load for {:?}", request.ticket.entity),
        }
    }
}
