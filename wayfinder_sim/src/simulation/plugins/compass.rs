// wayfinder_sim/src/simulation/plugins/compass.rs

use rand_distr::{Distribution, Normal};

use wayfinder_core::compass::cardinal_direction;

use crate::prelude::*;
use crate::simulation::core::app_state::SimulationSet;
use crate::simulation::core::resources::{now_ms, EngineResource, ScriptCursor, SimulationRng};

// =========================================================================
// == Orientation Sensor Plugin ==
// =========================================================================

/// Gaussian noise added to each raw heading. `None` when the scenario asks for
/// a perfect sensor.
#[derive(Resource, Debug, Clone, Default)]
pub struct HeadingNoise(pub Option<Normal<f64>>);

pub struct CompassSensorPlugin;

impl Plugin for CompassSensorPlugin {
    fn build(&self, app: &mut App) {
        let std_dev = app
            .world()
            .get_resource::<ScenarioConfig>()
            .map(|c| c.sensor.noise_std_deg)
            .unwrap_or_default();
        let noise = if std_dev > 0.0 {
            match Normal::new(0.0, std_dev) {
                Ok(dist) => Some(dist),
                Err(err) => {
                    warn!("Invalid heading noise {}: {}", std_dev, err);
                    None
                }
            }
        } else {
            None
        };

        app.insert_resource(HeadingNoise(noise))
            .add_systems(Startup, setup_orientation_sensor)
            .add_systems(
                FixedUpdate,
                compass_sample_system.in_set(SimulationSet::Input),
            );
    }
}

/// Mirrors the host asking for the orientation API and, where needed, permission.
fn setup_orientation_sensor(config: Res<ScenarioConfig>, mut engine: ResMut<EngineResource>) {
    if !config.sensor.available {
        warn!("[COMPASS] No orientation API on this device");
        engine.0.compass_unavailable();
        return;
    }
    match engine.0.compass_permission(config.sensor.permission_granted) {
        Ok(()) => info!("[COMPASS] Orientation permission granted"),
        Err(err) => warn!("[COMPASS] {}", err),
    }
}

// =========================================================================
// == Runtime System ==
// =========================================================================

fn compass_sample_system(
    time: Res<Time>,
    config: Res<ScenarioConfig>,
    noise: Res<HeadingNoise>,
    mut cursor: ResMut<ScriptCursor>,
    mut engine: ResMut<EngineResource>,
    mut rng: ResMut<SimulationRng>,
) {
    let now = now_ms(&time);
    while let Some(sample) = config.compass.get(cursor.compass) {
        if sample.at_ms > now {
            break;
        }
        cursor.compass += 1;

        let raw = sample.heading_deg.map(|heading| match &noise.0 {
            Some(dist) => heading + dist.sample(&mut rng.0),
            None => heading,
        });
        match engine.0.compass_sample(raw) {
            Ok(Some(heading)) => {
                debug!(
                    "[COMPASS] Heading {:.1}° ({})",
                    heading,
                    cardinal_direction(heading)
                );
                log_bearings(&engine.0, &config);
            }
            Ok(None) => debug!("[COMPASS] Sample without a heading ignored"),
            Err(err) => debug!("[COMPASS] Sample dropped: {}", err),
        }
    }
}

fn log_bearings(engine: &WayfinderEngine, config: &ScenarioConfig) {
    for bearing in engine.bearings(&config.user.position()) {
        debug!(
            "[COMPASS]   '{}' {:.1} m, {} ({:.0}° off heading){}",
            bearing.point.name,
            bearing.distance_meters,
            bearing.relative_direction().label(),
            bearing.relative_bearing_degrees,
            if bearing.in_view() { ", in view" } else { "" }
        );
    }
}
