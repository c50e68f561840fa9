// wayfinder_sim/src/simulation/plugins/session.rs

//! Replays the calibration scan and the AR session lifecycle from the scenario.

use nalgebra::Vector3;

use crate::prelude::*;
use crate::simulation::config::structs::SessionAction;
use crate::simulation::core::app_state::SimulationSet;
use crate::simulation::core::resources::{now_ms, EngineResource, ScriptCursor};

pub struct SessionScriptPlugin;

impl Plugin for SessionScriptPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (calibration_script_system, session_script_system)
                .chain()
                .in_set(SimulationSet::Input),
        );
    }
}

/// Performs the code scan once its time comes, then applies the configured point
/// selection.
fn calibration_script_system(
    time: Res<Time>,
    config: Res<ScenarioConfig>,
    mut cursor: ResMut<ScriptCursor>,
    mut engine: ResMut<EngineResource>,
) {
    let now = now_ms(&time);
    let Some(calibration) = config.calibration.as_ref() else {
        return;
    };
    if cursor.calibrated || now < calibration.at_ms {
        return;
    }
    cursor.calibrated = true;

    if let Err(err) = engine.0.calibrate(&calibration.to_result(now)) {
        error!("[CALIBRATION] {}", err);
        return;
    }

    let selection = match config.selection.point_id {
        None => PointSelection::All,
        Some(id) => match engine.0.points().iter().find(|p| p.id == id) {
            Some(point) => PointSelection::Single(point.clone()),
            None => {
                warn!("[CALIBRATION] Point {} is not in the catalog; guiding to all points", id);
                PointSelection::All
            }
        },
    };
    engine.0.select_point(selection);
}

pub(crate) fn session_script_system(
    time: Res<Time>,
    config: Res<ScenarioConfig>,
    mut cursor: ResMut<ScriptCursor>,
    mut engine: ResMut<EngineResource>,
) {
    let now = now_ms(&time);
    while let Some(event) = config.session.get(cursor.session) {
        if event.at_ms > now {
            break;
        }
        cursor.session += 1;

        match event.action {
            SessionAction::Start => {
                let origin = Vector3::from(event.origin);
                match engine.0.start_session(origin) {
                    Ok(id) => {
                        info!("[SESSION] {:?} started at t={:.0}ms", id, now);
                        // Hit-test failures are reported through the engine's events.
                        if let Err(err) = engine.0.on_hit_test_source(event.hit_test) {
                            warn!("[SESSION] {}", err);
                        }
                    }
                    Err(err) => error!("[SESSION] Start refused: {}", err),
                }
            }
            SessionAction::End => match engine.0.end_session() {
                Some(id) => info!("[SESSION] {:?} ended at t={:.0}ms", id, now),
                None => debug!("[SESSION] End requested with no session running"),
            },
        }
    }
}
