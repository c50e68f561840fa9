// wayfinder_sim/src/simulation/plugins/interaction.rs

use crate::prelude::*;
use crate::simulation::core::app_state::SimulationSet;
use crate::simulation::core::resources::{
    now_ms, EngineResource, RewardStore, ScriptCursor, SimulationRng,
};
use crate::simulation::core::transforms::pose_looking_along;
use crate::simulation::plugins::session::session_script_system;

pub struct PointerScriptPlugin;

impl Plugin for PointerScriptPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            // Selects see the markers as they were at the end of the previous frame.
            pointer_script_system
                .in_set(SimulationSet::Input)
                .after(session_script_system),
        );
    }
}

/// Replays controller selects. Each one becomes a pose and goes through the
/// engine's pick, count and reward path.
fn pointer_script_system(
    time: Res<Time>,
    config: Res<ScenarioConfig>,
    store: Res<RewardStore>,
    mut cursor: ResMut<ScriptCursor>,
    mut engine: ResMut<EngineResource>,
    mut rng: ResMut<SimulationRng>,
) {
    let now = now_ms(&time);
    while let Some(event) = config.pointer.get(cursor.pointer) {
        if event.at_ms > now {
            break;
        }
        cursor.pointer += 1;

        let Some(pose) = pose_looking_along(event.origin, event.direction) else {
            warn!("[POINTER] Ignoring select with zero direction at t={:.0}ms", event.at_ms);
            continue;
        };
        match engine.0.select(&pose, &store.0, &mut rng.0) {
            InteractionOutcome::Ignored => debug!("[POINTER] Select outside a live session"),
            InteractionOutcome::Missed => debug!("[POINTER] Select hit nothing"),
            InteractionOutcome::Counted { entity, count } => {
                info!("[POINTER] {:?} touched ({} so far)", entity, count)
            }
            InteractionOutcome::ThresholdReached { entity, selection } => match selection {
                Ok(prize) => info!(
                    "[POINTER] {:?} reached the threshold; '{}' will be revealed",
                    entity, prize.name
                ),
                Err(reason) => info!(
                    "[POINTER] {:?} reached the threshold without a prize: {:?}",
                    entity, reason
                ),
            },
        }
    }
}
