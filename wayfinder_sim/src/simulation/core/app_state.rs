// wayfinder_sim/src/simulation/core/app_state.rs

use bevy::ecs::schedule::SystemSet;

// =========================================================================
// == Per-Frame Sets (The "Data Flow Graph") ==
// =========================================================================

/// Ordering of one simulated render-loop frame, run on `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Host callbacks replayed from the scenario: calibration, session lifecycle,
    /// orientation samples and controller selects.
    Input,
    /// The engine's own frame tick (animations, placement and reveal timers).
    Engine,
    /// Load requests issued this frame are queued; loads that finished are delivered.
    Assets,
    /// Engine events are drained, redeemed and mirrored into the Bevy world.
    Presentation,
}
