// wayfinder_sim/src/prelude.rs

// Re-export the entire Bevy prelude for convenience.
pub use bevy::prelude::*;

// Re-export the entire wayfinder_core prelude so the engine, its messages and
// its collaborator traits are in scope.
pub use wayfinder_core::prelude::*;

// Re-export common simulation-specific types for easy access in other plugins.
pub use crate::simulation::config::structs::*;
pub use crate::simulation::core::app_state::SimulationSet;
pub use crate::simulation::core::events::BevyEngineEvent;
pub use crate::simulation::core::resources::{EngineResource, FrameBudget, RewardStore};
