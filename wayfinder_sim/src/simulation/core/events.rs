// wayfinder_sim/src/simulation/core/events.rs
use bevy::prelude::Event;
// Import the pure event enum from the core library
use wayfinder_core::messages::EngineEvent;

// Bevy-side wrapper so engine events can flow through `EventWriter`/`EventReader`.
#[derive(Event, Clone, Debug)]
pub struct BevyEngineEvent(pub EngineEvent);
