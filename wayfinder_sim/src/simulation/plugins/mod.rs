// wayfinder_sim/src/simulation/plugins/mod.rs

pub mod assets;
pub mod compass;
pub mod interaction;
pub mod presentation;
pub mod session;
