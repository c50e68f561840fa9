// wayfinder_core/src/lib.rs

pub mod animation;
pub mod compass;
pub mod config;
pub mod engine;
pub mod error;
pub mod frames;
pub mod interaction;
pub mod messages;
pub mod prelude;
pub mod reward;
pub mod scene;
pub mod session;
pub mod types;
pub mod utils;
