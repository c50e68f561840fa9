// wayfinder_sim/src/simulation/config/mod.rs

//! Loading of scenario files. A scenario is a TOML file layered with
//! `WAYFINDER_`-prefixed environment overrides.

pub mod structs;

use bevy::prelude::*;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

pub use structs::ScenarioConfig;

/// Reads `path` and applies environment overrides such as
/// `WAYFINDER_SIMULATION__SEED=7` or `WAYFINDER_ENGINE__INTERACTION__THRESHOLD=5`.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, figment::Error> {
    info!("Loading scenario from: {:?}", path);
    let mut scenario: ScenarioConfig = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("WAYFINDER_").split("__"))
        .extract()?;
    scenario.sort_tracks();
    Ok(scenario)
}

/// Parses a scenario held in memory, without environment overrides.
pub fn parse_scenario(toml: &str) -> Result<ScenarioConfig, figment::Error> {
    let mut scenario: ScenarioConfig = Figment::new().merge(Toml::string(toml)).extract()?;
    scenario.sort_tracks();
    Ok(scenario)
}
