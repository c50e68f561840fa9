// wayfinder_sim/src/simulation/config/structs.rs

use bevy::prelude::Resource;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use wayfinder_core::config::EngineConfig;
use wayfinder_core::messages::{CalibrationResult, PointRecord, VisitorEligibility};
use wayfinder_core::reward::Prize;

// =========================================================================
// == Top-Level Scenario Resource ==
// =========================================================================

/// # ScenarioConfig
/// Everything a scripted visit needs: engine tuning, the data the external
/// collaborators would supply, and the timed host events to replay.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: SimulationSection,

    #[serde(default)]
    pub engine: EngineConfig,

    /// The code scan. Without it the visit never calibrates.
    #[serde(default)]
    pub calibration: Option<ScriptedCalibration>,

    #[serde(default)]
    pub points: Vec<PointRecord>,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub prizes: Vec<Prize>,

    #[serde(default)]
    pub visitor: Option<VisitorEligibility>,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub sensor: SensorConfig,

    /// The TOML has `[[compass]]`, one entry per orientation event.
    #[serde(default)]
    pub compass: Vec<HeadingSample>,

    #[serde(default)]
    pub pointer: Vec<PointerEvent>,

    #[serde(default)]
    pub session: Vec<SessionScriptEvent>,

    #[serde(default)]
    pub assets: AssetsConfig,
}

impl ScenarioConfig {
    /// Orders every timed track by `at_ms`, keeping file order for equal times.
    /// Replay walks each track with a single cursor.
    pub fn sort_tracks(&mut self) {
        self.compass.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
        self.pointer.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
        self.session.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
    }
}

// =========================================================================
// == Scenario Sections ==
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSection {
    /// Optional seed for the pseudo-random number generator for determinism.
    pub seed: Option<u64>,
    /// Render loop rate in Hz.
    pub frame_rate_hz: f64,
    pub duration_seconds: f64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            seed: None,
            frame_rate_hz: 60.0,
            duration_seconds: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedCalibration {
    pub at_ms: f64,
    pub reference_code: String,
}

impl ScriptedCalibration {
    pub fn to_result(&self, timestamp: f64) -> CalibrationResult {
        CalibrationResult {
            reference_code: self.reference_code.clone(),
            timestamp,
        }
    }
}

/// Which point to guide to. Omitting `point_id` selects every point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    pub point_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserConfig {
    /// Where the visitor stands, in calibration coordinates.
    pub position: [f64; 3],
}

impl UserConfig {
    pub fn position(&self) -> Vector3<f64> {
        Vector3::from(self.position)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    /// Whether the device exposes an orientation API at all.
    pub available: bool,
    pub permission_granted: bool,
    /// Standard deviation of the Gaussian noise added to every raw heading.
    pub noise_std_deg: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            available: true,
            permission_granted: true,
            noise_std_deg: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeadingSample {
    pub at_ms: f64,
    /// Missing values model events without an `alpha` reading.
    #[serde(default)]
    pub heading_deg: Option<f64>,
}

/// A controller select at `at_ms`, cast from `origin` along `direction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointerEvent {
    pub at_ms: f64,
    pub origin: [f64; 3],
    pub direction: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionAction {
    Start,
    End,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionScriptEvent {
    pub at_ms: f64,
    pub action: SessionAction,
    /// Zero of the new session's tracking space. Only read for `start`.
    #[serde(default)]
    pub origin: [f64; 3],
    /// Whether the session supplies a hit-test source. Only read for `start`.
    #[serde(default = "default_true")]
    pub hit_test: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Asset paths that fail to load, forcing the fallback marker.
    pub failing: Vec<String>,
    /// Time between a load request and its completion.
    pub load_latency_ms: f64,
    /// Half extents of the pin mesh in model units.
    pub pin_half_extents: [f64; 3],
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            failing: Vec::new(),
            load_latency_ms: 150.0,
            pin_half_extents: [1.0, 1.5, 1.0],
        }
    }
}

fn default_true() -> bool {
    true
}
