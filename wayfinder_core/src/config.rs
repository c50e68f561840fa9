// wayfinder_core/src/config.rs

//! Tunable parameters for every engine component. Each section falls back to
//! its defaults when omitted from a scenario or host configuration.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::types::{Axis, Tint};

/// The root configuration handed to `WayfinderEngine::new`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub compass: CompassConfig,
    pub interaction: InteractionConfig,
    pub placement: PlacementConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompassConfig {
    /// Exponential smoothing factor applied to each raw heading sample.
    pub smoothing_factor: f64,
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractionConfig {
    /// Number of resolved interactions on one marker that triggers a reward draw.
    pub threshold: u32,
    /// Axis the flip animation spins around.
    pub flip_axis: Axis,
    /// Angle covered by one flip, in radians. One full turn by default.
    pub flip_angle: f64,
    pub flip_duration_ms: f64,
    /// Time to ramp from the original tint to white (or back) during the blink.
    pub blink_half_cycle_ms: f64,
    /// Number of ramps before the blink stops and restores the original tint.
    pub blink_flashes: u32,
    /// Delay between the threshold interaction and the "prize won" event.
    pub prize_reveal_delay_ms: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            flip_axis: Axis::Y,
            flip_angle: TAU,
            flip_duration_ms: 600.0,
            blink_half_cycle_ms: 200.0,
            blink_flashes: 4,
            prize_reveal_delay_ms: 700.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacementConfig {
    /// Frame time to wait after the session starts before markers are placed.
    pub delay_ms: f64,
    /// Asset requested as the primary marker representation.
    pub model_path: String,
    pub model_scale: f64,
    /// Vertical offset of the loaded model above its projected position.
    pub model_lift: f64,
    /// Edge length of the fallback cube. It is lifted by half this value.
    pub fallback_edge: f64,
    /// Vertical offset of the label above the marker.
    pub label_lift: f64,
    /// World-space height of a label. The width follows the text aspect.
    pub label_height: f64,
    pub label_font_size: f64,
    pub marker_tint: Tint,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000.0,
            model_path: "map_pointer_3d_icon.glb".to_string(),
            model_scale: 0.1,
            model_lift: 1.0,
            fallback_edge: 0.1,
            label_lift: 0.4,
            label_height: 0.15,
            label_font_size: 48.0,
            marker_tint: Tint::from_hsl(0.3, 0.8, 0.5),
        }
    }
}
