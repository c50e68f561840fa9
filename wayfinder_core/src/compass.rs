// wayfinder_core/src/compass.rs

//! Heading smoothing and point bearings for the 2D compass view. Runs on sensor
//! events only and never touches the AR scene.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CompassConfig;
use crate::error::{Result, WayfinderError};
use crate::frames::SpatialPoint;
use crate::utils::angles::{normalize_degrees, shortest_delta_degrees};

const CARDINALS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Compass label for a heading: the nearest of the eight 45° cardinal points.
pub fn cardinal_direction(heading_degrees: f64) -> &'static str {
    let index = (normalize_degrees(heading_degrees) / 45.0).round() as usize % CARDINALS.len();
    CARDINALS[index]
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CompassReading {
    /// Always in `[0, 360)`.
    pub smoothed_heading_degrees: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorStatus {
    #[default]
    AwaitingPermission,
    Active,
    /// Sensor missing or permission refused. Terminal; never retried.
    Unavailable,
}

/// Coarse direction of a point relative to where the visitor faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativeDirection {
    Ahead,
    AheadRight,
    Right,
    BehindRight,
    Behind,
    BehindLeft,
    Left,
    AheadLeft,
}

impl RelativeDirection {
    /// Buckets are 45° wide and closed at their upper bound; `Ahead` wraps through zero.
    pub fn from_relative_bearing(degrees: f64) -> Self {
        let b = normalize_degrees(degrees);
        match b {
            b if b > 337.5 || b <= 22.5 => RelativeDirection::Ahead,
            b if b <= 67.5 => RelativeDirection::AheadRight,
            b if b <= 112.5 => RelativeDirection::Right,
            b if b <= 157.5 => RelativeDirection::BehindRight,
            b if b <= 202.5 => RelativeDirection::Behind,
            b if b <= 247.5 => RelativeDirection::BehindLeft,
            b if b <= 292.5 => RelativeDirection::Left,
            _ => RelativeDirection::AheadLeft,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RelativeDirection::Ahead => "Ahead",
            RelativeDirection::AheadRight => "Ahead-right",
            RelativeDirection::Right => "Right",
            RelativeDirection::BehindRight => "Behind-right",
            RelativeDirection::Behind => "Behind",
            RelativeDirection::BehindLeft => "Behind-left",
            RelativeDirection::Left => "Left",
            RelativeDirection::AheadLeft => "Ahead-left",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointBearing {
    pub point: SpatialPoint,
    pub absolute_bearing_degrees: f64,
    pub distance_meters: f64,
    pub relative_bearing_degrees: f64,
}

impl PointBearing {
    /// Within ±90° of the current heading.
    pub fn in_view(&self) -> bool {
        self.relative_bearing_degrees > 270.0 || self.relative_bearing_degrees < 90.0
    }

    pub fn relative_direction(&self) -> RelativeDirection {
        RelativeDirection::from_relative_bearing(self.relative_bearing_degrees)
    }
}

#[derive(Debug, Clone)]
pub struct CompassBearingEngine {
    smoothing_factor: f64,
    reading: CompassReading,
    status: SensorStatus,
}

impl Default for CompassBearingEngine {
    fn default() -> Self {
        Self::new(&CompassConfig::default())
    }
}

impl CompassBearingEngine {
    pub fn new(config: &CompassConfig) -> Self {
        Self {
            smoothing_factor: config.smoothing_factor.clamp(0.0, 1.0),
            reading: CompassReading::default(),
            status: SensorStatus::AwaitingPermission,
        }
    }

    /// Folds one raw heading into the smoothed value along the shortest arc, so a
    /// 359° -> 1° change moves through north rather than all the way round.
    pub fn update(&mut self, raw_heading_degrees: f64) -> f64 {
        let raw = normalize_degrees(raw_heading_degrees);
        let previous = self.reading.smoothed_heading_degrees;
        let delta = shortest_delta_degrees(previous, raw);
        self.reading.smoothed_heading_degrees =
            normalize_degrees(previous + delta * self.smoothing_factor);
        self.reading.smoothed_heading_degrees
    }

    /// Entry point for sensor events. Missing or non-finite samples are ignored.
    pub fn on_sample(&mut self, raw_heading_degrees: Option<f64>) -> Result<Option<f64>> {
        if self.status == SensorStatus::Unavailable {
            return Err(WayfinderError::SensorUnavailable);
        }
        let Some(raw) = raw_heading_degrees.filter(|h| h.is_finite()) else {
            return Ok(None);
        };
        // Platforms without a permission prompt just start delivering events.
        self.status = SensorStatus::Active;
        Ok(Some(self.update(raw)))
    }

    /// Outcome of the platform's orientation permission prompt.
    pub fn on_permission(&mut self, granted: bool) -> Result<()> {
        if self.status == SensorStatus::Unavailable {
            return Err(WayfinderError::SensorUnavailable);
        }
        if granted {
            debug!("Orientation permission granted");
            self.status = SensorStatus::Active;
            Ok(())
        } else {
            self.mark_unavailable();
            Err(WayfinderError::SensorUnavailable)
        }
    }

    /// The orientation API is absent on this platform.
    pub fn mark_unavailable(&mut self) {
        if self.status != SensorStatus::Unavailable {
            warn!("Orientation sensor unavailable; bearings disabled");
        }
        self.status = SensorStatus::Unavailable;
    }

    pub fn status(&self) -> SensorStatus {
        self.status
    }

    pub fn heading(&self) -> f64 {
        self.reading.smoothed_heading_degrees
    }

    pub fn reading(&self) -> CompassReading {
        self.reading
    }

    pub fn cardinal(&self) -> &'static str {
        cardinal_direction(self.heading())
    }

    /// Bearing and horizontal distance from `user_position` to every point, nearest first.
    /// Points at equal distance keep their input order.
    pub fn bearings_to(
        &self,
        points: &[SpatialPoint],
        user_position: &Vector3<f64>,
    ) -> Vec<PointBearing> {
        let heading = self.heading();
        let mut bearings: Vec<PointBearing> = points
            .iter()
            .map(|point| {
                let dx = point.absolute_position.x - user_position.x;
                let dz = point.absolute_position.z - user_position.z;
                let absolute = normalize_degrees(dx.atan2(dz).to_degrees());
                PointBearing {
                    point: point.clone(),
                    absolute_bearing_degrees: absolute,
                    distance_meters: dx.hypot(dz),
                    relative_bearing_degrees: normalize_degrees(absolute - heading),
                }
            })
            .collect();
        bearings.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        bearings
    }
}
