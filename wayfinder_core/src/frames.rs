// wayfinder_core/src/frames.rs

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, WayfinderError};
use crate::messages::{CalibrationResult, PointRecord};
use crate::session::SessionContext;
use crate::types::SessionId;

/// Calibration codes shorter than this are rejected as misreads. The raw scan is
/// measured, surrounding whitespace included.
pub const MIN_REFERENCE_CODE_LEN: usize = 4;

/// A point of interest with its position relative to the calibration marker.
/// Immutable input to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialPoint {
    pub id: u64,
    pub name: String,
    pub absolute_position: Vector3<f64>,
}

impl From<PointRecord> for SpatialPoint {
    fn from(record: PointRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            absolute_position: Vector3::new(record.pos_x, record.pos_y, record.pos_z),
        }
    }
}

/// The anchor produced by a successful calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePoint {
    pub calibration_id: String,
    /// Host timestamp of the calibration scan, in milliseconds.
    pub established_at: f64,
    /// Set lazily on the first session start; frozen for the rest of that session.
    pub local_origin: Option<Vector3<f64>>,
}

/// Turns a calibration event into a stable local origin and projects stored
/// point coordinates into the AR session's frame.
#[derive(Debug, Default)]
pub struct ReferenceFrameManager {
    reference: Option<ReferencePoint>,
    /// The session whose start froze `local_origin`.
    bound_session: Option<SessionId>,
}

impl ReferenceFrameManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a scanned calibration code. A new calibration replaces the previous
    /// one and discards any origin it had established.
    pub fn calibrate(&mut self, calibration: &CalibrationResult) -> Result<&ReferencePoint> {
        let code = calibration.reference_code.as_str();
        if code.chars().count() < MIN_REFERENCE_CODE_LEN {
            return Err(WayfinderError::InvalidCalibration(code.to_string()));
        }

        info!("Calibrated against reference code '{}'", code);
        self.bound_session = None;
        Ok(self.reference.insert(ReferencePoint {
            calibration_id: code.to_string(),
            established_at: calibration.timestamp,
            local_origin: None,
        }))
    }

    pub fn is_calibrated(&self) -> bool {
        self.reference.is_some()
    }

    pub fn reference(&self) -> Option<&ReferencePoint> {
        self.reference.as_ref()
    }

    pub fn local_origin(&self) -> Option<Vector3<f64>> {
        self.reference.as_ref().and_then(|r| r.local_origin)
    }

    /// Freezes the session's local-space zero as the origin, unless one already exists.
    /// Repeated calls return the frozen value unchanged.
    pub fn establish_origin(&mut self, session: &SessionContext) -> Result<Vector3<f64>> {
        let reference = self.reference.as_mut().ok_or(WayfinderError::NotCalibrated)?;

        if let Some(origin) = reference.local_origin {
            return Ok(origin);
        }

        let origin = session.local_space_origin;
        reference.local_origin = Some(origin);
        debug!(
            "Local origin for '{}' frozen at {:?} by session {:?}",
            reference.calibration_id, origin, session.id
        );
        self.bound_session = Some(session.id);
        Ok(origin)
    }

    /// Releases the origin frozen by `session` so the next session re-derives its own.
    pub fn release_session(&mut self, session: SessionId) {
        if self.bound_session != Some(session) {
            return;
        }
        if let Some(reference) = self.reference.as_mut() {
            reference.local_origin = None;
        }
        self.bound_session = None;
    }

    /// Maps a point's calibration-relative position into the session frame.
    pub fn project_absolute(&self, point: &SpatialPoint) -> Result<Vector3<f64>> {
        let origin = self.local_origin().ok_or(WayfinderError::NotCalibrated)?;
        Ok(origin + point.absolute_position)
    }
}
