// wayfinder_core/src/error.rs

use thiserror::Error;

/// Why the primary 3D representation of a marker could not be loaded.
/// Always recovered locally by substituting the fallback primitive.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetLoadError {
    #[error("timed out loading asset '{0}'")]
    Timeout(String),
    #[error("failed to decode asset '{path}': {reason}")]
    Decode { path: String, reason: String },
    #[error("asset '{0}' not found")]
    Missing(String),
}

/// The error type shared by every component of the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WayfinderError {
    /// A projection was attempted before a local origin exists.
    #[error("no reference origin has been established; calibrate first")]
    NotCalibrated,
    /// The scanned calibration code was rejected.
    #[error("calibration code '{0}' is not a valid reference code")]
    InvalidCalibration(String),
    #[error(transparent)]
    AssetLoad(#[from] AssetLoadError),
    /// Orientation sensor missing or permission denied. Not retried.
    #[error("orientation sensor is unavailable")]
    SensorUnavailable,
    /// The AR session never supplied a hit-test source.
    #[error("the AR session did not provide a hit-test source")]
    HitTestUnavailable,
    #[error("no AR session is active")]
    SessionInactive,
}

impl WayfinderError {
    /// The message shown to the visitor, or `None` for failures that only get logged.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            WayfinderError::NotCalibrated | WayfinderError::InvalidCalibration(_) => {
                Some("Point the camera at the event QR code to calibrate your position.")
            }
            WayfinderError::SensorUnavailable => Some("Compass not available on this device."),
            WayfinderError::HitTestUnavailable | WayfinderError::SessionInactive => {
                Some("The camera or AR session is unavailable.")
            }
            WayfinderError::AssetLoad(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, WayfinderError>;
