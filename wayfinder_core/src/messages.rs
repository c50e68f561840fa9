// wayfinder_core/src/messages.rs

use serde::{Deserialize, Serialize};

use crate::error::WayfinderError;
use crate::frames::SpatialPoint;
use crate::reward::{NoEligiblePrize, Prize};
use crate::types::{EntityHandle, SessionId};

// =========================================================================
// == Data Consumed From Collaborators ==
// =========================================================================

/// Produced by the external code scanner when a calibration marker is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationResult {
    pub reference_code: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: f64,
}

/// One row of the point list, already filtered by the active reference code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: u64,
    #[serde(alias = "nome")]
    pub name: String,
    pub pos_x: f64,
    pub pos_y: f64,
    pub pos_z: f64,
}

/// Whether the current visitor may still win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorEligibility {
    pub id: String,
    #[serde(alias = "ganhou_premio")]
    pub has_won_before: bool,
}

// =========================================================================
// == Events Exposed To Collaborators ==
// =========================================================================

/// What the visitor chose to be guided to, from the compass or a scene pick.
#[derive(Debug, Clone, PartialEq)]
pub enum PointSelection {
    Single(SpatialPoint),
    /// Sentinel meaning "every available point".
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Started(SessionId),
    Ended(SessionId),
}

/// Emitted once the reveal delay after a winning interaction has elapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct PrizeWon {
    pub entity: EntityHandle,
    pub prize: Prize,
}

/// Everything the engine surfaces to its host, drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Session(SessionEvent),
    PointSelected(PointSelection),
    PrizeWon(PrizeWon),
    /// A threshold was reached but no prize could be awarded.
    NoPrize(NoEligiblePrize),
    /// A user-visible failure (calibration, sensor, session).
    Failure(WayfinderError),
}
