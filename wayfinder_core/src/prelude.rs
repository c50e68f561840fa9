// wayfinder_core/src/prelude.rs

// --- Entry Point ---
pub use crate::engine::WayfinderEngine;

// --- Contracts With The Host ---
pub use crate::reward::RewardBackend;
pub use crate::scene::assets::AssetLoader;
pub use crate::scene::renderable::Renderable;

// --- Core Data Structures ---
pub use crate::config::EngineConfig;
pub use crate::error::{AssetLoadError, WayfinderError};
pub use crate::frames::{ReferencePoint, SpatialPoint};
pub use crate::messages::{
    CalibrationResult, EngineEvent, PointRecord, PointSelection, PrizeWon, SessionEvent,
    VisitorEligibility,
};
pub use crate::reward::{CatalogSnapshot, NoEligiblePrize, Prize, Rarity};
pub use crate::scene::assets::{LoadRequest, LoadTicket, MeshPart, ModelAsset};
pub use crate::types::{Axis, EntityHandle, Ray, SessionId, Tint};

// --- Components ---
pub use crate::animation::AnimationScheduler;
pub use crate::compass::{CompassBearingEngine, PointBearing, RelativeDirection, SensorStatus};
pub use crate::frames::ReferenceFrameManager;
pub use crate::interaction::{InteractionEngine, InteractionOutcome};
pub use crate::reward::RewardSelectionEngine;
pub use crate::scene::SceneObjectManager;
