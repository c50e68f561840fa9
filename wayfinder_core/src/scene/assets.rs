// wayfinder_core/src/scene/assets.rs

use nalgebra::Vector3;

use crate::error::AssetLoadError;
use crate::types::{EntityHandle, SessionId};

/// One pickable mesh inside a loaded model, in model-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPart {
    pub name: String,
    pub offset: Vector3<f64>,
    pub half_extents: Vector3<f64>,
}

/// The decoded primary representation of a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    pub path: String,
    pub parts: Vec<MeshPart>,
}

/// Ties an in-flight load to the session and marker that requested it.
/// A completion whose session is no longer live is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub session: SessionId,
    pub entity: EntityHandle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub path: String,
}

/// Resolves asset paths into decoded models. Hosts with truly asynchronous loading
/// can skip this trait and feed completions to `SceneObjectManager::complete_load`.
pub trait AssetLoader {
    fn load(&mut self, path: &str) -> Result<ModelAsset, AssetLoadError>;
}
