// wayfinder_core/src/scene/renderable.rs

use nalgebra::Vector2;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::types::Tint;

/// Identifies one graphics allocation (buffer, material or texture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Material,
    Texture,
}

/// Book-keeping of every live graphics allocation made by the scene.
/// A resource is released exactly once; double releases are ignored.
#[derive(Debug, Default)]
pub struct GpuResources {
    live: HashMap<ResourceId, ResourceKind>,
    next_id: u64,
}

impl GpuResources {
    pub fn allocate(&mut self, kind: ResourceKind) -> ResourceId {
        self.next_id += 1;
        let id = ResourceId(self.next_id);
        self.live.insert(id, kind);
        id
    }

    /// Returns `true` if the resource was live.
    pub fn release(&mut self, id: ResourceId) -> bool {
        self.live.remove(&id).is_some()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_of(&self, kind: ResourceKind) -> usize {
        self.live.values().filter(|k| **k == kind).count()
    }
}

/// The capability every drawable thing in the scene exposes, regardless of whether
/// it came from a loaded model, a fallback primitive or a text label.
pub trait Renderable: Debug + Send + Sync {
    fn tint(&self) -> Tint;

    fn set_tint(&mut self, tint: Tint);

    /// Whether the tint takes part in interaction feedback such as the blink.
    fn accepts_feedback(&self) -> bool {
        true
    }

    /// Releases every exclusively-owned graphics resource. Returns how many were freed.
    /// Calling it again is a no-op.
    fn dispose(&mut self, gpu: &mut GpuResources) -> usize;

    fn is_disposed(&self) -> bool;
}

/// A mesh with its own geometry buffer and material. Used for model parts
/// and for the fallback cube.
#[derive(Debug)]
pub struct MeshRenderable {
    geometry: Option<ResourceId>,
    material: Option<ResourceId>,
    tint: Tint,
}

impl MeshRenderable {
    pub fn new(gpu: &mut GpuResources, tint: Tint) -> Self {
        Self {
            geometry: Some(gpu.allocate(ResourceKind::Geometry)),
            material: Some(gpu.allocate(ResourceKind::Material)),
            tint,
        }
    }
}

impl Renderable for MeshRenderable {
    fn tint(&self) -> Tint {
        self.tint
    }

    fn set_tint(&mut self, tint: Tint) {
        self.tint = tint;
    }

    fn dispose(&mut self, gpu: &mut GpuResources) -> usize {
        [self.geometry.take(), self.material.take()]
            .into_iter()
            .flatten()
            .filter(|id| gpu.release(*id))
            .count()
    }

    fn is_disposed(&self) -> bool {
        self.geometry.is_none() && self.material.is_none()
    }
}

/// A camera-facing text sprite. It owns the texture the text was rasterised into
/// and the sprite material sampling it.
#[derive(Debug)]
pub struct LabelRenderable {
    pub text: String,
    /// World-space width and height of the sprite.
    pub size: Vector2<f64>,
    texture: Option<ResourceId>,
    material: Option<ResourceId>,
    tint: Tint,
}

impl LabelRenderable {
    pub fn new(gpu: &mut GpuResources, text: impl Into<String>, size: Vector2<f64>) -> Self {
        Self {
            text: text.into(),
            size,
            texture: Some(gpu.allocate(ResourceKind::Texture)),
            material: Some(gpu.allocate(ResourceKind::Material)),
            tint: Tint::WHITE,
        }
    }
}

impl Renderable for LabelRenderable {
    fn tint(&self) -> Tint {
        self.tint
    }

    fn set_tint(&mut self, tint: Tint) {
        self.tint = tint;
    }

    fn accepts_feedback(&self) -> bool {
        false
    }

    fn dispose(&mut self, gpu: &mut GpuResources) -> usize {
        [self.texture.take(), self.material.take()]
            .into_iter()
            .flatten()
            .filter(|id| gpu.release(*id))
            .count()
    }

    fn is_disposed(&self) -> bool {
        self.texture.is_none() && self.material.is_none()
    }
}
