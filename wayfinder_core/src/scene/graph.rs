// wayfinder_core/src/scene/graph.rs

use nalgebra::{Point3, Similarity3, Translation3, UnitQuaternion, Vector3};
use std::collections::BTreeMap;

use crate::scene::renderable::{GpuResources, Renderable};
use crate::types::{Axis, EntityHandle, Ray};

/// What role a node plays inside a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The logical marker root placed at the projected position.
    Anchor,
    /// Root of a loaded model. Its children are the model's meshes.
    Model,
    MeshPart,
    /// The fallback cube used when the model cannot be loaded.
    Primitive,
    Label,
}

/// Local transform of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub position: Vector3<f64>,
    /// Euler angles in radians, applied as roll (X), pitch (Y), yaw (Z).
    pub rotation: Vector3<f64>,
    pub scale: f64,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: 1.0,
        }
    }
}

impl NodeTransform {
    pub fn at(position: Vector3<f64>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn to_similarity(&self) -> Similarity3<f64> {
        Similarity3::from_parts(
            Translation3::from(self.position),
            UnitQuaternion::from_euler_angles(self.rotation.x, self.rotation.y, self.rotation.z),
            self.scale,
        )
    }
}

#[derive(Debug)]
pub struct SceneNode {
    pub handle: EntityHandle,
    pub kind: NodeKind,
    pub parent: Option<EntityHandle>,
    pub children: Vec<EntityHandle>,
    pub transform: NodeTransform,
    /// Half extents of the node's pickable box, in its local frame. `None` means
    /// the node has no geometry a ray can hit.
    pub pick_extents: Option<Vector3<f64>>,
    pub renderable: Option<Box<dyn Renderable>>,
    /// Marks the logical entity a ray hit on any descendant resolves to.
    pub interactable_root: bool,
}

/// The closest intersection found by [`SceneGraph::intersect`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub node: EntityHandle,
    pub distance: f64,
}

/// An arena of scene nodes linked by explicit parent handles.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<EntityHandle, SceneNode>,
    next_handle: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, attaching it under `parent` when that node exists.
    pub fn spawn(
        &mut self,
        kind: NodeKind,
        transform: NodeTransform,
        parent: Option<EntityHandle>,
    ) -> EntityHandle {
        self.next_handle += 1;
        let handle = EntityHandle(self.next_handle);
        let parent = parent.filter(|p| self.nodes.contains_key(p));
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.push(handle);
        }
        self.nodes.insert(
            handle,
            SceneNode {
                handle,
                kind,
                parent,
                children: Vec::new(),
                transform,
                pick_extents: None,
                renderable: None,
                interactable_root: false,
            },
        );
        handle
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&SceneNode> {
        self.nodes.get(&handle)
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&handle)
    }

    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.nodes.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes without a parent, i.e. what the renderer walks from.
    pub fn roots(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.nodes
            .values()
            .filter(|node| node.parent.is_none())
            .map(|node| node.handle)
    }

    /// `root` followed by every descendant, depth first.
    pub fn descendants(&self, root: EntityHandle) -> Vec<EntityHandle> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            if let Some(node) = self.nodes.get(&handle) {
                out.push(handle);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Composes local transforms from the root down to `handle`.
    pub fn world_transform(&self, handle: EntityHandle) -> Option<Similarity3<f64>> {
        let mut node = self.nodes.get(&handle)?;
        let mut world = node.transform.to_similarity();
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(&p)) {
            world = parent.transform.to_similarity() * world;
            node = parent;
        }
        Some(world)
    }

    pub fn world_position(&self, handle: EntityHandle) -> Option<Point3<f64>> {
        self.world_transform(handle)
            .map(|world| world * Point3::origin())
    }

    pub fn rotation(&self, handle: EntityHandle, axis: Axis) -> Option<f64> {
        self.nodes
            .get(&handle)
            .map(|node| node.transform.rotation[axis.index()])
    }

    /// Overwrites one rotation channel. Returns `false` if the node is gone.
    pub fn set_rotation(&mut self, handle: EntityHandle, axis: Axis, angle: f64) -> bool {
        match self.nodes.get_mut(&handle) {
            Some(node) => {
                node.transform.rotation[axis.index()] = angle;
                true
            }
            None => false,
        }
    }

    /// Walks up from `hit` to the nearest ancestor flagged as an interactable root.
    /// Falls back to `hit` itself when no such ancestor exists.
    pub fn resolve_interactable_root(&self, hit: EntityHandle) -> EntityHandle {
        let mut current = self.nodes.get(&hit);
        while let Some(node) = current {
            if node.interactable_root {
                return node.handle;
            }
            current = node.parent.and_then(|p| self.nodes.get(&p));
        }
        hit
    }

    /// Casts `ray` against the pickable geometry under each of `roots` and returns
    /// the nearest hit. Boxes are tested axis-aligned in world space.
    pub fn intersect(&self, ray: &Ray, roots: &[EntityHandle]) -> Option<RayHit> {
        roots
            .iter()
            .flat_map(|root| self.descendants(*root))
            .filter_map(|handle| {
                let node = self.nodes.get(&handle)?;
                let extents = node.pick_extents?;
                let world = self.world_transform(handle)?;
                let center = world * Point3::origin();
                let half = extents * world.scaling().abs();
                ray_box_distance(ray, &center, &half).map(|distance| RayHit {
                    node: handle,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Removes `root` and its whole subtree, disposing every renderable on the way.
    /// Returns the number of graphics resources released.
    pub fn despawn_recursive(&mut self, root: EntityHandle, gpu: &mut GpuResources) -> usize {
        let doomed = self.descendants(root);
        if let Some(parent) = self
            .nodes
            .get(&root)
            .and_then(|node| node.parent)
            .and_then(|p| self.nodes.get_mut(&p))
        {
            parent.children.retain(|child| *child != root);
        }

        let mut released = 0;
        for handle in doomed {
            if let Some(mut node) = self.nodes.remove(&handle) {
                if let Some(renderable) = node.renderable.as_mut() {
                    released += renderable.dispose(gpu);
                }
            }
        }
        released
    }
}

/// Slab test of a ray against an axis-aligned box. Returns the entry distance,
/// or zero when the ray starts inside the box.
pub fn ray_box_distance(ray: &Ray, center: &Point3<f64>, half: &Vector3<f64>) -> Option<f64> {
    let mut t_min = 0.0_f64;
    let mut t_max = f64::INFINITY;

    for i in 0..3 {
        let origin = ray.origin[i];
        let dir = ray.direction[i];
        let lo = center[i] - half[i];
        let hi = center[i] + half[i];

        if dir.abs() < 1e-12 {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / dir;
        let (t0, t1) = {
            let a = (lo - origin) * inv;
            let b = (hi - origin) * inv;
            if a <= b {
                (a, b)
            } else {
                (b, a)
            }
        };
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }

    Some(t_min)
}
