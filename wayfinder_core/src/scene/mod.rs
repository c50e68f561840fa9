// wayfinder_core/src/scene/mod.rs

//! Lifecycle of the markers drawn for selected points: placement at projected
//! positions, asset completion with a guaranteed fallback, labels, picking and
//! teardown.

pub mod assets;
pub mod graph;
pub mod label;
pub mod renderable;

use nalgebra::Vector3;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::PlacementConfig;
use crate::error::{AssetLoadError, Result, WayfinderError};
use crate::frames::{ReferenceFrameManager, SpatialPoint};
use crate::session::SessionContext;
use crate::types::{EntityHandle, Ray, SessionId};

use self::assets::{AssetLoader, LoadRequest, LoadTicket, ModelAsset};
use self::graph::{NodeKind, NodeTransform, SceneGraph};
use self::label::LabelLayout;
use self::renderable::{GpuResources, LabelRenderable, MeshRenderable};

/// A marker placed for one point during one session.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntity {
    /// The anchor node at `local_position`. Stable for the life of the marker.
    pub entity_id: EntityHandle,
    pub source_point: SpatialPoint,
    pub local_position: Vector3<f64>,
    pub interaction_count: u32,
    /// Set once the model or its fallback has been attached.
    pub rendered: bool,
    /// The model root or fallback cube; what rays resolve to and what animations move.
    pub marker: Option<EntityHandle>,
    pub label: Option<EntityHandle>,
}

#[derive(Debug, Default)]
pub struct SceneObjectManager {
    config: PlacementConfig,
    graph: SceneGraph,
    gpu: GpuResources,
    /// Keyed by anchor handle; handles are allocated in creation order.
    tracked: BTreeMap<EntityHandle, TrackedEntity>,
    /// Marker roots eligible for ray picking.
    interactable: Vec<EntityHandle>,
    /// The session whose markers currently populate the scene.
    session: Option<SessionId>,
}

impl SceneObjectManager {
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Places an anchor for every point not already tracked and returns one model load
    /// request per new anchor. Projection happens before any node is created, so an
    /// uncalibrated frame leaves the scene untouched.
    pub fn instantiate(
        &mut self,
        session: &SessionContext,
        frames: &ReferenceFrameManager,
        points: &[SpatialPoint],
    ) -> Result<Vec<LoadRequest>> {
        if !session.is_active() {
            return Err(WayfinderError::SessionInactive);
        }

        let projected = points
            .iter()
            .map(|point| Ok((point, frames.project_absolute(point)?)))
            .collect::<Result<Vec<_>>>()?;

        self.session = Some(session.id);
        let mut requests = Vec::with_capacity(projected.len());
        for (point, local_position) in projected {
            if self.find_by_point(point.id).is_some() {
                debug!("Point {} ('{}') already has a marker", point.id, point.name);
                continue;
            }

            let anchor = self
                .graph
                .spawn(NodeKind::Anchor, NodeTransform::at(local_position), None);
            self.tracked.insert(
                anchor,
                TrackedEntity {
                    entity_id: anchor,
                    source_point: point.clone(),
                    local_position,
                    interaction_count: 0,
                    rendered: false,
                    marker: None,
                    label: None,
                },
            );
            debug!(
                "Anchored point {} ('{}') at {:?}",
                point.id, point.name, local_position
            );
            requests.push(LoadRequest {
                ticket: LoadTicket {
                    session: session.id,
                    entity: anchor,
                },
                path: self.config.model_path.clone(),
            });
        }

        info!("Placed {} new marker anchors", requests.len());
        Ok(requests)
    }

    /// Attaches the outcome of a model load to its anchor. A failed load is replaced by
    /// the fallback cube. Completions for a torn-down session or a removed anchor are
    /// dropped without touching the scene.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: std::result::Result<ModelAsset, AssetLoadError>,
    ) -> Option<EntityHandle> {
        if self.session != Some(ticket.session) {
            debug!("Dropping load for {:?}: session no longer live", ticket.entity);
            return None;
        }
        let already_rendered = self.tracked.get(&ticket.entity)?.rendered;
        if already_rendered {
            debug!("Dropping duplicate load for {:?}", ticket.entity);
            return None;
        }

        let tint = self.config.marker_tint;
        let (marker, marker_lift) = match result {
            Ok(model) if !model.parts.is_empty() => {
                let lift = self.config.model_lift;
                let root = self.graph.spawn(
                    NodeKind::Model,
                    NodeTransform::at(Vector3::new(0.0, lift, 0.0))
                        .with_scale(self.config.model_scale),
                    Some(ticket.entity),
                );
                for part in &model.parts {
                    let mesh = self.graph.spawn(
                        NodeKind::MeshPart,
                        NodeTransform::at(part.offset),
                        Some(root),
                    );
                    if let Some(node) = self.graph.get_mut(mesh) {
                        node.pick_extents = Some(part.half_extents);
                        node.renderable = Some(Box::new(MeshRenderable::new(&mut self.gpu, tint)));
                    }
                }
                (root, lift)
            }
            Ok(model) => {
                warn!("Model '{}' has no meshes; using fallback cube", model.path);
                self.spawn_fallback(ticket.entity)
            }
            Err(err) => {
                warn!("Marker model failed to load ({}); using fallback cube", err);
                self.spawn_fallback(ticket.entity)
            }
        };

        if let Some(node) = self.graph.get_mut(marker) {
            node.interactable_root = true;
        }
        let label = self.spawn_label(ticket.entity, marker_lift);

        let entity = self.tracked.get_mut(&ticket.entity)?;
        entity.marker = Some(marker);
        entity.label = label;
        entity.rendered = true;
        self.interactable.push(marker);
        Some(ticket.entity)
    }

    /// Instantiates `points` and resolves every load immediately through `loader`.
    pub fn instantiate_with(
        &mut self,
        session: &SessionContext,
        frames: &ReferenceFrameManager,
        points: &[SpatialPoint],
        loader: &mut dyn AssetLoader,
    ) -> Result<Vec<EntityHandle>> {
        let requests = self.instantiate(session, frames, points)?;
        Ok(requests
            .into_iter()
            .filter_map(|request| {
                let result = loader.load(&request.path);
                self.complete_load(request.ticket, result)
            })
            .collect())
    }

    /// Removes the marker of one point, e.g. when it is deselected. Returns whether
    /// a marker existed.
    pub fn remove_point(&mut self, point_id: u64) -> bool {
        let Some(anchor) = self.find_by_point(point_id) else {
            return false;
        };
        if let Some(entity) = self.tracked.remove(&anchor) {
            if let Some(marker) = entity.marker {
                self.interactable.retain(|h| *h != marker);
            }
        }
        let released = self.graph.despawn_recursive(anchor, &mut self.gpu);
        debug!("Removed marker for point {}, released {} resources", point_id, released);
        true
    }

    /// Tears down every marker, fallback and label and releases their graphics
    /// resources. Returns how many resources were released; zero when nothing exists.
    pub fn dispose_all(&mut self) -> usize {
        let anchors: Vec<EntityHandle> = self.tracked.keys().copied().collect();
        let released: usize = anchors
            .into_iter()
            .map(|anchor| self.graph.despawn_recursive(anchor, &mut self.gpu))
            .sum();

        if !self.tracked.is_empty() {
            info!(
                "Disposed {} markers ({} graphics resources)",
                self.tracked.len(),
                released
            );
        }
        self.tracked.clear();
        self.interactable.clear();
        self.session = None;
        released
    }

    /// Casts `ray` against the interactable markers and returns the anchor of the
    /// nearest one hit.
    pub fn pick(&self, ray: &Ray) -> Option<EntityHandle> {
        let hit = self.graph.intersect(ray, &self.interactable)?;
        let root = self.graph.resolve_interactable_root(hit.node);
        let anchor = self.anchor_of_marker(root);
        if anchor.is_none() {
            debug!("Ray hit {:?} outside any tracked marker", hit.node);
        }
        anchor
    }

    pub fn anchor_of_marker(&self, marker: EntityHandle) -> Option<EntityHandle> {
        self.tracked
            .values()
            .find(|entity| entity.marker == Some(marker))
            .map(|entity| entity.entity_id)
    }

    pub fn find_by_point(&self, point_id: u64) -> Option<EntityHandle> {
        self.tracked
            .values()
            .find(|entity| entity.source_point.id == point_id)
            .map(|entity| entity.entity_id)
    }

    pub fn tracked(&self) -> impl Iterator<Item = &TrackedEntity> {
        self.tracked.values()
    }

    pub fn tracked_entity(&self, entity: EntityHandle) -> Option<&TrackedEntity> {
        self.tracked.get(&entity)
    }

    pub fn tracked_entity_mut(&mut self, entity: EntityHandle) -> Option<&mut TrackedEntity> {
        self.tracked.get_mut(&entity)
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn interactable(&self) -> &[EntityHandle] {
        &self.interactable
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn gpu_resources(&self) -> &GpuResources {
        &self.gpu
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    fn spawn_fallback(&mut self, anchor: EntityHandle) -> (EntityHandle, f64) {
        let half = self.config.fallback_edge / 2.0;
        let cube = self.graph.spawn(
            NodeKind::Primitive,
            NodeTransform::at(Vector3::new(0.0, half, 0.0)),
            Some(anchor),
        );
        if let Some(node) = self.graph.get_mut(cube) {
            node.pick_extents = Some(Vector3::repeat(half));
            node.renderable = Some(Box::new(MeshRenderable::new(
                &mut self.gpu,
                self.config.marker_tint,
            )));
        }
        (cube, half)
    }

    fn spawn_label(&mut self, anchor: EntityHandle, marker_lift: f64) -> Option<EntityHandle> {
        let text = self.tracked.get(&anchor)?.source_point.name.clone();
        let layout = LabelLayout::for_text(
            &text,
            self.config.label_font_size,
            self.config.label_height,
        );
        let label = self.graph.spawn(
            NodeKind::Label,
            NodeTransform::at(Vector3::new(0.0, marker_lift + self.config.label_lift, 0.0)),
            Some(anchor),
        );
        if let Some(node) = self.graph.get_mut(label) {
            node.renderable = Some(Box::new(LabelRenderable::new(
                &mut self.gpu,
                text,
                layout.world_size,
            )));
        }
        Some(label)
    }
}
