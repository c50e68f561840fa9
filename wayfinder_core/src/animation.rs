// wayfinder_core/src/animation.rs

use tracing::debug;

use crate::scene::graph::SceneGraph;
use crate::types::{Axis, EntityHandle, Tint};
use crate::utils::angles::normalize_radians;
use crate::utils::easing::{ease_out_quad, triangle_wave};

// --- Flip ---

/// A single eased rotation of one node about one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct FlipAnimation {
    pub entity_id: EntityHandle,
    pub axis: Axis,
    pub start_angle: f64,
    pub target_angle: f64,
    pub elapsed_ms: f64,
    pub duration_ms: f64,
}

impl FlipAnimation {
    /// Starts from the current rotation wrapped into `[0, 2π)` and sweeps `angle` radians.
    pub fn new(entity_id: EntityHandle, axis: Axis, current: f64, angle: f64, duration_ms: f64) -> Self {
        let start_angle = normalize_radians(current);
        Self {
            entity_id,
            axis,
            start_angle,
            target_angle: start_angle + angle,
            elapsed_ms: 0.0,
            duration_ms,
        }
    }

    pub fn progress(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (self.elapsed_ms / self.duration_ms).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    /// The rotation to write at the current progress. Exactly `target_angle` once done.
    pub fn current_angle(&self) -> f64 {
        let t = self.progress();
        if t >= 1.0 {
            return self.target_angle;
        }
        self.start_angle + (self.target_angle - self.start_angle) * ease_out_quad(t)
    }
}

// --- Blink ---

/// Tint feedback that ramps a subtree toward white and back, then restores it.
#[derive(Debug, Clone, PartialEq)]
pub struct BlinkAnimation {
    pub entity_id: EntityHandle,
    /// Tints captured when the blink started, one per feedback-accepting node.
    original: Vec<(EntityHandle, Tint)>,
    pub elapsed_ms: f64,
    pub half_cycle_ms: f64,
    pub flashes: u32,
}

impl BlinkAnimation {
    fn capture(graph: &SceneGraph, entity_id: EntityHandle, half_cycle_ms: f64, flashes: u32) -> Self {
        let original = graph
            .descendants(entity_id)
            .into_iter()
            .filter_map(|handle| {
                let renderable = graph.get(handle)?.renderable.as_ref()?;
                renderable
                    .accepts_feedback()
                    .then(|| (handle, renderable.tint()))
            })
            .collect();
        Self {
            entity_id,
            original,
            elapsed_ms: 0.0,
            half_cycle_ms,
            flashes,
        }
    }

    pub fn total_ms(&self) -> f64 {
        self.half_cycle_ms * f64::from(self.flashes)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.total_ms()
    }

    fn apply(&self, graph: &mut SceneGraph) {
        let weight = if self.is_finished() {
            0.0
        } else {
            triangle_wave(self.elapsed_ms, self.half_cycle_ms) as f32
        };
        for (handle, tint) in &self.original {
            if let Some(renderable) = graph
                .get_mut(*handle)
                .and_then(|node| node.renderable.as_mut())
            {
                renderable.set_tint(tint.lerp(Tint::WHITE, weight));
            }
        }
    }
}

// --- Scheduler ---

/// Advances every active animation once per rendered frame.
#[derive(Debug, Default)]
pub struct AnimationScheduler {
    flips: Vec<FlipAnimation>,
    blinks: Vec<BlinkAnimation>,
    last_timestamp_ms: Option<f64>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a flip of `entity` from its current rotation. Flips already running on the
    /// same entity keep running. Returns `false` if the entity is not in the graph.
    pub fn start_flip(
        &mut self,
        graph: &SceneGraph,
        entity: EntityHandle,
        axis: Axis,
        angle: f64,
        duration_ms: f64,
    ) -> bool {
        let Some(current) = graph.rotation(entity, axis) else {
            return false;
        };
        self.flips
            .push(FlipAnimation::new(entity, axis, current, angle, duration_ms));
        true
    }

    /// Starts a blink on `entity`. A blink already running on it restarts instead of
    /// capturing its half-white tints as the originals.
    pub fn start_blink(
        &mut self,
        graph: &SceneGraph,
        entity: EntityHandle,
        half_cycle_ms: f64,
        flashes: u32,
    ) -> bool {
        if !graph.contains(entity) {
            return false;
        }
        if let Some(running) = self.blinks.iter_mut().find(|b| b.entity_id == entity) {
            running.elapsed_ms = 0.0;
            return true;
        }
        self.blinks
            .push(BlinkAnimation::capture(graph, entity, half_cycle_ms, flashes));
        true
    }

    /// Derives the delta from the render loop's timestamp and ticks. The first frame
    /// after construction or [`clear`](Self::clear) only seeds the clock.
    pub fn frame(&mut self, timestamp_ms: f64, graph: &mut SceneGraph) {
        let delta = match self.last_timestamp_ms.replace(timestamp_ms) {
            Some(last) => (timestamp_ms - last).max(0.0),
            None => 0.0,
        };
        self.tick(delta, graph);
    }

    /// Advances every animation by `delta_ms` and drops the ones that completed.
    pub fn tick(&mut self, delta_ms: f64, graph: &mut SceneGraph) {
        self.flips.retain_mut(|flip| {
            flip.elapsed_ms += delta_ms;
            if !graph.set_rotation(flip.entity_id, flip.axis, flip.current_angle()) {
                debug!("Flip target {:?} is gone; dropping animation", flip.entity_id);
                return false;
            }
            !flip.is_finished()
        });

        self.blinks.retain_mut(|blink| {
            blink.elapsed_ms += delta_ms;
            blink.apply(graph);
            !blink.is_finished()
        });
    }

    /// Drops all animations and forgets the last frame timestamp.
    pub fn clear(&mut self) {
        self.flips.clear();
        self.blinks.clear();
        self.last_timestamp_ms = None;
    }

    pub fn flips(&self) -> &[FlipAnimation] {
        &self.flips
    }

    pub fn blinks(&self) -> &[BlinkAnimation] {
        &self.blinks
    }

    pub fn is_idle(&self) -> bool {
        self.flips.is_empty() && self.blinks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::graph::{NodeKind, NodeTransform};
    use crate::scene::renderable::{GpuResources, LabelRenderable, MeshRenderable};
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector2;
    use std::f64::consts::TAU;
    use proptest::prelude::*;

    fn graph_with_marker() -> (SceneGraph, EntityHandle) {
        let mut graph = SceneGraph::new();
        let marker = graph.spawn(NodeKind::Primitive, NodeTransform::default(), None);
        (graph, marker)
    }

    #[test]
    fn test_six_ticks_of_100ms_finish_a_600ms_flip_exactly() {
        let (mut graph, marker) = graph_with_marker();
        let mut animations = AnimationScheduler::new();
        assert!(animations.start_flip(&graph, marker, Axis::Y, TAU, 600.0));
        let target = animations.flips()[0].target_angle;

        for _ in 0..5 {
            animations.tick(100.0, &mut graph);
            assert_eq!(animations.flips().len(), 1);
        }
        animations.tick(100.0, &mut graph);

        assert_eq!(graph.rotation(marker, Axis::Y), Some(target));
        assert!(animations.flips().is_empty());
    }

    #[test]
    fn test_flip_follows_ease_out_curve() {
        let (mut graph, marker) = graph_with_marker();
        let mut animations = AnimationScheduler::new();
        animations.start_flip(&graph, marker, Axis::Y, TAU, 600.0);
        animations.tick(300.0, &mut graph);
        assert_abs_diff_eq!(
            graph.rotation(marker, Axis::Y).unwrap(),
            TAU * 0.75,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_flip_starts_from_wrapped_rotation() {
        let (mut graph, marker) = graph_with_marker();
        graph.set_rotation(marker, Axis::Y, TAU + 0.5);
        let mut animations = AnimationScheduler::new();
        animations.start_flip(&graph, marker, Axis::Y, TAU, 600.0);
        let flip = &animations.flips()[0];
        assert_abs_diff_eq!(flip.start_angle, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(flip.target_angle, 0.5 + TAU, epsilon = 1e-12);
    }

    #[test]
    fn test_overlapping_flips_both_run_and_later_write_wins() {
        let (mut graph, marker) = graph_with_marker();
        let mut animations = AnimationScheduler::new();
        animations.start_flip(&graph, marker, Axis::Y, TAU, 600.0);
        animations.tick(300.0, &mut graph);
        animations.start_flip(&graph, marker, Axis::Y, TAU, 600.0);
        assert_eq!(animations.flips().len(), 2);

        animations.tick(300.0, &mut graph);
        // The first flip completes this frame, the second keeps going and writes last.
        assert_eq!(animations.flips().len(), 1);
        let second = &animations.flips()[0];
        assert_abs_diff_eq!(
            graph.rotation(marker, Axis::Y).unwrap(),
            second.current_angle(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_first_frame_seeds_the_clock() {
        let (mut graph, marker) = graph_with_marker();
        let mut animations = AnimationScheduler::new();
        animations.start_flip(&graph, marker, Axis::Y, TAU, 600.0);

        animations.frame(1_000_000.0, &mut graph);
        assert_eq!(animations.flips()[0].elapsed_ms, 0.0);
        animations.frame(1_000_016.0, &mut graph);
        assert_abs_diff_eq!(animations.flips()[0].elapsed_ms, 16.0);

        animations.clear();
        assert!(animations.is_idle());
        animations.start_flip(&graph, marker, Axis::Y, TAU, 600.0);
        animations.frame(5_000_000.0, &mut graph);
        assert_eq!(animations.flips()[0].elapsed_ms, 0.0);
    }

    #[test]
    fn test_flip_on_despawned_node_is_dropped() {
        let (mut graph, marker) = graph_with_marker();
        let mut gpu = GpuResources::default();
        let mut animations = AnimationScheduler::new();
        animations.start_flip(&graph, marker, Axis::Y, TAU, 600.0);
        graph.despawn_recursive(marker, &mut gpu);
        animations.tick(16.0, &mut graph);
        assert!(animations.is_idle());
        assert!(!animations.start_flip(&graph, marker, Axis::Y, TAU, 600.0));
    }

    #[test]
    fn test_blink_ramps_to_white_and_restores_original_tint() {
        let mut gpu = GpuResources::default();
        let (mut graph, marker) = graph_with_marker();
        let base = Tint::new(0.2, 0.8, 0.2);
        graph.get_mut(marker).unwrap().renderable = Some(Box::new(MeshRenderable::new(&mut gpu, base)));
        let label = graph.spawn(NodeKind::Label, NodeTransform::default(), Some(marker));
        graph.get_mut(label).unwrap().renderable = Some(Box::new(LabelRenderable::new(
            &mut gpu,
            "Stage",
            Vector2::new(0.3, 0.15),
        )));

        let tint_of = |graph: &SceneGraph, handle| {
            graph.get(handle).unwrap().renderable.as_ref().unwrap().tint()
        };

        let mut animations = AnimationScheduler::new();
        animations.start_blink(&graph, marker, 200.0, 4);

        animations.tick(200.0, &mut graph);
        assert_eq!(tint_of(&graph, marker), Tint::WHITE);

        animations.tick(100.0, &mut graph);
        let halfway = tint_of(&graph, marker);
        assert_abs_diff_eq!(halfway.r, 0.6, epsilon = 1e-6);

        animations.tick(500.0, &mut graph);
        assert!(animations.blinks().is_empty());
        assert_eq!(tint_of(&graph, marker), base);
        // Labels do not take part in the feedback.
        assert_eq!(tint_of(&graph, label), Tint::WHITE);
    }

    #[test]
    fn test_restarted_blink_keeps_true_original() {
        let mut gpu = GpuResources::default();
        let (mut graph, marker) = graph_with_marker();
        let base = Tint::new(0.0, 0.0, 0.0);
        graph.get_mut(marker).unwrap().renderable = Some(Box::new(MeshRenderable::new(&mut gpu, base)));

        let mut animations = AnimationScheduler::new();
        animations.start_blink(&graph, marker, 200.0, 4);
        animations.tick(150.0, &mut graph);
        animations.start_blink(&graph, marker, 200.0, 4);
        assert_eq!(animations.blinks().len(), 1);

        animations.tick(800.0, &mut graph);
        let tint = graph.get(marker).unwrap().renderable.as_ref().unwrap().tint();
        assert_eq!(tint, base);
    }

    proptest! {
        #[test]
        fn prop_flip_is_monotonic_and_ends_on_target(
            current in -20.0f64..20.0,
            steps in prop::collection::vec(1.0f64..120.0, 1..40),
        ) {
            let mut flip = FlipAnimation::new(EntityHandle(1), Axis::Y, current, TAU, 600.0);
            let mut last = flip.current_angle();
            for step in steps {
                flip.elapsed_ms += step;
                let angle = flip.current_angle();
                prop_assert!(angle >= last);
                last = angle;
            }
            flip.elapsed_ms += 600.0;
            prop_assert_eq!(flip.current_angle(), flip.target_angle);
            prop_assert!((0.0..TAU).contains(&flip.start_angle));
        }
    }
}
