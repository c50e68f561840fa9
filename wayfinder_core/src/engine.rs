// wayfinder_core/src/engine.rs

//! The single-threaded facade a host drives: it owns one instance of every
//! component and the current session, and turns host callbacks (calibration,
//! session lifecycle, frames, pointer selects, sensor samples, asset loads) into
//! component calls plus a queue of [`EngineEvent`]s.

use nalgebra::{Isometry3, Vector3};
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::animation::AnimationScheduler;
use crate::compass::{CompassBearingEngine, PointBearing, SensorStatus};
use crate::config::EngineConfig;
use crate::error::{AssetLoadError, Result, WayfinderError};
use crate::frames::{ReferenceFrameManager, SpatialPoint};
use crate::interaction::{InteractionEngine, InteractionOutcome};
use crate::messages::{
    CalibrationResult, EngineEvent, PointRecord, PointSelection, PrizeWon, SessionEvent,
};
use crate::reward::RewardBackend;
use crate::scene::assets::{AssetLoader, LoadRequest, LoadTicket, ModelAsset};
use crate::scene::SceneObjectManager;
use crate::session::{HitTestState, SessionContext, TimerQueue};
use crate::types::{EntityHandle, Ray, SessionId};

#[derive(Debug)]
pub struct WayfinderEngine {
    config: EngineConfig,
    frames: ReferenceFrameManager,
    scene: SceneObjectManager,
    animations: AnimationScheduler,
    interaction: InteractionEngine,
    compass: CompassBearingEngine,

    session: Option<SessionContext>,
    next_session: u64,
    /// Markers have been placed for the current session at least once.
    placed: bool,

    points: Vec<SpatialPoint>,
    selection: Option<PointSelection>,

    /// Session whose placement delay starts on its first frame.
    placement_pending: Option<SessionId>,
    placement_timers: TimerQueue<()>,
    reveal_timers: TimerQueue<PrizeWon>,
    pending_loads: Vec<LoadRequest>,
    clock_ms: f64,
    events: Vec<EngineEvent>,
}

impl Default for WayfinderEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl WayfinderEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            frames: ReferenceFrameManager::new(),
            scene: SceneObjectManager::new(config.placement.clone()),
            animations: AnimationScheduler::new(),
            interaction: InteractionEngine::new(config.interaction.clone()),
            compass: CompassBearingEngine::new(&config.compass),
            session: None,
            next_session: 0,
            placed: false,
            points: Vec::new(),
            selection: None,
            placement_pending: None,
            placement_timers: TimerQueue::default(),
            reveal_timers: TimerQueue::default(),
            pending_loads: Vec::new(),
            clock_ms: 0.0,
            events: Vec::new(),
            config,
        }
    }

    // --- Calibration & Points ---

    /// Accepts a scanned calibration code. Recalibrating during a session re-anchors
    /// the origin to that session's zero.
    pub fn calibrate(&mut self, calibration: &CalibrationResult) -> Result<()> {
        if let Err(err) = self.frames.calibrate(calibration) {
            warn!("Calibration rejected: {}", err);
            self.events.push(EngineEvent::Failure(err.clone()));
            return Err(err);
        }
        if let Some(session) = self.session.as_ref().filter(|s| s.is_active()) {
            self.frames.establish_origin(session)?;
        }
        Ok(())
    }

    /// Replaces the available points, as filtered by the active reference code.
    pub fn set_points(&mut self, records: impl IntoIterator<Item = PointRecord>) {
        self.points = records.into_iter().map(SpatialPoint::from).collect();
        debug!("{} points available", self.points.len());
    }

    /// Chooses what to guide the visitor to. Once markers are placed in the current
    /// session, the scene follows the new selection immediately.
    pub fn select_point(&mut self, selection: PointSelection) {
        match &selection {
            PointSelection::Single(point) => info!("Selected point '{}'", point.name),
            PointSelection::All => info!("Selected all points"),
        }
        self.events
            .push(EngineEvent::PointSelected(selection.clone()));
        self.selection = Some(selection);
        if self.placed {
            self.sync_markers();
        }
    }

    /// The points the current selection expands to.
    pub fn selected_points(&self) -> Vec<SpatialPoint> {
        match &self.selection {
            Some(PointSelection::All) => self.points.clone(),
            Some(PointSelection::Single(point)) => vec![point.clone()],
            None => Vec::new(),
        }
    }

    // --- Session Lifecycle ---

    /// Starts an AR session whose tracking space has its zero at `local_space_origin`.
    /// Any running session is ended first. Marker placement is deferred by the
    /// configured delay, counted from the session's first frame.
    pub fn start_session(&mut self, local_space_origin: Vector3<f64>) -> Result<SessionId> {
        if !self.frames.is_calibrated() {
            error!("Cannot start a session before calibration");
            self.events
                .push(EngineEvent::Failure(WayfinderError::NotCalibrated));
            return Err(WayfinderError::NotCalibrated);
        }
        self.end_session();

        self.next_session += 1;
        let id = SessionId(self.next_session);
        let session = SessionContext::new(id, local_space_origin);
        let origin = self.frames.establish_origin(&session)?;

        self.animations.clear();
        self.placed = false;
        // The last frame seen belongs to the previous render loop.
        self.placement_pending = Some(id);
        self.session = Some(session);
        self.events
            .push(EngineEvent::Session(SessionEvent::Started(id)));
        info!("Session {:?} started, origin {:?}", id, origin);
        Ok(id)
    }

    /// Outcome of the hit-test source request issued at session start. A session
    /// that cannot provide one loses spatial anchoring: pending placement is cancelled
    /// and the failure is surfaced.
    pub fn on_hit_test_source(&mut self, available: bool) -> Result<()> {
        let session = self
            .session
            .as_mut()
            .filter(|s| s.is_active())
            .ok_or(WayfinderError::SessionInactive)?;

        if available {
            session.hit_test = HitTestState::Ready;
            debug!("Hit-test source ready for {:?}", session.id);
            return Ok(());
        }

        session.hit_test = HitTestState::Unavailable;
        error!("Session {:?} has no hit-test source; markers will not be placed", session.id);
        self.placement_pending = None;
        self.placement_timers.drain_all();
        self.events
            .push(EngineEvent::Failure(WayfinderError::HitTestUnavailable));
        Err(WayfinderError::HitTestUnavailable)
    }

    /// Tears the current session down: the frame loop stops, the hit-test request is
    /// cancelled, every marker is disposed and session timers are dropped. Prize
    /// reveals still waiting are released right away.
    pub fn end_session(&mut self) -> Option<SessionId> {
        let mut session = self.session.take()?;
        session.end();

        let released = self.scene.dispose_all();
        self.animations.clear();
        self.frames.release_session(session.id);
        self.placement_pending = None;
        self.placement_timers.drain_all();
        self.pending_loads.clear();
        self.placed = false;

        for reveal in self.reveal_timers.drain_all() {
            self.events.push(EngineEvent::PrizeWon(reveal));
        }
        self.events
            .push(EngineEvent::Session(SessionEvent::Ended(session.id)));
        info!(
            "Session {:?} ended, released {} graphics resources",
            session.id, released
        );
        Some(session.id)
    }

    // --- Frame Loop ---

    /// One tick of the render loop at host time `timestamp_ms`.
    pub fn frame(&mut self, timestamp_ms: f64) {
        self.clock_ms = timestamp_ms;
        let live = self.session.as_ref().filter(|s| s.is_active()).map(|s| s.id);

        if live.is_some() {
            if self.placement_pending == live {
                self.placement_pending = None;
                self.placement_timers.schedule(
                    timestamp_ms,
                    self.config.placement.delay_ms,
                    live,
                    (),
                );
            }
            self.animations.frame(timestamp_ms, self.scene.graph_mut());
            if !self
                .placement_timers
                .drain_due(timestamp_ms, live)
                .is_empty()
            {
                self.placed = true;
                self.sync_markers();
            }
        }

        for reveal in self.reveal_timers.drain_due(timestamp_ms, live) {
            info!("Revealing prize '{}'", reveal.prize.name);
            self.events.push(EngineEvent::PrizeWon(reveal));
        }
    }

    /// Makes the markers match the selection: deselected points lose their marker,
    /// newly selected ones are anchored and queued for loading.
    fn sync_markers(&mut self) {
        let Some(session) = self.session.as_ref().filter(|s| s.is_active()) else {
            return;
        };
        if session.hit_test == HitTestState::Unavailable {
            return;
        }

        let desired = self.selected_points();
        let stale: Vec<u64> = self
            .scene
            .tracked()
            .map(|entity| entity.source_point.id)
            .filter(|id| !desired.iter().any(|p| p.id == *id))
            .collect();
        for point_id in stale {
            self.scene.remove_point(point_id);
        }

        match self.scene.instantiate(session, &self.frames, &desired) {
            Ok(requests) => self.pending_loads.extend(requests),
            Err(err) => {
                error!("Marker placement failed: {}", err);
                self.events.push(EngineEvent::Failure(err));
            }
        }
    }

    // --- Asset Loading ---

    /// Model loads requested since the last call. The host resolves them and reports
    /// back through [`complete_load`](Self::complete_load).
    pub fn take_load_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.pending_loads)
    }

    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: std::result::Result<ModelAsset, AssetLoadError>,
    ) -> Option<EntityHandle> {
        self.scene.complete_load(ticket, result)
    }

    /// Resolves every pending load synchronously through `loader`.
    pub fn fulfil_loads(&mut self, loader: &mut dyn AssetLoader) -> usize {
        self.take_load_requests()
            .into_iter()
            .filter_map(|request| {
                let result = loader.load(&request.path);
                self.complete_load(request.ticket, result)
            })
            .count()
    }

    // --- Interaction ---

    /// A select event from a tracked controller at `pose`.
    pub fn select<R: Rng + ?Sized>(
        &mut self,
        pose: &Isometry3<f64>,
        backend: &dyn RewardBackend,
        rng: &mut R,
    ) -> InteractionOutcome {
        self.select_ray(&Ray::from_pose(pose), backend, rng)
    }

    pub fn select_ray<R: Rng + ?Sized>(
        &mut self,
        ray: &Ray,
        backend: &dyn RewardBackend,
        rng: &mut R,
    ) -> InteractionOutcome {
        let Some(session) = self.session.as_ref() else {
            return InteractionOutcome::Ignored;
        };
        let outcome = self.interaction.handle_select(
            session,
            ray,
            &mut self.scene,
            &mut self.animations,
            backend,
            rng,
        );

        if let InteractionOutcome::ThresholdReached { entity, selection } = &outcome {
            match selection {
                Ok(prize) => self.reveal_timers.schedule(
                    self.clock_ms,
                    self.config.interaction.prize_reveal_delay_ms,
                    None,
                    PrizeWon {
                        entity: *entity,
                        prize: prize.clone(),
                    },
                ),
                Err(reason) => self.events.push(EngineEvent::NoPrize(*reason)),
            }
        }
        outcome
    }

    // --- Compass ---

    /// Feeds one orientation event. `None` samples are ignored.
    pub fn compass_sample(&mut self, raw_heading_degrees: Option<f64>) -> Result<Option<f64>> {
        self.compass.on_sample(raw_heading_degrees)
    }

    pub fn compass_permission(&mut self, granted: bool) -> Result<()> {
        let was_unavailable = self.compass.status() == SensorStatus::Unavailable;
        let result = self.compass.on_permission(granted);
        if let Err(err) = &result {
            if !was_unavailable {
                self.events.push(EngineEvent::Failure(err.clone()));
            }
        }
        result
    }

    /// The platform has no orientation API at all.
    pub fn compass_unavailable(&mut self) {
        if self.compass.status() != SensorStatus::Unavailable {
            self.compass.mark_unavailable();
            self.events
                .push(EngineEvent::Failure(WayfinderError::SensorUnavailable));
        }
    }

    /// Bearings from `user_position` to every available point.
    pub fn bearings(&self, user_position: &Vector3<f64>) -> Vec<PointBearing> {
        self.compass.bearings_to(&self.points, user_position)
    }

    // --- Accessors ---

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    pub fn is_session_active(&self) -> bool {
        self.session.as_ref().is_some_and(SessionContext::is_active)
    }

    pub fn frames(&self) -> &ReferenceFrameManager {
        &self.frames
    }

    pub fn scene(&self) -> &SceneObjectManager {
        &self.scene
    }

    pub fn animations(&self) -> &AnimationScheduler {
        &self.animations
    }

    pub fn compass(&self) -> &CompassBearingEngine {
        &self.compass
    }

    pub fn points(&self) -> &[SpatialPoint] {
        &self.points
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn pending_reveals(&self) -> usize {
        self.reveal_timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::VisitorEligibility;
    use crate::reward::{CatalogSnapshot, Prize, Rarity};
    use nalgebra::Point3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct NoModel;

    impl AssetLoader for NoModel {
        fn load(&mut self, path: &str) -> std::result::Result<ModelAsset, AssetLoadError> {
            Err(AssetLoadError::Timeout(path.to_string()))
        }
    }

    fn calibrated_engine() -> WayfinderEngine {
        let mut engine = WayfinderEngine::default();
        engine
            .calibrate(&CalibrationResult {
                reference_code: "EXPO-2025".into(),
                timestamp: 0.0,
            })
            .unwrap();
        engine.set_points([PointRecord {
            id: 1,
            name: "Stage".into(),
            pos_x: 0.0,
            pos_y: 0.0,
            pos_z: -2.0,
        }]);
        engine.select_point(PointSelection::All);
        engine
    }

    fn backend() -> CatalogSnapshot {
        CatalogSnapshot {
            visitor: Some(VisitorEligibility {
                id: "v-1".into(),
                has_won_before: false,
            }),
            prizes: vec![Prize {
                id: 5,
                name: "Sticker".into(),
                rarity: Rarity::Rare,
                probability: 0.5,
                remaining_stock: 3,
                image_url: None,
                description: None,
            }],
        }
    }

    #[test]
    fn test_session_requires_calibration() {
        let mut engine = WayfinderEngine::default();
        assert_eq!(
            engine.start_session(Vector3::zeros()),
            Err(WayfinderError::NotCalibrated)
        );
        assert_eq!(
            engine.drain_events(),
            vec![EngineEvent::Failure(WayfinderError::NotCalibrated)]
        );
    }

    #[test]
    fn test_placement_waits_for_delay() {
        let mut engine = calibrated_engine();
        engine.start_session(Vector3::zeros()).unwrap();
        engine.frame(0.0);
        engine.frame(500.0);
        assert!(engine.take_load_requests().is_empty());
        engine.frame(1000.0);
        assert_eq!(engine.take_load_requests().len(), 1);
    }

    #[test]
    fn test_placement_delay_restarts_after_idle_gap() {
        let mut engine = calibrated_engine();
        engine.frame(0.0);
        engine.start_session(Vector3::zeros()).unwrap();
        engine.frame(1000.0);
        engine.frame(2000.0);
        assert_eq!(engine.take_load_requests().len(), 1);
        engine.end_session();

        // No frames run between sessions; the clock is stale when the next one starts.
        engine.start_session(Vector3::zeros()).unwrap();
        engine.frame(90_000.0);
        assert!(engine.take_load_requests().is_empty());
        engine.frame(90_500.0);
        assert!(engine.take_load_requests().is_empty());
        engine.frame(91_000.0);
        assert_eq!(engine.take_load_requests().len(), 1);
    }

    #[test]
    fn test_first_session_delay_ignores_large_host_clock() {
        let mut engine = calibrated_engine();
        engine.start_session(Vector3::zeros()).unwrap();
        engine.frame(1_700_000_000_000.0);
        assert!(engine.take_load_requests().is_empty());
        engine.frame(1_700_000_001_000.0);
        assert_eq!(engine.take_load_requests().len(), 1);
    }

    #[test]
    fn test_missing_hit_test_source_cancels_placement() {
        let mut engine = calibrated_engine();
        engine.start_session(Vector3::zeros()).unwrap();
        engine.drain_events();

        assert_eq!(
            engine.on_hit_test_source(false),
            Err(WayfinderError::HitTestUnavailable)
        );
        engine.frame(2000.0);
        assert!(engine.take_load_requests().is_empty());
        assert!(engine.scene().is_empty());
        assert_eq!(
            engine.drain_events(),
            vec![EngineEvent::Failure(WayfinderError::HitTestUnavailable)]
        );
    }

    #[test]
    fn test_prize_is_revealed_after_delay() {
        let mut engine = calibrated_engine();
        engine.start_session(Vector3::zeros()).unwrap();
        engine.frame(0.0);
        engine.frame(1000.0);
        assert_eq!(engine.fulfil_loads(&mut NoModel), 1);
        engine.drain_events();

        let ray = Ray::new(Point3::new(0.0, 0.05, 0.0), -Vector3::z()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..3 {
            engine.select_ray(&ray, &backend(), &mut rng);
        }
        assert_eq!(engine.pending_reveals(), 1);

        engine.frame(1500.0);
        assert!(engine.drain_events().is_empty());
        engine.frame(1700.0);
        match engine.drain_events().as_slice() {
            [EngineEvent::PrizeWon(won)] => assert_eq!(won.prize.id, 5),
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn test_deselecting_removes_marker() {
        let mut engine = calibrated_engine();
        engine.start_session(Vector3::zeros()).unwrap();
        engine.frame(0.0);
        engine.frame(1000.0);
        engine.fulfil_loads(&mut NoModel);
        assert_eq!(engine.scene().len(), 1);

        engine.select_point(PointSelection::Single(SpatialPoint {
            id: 99,
            name: "Elsewhere".into(),
            absolute_position: Vector3::new(4.0, 0.0, 0.0),
        }));
        assert_eq!(engine.scene().len(), 1);
        assert!(engine.scene().find_by_point(1).is_none());
        assert!(engine.scene().find_by_point(99).is_some());
    }

    #[test]
    fn test_denied_compass_permission_reports_once() {
        let mut engine = WayfinderEngine::default();
        assert!(engine.compass_permission(false).is_err());
        assert!(engine.compass_permission(false).is_err());
        engine.compass_unavailable();
        assert_eq!(
            engine.drain_events(),
            vec![EngineEvent::Failure(WayfinderError::SensorUnavailable)]
        );
    }
}
