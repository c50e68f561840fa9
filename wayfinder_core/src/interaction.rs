// wayfinder_core/src/interaction.rs

use rand::Rng;
use tracing::{debug, info};

use crate::animation::AnimationScheduler;
use crate::config::InteractionConfig;
use crate::reward::{NoEligiblePrize, Prize, RewardBackend, RewardSelectionEngine};
use crate::scene::SceneObjectManager;
use crate::session::SessionContext;
use crate::types::{EntityHandle, Ray};

/// What a single select event amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    /// The session is not active; nothing was evaluated.
    Ignored,
    /// The ray did not resolve to a tracked marker.
    Missed,
    /// The marker's counter advanced without reaching the threshold.
    Counted { entity: EntityHandle, count: u32 },
    /// The threshold was reached, the counter reset and a reward draw ran.
    ThresholdReached {
        entity: EntityHandle,
        selection: Result<Prize, NoEligiblePrize>,
    },
}

/// Counts resolved interactions per marker and turns every third one into a reward draw.
#[derive(Debug, Default)]
pub struct InteractionEngine {
    config: InteractionConfig,
    reward: RewardSelectionEngine,
}

impl InteractionEngine {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            reward: RewardSelectionEngine::new(),
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Resolves `ray` against the interactable markers and applies the interaction to
    /// the nearest one.
    pub fn handle_select<R: Rng + ?Sized>(
        &self,
        session: &SessionContext,
        ray: &Ray,
        scene: &mut SceneObjectManager,
        animations: &mut AnimationScheduler,
        backend: &dyn RewardBackend,
        rng: &mut R,
    ) -> InteractionOutcome {
        if !session.is_active() {
            debug!("Select ignored: session {:?} is not active", session.id);
            return InteractionOutcome::Ignored;
        }
        match scene.pick(ray) {
            Some(entity) => self.interact(session, entity, scene, animations, backend, rng),
            None => InteractionOutcome::Missed,
        }
    }

    /// Applies one resolved interaction to `entity`: count, flip, and on threshold
    /// blink, reset and draw.
    pub fn interact<R: Rng + ?Sized>(
        &self,
        session: &SessionContext,
        entity: EntityHandle,
        scene: &mut SceneObjectManager,
        animations: &mut AnimationScheduler,
        backend: &dyn RewardBackend,
        rng: &mut R,
    ) -> InteractionOutcome {
        if !session.is_active() {
            return InteractionOutcome::Ignored;
        }
        let Some(tracked) = scene.tracked_entity_mut(entity) else {
            return InteractionOutcome::Missed;
        };
        let Some(marker) = tracked.marker else {
            // Still waiting on its model; nothing visible to interact with.
            return InteractionOutcome::Missed;
        };

        tracked.interaction_count += 1;
        let count = tracked.interaction_count;
        let reached = count >= self.config.threshold;
        if reached {
            tracked.interaction_count = 0;
        }
        let name = tracked.source_point.name.clone();

        animations.start_flip(
            scene.graph(),
            marker,
            self.config.flip_axis,
            self.config.flip_angle,
            self.config.flip_duration_ms,
        );

        if !reached {
            debug!("Interaction {} on '{}'", count, name);
            return InteractionOutcome::Counted { entity, count };
        }

        animations.start_blink(
            scene.graph(),
            marker,
            self.config.blink_half_cycle_ms,
            self.config.blink_flashes,
        );
        let selection = self.reward.select_from(backend, rng);
        match &selection {
            Ok(prize) => info!("'{}' reached the threshold and won '{}'", name, prize.name),
            Err(reason) => info!("'{}' reached the threshold without a prize: {}", name, reason),
        }
        InteractionOutcome::ThresholdReached { entity, selection }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlacementConfig;
    use crate::error::AssetLoadError;
    use crate::frames::{ReferenceFrameManager, SpatialPoint};
    use crate::messages::{CalibrationResult, VisitorEligibility};
    use crate::reward::{CatalogSnapshot, Rarity};
    use crate::scene::assets::{AssetLoader, ModelAsset};
    use crate::types::SessionId;
    use nalgebra::{Point3, Vector3};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Unavailable;

    impl AssetLoader for Unavailable {
        fn load(&mut self, path: &str) -> Result<ModelAsset, AssetLoadError> {
            Err(AssetLoadError::Missing(path.to_string()))
        }
    }

    struct Fixture {
        session: SessionContext,
        scene: SceneObjectManager,
        animations: AnimationScheduler,
        entity: EntityHandle,
    }

    fn fixture() -> Fixture {
        let session = SessionContext::new(SessionId(1), Vector3::zeros());
        let mut frames = ReferenceFrameManager::new();
        frames
            .calibrate(&CalibrationResult {
                reference_code: "EXPO-2025".into(),
                timestamp: 0.0,
            })
            .unwrap();
        frames.establish_origin(&session).unwrap();

        let mut scene = SceneObjectManager::new(PlacementConfig::default());
        let point = SpatialPoint {
            id: 1,
            name: "Info desk".into(),
            absolute_position: Vector3::new(0.0, 0.0, -2.0),
        };
        let entity = scene
            .instantiate_with(&session, &frames, &[point], &mut Unavailable)
            .unwrap()[0];
        Fixture {
            session,
            scene,
            animations: AnimationScheduler::new(),
            entity,
        }
    }

    fn backend() -> CatalogSnapshot {
        CatalogSnapshot {
            visitor: Some(VisitorEligibility {
                id: "v-1".into(),
                has_won_before: false,
            }),
            prizes: vec![Prize {
                id: 1,
                name: "Tote bag".into(),
                rarity: Rarity::Common,
                probability: 1.0,
                remaining_stock: 10,
                image_url: None,
                description: None,
            }],
        }
    }

    fn cube_ray() -> Ray {
        // The fallback cube sits 5 cm above the anchor, 2 m ahead.
        Ray::new(Point3::new(0.0, 0.05, 0.0), -Vector3::z()).unwrap()
    }

    #[test]
    fn test_three_interactions_trigger_one_draw_and_reset() {
        let mut f = fixture();
        let engine = InteractionEngine::new(InteractionConfig::default());
        let backend = backend();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut select = |f: &mut Fixture| {
            engine.handle_select(
                &f.session,
                &cube_ray(),
                &mut f.scene,
                &mut f.animations,
                &backend,
                &mut rng,
            )
        };

        assert_eq!(
            select(&mut f),
            InteractionOutcome::Counted { entity: f.entity, count: 1 }
        );
        assert_eq!(
            select(&mut f),
            InteractionOutcome::Counted { entity: f.entity, count: 2 }
        );
        match select(&mut f) {
            InteractionOutcome::ThresholdReached { entity, selection } => {
                assert_eq!(entity, f.entity);
                assert_eq!(selection.unwrap().id, 1);
            }
            other => panic!("expected threshold, got {other:?}"),
        }
        assert_eq!(f.scene.tracked_entity(f.entity).unwrap().interaction_count, 0);
        assert_eq!(
            select(&mut f),
            InteractionOutcome::Counted { entity: f.entity, count: 1 }
        );

        // One flip per interaction, one blink for the threshold.
        assert_eq!(f.animations.flips().len(), 4);
        assert_eq!(f.animations.blinks().len(), 1);
    }

    #[test]
    fn test_threshold_without_prize_still_resets() {
        let mut f = fixture();
        let engine = InteractionEngine::new(InteractionConfig::default());
        let backend = CatalogSnapshot {
            visitor: None,
            prizes: Vec::new(),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let outcomes: Vec<_> = (0..3)
            .map(|_| {
                engine.interact(
                    &f.session,
                    f.entity,
                    &mut f.scene,
                    &mut f.animations,
                    &backend,
                    &mut rng,
                )
            })
            .collect();
        assert_eq!(
            outcomes[2],
            InteractionOutcome::ThresholdReached {
                entity: f.entity,
                selection: Err(NoEligiblePrize::UnknownVisitor),
            }
        );
        assert_eq!(f.scene.tracked_entity(f.entity).unwrap().interaction_count, 0);
        assert_eq!(f.animations.blinks().len(), 1);
    }

    #[test]
    fn test_inactive_session_changes_nothing() {
        let mut f = fixture();
        f.session.end();
        let engine = InteractionEngine::new(InteractionConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let outcome = engine.handle_select(
            &f.session,
            &cube_ray(),
            &mut f.scene,
            &mut f.animations,
            &backend(),
            &mut rng,
        );
        assert_eq!(outcome, InteractionOutcome::Ignored);
        assert_eq!(f.scene.tracked_entity(f.entity).unwrap().interaction_count, 0);
        assert!(f.animations.is_idle());
    }

    #[test]
    fn test_ray_missing_every_marker() {
        let mut f = fixture();
        let engine = InteractionEngine::new(InteractionConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let away = Ray::new(Point3::origin(), Vector3::z()).unwrap();
        let outcome = engine.handle_select(
            &f.session,
            &away,
            &mut f.scene,
            &mut f.animations,
            &backend(),
            &mut rng,
        );
        assert_eq!(outcome, InteractionOutcome::Missed);
        assert!(f.animations.is_idle());
    }
}
