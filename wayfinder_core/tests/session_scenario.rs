// wayfinder_core/tests/session_scenario.rs

//! Drives the engine through a whole visit the way a host would: calibrate,
//! start a session, place markers, interact, end, and start again.

use approx::assert_abs_diff_eq;
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use wayfinder_core::prelude::*;

struct MarkerModel;

impl AssetLoader for MarkerModel {
    fn load(&mut self, path: &str) -> Result<ModelAsset, AssetLoadError> {
        Ok(ModelAsset {
            path: path.to_string(),
            parts: vec![MeshPart {
                name: "pin".into(),
                offset: Vector3::zeros(),
                half_extents: Vector3::new(1.5, 1.5, 1.5),
            }],
        })
    }
}

fn stand_record() -> PointRecord {
    PointRecord {
        id: 12,
        name: "Robotics stand".into(),
        pos_x: 1.0,
        pos_y: 0.0,
        pos_z: 2.0,
    }
}

fn backend() -> CatalogSnapshot {
    CatalogSnapshot {
        visitor: Some(VisitorEligibility {
            id: "visitor-77".into(),
            has_won_before: false,
        }),
        prizes: vec![
            Prize {
                id: 1,
                name: "Keychain".into(),
                rarity: Rarity::Common,
                probability: 0.7,
                remaining_stock: 50,
                image_url: None,
                description: None,
            },
            Prize {
                id: 2,
                name: "Drone".into(),
                rarity: Rarity::UltraRare,
                probability: 0.3,
                remaining_stock: 1,
                image_url: None,
                description: Some("Grand prize".into()),
            },
        ],
    }
}

/// Controller held 1 m above the session origin, looking at the stand's pin.
fn pose_towards_stand(origin: Vector3<f64>) -> Isometry3<f64> {
    let eye = origin + Vector3::new(1.0, 1.0, 0.0);
    // -Z rotated by 180° about Y points along +Z, towards the stand at z = 2.
    Isometry3::from_parts(
        Translation3::from(eye),
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f64::consts::PI),
    )
}

#[test]
fn full_visit_with_session_restart() {
    let mut engine = WayfinderEngine::new(EngineConfig::default());
    let mut rng = ChaCha8Rng::seed_from_u64(2025);
    let backend = backend();

    engine
        .calibrate(&CalibrationResult {
            reference_code: "EXPO-HALL-A".into(),
            timestamp: 1_700_000_000_000.0,
        })
        .unwrap();
    engine.set_points([stand_record()]);
    engine.select_point(PointSelection::All);

    // --- First session ---
    let first_origin = Vector3::new(0.5, 0.0, -0.5);
    let first = engine.start_session(first_origin).unwrap();
    engine.on_hit_test_source(true).unwrap();
    assert_eq!(engine.frames().local_origin(), Some(first_origin));

    engine.frame(16.0);
    engine.frame(1_016.0);
    assert_eq!(engine.fulfil_loads(&mut MarkerModel), 1);

    let entity = engine.scene().find_by_point(12).unwrap();
    let tracked = engine.scene().tracked_entity(entity).unwrap();
    assert_eq!(tracked.local_position, first_origin + Vector3::new(1.0, 0.0, 2.0));
    assert!(tracked.rendered);

    let pose = pose_towards_stand(first_origin);
    let outcomes: Vec<InteractionOutcome> = (0..4)
        .map(|_| engine.select(&pose, &backend, &mut rng))
        .collect();
    assert_eq!(
        outcomes[0],
        InteractionOutcome::Counted { entity, count: 1 }
    );
    assert!(matches!(
        outcomes[2],
        InteractionOutcome::ThresholdReached { selection: Ok(_), .. }
    ));
    assert_eq!(
        outcomes[3],
        InteractionOutcome::Counted { entity, count: 1 }
    );
    assert_eq!(engine.pending_reveals(), 1);

    // Let the flips run to completion on frame time.
    for step in 1..=50 {
        engine.frame(1_016.0 + f64::from(step) * 16.0);
    }
    assert!(engine.animations().flips().is_empty());
    let events = engine.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::PrizeWon(won) if won.entity == entity)));

    assert_eq!(engine.end_session(), Some(first));
    assert!(engine.scene().is_empty());
    assert!(engine.scene().graph().is_empty());
    assert_eq!(engine.scene().gpu_resources().live_count(), 0);
    assert!(engine.animations().is_idle());
    assert!(!engine.is_session_active());
    assert_eq!(engine.frames().local_origin(), None);

    // --- Second session, new tracking zero ---
    let second_origin = Vector3::new(-3.0, 0.0, 4.0);
    let second = engine.start_session(second_origin).unwrap();
    assert_ne!(first, second);
    assert_eq!(engine.frames().local_origin(), Some(second_origin));

    // A fresh session reseeds the animation clock; a late frame is not a huge delta.
    engine.frame(90_000.0);
    engine.frame(91_000.0);
    engine.fulfil_loads(&mut MarkerModel);
    let entity = engine.scene().find_by_point(12).unwrap();
    let tracked = engine.scene().tracked_entity(entity).unwrap();
    assert_abs_diff_eq!(tracked.local_position.x, -2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(tracked.local_position.z, 6.0, epsilon = 1e-12);
    assert_eq!(tracked.interaction_count, 0);

    let events = engine.drain_events();
    assert!(events.contains(&EngineEvent::Session(SessionEvent::Ended(first))));
    assert!(events.contains(&EngineEvent::Session(SessionEvent::Started(second))));
}

#[test]
fn stale_load_after_session_end_is_ignored() {
    let mut engine = WayfinderEngine::default();
    engine
        .calibrate(&CalibrationResult {
            reference_code: "EXPO-HALL-A".into(),
            timestamp: 0.0,
        })
        .unwrap();
    engine.set_points([stand_record()]);
    engine.select_point(PointSelection::All);

    engine.start_session(Vector3::zeros()).unwrap();
    engine.frame(0.0);
    engine.frame(1_000.0);
    let requests = engine.take_load_requests();
    assert_eq!(requests.len(), 1);

    engine.end_session();
    let late = engine.complete_load(requests[0].ticket, MarkerModel.load(&requests[0].path));
    assert!(late.is_none());
    assert!(engine.scene().graph().is_empty());
}

#[test]
fn already_won_visitor_gets_no_prize_and_no_message() {
    let mut engine = WayfinderEngine::default();
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let mut backend = backend();
    backend.visitor = Some(VisitorEligibility {
        id: "visitor-77".into(),
        has_won_before: true,
    });

    engine
        .calibrate(&CalibrationResult {
            reference_code: "EXPO-HALL-A".into(),
            timestamp: 0.0,
        })
        .unwrap();
    engine.set_points([stand_record()]);
    engine.select_point(PointSelection::All);
    engine.start_session(Vector3::zeros()).unwrap();
    engine.frame(0.0);
    engine.frame(1_000.0);
    engine.fulfil_loads(&mut MarkerModel);
    engine.drain_events();

    let pose = pose_towards_stand(Vector3::zeros());
    for _ in 0..3 {
        engine.select(&pose, &backend, &mut rng);
    }
    let events = engine.drain_events();
    assert_eq!(events, vec![EngineEvent::NoPrize(NoEligiblePrize::AlreadyWon)]);
    assert_eq!(NoEligiblePrize::AlreadyWon.user_message(), None);
    assert_eq!(engine.pending_reveals(), 0);
}
