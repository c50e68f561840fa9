// wayfinder_sim/src/simulation/plugins/presentation.rs

//! The host's side of the engine's outputs: events become Bevy events, prizes are
//! redeemed against the store, user-facing messages are logged and placed markers
//! are mirrored as Bevy entities.

use std::collections::HashMap;

use crate::prelude::*;
use crate::simulation::core::app_state::SimulationSet;
use crate::simulation::core::events::BevyEngineEvent;
use crate::simulation::core::resources::{
    now_ms, EngineResource, FrameBudget, RewardStore, ScriptCursor,
};
use crate::simulation::core::transforms::similarity_to_bevy_transform;

// =========================================================================
// == Marker Mirror Components ==
// =========================================================================

/// A Bevy-side copy of one tracked marker.
#[derive(Component, Debug, Clone)]
pub struct MarkerMirror {
    pub anchor: EntityHandle,
    pub point_id: u64,
    pub interaction_count: u32,
}

/// Anchor handle to the Bevy entity mirroring it.
#[derive(Resource, Debug, Default)]
pub struct MirrorIndex(pub HashMap<EntityHandle, Entity>);

pub struct PresentationPlugin;

impl Plugin for PresentationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MirrorIndex>().add_systems(
            FixedUpdate,
            (
                publish_engine_events_system,
                (redeem_prizes_system, user_message_system),
                mirror_markers_system,
                exit_system,
            )
                .chain()
                .in_set(SimulationSet::Presentation),
        );
    }
}

// =========================================================================
// == Event Systems ==
// =========================================================================

fn publish_engine_events_system(
    mut engine: ResMut<EngineResource>,
    mut writer: EventWriter<BevyEngineEvent>,
) {
    for event in engine.0.drain_events() {
        trace!("[EVENT] {:?}", event);
        writer.write(BevyEngineEvent(event));
    }
}

/// Marks a won prize as redeemed: one unit of stock goes and the visitor can no
/// longer win. Returns the stock left, or `None` for a prize not in the catalog.
pub fn redeem(store: &mut CatalogSnapshot, prize: &Prize) -> Option<u32> {
    if let Some(visitor) = store.visitor.as_mut() {
        visitor.has_won_before = true;
    }
    let entry = store.prizes.iter_mut().find(|p| p.id == prize.id)?;
    entry.remaining_stock = entry.remaining_stock.saturating_sub(1);
    Some(entry.remaining_stock)
}

fn redeem_prizes_system(
    mut reader: EventReader<BevyEngineEvent>,
    mut store: ResMut<RewardStore>,
) {
    for BevyEngineEvent(event) in reader.read() {
        let EngineEvent::PrizeWon(won) = event else {
            continue;
        };
        let prize = &won.prize;
        info!(
            "[PRIZE] {} '{}' ({:?}, {}) from {:?}",
            prize.rarity.headline(),
            prize.name,
            prize.rarity,
            prize.rarity.accent_color(),
            won.entity
        );
        match redeem(&mut store.0, prize) {
            Some(left) => info!("[PRIZE] Redeemed '{}', {} left", prize.name, left),
            None => warn!("[PRIZE] '{}' is no longer in the catalog", prize.name),
        }
    }
}

fn user_message_system(mut reader: EventReader<BevyEngineEvent>) {
    for BevyEngineEvent(event) in reader.read() {
        let message = match event {
            EngineEvent::Failure(err) => err.user_message(),
            EngineEvent::NoPrize(reason) => reason.user_message(),
            EngineEvent::Session(session) => {
                info!("[SESSION] {:?}", session);
                None
            }
            EngineEvent::PointSelected(selection) => {
                debug!("[SELECTION] {:?}", selection);
                None
            }
            EngineEvent::PrizeWon(_) => None,
        };
        if let Some(message) = message {
            info!("[UI] {}", message);
        }
    }
}

// =========================================================================
// == Marker Mirroring ==
// =========================================================================

fn mirror_markers_system(
    mut commands: Commands,
    engine: Res<EngineResource>,
    mut index: ResMut<MirrorIndex>,
    mut mirrors: Query<(&mut Transform, &mut MarkerMirror)>,
) {
    let scene = engine.0.scene();

    for tracked in scene.tracked() {
        let Some(world) = tracked
            .marker
            .and_then(|marker| scene.graph().world_transform(marker))
        else {
            continue;
        };
        let transform = similarity_to_bevy_transform(&world);

        match index.0.get(&tracked.entity_id) {
            Some(&entity) => {
                if let Ok((mut current, mut mirror)) = mirrors.get_mut(entity) {
                    *current = transform;
                    mirror.interaction_count = tracked.interaction_count;
                }
            }
            None => {
                debug!(
                    "[MIRROR] Spawning marker for '{}'",
                    tracked.source_point.name
                );
                let entity = commands
                    .spawn((
                        Name::new(tracked.source_point.name.clone()),
                        MarkerMirror {
                            anchor: tracked.entity_id,
                            point_id: tracked.source_point.id,
                            interaction_count: tracked.interaction_count,
                        },
                        transform,
                    ))
                    .id();
                index.0.insert(tracked.entity_id, entity);
            }
        }
    }

    index.0.retain(|anchor, entity| {
        let alive = scene.tracked_entity(*anchor).is_some();
        if !alive {
            commands.entity(*entity).despawn();
        }
        alive
    });
}

/// Stops the app once the scenario's duration or the frame budget is used up.
fn exit_system(
    time: Res<Time>,
    config: Res<ScenarioConfig>,
    budget: Res<FrameBudget>,
    mut cursor: ResMut<ScriptCursor>,
    mut exit: EventWriter<AppExit>,
) {
    cursor.frames += 1;
    let out_of_frames = budget.0.is_some_and(|max| cursor.frames >= max);
    let out_of_time = now_ms(&time) >= config.simulation.duration_seconds * 1000.0;
    if out_of_frames || out_of_time {
        info!(
            "Scenario finished after {} frames ({:.2}s)",
            cursor.frames,
            time.elapsed_secs_f64()
        );
        exit.write(AppExit::Success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prize(id: u64, stock: u32) -> Prize {
        Prize {
            id,
            name: format!("prize-{id}"),
            rarity: Rarity::Common,
            probability: 0.5,
            remaining_stock: stock,
            image_url: None,
            description: None,
        }
    }

    #[test]
    fn test_redeem_spends_stock_and_marks_visitor() {
        let mut store = CatalogSnapshot {
            visitor: Some(VisitorEligibility {
                id: "v-1".into(),
                has_won_before: false,
            }),
            prizes: vec![prize(1, 2), prize(2, 0)],
        };
        assert_eq!(redeem(&mut store, &prize(1, 2)), Some(1));
        assert!(store.visitor.as_ref().unwrap().has_won_before);
        // Stock never wraps.
        assert_eq!(redeem(&mut store, &prize(2, 0)), Some(0));
        assert_eq!(redeem(&mut store, &prize(9, 1)), None);
    }
}
