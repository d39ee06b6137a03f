//! # Targeting System
//!
//! Flies an entity from its start point to another entity along an arch.
//! The arch is a parabola over the straight line, bulging along
//! `arch_normal` with peak `height` at the midpoint. The target's current
//! position is re-read every frame, so the flight follows a moving target.
//!
//! On impact (remaining time at or below zero) or if the target no longer
//! exists, the flier posts `Destroy` for itself.

use cadence_core::{Component, CoreResult, EntityStore, TargetingComponent};

use crate::events::{FrameEvent, FrameEvents};

/// Height factor of the arch at flight progress `t`; 1 at the midpoint.
#[inline]
fn arch(t: f32) -> f32 {
    4.0 * t * (1.0 - t)
}

/// Advances every flight by `dt` seconds.
///
/// Returns the number of `Destroy` events posted.
///
/// # Errors
///
/// Propagates arena errors, which only occur if the store's spans were
/// reclaimed.
pub fn update(store: &mut EntityStore, dt: f32, events: &mut FrameEvents) -> CoreResult<u32> {
    let count = store.pool::<TargetingComponent>().len();
    let mut posted = 0;

    for i in 0..count as usize {
        let mut flight = store.components::<TargetingComponent>()?[i];
        let owner = flight.owner();

        let Some(goal) = store.lookup(flight.target()).map(|e| e.position) else {
            if events.post(&mut store.scratch(), FrameEvent::Destroy { entity: owner }) {
                posted += 1;
            }
            continue;
        };

        flight.remaining -= dt;
        let t = flight.progress();
        let position = flight.start.lerp(goal, t) + flight.arch_normal * (flight.height * arch(t));
        if let Some(entity) = store.lookup_mut(owner) {
            entity.position = position;
        }
        store.components_mut::<TargetingComponent>()?[i] = flight;

        if flight.remaining <= 0.0
            && events.post(&mut store.scratch(), FrameEvent::Destroy { entity: owner })
        {
            posted += 1;
        }
    }
    Ok(posted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{Arena, Handle, StoreConfig};
    use cadence_shared::Vec3;

    fn setup() -> (EntityStore, Handle, Handle) {
        let config = StoreConfig::default();
        let mut store =
            EntityStore::new(Arena::new(config.required_bytes() + 1024), config).unwrap();
        let target = store.spawn_at(Vec3::new(10.0, 0.0, 0.0)).unwrap();
        let flier = store.spawn_at(Vec3::ZERO).unwrap();
        store
            .attach(
                flier,
                TargetingComponent::new(Vec3::ZERO, target, Vec3::Y, 2.0, 1.0),
            )
            .unwrap();
        (store, flier, target)
    }

    #[test]
    fn test_arch_peaks_at_midpoint() {
        let (mut store, flier, _) = setup();
        let mut events = FrameEvents::new(&mut store.scratch(), 4).unwrap();

        assert_eq!(update(&mut store, 0.5, &mut events).unwrap(), 0);
        let p = store.lookup(flier).unwrap().position;
        assert!((p.x - 5.0).abs() < 1e-5);
        assert!((p.y - 2.0).abs() < 1e-5);
        assert!(events.is_empty());
    }

    #[test]
    fn test_impact_posts_destroy_for_owner() {
        let (mut store, flier, target) = setup();
        let mut events = FrameEvents::new(&mut store.scratch(), 4).unwrap();

        update(&mut store, 0.5, &mut events).unwrap();
        assert_eq!(update(&mut store, 0.5, &mut events).unwrap(), 1);
        let p = store.lookup(flier).unwrap().position;
        assert_eq!(p, store.lookup(target).unwrap().position);
        assert_eq!(
            events.get(store.arena(), 0),
            Some(FrameEvent::Destroy { entity: flier })
        );
    }

    #[test]
    fn test_missing_target_posts_destroy() {
        let (mut store, flier, target) = setup();
        store.destroy(target).unwrap();
        let mut events = FrameEvents::new(&mut store.scratch(), 4).unwrap();

        assert_eq!(update(&mut store, 0.1, &mut events).unwrap(), 1);
        assert_eq!(
            events.get(store.arena(), 0),
            Some(FrameEvent::Destroy { entity: flier })
        );
    }
}
