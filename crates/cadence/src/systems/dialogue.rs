//! Counts dialogue lines down and takes them off screen when their time is up.

use cadence_core::{Component, CoreResult, DialogueComponent, EntityStore};

/// Advances every dialogue line by `dt` seconds and detaches expired ones.
///
/// Returns the number of lines removed.
///
/// # Errors
///
/// Propagates arena errors, which only occur if the store's spans were
/// reclaimed.
pub fn update(store: &mut EntityStore, dt: f32) -> CoreResult<u32> {
    let mut expired = 0;
    // Back to front: a detach moves the tail, which has already been visited.
    for i in (0..store.pool::<DialogueComponent>().len() as usize).rev() {
        let line = &mut store.components_mut::<DialogueComponent>()?[i];
        line.remaining -= dt;
        if !line.has_expired() {
            continue;
        }
        let owner = line.owner();
        store.detach(owner, DialogueComponent::KIND)?;
        expired += 1;
    }
    Ok(expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{Arena, StoreConfig};
    use cadence_shared::Vec3;

    #[test]
    fn test_lines_expire_in_any_pool_order() {
        let config = StoreConfig::default();
        let mut store = EntityStore::new(Arena::new(config.required_bytes()), config).unwrap();
        let short = store.spawn_at(Vec3::ZERO).unwrap();
        let long = store.spawn_at(Vec3::ZERO).unwrap();
        let also_short = store.spawn_at(Vec3::ZERO).unwrap();
        store.attach(short, DialogueComponent::new(1, 0.5)).unwrap();
        store.attach(long, DialogueComponent::new(2, 2.0)).unwrap();
        store.attach(also_short, DialogueComponent::new(3, 0.5)).unwrap();

        assert_eq!(update(&mut store, 0.25).unwrap(), 0);
        assert_eq!(update(&mut store, 0.25).unwrap(), 2);

        assert!(store.component::<DialogueComponent>(short).is_none());
        assert!(store.component::<DialogueComponent>(also_short).is_none());
        let left = store.component::<DialogueComponent>(long).unwrap();
        assert_eq!(left.line, 2);
        assert!((left.remaining - 1.5).abs() < 1e-6);
        store.verify().unwrap();
    }
}
