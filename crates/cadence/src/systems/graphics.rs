//! Keeps each graphics transform's translation on its owner's position.

use cadence_core::{Component, CoreResult, EntityStore, GraphicsComponent};

/// Copies owner positions into graphics transforms.
///
/// Returns the number of transforms written.
///
/// # Errors
///
/// Propagates arena errors, which only occur if the store's spans were
/// reclaimed.
pub fn update(store: &mut EntityStore) -> CoreResult<u32> {
    let count = store.pool::<GraphicsComponent>().len();
    let mut written = 0;
    for i in 0..count as usize {
        let owner = store.components::<GraphicsComponent>()?[i].owner();
        let Some(position) = store.lookup(owner).map(|e| e.position) else {
            continue;
        };
        store.components_mut::<GraphicsComponent>()?[i]
            .transform
            .set_translation(position);
        written += 1;
    }
    Ok(written)
}
