//! # Entity Store Invariant Tests
//!
//! Drives the store through long seeded sequences of create, attach, detach
//! and destroy, checking after every step that:
//!
//! 1. Every attached slot points at a component owned by that entity
//! 2. Every pool element's owner points back at it
//! 3. Pool lengths match the number of attached entities
//! 4. Scratch use on the top front never disturbs the bottom front
//!
//! Run with: cargo test --test store_invariants -- --nocapture

use cadence_core::{
    Arena, ComponentKind, CoreError, DialogueComponent, EntityStore, GraphicsComponent, Handle,
    MovementComponent, StoreConfig, TargetingComponent,
};
use cadence_shared::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const STEPS: usize = 5_000;

fn config() -> StoreConfig {
    StoreConfig {
        max_entities: 32,
        graphics_capacity: 32,
        movement_capacity: 16,
        targeting_capacity: 8,
        dialogue_capacity: 4,
    }
}

fn new_store(scratch_bytes: usize) -> EntityStore {
    let config = config();
    EntityStore::new(Arena::new(config.required_bytes() + scratch_bytes), config).unwrap()
}

fn attach_kind(store: &mut EntityStore, h: Handle, kind: ComponentKind) -> Result<u32, CoreError> {
    match kind {
        ComponentKind::Graphics => store.attach(h, GraphicsComponent::default()),
        ComponentKind::Movement => store.attach(h, MovementComponent::new(Vec3::X, 1.0)),
        ComponentKind::Targeting => store.attach(
            h,
            TargetingComponent::new(Vec3::ZERO, h, Vec3::Y, 1.0, 1.0),
        ),
        ComponentKind::Dialogue => store.attach(h, DialogueComponent::new(0, 1.0)),
    }
}

fn assert_pool_lengths(store: &EntityStore) {
    for kind in ComponentKind::ALL {
        let attached = store.iter_alive().filter(|e| e.has(kind)).count();
        assert_eq!(
            store.pools().len(kind) as usize,
            attached,
            "{kind} pool length drifted"
        );
    }
}

#[test]
fn randomized_operations_keep_back_references_consistent() {
    for seed in [1u64, 7, 0xC0FFEE, 0xDEAD_BEEF] {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut store = new_store(0);
        let mut live: Vec<Handle> = Vec::new();

        for step in 0..STEPS {
            match rng.gen_range(0..10) {
                0..=2 => match store.create() {
                    Ok(e) => live.push(e.handle()),
                    Err(err) => {
                        assert_eq!(err, CoreError::OutOfHandles { capacity: 32 });
                        assert_eq!(live.len(), 32);
                    }
                },
                3 if !live.is_empty() => {
                    let h = live.swap_remove(rng.gen_range(0..live.len()));
                    store.destroy(h).unwrap();
                }
                4..=6 if !live.is_empty() => {
                    let h = live[rng.gen_range(0..live.len())];
                    let kind = ComponentKind::ALL[rng.gen_range(0..ComponentKind::COUNT)];
                    let had = store.lookup(h).unwrap().has(kind);
                    match attach_kind(&mut store, h, kind) {
                        Ok(_) => assert!(!had),
                        Err(CoreError::AlreadyAttached { .. }) => assert!(had),
                        Err(CoreError::CapacityExceeded { .. }) => assert!(!had),
                        Err(other) => panic!("seed {seed} step {step}: {other}"),
                    }
                }
                7..=8 if !live.is_empty() => {
                    let h = live[rng.gen_range(0..live.len())];
                    let kind = ComponentKind::ALL[rng.gen_range(0..ComponentKind::COUNT)];
                    let had = store.lookup(h).unwrap().has(kind);
                    assert_eq!(store.detach(h, kind).unwrap(), had);
                }
                _ => {
                    let mut scratch = store.scratch();
                    let _ = scratch.alloc(rng.gen_range(1..64), 8);
                    store.end_frame();
                }
            }

            if let Err(err) = store.verify() {
                panic!("seed {seed} step {step}: {err}");
            }
            assert_eq!(store.live_count(), live.len());
        }
        assert_pool_lengths(&store);
    }
}

#[test]
fn destroy_middle_repairs_each_kind_independently() {
    let mut store = new_store(0);
    let handles: Vec<Handle> = (0..4).map(|_| store.create().unwrap().handle()).collect();
    for &h in &handles {
        store.attach(h, GraphicsComponent::default()).unwrap();
    }
    // Movement attached in reverse, so its pool order differs.
    for &h in handles.iter().rev() {
        store.attach(h, MovementComponent::new(Vec3::X, 1.0)).unwrap();
    }

    store.destroy(handles[1]).unwrap();
    store.verify().unwrap();

    // Graphics: [0,1,2,3] -> [0,3,2]; movement: [3,2,1,0] -> [3,2,0].
    let graphics: Vec<Handle> = store
        .components::<GraphicsComponent>()
        .unwrap()
        .iter()
        .map(cadence_core::Component::owner)
        .collect();
    assert_eq!(graphics, vec![handles[0], handles[3], handles[2]]);
    let movement: Vec<Handle> = store
        .components::<MovementComponent>()
        .unwrap()
        .iter()
        .map(cadence_core::Component::owner)
        .collect();
    assert_eq!(movement, vec![handles[3], handles[2], handles[0]]);
    assert_eq!(
        store.lookup(handles[0]).unwrap().component(ComponentKind::Movement),
        Some(2)
    );
}

#[test]
fn scratch_churn_leaves_bottom_front_intact() {
    let mut store = new_store(4096);
    let h = store.spawn_at(Vec3::new(4.0, 5.0, 6.0)).unwrap();
    store.attach(h, GraphicsComponent::default()).unwrap();
    let bottom = store.arena().stats().bottom_used;

    for frame in 0..100u32 {
        {
            let mut scratch = store.scratch();
            let span = scratch.alloc_slice::<u32>(64).unwrap();
            scratch.slice_mut::<u32>(&span).unwrap().fill(frame);
            assert!(scratch.alloc(8192, 8).is_err());
        }
        store.end_frame();
        assert_eq!(store.arena().stats().top_used, 0);
    }

    assert_eq!(store.arena().stats().bottom_used, bottom);
    assert_eq!(store.lookup(h).unwrap().position, Vec3::new(4.0, 5.0, 6.0));
    store.verify().unwrap();
}

#[test]
fn exhausted_handles_recover_after_destroy() {
    let mut store = new_store(0);
    let handles: Vec<Handle> = (0..32).map(|_| store.create().unwrap().handle()).collect();
    assert!(store.create().is_err());

    store.destroy(handles[5]).unwrap();
    store.destroy(handles[2]).unwrap();
    assert_eq!(store.create().unwrap().handle(), handles[5]);
    assert_eq!(store.create().unwrap().handle(), handles[2]);
    assert!(store.create().is_err());
}
