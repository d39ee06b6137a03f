//! # Arena Property Tests
//!
//! Seeded random sequences against the double-ended arena and a dense pool:
//!
//! 1. Every successful allocation is in bounds and aligned
//! 2. The fronts never cross, and failed calls move nothing
//! 3. Mark/rewind restores the cursor and reproduces the same offsets
//! 4. Pool append/remove keep the dense prefix consistent with a model
//!
//! Run with: cargo test --test arena_properties -- --nocapture

use cadence_core::{Arena, ArenaSpan, ComponentPool, CoreError, Side};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SEEDS: [u64; 4] = [3, 42, 0xBADC0DE, 0x5EED_0001];

fn assert_span_ok(arena: &Arena, span: &ArenaSpan, align: usize) {
    let stats = arena.stats();
    assert!(span.end() <= stats.capacity);
    assert_eq!(arena.address(span) % align, 0, "misaligned {span:?}");
    match span.side() {
        Side::Top => assert!(span.end() <= stats.top_used),
        Side::Bottom => assert!(span.offset() >= stats.capacity - stats.bottom_used),
    }
}

#[test]
fn random_allocations_are_aligned_and_fronts_never_cross() {
    for seed in SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut arena = Arena::new(rng.gen_range(64..2048));

        for _ in 0..2_000 {
            let size = rng.gen_range(0..96);
            let align = 1usize << rng.gen_range(0..5);
            let before = arena.stats();
            let top_side = rng.gen_bool(0.5);
            let result = if top_side {
                arena.alloc_top(size, align)
            } else {
                arena.alloc_bottom(size, align)
            };

            match result {
                Ok(span) => {
                    assert_eq!(span.len(), size);
                    assert_span_ok(&arena, &span, align);
                }
                Err(CoreError::ArenaOverflow { .. }) => {
                    let after = arena.stats();
                    assert_eq!(after.top_used, before.top_used);
                    assert_eq!(after.bottom_used, before.bottom_used);
                    // Start over so the sequence keeps exercising both fronts.
                    if top_side {
                        arena.clear_top();
                    } else {
                        arena.clear_bottom();
                    }
                }
                Err(other) => panic!("seed {seed}: unexpected {other}"),
            }

            let stats = arena.stats();
            assert!(stats.top_used + stats.bottom_used <= stats.capacity);
            assert_eq!(stats.free, stats.capacity - stats.top_used - stats.bottom_used);
        }
    }
}

#[test]
fn rewind_reissues_the_same_offsets() {
    for seed in SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut arena = Arena::new(4096);
        arena.alloc_top(rng.gen_range(0..64), 8).unwrap();
        arena.alloc_bottom(rng.gen_range(0..64), 8).unwrap();

        let requests: Vec<(usize, usize)> = (0..16)
            .map(|_| (rng.gen_range(1..64), 1usize << rng.gen_range(0..4)))
            .collect();

        let top_mark = arena.mark_top();
        let bottom_mark = arena.mark_bottom();
        let first: Vec<(ArenaSpan, ArenaSpan)> = requests
            .iter()
            .map(|&(size, align)| {
                (
                    arena.alloc_top(size, align).unwrap(),
                    arena.alloc_bottom(size, align).unwrap(),
                )
            })
            .collect();

        arena.rewind_top(top_mark).unwrap();
        arena.rewind_bottom(bottom_mark).unwrap();
        assert_eq!(arena.mark_top(), top_mark);
        assert_eq!(arena.mark_bottom(), bottom_mark);

        for (&(size, align), &(top, bottom)) in requests.iter().zip(&first) {
            assert_eq!(arena.alloc_top(size, align).unwrap(), top);
            assert_eq!(arena.alloc_bottom(size, align).unwrap(), bottom);
        }
    }
}

#[test]
fn pool_matches_vec_model() {
    for seed in SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut arena = Arena::new(1024);
        let mut pool: ComponentPool<u64> = ComponentPool::new(&mut arena, 32).unwrap();
        let mut model: Vec<u64> = Vec::new();

        for step in 0..3_000u64 {
            if rng.gen_bool(0.55) {
                match pool.append(&mut arena, step) {
                    Ok(index) => {
                        assert_eq!(index as usize, model.len());
                        model.push(step);
                        assert_eq!(*pool.get(&arena, pool.size() - 1).unwrap(), step);
                    }
                    Err(err) => {
                        assert_eq!(err, CoreError::CapacityExceeded { capacity: 32 });
                        assert_eq!(model.len(), 32);
                    }
                }
            } else if !model.is_empty() {
                let index = rng.gen_range(0..model.len());
                let tail = model.len() - 1;
                let moved = pool.remove_at(&mut arena, index as u32).unwrap();
                model.swap_remove(index);
                if index == tail {
                    assert_eq!(moved, None);
                } else {
                    assert_eq!(moved, Some(tail as u32));
                }
            }
            assert_eq!(pool.as_slice(&arena).unwrap(), model.as_slice());
        }
    }
}
