//! # Arena Benchmark
//!
//! Measures the hot paths of the double-ended arena:
//! 1. Top-front scratch allocation and per-frame clear
//! 2. Marker rewind on the top front
//! 3. Growing a `ScratchVec` from empty

#![allow(missing_docs)]

use cadence_core::{Arena, ScratchVec};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const ARENA_BYTES: usize = 1 << 20;
const ALLOCS_PER_FRAME: usize = 1_000;

fn bench_scratch_frame(c: &mut Criterion) {
    let mut arena = Arena::new(ARENA_BYTES);

    c.bench_function("arena_top_alloc_1k_then_clear", |b| {
        b.iter(|| {
            for i in 0..ALLOCS_PER_FRAME {
                let span = arena.alloc_top(16 + (i & 7), 8).unwrap();
                black_box(span);
            }
            arena.clear_top();
        });
    });
}

fn bench_marker_rewind(c: &mut Criterion) {
    let mut arena = Arena::new(ARENA_BYTES);
    arena.alloc_bottom(4096, 16).unwrap();

    c.bench_function("arena_mark_alloc_rewind", |b| {
        b.iter(|| {
            let marker = arena.mark_top();
            for _ in 0..64 {
                black_box(arena.alloc_top(24, 4).unwrap());
            }
            arena.rewind_top(marker).unwrap();
        });
    });
}

fn bench_scratch_vec_growth(c: &mut Criterion) {
    let mut arena = Arena::new(ARENA_BYTES);

    c.bench_function("scratch_vec_push_1k", |b| {
        b.iter(|| {
            {
                let mut scratch = arena.scratch();
                let mut events = ScratchVec::<u32>::with_capacity(&mut scratch, 0).unwrap();
                for i in 0..1_000u32 {
                    events.push(&mut scratch, i).unwrap();
                }
                black_box(events.len());
            }
            arena.clear_top();
        });
    });
}

criterion_group!(
    benches,
    bench_scratch_frame,
    bench_marker_rewind,
    bench_scratch_vec_growth
);
criterion_main!(benches);
