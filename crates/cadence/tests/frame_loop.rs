//! # Frame Loop Tests
//!
//! Whole-frame behaviour of the host:
//!
//! 1. **Song flow**: start -> rhythmic -> end -> start driven by input and
//!    the music clock
//! 2. **Targeting**: projectiles arch onto their target and are destroyed
//!    on impact in the same frame
//! 3. **Movement**: completions fire once, never after destroy, and never
//!    for a component they were not started with
//! 4. **Dialogue**: lines are detached when their time runs out
//! 5. **Scratch**: the arena top is empty after every tick
//!
//! Run with: cargo test --test frame_loop -- --nocapture

use std::cell::Cell;
use std::rc::Rc;

use cadence::{
    Buttons, Completion, FrameEvent, FrameStats, GameConfig, GameLoop, RecordingRenderer,
    StateKind, Vec3,
};
use cadence_core::{
    Component, DialogueComponent, GraphicsComponent, Handle, MovementComponent,
};

const DT: f32 = 0.1;

/// 60 bpm (one beat per second), one bar of four beats.
fn song_config() -> GameConfig {
    GameConfig {
        bpm: 60.0,
        beats_per_bar: 4,
        song_bars: 1,
        hit_window: 0.2,
        frame_budget_ms: 1_000.0,
        ..GameConfig::default()
    }
}

fn tick(
    game: &mut GameLoop,
    renderer: &mut RecordingRenderer,
    time: f64,
    held: Buttons,
) -> FrameStats {
    let stats = game.tick(DT, time, held, renderer).unwrap();
    assert_eq!(game.store().arena().stats().top_used, 0, "scratch not cleared");
    stats
}

#[test]
fn song_runs_from_title_to_results_and_back() {
    let mut game = GameLoop::new(song_config()).unwrap();
    let mut renderer = RecordingRenderer::default();

    let first = tick(&mut game, &mut renderer, 0.0, Buttons::A);
    assert!(first.game_started);
    assert!(first.new_beat);
    assert_eq!(first.events_posted, 1);
    assert_eq!(first.state, Some(StateKind::Rhythmic));

    // Release, then the song starts on beat 1 (t = 1.0).
    let mut successes = 0;
    let mut failures = 0;
    for (time, held) in [
        (0.5, Buttons::NONE),
        (1.0, Buttons::NONE),
        (1.05, Buttons::A),
        (1.5, Buttons::NONE),
        (1.95, Buttons::A),
        (2.5, Buttons::NONE),
        (3.5, Buttons::NONE),
        (4.5, Buttons::NONE),
    ] {
        let stats = tick(&mut game, &mut renderer, time, held);
        successes += stats.successes;
        failures += stats.failures;
    }

    // Two beats hit, two beats left silent.
    assert_eq!(successes, 2);
    assert_eq!(failures, 2);
    assert_eq!(game.machine().kind(), Some(StateKind::End));

    let back = tick(&mut game, &mut renderer, 5.5, Buttons::A);
    assert_eq!(back.state, Some(StateKind::Start));
    assert!(!back.game_started);
    assert_eq!(renderer.frames, 10);
}

#[test]
fn projectile_hits_and_is_destroyed() {
    let mut game = GameLoop::new(GameConfig::default()).unwrap();
    let mut renderer = RecordingRenderer::default();

    let target = game.store_mut().spawn_at(Vec3::new(10.0, 0.0, 0.0)).unwrap();
    let shooter = game.store_mut().spawn_at(Vec3::ZERO).unwrap();
    let projectile = game.launch(shooter, target, 2.0, 0.2).unwrap();
    assert_eq!(game.store().live_count(), 3);

    let stats = tick(&mut game, &mut renderer, 0.0, Buttons::NONE);
    assert_eq!(stats.impacts, 0);
    assert_eq!(renderer.records.len(), 1);
    let mid = game.store().lookup(projectile).unwrap().position;
    assert!((mid.x - 5.0).abs() < 1e-4);
    assert!((mid.y - 2.0).abs() < 1e-4);

    let stats = tick(&mut game, &mut renderer, 0.1, Buttons::NONE);
    assert_eq!(stats.impacts, 1);
    assert_eq!(stats.destroyed, 1);
    assert!(!game.store().is_alive(projectile));
    assert!(renderer.records.is_empty());
    assert_eq!(game.store().live_count(), 2);
    game.store().verify().unwrap();
}

#[test]
fn projectile_with_vanished_target_self_destructs() {
    let mut game = GameLoop::new(GameConfig::default()).unwrap();
    let mut renderer = RecordingRenderer::default();

    let target = game.store_mut().spawn_at(Vec3::new(3.0, 0.0, 0.0)).unwrap();
    let shooter = game.store_mut().spawn_at(Vec3::ZERO).unwrap();
    let projectile = game.launch(shooter, target, 1.0, 10.0).unwrap();
    game.destroy(target).unwrap();

    let stats = tick(&mut game, &mut renderer, 0.0, Buttons::NONE);
    assert_eq!(stats.destroyed, 1);
    assert!(!game.store().is_alive(projectile));
}

#[test]
fn movement_completion_can_destroy_its_owner() {
    let mut game = GameLoop::new(GameConfig::default()).unwrap();
    let mut renderer = RecordingRenderer::default();

    let walker = game.store_mut().spawn_at(Vec3::ZERO).unwrap();
    game.store_mut()
        .attach(walker, GraphicsComponent::default())
        .unwrap();
    game.move_to(
        walker,
        Vec3::new(0.0, 0.0, 1.0),
        5.0,
        Some(Box::new(|owner: Handle| Some(FrameEvent::Destroy { entity: owner }))),
    )
    .unwrap();

    let stats = tick(&mut game, &mut renderer, 0.0, Buttons::NONE);
    assert_eq!(stats.arrivals, 0);
    // Graphics runs before movement, so it still shows the start position.
    assert_eq!(renderer.records[0].model.translation(), Vec3::ZERO);

    let stats = tick(&mut game, &mut renderer, 0.1, Buttons::NONE);
    assert_eq!(stats.arrivals, 1);
    assert_eq!(stats.destroyed, 1);
    assert!(!game.store().is_alive(walker));
    assert_eq!(game.store().live_count(), 0);
}

#[test]
fn destroy_drops_pending_completion() {
    let mut game = GameLoop::new(GameConfig::default()).unwrap();
    let mut renderer = RecordingRenderer::default();
    let runs = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&runs);

    let walker = game.store_mut().spawn_at(Vec3::ZERO).unwrap();
    game.move_to(
        walker,
        Vec3::X,
        0.5,
        Some(Box::new(move |_: Handle| {
            counter.set(counter.get() + 1);
            None
        })),
    )
    .unwrap();
    assert!(game.movement().has_completion(walker));

    game.destroy(walker).unwrap();
    assert!(!game.movement().has_completion(walker));

    // Later frames must not run the dropped completion.
    for i in 0..4 {
        tick(&mut game, &mut renderer, f64::from(i) * 0.1, Buttons::NONE);
    }
    assert_eq!(runs.get(), 0);
    assert_eq!(Rc::strong_count(&runs), 1);
}

fn counting(runs: &Rc<Cell<u32>>) -> Completion {
    let counter = Rc::clone(runs);
    Box::new(move |_: Handle| {
        counter.set(counter.get() + 1);
        None
    })
}

#[test]
fn completion_does_not_follow_recycled_handle() {
    let config = GameConfig {
        max_entities: 1,
        ..GameConfig::default()
    };
    let mut game = GameLoop::new(config).unwrap();
    let mut renderer = RecordingRenderer::default();
    let runs = Rc::new(Cell::new(0u32));

    let first = game.store_mut().spawn_at(Vec3::ZERO).unwrap();
    game.move_to(first, Vec3::X, 1.0, Some(counting(&runs))).unwrap();
    game.store_mut().destroy(first).unwrap();

    let second = game.store_mut().spawn_at(Vec3::ZERO).unwrap();
    assert_eq!(first, second);
    game.store_mut()
        .attach(second, MovementComponent::new(Vec3::new(0.001, 0.0, 0.0), 1.0))
        .unwrap();

    let stats = tick(&mut game, &mut renderer, 0.0, Buttons::NONE);
    assert_eq!(stats.arrivals, 1);
    assert_eq!(runs.get(), 0);
    assert!(!game.movement().has_completion(second));
    assert_eq!(Rc::strong_count(&runs), 1);
}

#[test]
fn completion_does_not_follow_reattached_movement() {
    let mut game = GameLoop::new(GameConfig::default()).unwrap();
    let mut renderer = RecordingRenderer::default();
    let runs = Rc::new(Cell::new(0u32));

    let walker = game.store_mut().spawn_at(Vec3::ZERO).unwrap();
    game.move_to(walker, Vec3::X, 1.0, Some(counting(&runs))).unwrap();
    game.store_mut()
        .detach(walker, MovementComponent::KIND)
        .unwrap();
    game.store_mut()
        .attach(walker, MovementComponent::new(Vec3::X, 100.0))
        .unwrap();

    let stats = tick(&mut game, &mut renderer, 0.0, Buttons::NONE);
    assert_eq!(stats.arrivals, 1);
    assert_eq!(runs.get(), 0);
}

#[test]
fn walker_can_move_again_after_arriving() {
    let mut game = GameLoop::new(GameConfig::default()).unwrap();
    let mut renderer = RecordingRenderer::default();
    let runs = Rc::new(Cell::new(0u32));

    let walker = game.store_mut().spawn_at(Vec3::ZERO).unwrap();
    for (leg, target) in (0u32..).zip([Vec3::X, Vec3::ZERO, Vec3::X]) {
        game.move_to(walker, target, 20.0, Some(counting(&runs))).unwrap();
        let stats = tick(&mut game, &mut renderer, f64::from(leg) * 0.1, Buttons::NONE);
        assert_eq!(stats.arrivals, 1);
    }
    assert_eq!(runs.get(), 3);
    assert_eq!(game.store().pools().len(MovementComponent::KIND), 1);
}

#[test]
fn dialogue_lines_leave_after_their_time() {
    let mut game = GameLoop::new(GameConfig::default()).unwrap();
    let mut renderer = RecordingRenderer::default();

    let speaker = game.store_mut().spawn_at(Vec3::ZERO).unwrap();
    game.store_mut()
        .attach(speaker, DialogueComponent::new(4, 0.25))
        .unwrap();

    let mut expired = 0;
    for frame in 0..4u32 {
        expired += tick(&mut game, &mut renderer, f64::from(frame) * 0.1, Buttons::NONE)
            .dialogue_expired;
    }
    assert_eq!(expired, 1);
    assert!(game.store().component::<DialogueComponent>(speaker).is_none());
    assert!(game.store().is_alive(speaker));
}

#[test]
fn scratch_usage_is_reported_and_cleared() {
    let mut game = GameLoop::new(GameConfig::default()).unwrap();
    let mut renderer = RecordingRenderer::default();
    let bottom = game.store().arena().stats().bottom_used;

    for frame in 0..120u32 {
        let stats = tick(&mut game, &mut renderer, f64::from(frame) / 60.0, Buttons::NONE);
        assert!(stats.scratch_bytes > 0);
        assert_eq!(stats.frame, u64::from(frame));
    }
    assert_eq!(game.store().arena().stats().bottom_used, bottom);
    assert_eq!(game.frame(), 120);
}

#[test]
fn config_loads_from_toml() {
    let config = GameConfig::from_toml_str(
        r"
        arena_bytes = 32768
        max_entities = 8
        graphics_capacity = 8
        movement_capacity = 8
        targeting_capacity = 8
        dialogue_capacity = 1
        bpm = 90.0
        ",
    )
    .unwrap();
    let game = GameLoop::new(config).unwrap();
    assert_eq!(game.store().capacity(), 8);
    assert_eq!(game.machine().kind(), Some(StateKind::Start));
}
