//! # CADENCE Game Loop
//!
//! One call to [`GameLoop::tick`] runs one frame:
//!
//! ```text
//! Frame N:
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. INPUT      raw levels -> press edges                      │
//! │ 2. MUSIC      time -> MusicPos                               │
//! │ 3. EVENTS     FrameEvents allocated from the arena top       │
//! │ 4. STATE      r_update on a new beat, then update            │
//! │ 5. SYSTEMS    graphics -> movement -> targeting -> dialogue  │
//! │ 6. APPLY      Destroy events, score tally                    │
//! │ 7. RENDER     read-only graphics pool + camera view          │
//! │ 8. END FRAME  top front cleared, even if a step failed       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::time::Instant;

use cadence_core::{Arena, EntityStore, GraphicsComponent, Handle, TargetingComponent};
use cadence_shared::{Buttons, EdgeDetector, MusicPos, Vec3};

use crate::config::GameConfig;
use crate::error::GameResult;
use crate::events::{FrameEvent, FrameEvents, ScratchSink};
use crate::music::{FixedTempo, MusicClock};
use crate::state::{RhythmRules, StateKind, StateMachine};
use crate::systems::{
    dialogue, graphics, targeting, Camera, Completion, MovementSystem, RenderView, Renderer,
};

/// What happened during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number, starting at zero.
    pub frame: u64,
    /// Wall time spent in `tick`, in microseconds.
    pub total_us: u64,
    /// Whether the music crossed into a new beat this frame.
    pub new_beat: bool,
    /// Events posted this frame.
    pub events_posted: u32,
    /// Events dropped for lack of arena space.
    pub events_dropped: u32,
    /// `GameStart` was posted.
    pub game_started: bool,
    /// `PlayerSuccess` events.
    pub successes: u32,
    /// `PlayerFail` events.
    pub failures: u32,
    /// Graphics transforms refreshed.
    pub graphics_written: u32,
    /// Entities that reached their movement target.
    pub arrivals: u32,
    /// `Destroy` events posted by targeting.
    pub impacts: u32,
    /// Dialogue lines whose time ran out.
    pub dialogue_expired: u32,
    /// Entities destroyed while applying events.
    pub destroyed: u32,
    /// Top-front bytes in use just before the frame clear.
    pub scratch_bytes: usize,
    /// Active state after the frame.
    pub state: Option<StateKind>,
}

/// The host: owns the store, the state machine, the systems and the camera.
pub struct GameLoop<C: MusicClock = FixedTempo> {
    config: GameConfig,
    store: EntityStore,
    machine: StateMachine,
    movement: MovementSystem,
    clock: C,
    camera: Camera,
    input: EdgeDetector,
    last_pos: Option<MusicPos>,
    frame: u64,
}

impl GameLoop<FixedTempo> {
    /// Builds a loop with a constant-tempo clock from `config`.
    ///
    /// # Errors
    ///
    /// Configuration or store construction errors.
    pub fn new(config: GameConfig) -> GameResult<Self> {
        let clock = FixedTempo::new(config.bpm, config.beats_per_bar);
        Self::with_clock(config, clock)
    }
}

impl<C: MusicClock> GameLoop<C> {
    /// Builds a loop around a custom music clock.
    ///
    /// # Errors
    ///
    /// Configuration or store construction errors.
    pub fn with_clock(config: GameConfig, clock: C) -> GameResult<Self> {
        config.validate()?;
        let store = EntityStore::new(Arena::new(config.arena_bytes), config.store_config())?;
        let rules = RhythmRules {
            beats_per_bar: clock.beats_per_bar(),
            hit_window: config.hit_window,
            song_bars: config.song_bars,
            ..RhythmRules::default()
        };
        tracing::info!(
            arena_bytes = config.arena_bytes,
            max_entities = config.max_entities,
            bpm = config.bpm,
            "game loop ready"
        );

        Ok(Self {
            movement: MovementSystem::new(config.arrival_tolerance),
            machine: StateMachine::new(rules),
            store,
            clock,
            camera: Camera::default(),
            input: EdgeDetector::new(),
            last_pos: None,
            frame: 0,
            config,
        })
    }

    /// Runs one frame.
    ///
    /// `dt` is the frame delta in seconds, `time` the song time in seconds,
    /// `raw_buttons` the buttons currently held.
    ///
    /// # Errors
    ///
    /// Core errors from any step. The frame scratch is cleared either way.
    pub fn tick(
        &mut self,
        dt: f32,
        time: f64,
        raw_buttons: Buttons,
        renderer: &mut impl Renderer,
    ) -> GameResult<FrameStats> {
        let started = Instant::now();
        let result = self.run_frame(dt, time, raw_buttons, renderer);
        let scratch_bytes = self.store.arena().stats().top_used;
        self.store.end_frame();
        self.frame += 1;

        let mut stats = result?;
        stats.scratch_bytes = scratch_bytes;
        stats.total_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

        let budget_us = f64::from(self.config.frame_budget_ms) * 1000.0;
        #[allow(clippy::cast_precision_loss)]
        let total_us = stats.total_us as f64;
        if total_us > budget_us {
            tracing::warn!(
                frame = stats.frame,
                total_us = stats.total_us,
                budget_us,
                "frame over budget"
            );
        }
        Ok(stats)
    }

    fn run_frame(
        &mut self,
        dt: f32,
        time: f64,
        raw_buttons: Buttons,
        renderer: &mut impl Renderer,
    ) -> GameResult<FrameStats> {
        let mut stats = FrameStats {
            frame: self.frame,
            ..FrameStats::default()
        };

        let pad = self.input.update(raw_buttons);
        let mp = self.clock.position(time);
        let mut events = FrameEvents::new(&mut self.store.scratch(), self.config.event_capacity)?;

        {
            let mut sink = ScratchSink::new(&mut events, self.store.scratch());
            stats.new_beat = self.last_pos.map_or(true, |prev| mp.is_new_beat(&prev));
            if stats.new_beat {
                self.machine.r_update(mp, pad, &mut sink);
            }
            self.machine.update(dt, mp, pad, &mut sink);
        }
        self.last_pos = Some(mp);

        stats.graphics_written = graphics::update(&mut self.store)?;
        stats.arrivals = self.movement.update(&mut self.store, dt, &mut events)?;
        stats.impacts = targeting::update(&mut self.store, dt, &mut events)?;
        stats.dialogue_expired = dialogue::update(&mut self.store, dt)?;

        for i in 0..events.len() {
            match events.get(self.store.arena(), i) {
                Some(FrameEvent::Destroy { entity }) => {
                    if self.store.is_alive(entity) {
                        self.destroy(entity)?;
                        stats.destroyed += 1;
                    }
                }
                Some(FrameEvent::PlayerSuccess) => stats.successes += 1,
                Some(FrameEvent::PlayerFail) => stats.failures += 1,
                Some(FrameEvent::GameStart) => stats.game_started = true,
                None => {}
            }
        }
        stats.events_posted = events.len();
        stats.events_dropped = events.dropped();

        renderer.render(&RenderView {
            graphics: self.store.components::<GraphicsComponent>()?,
            view: self.camera.view(),
            time,
        });

        stats.state = self.machine.kind();
        Ok(stats)
    }

    /// Destroys `handle`, dropping any pending movement completion first.
    ///
    /// # Errors
    ///
    /// [`CoreError::DeadHandle`](cadence_core::CoreError::DeadHandle).
    pub fn destroy(&mut self, handle: Handle) -> GameResult<()> {
        self.movement.forget(handle);
        self.store.destroy(handle)?;
        Ok(())
    }

    /// Starts moving `handle` towards `target`, replacing a movement that
    /// has already arrived.
    ///
    /// # Errors
    ///
    /// Attach errors from the store, including
    /// [`CoreError::AlreadyAttached`](cadence_core::CoreError::AlreadyAttached)
    /// while a previous movement is still in flight.
    pub fn move_to(
        &mut self,
        handle: Handle,
        target: Vec3,
        velocity: f32,
        on_arrival: Option<Completion>,
    ) -> GameResult<()> {
        self.movement
            .start(&mut self.store, handle, target, velocity, on_arrival)?;
        Ok(())
    }

    /// Spawns a visible projectile at `from`'s position that arches onto
    /// `target` over `duration` seconds and destroys itself on impact.
    ///
    /// # Errors
    ///
    /// [`CoreError::DeadHandle`](cadence_core::CoreError::DeadHandle) if
    /// `from` is not live, or any create/attach error.
    pub fn launch(
        &mut self,
        from: Handle,
        target: Handle,
        height: f32,
        duration: f32,
    ) -> GameResult<Handle> {
        let start = self
            .store
            .lookup(from)
            .map(|e| e.position)
            .ok_or(cadence_core::CoreError::DeadHandle(from.raw()))?;
        let projectile = self.store.spawn_at(start)?;
        let flight = TargetingComponent::new(start, target, Vec3::Y, height, duration);
        let attached = self
            .store
            .attach(projectile, GraphicsComponent::default())
            .and_then(|_| self.store.attach(projectile, flight));
        if let Err(err) = attached {
            self.store.destroy(projectile)?;
            return Err(err.into());
        }
        Ok(projectile)
    }

    /// The entity store.
    #[must_use]
    pub const fn store(&self) -> &EntityStore {
        &self.store
    }

    /// The entity store, mutably (spawning, attaching, positions).
    ///
    /// A movement completion whose component is detached or destroyed
    /// through here is dropped unrun on the next tick.
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    /// The state machine.
    #[must_use]
    pub const fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// The movement system.
    #[must_use]
    pub const fn movement(&self) -> &MovementSystem {
        &self.movement
    }

    /// The camera.
    #[must_use]
    pub const fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The camera, mutably.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// The configuration the loop was built from.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Frames ticked so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }
}

impl<C: MusicClock> std::fmt::Debug for GameLoop<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoop")
            .field("frame", &self.frame)
            .field("state", &self.machine.kind())
            .field("store", &self.store)
            .field("movement", &self.movement)
            .finish_non_exhaustive()
    }
}
