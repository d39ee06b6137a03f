//! # CADENCE
//!
//! The rhythm-game host built on `cadence_core`.
//!
//! ## Crate Structure
//!
//! - `config`: TOML startup configuration
//! - `events`: per-frame event buffer in arena scratch
//! - `music`: music clock seam
//! - `state`: start / rhythmic / end state machine
//! - `systems`: graphics, movement, targeting and the renderer seam
//! - `game_loop`: the frame sequence tying it all together
//!
//! ## Example
//!
//! ```rust,ignore
//! use cadence::{Buttons, GameConfig, GameLoop, RecordingRenderer};
//!
//! let mut game = GameLoop::new(GameConfig::default())?;
//! let mut renderer = RecordingRenderer::default();
//! let stats = game.tick(1.0 / 60.0, 0.0, Buttons::A, &mut renderer)?;
//! ```
//!
//! The libraries never install a `tracing` subscriber; binaries choose one.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod events;
pub mod game_loop;
pub mod music;
pub mod state;
pub mod systems;

pub use config::GameConfig;
pub use error::{GameError, GameResult};
pub use events::{EventSink, FrameEvent, FrameEvents, RawEvent, ScratchSink};
pub use game_loop::{FrameStats, GameLoop};
pub use music::{FixedTempo, MusicClock};
pub use state::{
    EndState, GameState, RhythmRules, RhythmicState, Score, StateKind, StateMachine, Transition,
};
pub use systems::{
    Camera, Completion, DrawRecord, MovementSystem, RecordingRenderer, RenderView, Renderer,
};

pub use cadence_shared::{Buttons, GamepadSnapshot, MusicPos, Vec3};
