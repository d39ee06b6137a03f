//! # Memory Management
//!
//! One arena, reserved once at startup, serving two fronts.
//!
//! ## Design Philosophy
//!
//! - Long-lived storage (entity table, component pools) is carved from the
//!   bottom front during initialization
//! - Per-frame scratch comes from the top front and is cleared every frame
//! - No per-allocation free, no growth, no hidden state beyond two cursors

mod arena;
mod scratch;

pub use arena::{Arena, ArenaSpan, ArenaStats, BottomMarker, Side, TopMarker};
pub use scratch::{FrameScratch, ScratchVec};
