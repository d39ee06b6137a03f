//! # Systems
//!
//! Per-frame updates over the component pools, always run in this order:
//!
//! ```text
//! graphics ──> movement ──> targeting ──> dialogue
//! ```
//!
//! A later system sees the earlier systems' writes from the same frame; an
//! earlier one sees them only on the next frame. Graphics therefore draws
//! positions as they stood at the start of the frame.

pub mod dialogue;
pub mod graphics;
pub mod movement;
pub mod render;
pub mod targeting;

pub use movement::{Completion, MovementSystem};
pub use render::{Camera, DrawRecord, RecordingRenderer, RenderView, Renderer};
