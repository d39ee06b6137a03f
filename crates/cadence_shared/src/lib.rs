//! # CADENCE Shared
//!
//! Plain data used by both the core allocator/ECS and the host game.
//!
//! Everything in here is `Pod` where it may be stored inside the arena,
//! so it can be carved out of raw bytes without any conversion step.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod input;
pub mod math;
pub mod music;

pub use input::{Buttons, EdgeDetector, GamepadSnapshot};
pub use math::{Mat4, Vec3};
pub use music::MusicPos;
