//! # CADENCE Core
//!
//! A fixed-capacity, double-ended arena and the entity/component store
//! that lives inside it.
//!
//! ## Architecture
//!
//! ```text
//!  0                                                           C
//!  ┌──────────────────────┬─────────────────┬──────────────────┐
//!  │ top front (scratch)  │      free       │ bottom front     │
//!  │ grows up, cleared    │                 │ grows down,      │
//!  │ once per frame       │                 │ pools + entities │
//!  └──────────────────────┴─────────────────┴──────────────────┘
//!                         ^ top             ^ bot
//! ```
//!
//! ## Rules
//!
//! 1. **One reservation** - the arena buffer is allocated once and never grows
//! 2. **Errors are values** - overflow, exhausted handles and full pools are
//!    reported, never aborted on
//! 3. **Handles, not pointers** - components point back at their owner by
//!    handle, and allocations are reached through spans checked against the
//!    live cursors
//!
//! ## Example
//!
//! ```rust,ignore
//! use cadence_core::{Arena, EntityStore, StoreConfig, GraphicsComponent};
//!
//! let config = StoreConfig::default();
//! let mut store = EntityStore::new(Arena::new(config.required_bytes() + 4096), config)?;
//! let h = store.create()?.handle();
//! store.attach(h, GraphicsComponent::default())?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod error;
pub mod memory;

pub use ecs::{
    Component, ComponentKind, ComponentPool, ComponentPools, DialogueComponent, Entity, EntityStore,
    GraphicsComponent, Handle, MovementComponent, StoreConfig, TargetingComponent, MAX_HANDLES,
    MAX_POOL_CAPACITY,
};
pub use error::{CoreError, CoreResult};
pub use memory::{
    Arena, ArenaSpan, ArenaStats, BottomMarker, FrameScratch, ScratchVec, Side, TopMarker,
};
