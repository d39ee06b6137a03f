//! # Entity Component System
//!
//! Fixed-capacity entities and dense component pools, all carved from one
//! arena at startup.
//!
//! - [`Entity`]: a row in the entity table, addressed by a recycled [`Handle`]
//! - [`ComponentPool`]: dense storage with swap-with-last removal
//! - [`EntityStore`]: keeps entity slot indices and component owners in sync

mod component;
mod entity;
mod pool;
mod store;

pub use component::{
    Component, ComponentKind, ComponentPools, DialogueComponent, GraphicsComponent,
    MovementComponent, TargetingComponent,
};
pub use entity::{Entity, Handle};
pub use pool::ComponentPool;
pub use store::{EntityStore, StoreConfig, MAX_HANDLES, MAX_POOL_CAPACITY};
