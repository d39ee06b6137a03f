//! # Entity Records
//!
//! An entity is a small fixed record living in the arena-backed entity
//! table. Its handle is its slot in that table, so the handle never changes
//! while the entity is alive and is recycled after destruction.

use bytemuck::{Pod, Zeroable};
use cadence_shared::Vec3;

use super::component::ComponentKind;

/// Stable identifier of an entity.
///
/// Handles are small integers (`u8`); the store recycles them in FIFO order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Handle(u8);

impl Handle {
    /// Wraps a raw handle value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Index into the entity table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Slot value meaning "no component of this kind".
const NO_SLOT: u8 = u8::MAX;

/// One row of the entity table.
///
/// `Pod` so the whole table can be carved out of arena bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Entity {
    /// World-space position, read and written by the systems.
    pub position: Vec3,
    handle: u8,
    live: u8,
    slots: [u8; ComponentKind::COUNT],
    _padding: [u8; 2],
}

impl Entity {
    /// A freshly created entity: live, no components, at the origin.
    #[inline]
    #[must_use]
    pub(crate) const fn fresh(handle: Handle) -> Self {
        Self {
            position: Vec3::ZERO,
            handle: handle.0,
            live: 1,
            slots: [NO_SLOT; ComponentKind::COUNT],
            _padding: [0; 2],
        }
    }

    /// A dead table slot.
    #[inline]
    #[must_use]
    pub(crate) const fn vacant(handle: Handle) -> Self {
        Self {
            position: Vec3::ZERO,
            handle: handle.0,
            live: 0,
            slots: [NO_SLOT; ComponentKind::COUNT],
            _padding: [0; 2],
        }
    }

    /// This entity's handle.
    #[inline]
    #[must_use]
    pub const fn handle(&self) -> Handle {
        Handle(self.handle)
    }

    /// Whether this table slot holds a live entity.
    #[inline]
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.live != 0
    }

    /// Index of this entity's component of `kind` in that kind's pool.
    #[inline]
    #[must_use]
    pub const fn component(&self, kind: ComponentKind) -> Option<u8> {
        match self.slots[kind.index()] {
            NO_SLOT => None,
            slot => Some(slot),
        }
    }

    /// Whether a component of `kind` is attached.
    #[inline]
    #[must_use]
    pub const fn has(&self, kind: ComponentKind) -> bool {
        self.slots[kind.index()] != NO_SLOT
    }

    /// Number of attached components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.slots.iter().filter(|&&s| s != NO_SLOT).count()
    }

    #[inline]
    pub(crate) fn set_component(&mut self, kind: ComponentKind, slot: Option<u8>) {
        self.slots[kind.index()] = slot.unwrap_or(NO_SLOT);
    }
}
