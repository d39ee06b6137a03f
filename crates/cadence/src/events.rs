//! # Frame Events
//!
//! Events raised during a frame by the state machine and the systems, and
//! consumed by the loop before the frame ends.
//!
//! ## Storage
//!
//! ```text
//! FrameEvents ──> ScratchVec<RawEvent> ──> arena top front
//!                                           (gone at end_frame)
//! ```
//!
//! Events are stored as two-byte [`RawEvent`] records so they can live in
//! arena scratch. A full buffer grows; if the arena cannot fit the growth
//! the event is dropped and counted.

use bytemuck::{Pod, Zeroable};

use cadence_core::{Arena, CoreResult, FrameScratch, Handle, ScratchVec};

/// Something that happened this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameEvent {
    /// A press landed on the beat with the expected button.
    PlayerSuccess,
    /// A press was off-beat or wrong, or a beat passed without a press.
    PlayerFail,
    /// The player started a song from the title state.
    GameStart,
    /// The entity should be destroyed before the frame ends.
    Destroy {
        /// Entity to destroy.
        entity: Handle,
    },
}

impl FrameEvent {
    const TAG_SUCCESS: u8 = 0;
    const TAG_FAIL: u8 = 1;
    const TAG_START: u8 = 2;
    const TAG_DESTROY: u8 = 3;

    /// Packs the event for arena storage.
    #[must_use]
    pub const fn encode(self) -> RawEvent {
        match self {
            Self::PlayerSuccess => RawEvent::new(Self::TAG_SUCCESS, 0),
            Self::PlayerFail => RawEvent::new(Self::TAG_FAIL, 0),
            Self::GameStart => RawEvent::new(Self::TAG_START, 0),
            Self::Destroy { entity } => RawEvent::new(Self::TAG_DESTROY, entity.raw()),
        }
    }
}

/// Arena representation of a [`FrameEvent`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RawEvent {
    tag: u8,
    entity: u8,
}

impl RawEvent {
    const fn new(tag: u8, entity: u8) -> Self {
        Self { tag, entity }
    }

    /// Unpacks the event; `None` for an unknown tag.
    #[must_use]
    pub const fn decode(self) -> Option<FrameEvent> {
        match self.tag {
            FrameEvent::TAG_SUCCESS => Some(FrameEvent::PlayerSuccess),
            FrameEvent::TAG_FAIL => Some(FrameEvent::PlayerFail),
            FrameEvent::TAG_START => Some(FrameEvent::GameStart),
            FrameEvent::TAG_DESTROY => Some(FrameEvent::Destroy {
                entity: Handle::new(self.entity),
            }),
            _ => None,
        }
    }
}

/// Anything that accepts frame events.
///
/// The state machine posts through this trait so it never sees the arena.
pub trait EventSink {
    /// Records `event`.
    fn post(&mut self, event: FrameEvent);
}

impl EventSink for Vec<FrameEvent> {
    fn post(&mut self, event: FrameEvent) {
        self.push(event);
    }
}

/// This frame's event buffer, allocated from the arena top.
#[derive(Clone, Copy, Debug)]
pub struct FrameEvents {
    items: ScratchVec<RawEvent>,
    dropped: u32,
}

impl FrameEvents {
    /// Allocates an empty buffer with room for `capacity` events.
    ///
    /// # Errors
    ///
    /// [`CoreError::ArenaOverflow`](cadence_core::CoreError::ArenaOverflow)
    /// if the initial block does not fit.
    pub fn new(scratch: &mut FrameScratch<'_>, capacity: u32) -> CoreResult<Self> {
        Ok(Self {
            items: ScratchVec::with_capacity(scratch, capacity)?,
            dropped: 0,
        })
    }

    /// Appends `event`, growing the buffer if needed.
    ///
    /// Returns `false` when the arena cannot hold the event; it is dropped,
    /// counted and logged.
    pub fn post(&mut self, scratch: &mut FrameScratch<'_>, event: FrameEvent) -> bool {
        match self.items.push(scratch, event.encode()) {
            Ok(()) => true,
            Err(err) => {
                self.dropped += 1;
                tracing::warn!(?event, %err, "frame event dropped");
                false
            }
        }
    }

    /// Number of stored events.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.items.len()
    }

    /// `true` when nothing was posted (or everything was dropped).
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Events lost to arena exhaustion this frame.
    #[inline]
    #[must_use]
    pub const fn dropped(&self) -> u32 {
        self.dropped
    }

    /// The event at `index`.
    #[must_use]
    pub fn get(&self, arena: &Arena, index: u32) -> Option<FrameEvent> {
        self.items.get(arena, index).ok().and_then(RawEvent::decode)
    }

    /// Every stored event, in posting order.
    pub fn iter<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = FrameEvent> + 'a {
        let items = self.items;
        (0..items.len()).filter_map(move |i| items.get(arena, i).ok().and_then(RawEvent::decode))
    }
}

/// An [`EventSink`] writing into a [`FrameEvents`] buffer.
pub struct ScratchSink<'e, 'a> {
    events: &'e mut FrameEvents,
    scratch: FrameScratch<'a>,
}

impl<'e, 'a> ScratchSink<'e, 'a> {
    /// Posts into `events`, growing it through `scratch`.
    pub fn new(events: &'e mut FrameEvents, scratch: FrameScratch<'a>) -> Self {
        Self { events, scratch }
    }
}

impl EventSink for ScratchSink<'_, '_> {
    fn post(&mut self, event: FrameEvent) {
        self.events.post(&mut self.scratch, event);
    }
}
