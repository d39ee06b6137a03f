//! # Frame Scratch
//!
//! Policy layer over the arena's top front. Anything allocated through a
//! [`FrameScratch`] during frame `F` is gone once the host clears the top
//! at the end of that frame. The bottom front is not reachable from here.

use std::marker::PhantomData;

use bytemuck::Pod;

use super::arena::{Arena, ArenaSpan, TopMarker};
use crate::error::{CoreError, CoreResult};

/// Top-front-only view of an arena for per-frame allocations.
///
/// The host obtains one per frame (from [`Arena::scratch`] or
/// `EntityStore::scratch`) and clears the top exactly once after every
/// consumer is done with it.
pub struct FrameScratch<'a> {
    arena: &'a mut Arena,
}

impl Arena {
    /// Borrows the top front as frame scratch.
    #[inline]
    pub fn scratch(&mut self) -> FrameScratch<'_> {
        FrameScratch { arena: self }
    }
}

impl FrameScratch<'_> {
    /// Allocates `size` bytes aligned to `align`.
    ///
    /// # Errors
    ///
    /// [`CoreError::ArenaOverflow`] or [`CoreError::InvalidAlignment`].
    #[inline]
    pub fn alloc(&mut self, size: usize, align: usize) -> CoreResult<ArenaSpan> {
        self.arena.alloc_top(size, align)
    }

    /// Allocates room for `count` values of `T`.
    ///
    /// # Errors
    ///
    /// [`CoreError::ArenaOverflow`].
    #[inline]
    pub fn alloc_slice<T: Pod>(&mut self, count: usize) -> CoreResult<ArenaSpan> {
        self.arena.alloc_top_slice::<T>(count)
    }

    /// Snapshots the top cursor for a nested rewind.
    #[inline]
    #[must_use]
    pub fn mark(&self) -> TopMarker {
        self.arena.mark_top()
    }

    /// Rewinds to a marker taken from this front.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidMarker`] if the marker is above the cursor.
    #[inline]
    pub fn rewind(&mut self, marker: TopMarker) -> CoreResult<()> {
        self.arena.rewind_top(marker)
    }

    /// Bytes used by this frame so far.
    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        self.arena.mark_top().offset()
    }

    /// Bytes still available before hitting the bottom front.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.arena.free()
    }

    /// Views a scratch span as `&[T]`.
    ///
    /// # Errors
    ///
    /// See [`Arena::slice`].
    #[inline]
    pub fn slice<T: Pod>(&self, span: &ArenaSpan) -> CoreResult<&[T]> {
        self.arena.slice(span)
    }

    /// Views a scratch span as `&mut [T]`.
    ///
    /// # Errors
    ///
    /// See [`Arena::slice_mut`].
    #[inline]
    pub fn slice_mut<T: Pod>(&mut self, span: &ArenaSpan) -> CoreResult<&mut [T]> {
        self.arena.slice_mut(span)
    }
}

/// A growable vector whose storage lives on the top front.
///
/// The value itself is just a receipt (span, length, capacity); every access
/// goes through the [`FrameScratch`] it was created from. Growing allocates a
/// block of twice the capacity and copies; the old block is reclaimed with
/// the rest of the frame.
#[derive(Clone, Copy, Debug)]
pub struct ScratchVec<T> {
    span: ArenaSpan,
    len: u32,
    capacity: u32,
    _marker: PhantomData<T>,
}

impl<T: Pod> ScratchVec<T> {
    /// Allocates an empty vector with room for `capacity` elements.
    ///
    /// # Errors
    ///
    /// [`CoreError::ArenaOverflow`] if the block does not fit.
    pub fn with_capacity(scratch: &mut FrameScratch<'_>, capacity: u32) -> CoreResult<Self> {
        let span = scratch.alloc_slice::<T>(capacity as usize)?;
        Ok(Self {
            span,
            len: 0,
            capacity,
            _marker: PhantomData,
        })
    }

    /// Number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.len
    }

    /// `true` when empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current capacity in elements.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Appends a value, growing the block when full.
    ///
    /// # Errors
    ///
    /// [`CoreError::ArenaOverflow`] if growth does not fit; the vector is
    /// unchanged in that case.
    pub fn push(&mut self, scratch: &mut FrameScratch<'_>, value: T) -> CoreResult<()> {
        if self.len == self.capacity {
            self.grow(scratch)?;
        }
        let slot = self.len as usize;
        scratch.slice_mut::<T>(&self.span)?[slot] = value;
        self.len += 1;
        Ok(())
    }

    /// The stored elements.
    ///
    /// # Errors
    ///
    /// [`CoreError::StaleSpan`] if the frame has been cleared since creation.
    pub fn as_slice<'s>(&self, scratch: &'s FrameScratch<'_>) -> CoreResult<&'s [T]> {
        let all = scratch.slice::<T>(&self.span)?;
        Ok(&all[..self.len as usize])
    }

    /// Copies out the element at `index`, reading straight from the arena.
    ///
    /// Lets a caller walk the vector while holding the arena only briefly
    /// per element.
    ///
    /// # Errors
    ///
    /// [`CoreError::IndexOutOfBounds`], or [`CoreError::StaleSpan`] after the
    /// frame has been cleared.
    pub fn get(&self, arena: &Arena, index: u32) -> CoreResult<T> {
        if index >= self.len {
            return Err(CoreError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        Ok(arena.slice::<T>(&self.span)?[index as usize])
    }

    /// Forgets all elements, keeping the block.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    fn grow(&mut self, scratch: &mut FrameScratch<'_>) -> CoreResult<()> {
        let new_capacity = self.capacity.saturating_mul(2).max(4);
        if new_capacity == self.capacity {
            return Err(CoreError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        let fresh = scratch.alloc_slice::<T>(new_capacity as usize)?;
        let used = self.len as usize * std::mem::size_of::<T>();
        let live = self.span.prefix(used);
        scratch.arena.copy_span(&live, &fresh)?;
        self.span = fresh;
        self.capacity = new_capacity;
        Ok(())
    }
}
