//! # Double-Ended Arena
//!
//! One contiguous byte buffer serving aligned allocations from two fronts:
//! the top front grows upward from offset 0, the bottom front grows
//! downward from the capacity. The fronts never cross (`top <= bot`).
//!
//! Allocations are handed out as [`ArenaSpan`]s. A span is a receipt, not a
//! reference: the bytes behind it are reached through [`Arena::bytes`] and
//! friends, which refuse spans that a rewind has already reclaimed.

use std::ops::Range;

use bytemuck::Pod;

use crate::error::{CoreError, CoreResult};

/// Which front an allocation or marker belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Grows upward from offset 0. Per-frame scratch.
    Top,
    /// Grows downward from the capacity. Long-lived storage.
    Bottom,
}

/// A byte range handed out by the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArenaSpan {
    offset: usize,
    len: usize,
    side: Side,
}

impl ArenaSpan {
    /// Offset of the first byte from the start of the buffer.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// `true` for zero-size allocations.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last byte.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    /// The front this span was carved from.
    #[inline]
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// The first `len` bytes of this span, clamped to its length.
    #[inline]
    #[must_use]
    pub(crate) const fn prefix(&self, len: usize) -> Self {
        Self {
            offset: self.offset,
            len: if len < self.len { len } else { self.len },
            side: self.side,
        }
    }
}

/// Snapshot of the top cursor. Only usable with [`Arena::rewind_top`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopMarker(usize);

impl TopMarker {
    /// Cursor offset captured by this marker.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.0
    }
}

/// Snapshot of the bottom cursor. Only usable with [`Arena::rewind_bottom`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BottomMarker(usize);

impl BottomMarker {
    /// Cursor offset captured by this marker.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.0
    }
}

/// Occupancy figures for an arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Total capacity in bytes.
    pub capacity: usize,
    /// Bytes used by the top front.
    pub top_used: usize,
    /// Bytes used by the bottom front.
    pub bottom_used: usize,
    /// Bytes between the fronts.
    pub free: usize,
    /// Highest combined usage ever observed.
    pub peak_used: usize,
}

/// A fixed-capacity double-ended stack allocator.
///
/// Allocation bumps a cursor; there is no per-allocation free. Memory is
/// reclaimed in bulk by rewinding a cursor to a marker.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. The engine is single-threaded by design.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = Arena::new(1024);
///
/// let long_lived = arena.alloc_bottom(64, 8)?;
/// let scratch = arena.alloc_top(16, 4)?;
///
/// // End of frame: everything on the top front goes away.
/// arena.clear_top();
/// ```
pub struct Arena {
    /// Backing words; `u64` keeps the base 8-byte aligned.
    storage: Box<[u64]>,
    /// Usable bytes (may be less than `storage.len() * 8`).
    capacity: usize,
    /// First free byte of the top front.
    top: usize,
    /// First used byte of the bottom front.
    bot: usize,
    /// High-water mark of `top + (capacity - bot)`.
    peak_used: usize,
}

impl Arena {
    /// Creates a new arena with the specified capacity in bytes.
    ///
    /// The buffer is reserved and zeroed once; capacity never changes.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Total size in bytes
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let words = capacity.div_ceil(std::mem::size_of::<u64>());
        Self {
            storage: vec![0u64; words].into_boxed_slice(),
            capacity,
            top: 0,
            bot: capacity,
            peak_used: 0,
        }
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the free space between the fronts in bytes.
    #[inline]
    #[must_use]
    pub const fn free(&self) -> usize {
        self.bot - self.top
    }

    /// Returns occupancy figures.
    #[must_use]
    pub const fn stats(&self) -> ArenaStats {
        ArenaStats {
            capacity: self.capacity,
            top_used: self.top,
            bottom_used: self.capacity - self.bot,
            free: self.bot - self.top,
            peak_used: self.peak_used,
        }
    }

    /// Absolute address of the first byte of `span`.
    ///
    /// Only meaningful for alignment checks; it is never dereferenced.
    #[inline]
    #[must_use]
    pub fn address(&self, span: &ArenaSpan) -> usize {
        self.base_address() + span.offset
    }

    #[inline]
    fn base_address(&self) -> usize {
        self.storage.as_ptr() as usize
    }

    /// Allocates `size` bytes aligned to `align` from the top front.
    ///
    /// # Arguments
    ///
    /// * `size` - Payload size in bytes (zero is allowed)
    /// * `align` - Power-of-two alignment of the returned address
    ///
    /// # Errors
    ///
    /// [`CoreError::ArenaOverflow`] if padding plus payload does not fit below
    /// the bottom front; [`CoreError::InvalidAlignment`] for a bad `align`.
    /// Cursors are unchanged on error.
    pub fn alloc_top(&mut self, size: usize, align: usize) -> CoreResult<ArenaSpan> {
        let mask = check_align(align)?;
        let addr = self.base_address() + self.top;
        let padding = (align - (addr & mask)) & mask;

        let end = self
            .top
            .checked_add(padding)
            .and_then(|start| start.checked_add(size))
            .filter(|&end| end <= self.bot)
            .ok_or_else(|| self.overflow(size, align))?;

        let offset = self.top + padding;
        self.top = end;
        self.record_peak();

        Ok(ArenaSpan {
            offset,
            len: size,
            side: Side::Top,
        })
    }

    /// Allocates `size` bytes aligned to `align` from the bottom front.
    ///
    /// The tentative base `bot - size` is rounded down to `align`, so the
    /// cursor moves by `size` plus the misalignment.
    ///
    /// # Errors
    ///
    /// [`CoreError::ArenaOverflow`] if the block would cross the top front;
    /// [`CoreError::InvalidAlignment`] for a bad `align`. Cursors are
    /// unchanged on error.
    pub fn alloc_bottom(&mut self, size: usize, align: usize) -> CoreResult<ArenaSpan> {
        let mask = check_align(align)?;
        if size > self.bot {
            return Err(self.overflow(size, align));
        }

        let addr = self.base_address() + self.bot - size;
        let misalignment = addr & mask;
        let needed = size + misalignment;
        if self.bot < needed || self.bot - needed < self.top {
            return Err(self.overflow(size, align));
        }

        self.bot -= needed;
        self.record_peak();

        Ok(ArenaSpan {
            offset: self.bot,
            len: size,
            side: Side::Bottom,
        })
    }

    /// Allocates room for `count` values of `T` from the top front.
    ///
    /// # Errors
    ///
    /// Same as [`Arena::alloc_top`].
    pub fn alloc_top_slice<T: Pod>(&mut self, count: usize) -> CoreResult<ArenaSpan> {
        let size = slice_bytes::<T>(count).ok_or_else(|| self.overflow(usize::MAX, 1))?;
        self.alloc_top(size, std::mem::align_of::<T>())
    }

    /// Allocates room for `count` values of `T` from the bottom front.
    ///
    /// # Errors
    ///
    /// Same as [`Arena::alloc_bottom`].
    pub fn alloc_bottom_slice<T: Pod>(&mut self, count: usize) -> CoreResult<ArenaSpan> {
        let size = slice_bytes::<T>(count).ok_or_else(|| self.overflow(usize::MAX, 1))?;
        self.alloc_bottom(size, std::mem::align_of::<T>())
    }

    /// Snapshots the top cursor.
    #[inline]
    #[must_use]
    pub const fn mark_top(&self) -> TopMarker {
        TopMarker(self.top)
    }

    /// Snapshots the bottom cursor.
    #[inline]
    #[must_use]
    pub const fn mark_bottom(&self) -> BottomMarker {
        BottomMarker(self.bot)
    }

    /// Rewinds the top front to `marker`, reclaiming everything above it.
    ///
    /// No destructors run; callers must not hold data in the reclaimed span.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidMarker`] if `marker` lies above the current top.
    pub fn rewind_top(&mut self, marker: TopMarker) -> CoreResult<()> {
        if marker.0 > self.top {
            return Err(CoreError::InvalidMarker {
                marker: marker.0,
                cursor: self.top,
            });
        }
        self.top = marker.0;
        Ok(())
    }

    /// Rewinds the bottom front to `marker`, reclaiming everything below it.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidMarker`] if `marker` lies below the current bottom
    /// cursor or past the capacity.
    pub fn rewind_bottom(&mut self, marker: BottomMarker) -> CoreResult<()> {
        if marker.0 < self.bot || marker.0 > self.capacity {
            return Err(CoreError::InvalidMarker {
                marker: marker.0,
                cursor: self.bot,
            });
        }
        self.bot = marker.0;
        Ok(())
    }

    /// Releases the whole top front. Idempotent.
    #[inline]
    pub fn clear_top(&mut self) {
        self.top = 0;
    }

    /// Releases the whole bottom front. Idempotent.
    #[inline]
    pub fn clear_bottom(&mut self) {
        self.bot = self.capacity;
    }

    /// Bytes behind a live span.
    ///
    /// # Errors
    ///
    /// [`CoreError::StaleSpan`] if the span is no longer inside the used part
    /// of its front.
    pub fn bytes(&self, span: &ArenaSpan) -> CoreResult<&[u8]> {
        let range = self.live_range(span)?;
        Ok(&self.buffer()[range])
    }

    /// Mutable bytes behind a live span.
    ///
    /// # Errors
    ///
    /// Same as [`Arena::bytes`].
    pub fn bytes_mut(&mut self, span: &ArenaSpan) -> CoreResult<&mut [u8]> {
        let range = self.live_range(span)?;
        Ok(&mut self.buffer_mut()[range])
    }

    /// Views a live span as a slice of `T`.
    ///
    /// # Errors
    ///
    /// [`CoreError::StaleSpan`] as for [`Arena::bytes`];
    /// [`CoreError::LayoutMismatch`] if the span is misaligned for `T` or its
    /// length is not a multiple of `size_of::<T>()`.
    pub fn slice<T: Pod>(&self, span: &ArenaSpan) -> CoreResult<&[T]> {
        let bytes = self.bytes(span)?;
        bytemuck::try_cast_slice(bytes).map_err(|_| layout_mismatch::<T>(span))
    }

    /// Views a live span as a mutable slice of `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Arena::slice`].
    pub fn slice_mut<T: Pod>(&mut self, span: &ArenaSpan) -> CoreResult<&mut [T]> {
        let bytes = self.bytes_mut(span)?;
        bytemuck::try_cast_slice_mut(bytes).map_err(|_| layout_mismatch::<T>(span))
    }

    /// Copies the contents of `src` to the start of `dst`.
    ///
    /// # Errors
    ///
    /// [`CoreError::StaleSpan`] if either span is stale;
    /// [`CoreError::LayoutMismatch`] if `dst` is shorter than `src`.
    pub fn copy_span(&mut self, src: &ArenaSpan, dst: &ArenaSpan) -> CoreResult<()> {
        let from = self.live_range(src)?;
        let to = self.live_range(dst)?;
        if to.len() < from.len() {
            return Err(CoreError::LayoutMismatch {
                len: dst.len,
                type_name: "u8",
            });
        }
        self.buffer_mut().copy_within(from, to.start);
        Ok(())
    }

    fn live_range(&self, span: &ArenaSpan) -> CoreResult<Range<usize>> {
        let stale = || CoreError::StaleSpan {
            offset: span.offset,
            len: span.len,
        };
        let end = span.offset.checked_add(span.len).ok_or_else(stale)?;
        let live = match span.side {
            Side::Top => end <= self.top,
            Side::Bottom => span.offset >= self.bot && end <= self.capacity,
        };
        if live {
            Ok(span.offset..end)
        } else {
            Err(stale())
        }
    }

    fn buffer(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.storage)[..self.capacity]
    }

    fn buffer_mut(&mut self) -> &mut [u8] {
        let capacity = self.capacity;
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.storage)[..capacity]
    }

    fn record_peak(&mut self) {
        let used = self.top + (self.capacity - self.bot);
        self.peak_used = self.peak_used.max(used);
    }

    fn overflow(&self, requested: usize, align: usize) -> CoreError {
        CoreError::ArenaOverflow {
            requested,
            align,
            available: self.free(),
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity)
            .field("top", &self.top)
            .field("bot", &self.bot)
            .field("peak_used", &self.peak_used)
            .finish_non_exhaustive()
    }
}

/// Returns `align - 1` for a valid power-of-two alignment.
#[inline]
fn check_align(align: usize) -> CoreResult<usize> {
    if align.is_power_of_two() {
        Ok(align - 1)
    } else {
        Err(CoreError::InvalidAlignment(align))
    }
}

#[inline]
fn slice_bytes<T>(count: usize) -> Option<usize> {
    std::mem::size_of::<T>().checked_mul(count)
}

fn layout_mismatch<T>(span: &ArenaSpan) -> CoreError {
    CoreError::LayoutMismatch {
        len: span.len,
        type_name: std::any::type_name::<T>(),
    }
}
