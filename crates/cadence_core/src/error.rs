//! # Core Error Types
//!
//! Every failure the arena or the store can report. None of them abort;
//! a failed call leaves the arena cursors and the store untouched.

use thiserror::Error;

/// Errors that can occur in the core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The request plus its alignment padding does not fit between the fronts.
    #[error("arena overflow: requested {requested} bytes (align {align}), {available} free")]
    ArenaOverflow {
        /// Payload size in bytes.
        requested: usize,
        /// Requested alignment.
        align: usize,
        /// Free bytes between the fronts at the time of the call.
        available: usize,
    },

    /// Every entity handle is in use.
    #[error("out of entity handles: all {capacity} are live")]
    OutOfHandles {
        /// Number of handles the store was built with.
        capacity: usize,
    },

    /// A component pool is full.
    #[error("component pool full: capacity {capacity}")]
    CapacityExceeded {
        /// Pool capacity in elements.
        capacity: u32,
    },

    /// A marker that does not describe a point inside the used part of its side.
    #[error("invalid marker {marker} for cursor {cursor}")]
    InvalidMarker {
        /// The marker value.
        marker: usize,
        /// The current cursor on that side.
        cursor: usize,
    },

    /// Alignment was zero or not a power of two.
    #[error("invalid alignment {0}: must be a power of two")]
    InvalidAlignment(usize),

    /// A span that a rewind has already reclaimed.
    #[error("stale span at offset {offset} (len {len})")]
    StaleSpan {
        /// Span start offset.
        offset: usize,
        /// Span length.
        len: usize,
    },

    /// A span whose size or alignment does not fit the requested element type.
    #[error("span of {len} bytes cannot be viewed as [{type_name}]")]
    LayoutMismatch {
        /// Span length.
        len: usize,
        /// Element type requested.
        type_name: &'static str,
    },

    /// Pool index at or past the element count.
    #[error("index {index} out of bounds for pool of {len}")]
    IndexOutOfBounds {
        /// The index.
        index: u32,
        /// Current element count.
        len: u32,
    },

    /// The handle does not name a live entity.
    #[error("entity {0} is not alive")]
    DeadHandle(u8),

    /// The entity already owns a component of this kind.
    #[error("entity {handle} already has a {kind} component")]
    AlreadyAttached {
        /// Entity handle.
        handle: u8,
        /// Component kind name.
        kind: &'static str,
    },

    /// A store invariant does not hold (reported by `EntityStore::verify`).
    #[error("store invariant violated: {0}")]
    InvariantViolated(String),

    /// Store configuration outside the representable range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
