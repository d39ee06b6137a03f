//! # Component Pools
//!
//! Dense, fixed-capacity component storage carved from the arena's bottom
//! front. The pool itself holds only the span and counters; the bytes stay
//! in the arena and every access borrows it.
//!
//! - Append is O(1) at the tail
//! - Removal is O(1) by moving the tail element into the hole
//! - Iteration is a contiguous slice; order changes after removals

use std::marker::PhantomData;

use bytemuck::Pod;

use crate::error::{CoreError, CoreResult};
use crate::memory::{Arena, ArenaSpan};

/// Pre-allocated dense storage for one component type.
///
/// # Type Parameters
///
/// * `T` - The element type
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = Arena::new(4096);
/// let mut pool: ComponentPool<u32> = ComponentPool::new(&mut arena, 16)?;
/// let i = pool.append(&mut arena, 7)?;
/// assert_eq!(*pool.get(&arena, i)?, 7);
/// ```
pub struct ComponentPool<T> {
    /// Bottom-front block of `capacity` elements.
    span: ArenaSpan,
    /// Live elements, always packed at `[0, count)`.
    count: u32,
    capacity: u32,
    _phantom: PhantomData<T>,
}

impl<T: Pod> ComponentPool<T> {
    /// Reserves `capacity` elements from the bottom front of `arena`.
    ///
    /// # Arguments
    ///
    /// * `arena` - Arena to carve from
    /// * `capacity` - Maximum number of elements
    ///
    /// # Errors
    ///
    /// [`CoreError::ArenaOverflow`] if the block does not fit.
    pub fn new(arena: &mut Arena, capacity: u32) -> CoreResult<Self> {
        let span = arena.alloc_bottom_slice::<T>(capacity as usize)?;
        Ok(Self {
            span,
            count: 0,
            capacity,
            _phantom: PhantomData,
        })
    }

    /// Writes `item` at the tail and returns its index.
    ///
    /// # Errors
    ///
    /// [`CoreError::CapacityExceeded`] when the pool is full.
    pub fn append(&mut self, arena: &mut Arena, item: T) -> CoreResult<u32> {
        if self.count == self.capacity {
            return Err(CoreError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        let index = self.count;
        arena.slice_mut::<T>(&self.span)?[index as usize] = item;
        self.count += 1;
        Ok(index)
    }

    /// Removes the element at `index` by moving the tail into its place.
    ///
    /// Returns the old index of the relocated element, or `None` if `index`
    /// was the tail and nothing moved. After a move the element formerly at
    /// the returned index now lives at `index`.
    ///
    /// # Errors
    ///
    /// [`CoreError::IndexOutOfBounds`] if `index >= len()`.
    pub fn remove_at(&mut self, arena: &mut Arena, index: u32) -> CoreResult<Option<u32>> {
        if index >= self.count {
            return Err(CoreError::IndexOutOfBounds {
                index,
                len: self.count,
            });
        }
        let last = self.count - 1;
        let moved = if index == last {
            None
        } else {
            let items = arena.slice_mut::<T>(&self.span)?;
            items[index as usize] = items[last as usize];
            Some(last)
        };
        self.count = last;
        Ok(moved)
    }

    /// The element at `index`.
    ///
    /// # Errors
    ///
    /// [`CoreError::IndexOutOfBounds`] if `index >= len()`.
    pub fn get<'a>(&self, arena: &'a Arena, index: u32) -> CoreResult<&'a T> {
        let items = self.as_slice(arena)?;
        items.get(index as usize).ok_or(CoreError::IndexOutOfBounds {
            index,
            len: self.count,
        })
    }

    /// The element at `index`, mutably.
    ///
    /// # Errors
    ///
    /// [`CoreError::IndexOutOfBounds`] if `index >= len()`.
    pub fn get_mut<'a>(&self, arena: &'a mut Arena, index: u32) -> CoreResult<&'a mut T> {
        let len = self.count;
        let items = self.as_mut_slice(arena)?;
        items
            .get_mut(index as usize)
            .ok_or(CoreError::IndexOutOfBounds { index, len })
    }

    /// The live elements, densely packed.
    ///
    /// # Errors
    ///
    /// [`CoreError::StaleSpan`] if the bottom front was rewound past the pool.
    pub fn as_slice<'a>(&self, arena: &'a Arena) -> CoreResult<&'a [T]> {
        let items = arena.slice::<T>(&self.span)?;
        Ok(&items[..self.count as usize])
    }

    /// The live elements, mutably.
    ///
    /// # Errors
    ///
    /// [`CoreError::StaleSpan`] if the bottom front was rewound past the pool.
    pub fn as_mut_slice<'a>(&self, arena: &'a mut Arena) -> CoreResult<&'a mut [T]> {
        let items = arena.slice_mut::<T>(&self.span)?;
        Ok(&mut items[..self.count as usize])
    }

    /// Drops every element. The block stays reserved.
    #[inline]
    pub fn clear(&mut self) {
        self.count = 0;
    }
}

impl<T> ComponentPool<T> {
    /// Number of live elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.count
    }

    /// Alias of [`ComponentPool::len`].
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.count
    }

    /// `true` when no element is live.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Maximum number of elements.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// The arena block backing this pool.
    #[inline]
    #[must_use]
    pub const fn span(&self) -> ArenaSpan {
        self.span
    }
}

impl<T> std::fmt::Debug for ComponentPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentPool")
            .field("type", &std::any::type_name::<T>())
            .field("count", &self.count)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with(values: &[u32]) -> (Arena, ComponentPool<u32>) {
        let mut arena = Arena::new(256);
        let mut pool = ComponentPool::new(&mut arena, 8).unwrap();
        for &v in values {
            pool.append(&mut arena, v).unwrap();
        }
        (arena, pool)
    }

    #[test]
    fn test_pool_reserves_from_bottom() {
        let mut arena = Arena::new(256);
        let pool: ComponentPool<u32> = ComponentPool::new(&mut arena, 8).unwrap();
        assert_eq!(pool.capacity(), 8);
        assert!(pool.is_empty());
        assert_eq!(arena.stats().bottom_used, 32);
        assert_eq!(arena.stats().top_used, 0);
    }

    #[test]
    fn test_append_then_get() {
        let (mut arena, mut pool) = pool_with(&[10, 20]);
        let i = pool.append(&mut arena, 30).unwrap();
        assert_eq!(i, 2);
        assert_eq!(pool.size(), 3);
        assert_eq!(*pool.get(&arena, pool.size() - 1).unwrap(), 30);
    }

    #[test]
    fn test_remove_middle_moves_tail() {
        let (mut arena, mut pool) = pool_with(&[10, 20, 30, 40]);
        let moved = pool.remove_at(&mut arena, 1).unwrap();
        assert_eq!(moved, Some(3));
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.as_slice(&arena).unwrap(), &[10, 40, 30]);
    }

    #[test]
    fn test_remove_tail_moves_nothing() {
        let (mut arena, mut pool) = pool_with(&[10, 20]);
        assert_eq!(pool.remove_at(&mut arena, 1).unwrap(), None);
        assert_eq!(pool.as_slice(&arena).unwrap(), &[10]);
    }

    #[test]
    fn test_bounds_and_capacity() {
        let (mut arena, mut pool) = pool_with(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(
            pool.append(&mut arena, 9),
            Err(CoreError::CapacityExceeded { capacity: 8 })
        );
        assert!(matches!(
            pool.remove_at(&mut arena, 8),
            Err(CoreError::IndexOutOfBounds { index: 8, len: 8 })
        ));
        assert!(pool.get(&arena, 8).is_err());
        *pool.get_mut(&mut arena, 0).unwrap() = 100;
        assert_eq!(*pool.get(&arena, 0).unwrap(), 100);
    }

    #[test]
    fn test_pool_larger_than_arena_fails() {
        let mut arena = Arena::new(16);
        assert!(ComponentPool::<u64>::new(&mut arena, 4).is_err());
        assert_eq!(arena.stats().bottom_used, 0);
    }
}
