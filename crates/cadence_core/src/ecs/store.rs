//! # Entity Store
//!
//! The central container for entities and their components. Owns the arena;
//! the entity table, the free-handle FIFO and every component pool are carved
//! from its bottom front at construction. The top front stays available as
//! per-frame scratch.
//!
//! Removing a component moves the pool's tail element into the hole. The
//! store then rewrites the moved element's owner so its slot index points at
//! the new position; no entity ever holds a stale index.

use cadence_shared::Vec3;

use super::component::{
    Component, ComponentKind, ComponentPools, DialogueComponent, GraphicsComponent,
    MovementComponent, TargetingComponent,
};
use super::entity::{Entity, Handle};
use super::pool::ComponentPool;
use crate::error::{CoreError, CoreResult};
use crate::memory::{Arena, ArenaSpan, FrameScratch};

/// Largest entity count addressable by a `u8` handle.
pub const MAX_HANDLES: u16 = 256;

/// Largest pool capacity addressable by a `u8` slot (255 is "none").
pub const MAX_POOL_CAPACITY: u32 = 255;

/// Sizes of the entity table and of each component pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of entity handles (`1..=256`).
    pub max_entities: u16,
    /// Graphics pool capacity (`<= 255`).
    pub graphics_capacity: u32,
    /// Movement pool capacity (`<= 255`).
    pub movement_capacity: u32,
    /// Targeting pool capacity (`<= 255`).
    pub targeting_capacity: u32,
    /// Dialogue pool capacity (`<= 255`).
    pub dialogue_capacity: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_entities: 128,
            graphics_capacity: 128,
            movement_capacity: 64,
            targeting_capacity: 64,
            dialogue_capacity: 8,
        }
    }
}

impl StoreConfig {
    /// Checks every size against what handles and slot indices can address.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_entities == 0 || self.max_entities > MAX_HANDLES {
            return Err(CoreError::InvalidConfig(format!(
                "max_entities must be in 1..={MAX_HANDLES}, got {}",
                self.max_entities
            )));
        }
        for (name, capacity) in [
            ("graphics_capacity", self.graphics_capacity),
            ("movement_capacity", self.movement_capacity),
            ("targeting_capacity", self.targeting_capacity),
            ("dialogue_capacity", self.dialogue_capacity),
        ] {
            if capacity > MAX_POOL_CAPACITY {
                return Err(CoreError::InvalidConfig(format!(
                    "{name} must be <= {MAX_POOL_CAPACITY}, got {capacity}"
                )));
            }
        }
        Ok(())
    }

    /// Bottom-front bytes the store needs, including worst-case padding.
    #[must_use]
    pub const fn required_bytes(&self) -> usize {
        const fn block<T>(count: usize) -> usize {
            count * std::mem::size_of::<T>() + std::mem::align_of::<T>() - 1
        }
        let n = self.max_entities as usize;
        block::<Entity>(n)
            + block::<u8>(n)
            + block::<GraphicsComponent>(self.graphics_capacity as usize)
            + block::<MovementComponent>(self.movement_capacity as usize)
            + block::<TargetingComponent>(self.targeting_capacity as usize)
            + block::<DialogueComponent>(self.dialogue_capacity as usize)
    }
}

/// FIFO ring of unused handles, stored in the arena.
#[derive(Debug)]
struct FreeHandles {
    span: ArenaSpan,
    head: u16,
    len: u16,
    capacity: u16,
}

impl FreeHandles {
    fn pop(&mut self, arena: &Arena) -> CoreResult<Option<Handle>> {
        if self.len == 0 {
            return Ok(None);
        }
        let ring = arena.slice::<u8>(&self.span)?;
        let handle = Handle::new(ring[self.head as usize]);
        self.head = (self.head + 1) % self.capacity;
        self.len -= 1;
        Ok(Some(handle))
    }

    fn push(&mut self, arena: &mut Arena, handle: Handle) -> CoreResult<()> {
        let tail = (self.head + self.len) % self.capacity;
        arena.slice_mut::<u8>(&self.span)?[tail as usize] = handle.raw();
        self.len += 1;
        Ok(())
    }

    fn iter<'a>(&self, arena: &'a Arena) -> CoreResult<impl Iterator<Item = Handle> + 'a> {
        let ring = arena.slice::<u8>(&self.span)?;
        let (head, len, capacity) = (self.head, self.len, self.capacity);
        Ok((0..len).map(move |i| Handle::new(ring[((head + i) % capacity) as usize])))
    }
}

/// Fixed-capacity entity table plus one dense pool per component kind.
///
/// All memory comes from the arena handed to [`EntityStore::new`]. No
/// allocation happens during create, destroy, attach or detach.
///
/// # Example
///
/// ```rust,ignore
/// let config = StoreConfig::default();
/// let mut store = EntityStore::new(Arena::new(config.required_bytes()), config)?;
///
/// let h = store.create()?.handle();
/// store.attach(h, GraphicsComponent::default())?;
/// store.destroy(h)?;
/// ```
pub struct EntityStore {
    arena: Arena,
    /// `[Entity; max_entities]`, indexed by handle.
    entities: ArenaSpan,
    free: FreeHandles,
    pools: ComponentPools,
    max_entities: u16,
    live_count: u16,
}

impl EntityStore {
    /// Carves the entity table, the handle FIFO and all pools from the bottom
    /// of `arena`. Handles are issued in ascending order.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidConfig`] for out-of-range sizes;
    /// [`CoreError::ArenaOverflow`] if the arena is too small.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(mut arena: Arena, config: StoreConfig) -> CoreResult<Self> {
        config.validate()?;
        let n = config.max_entities;

        let entities = arena.alloc_bottom_slice::<Entity>(n as usize)?;
        let queue = arena.alloc_bottom_slice::<u8>(n as usize)?;
        let pools = ComponentPools {
            graphics: ComponentPool::new(&mut arena, config.graphics_capacity)?,
            movement: ComponentPool::new(&mut arena, config.movement_capacity)?,
            targeting: ComponentPool::new(&mut arena, config.targeting_capacity)?,
            dialogue: ComponentPool::new(&mut arena, config.dialogue_capacity)?,
        };

        // n <= 256, so every index fits a u8.
        for (i, slot) in arena.slice_mut::<Entity>(&entities)?.iter_mut().enumerate() {
            *slot = Entity::vacant(Handle::new(i as u8));
        }
        for (i, h) in arena.slice_mut::<u8>(&queue)?.iter_mut().enumerate() {
            *h = i as u8;
        }

        tracing::debug!(
            max_entities = n,
            bottom_bytes = arena.stats().bottom_used,
            free_bytes = arena.free(),
            "entity store carved from arena"
        );

        Ok(Self {
            arena,
            entities,
            free: FreeHandles {
                span: queue,
                head: 0,
                len: n,
                capacity: n,
            },
            pools,
            max_entities: n,
            live_count: 0,
        })
    }

    /// Maximum number of live entities.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_entities as usize
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live_count as usize
    }

    /// The backing arena, read-only.
    #[inline]
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The component pools.
    #[inline]
    #[must_use]
    pub const fn pools(&self) -> &ComponentPools {
        &self.pools
    }

    /// Creates an entity with the next free handle.
    ///
    /// # Errors
    ///
    /// [`CoreError::OutOfHandles`] when every handle is live.
    pub fn create(&mut self) -> CoreResult<&mut Entity> {
        let handle = self
            .free
            .pop(&self.arena)?
            .ok_or(CoreError::OutOfHandles {
                capacity: self.capacity(),
            })?;
        self.live_count += 1;
        let entity = self.slot_mut(handle)?;
        *entity = Entity::fresh(handle);
        Ok(entity)
    }

    /// Creates an entity at `position`, returning its handle.
    ///
    /// # Errors
    ///
    /// [`CoreError::OutOfHandles`] when every handle is live.
    pub fn spawn_at(&mut self, position: Vec3) -> CoreResult<Handle> {
        let entity = self.create()?;
        entity.position = position;
        Ok(entity.handle())
    }

    /// Destroys a live entity, detaching all of its components.
    ///
    /// The table slot is reset in place and the handle goes to the back of
    /// the free FIFO.
    ///
    /// # Errors
    ///
    /// [`CoreError::DeadHandle`] if `handle` is not live.
    pub fn destroy(&mut self, handle: Handle) -> CoreResult<()> {
        self.live(handle)?;
        for kind in ComponentKind::ALL {
            self.detach(handle, kind)?;
        }
        *self.slot_mut(handle)? = Entity::vacant(handle);
        self.free.push(&mut self.arena, handle)?;
        self.live_count -= 1;
        tracing::trace!(%handle, live = self.live_count, "entity destroyed");
        Ok(())
    }

    /// Appends `component` to its pool and records the index on the owner.
    ///
    /// Returns the pool index.
    ///
    /// # Errors
    ///
    /// [`CoreError::DeadHandle`], [`CoreError::AlreadyAttached`], or
    /// [`CoreError::CapacityExceeded`] from the pool.
    pub fn attach<C: Component>(&mut self, handle: Handle, mut component: C) -> CoreResult<u32> {
        if self.live(handle)?.has(C::KIND) {
            return Err(CoreError::AlreadyAttached {
                handle: handle.raw(),
                kind: C::KIND.name(),
            });
        }
        let pool = C::pool_mut(&mut self.pools);
        let slot = u8::try_from(pool.len()).map_err(|_| CoreError::CapacityExceeded {
            capacity: pool.capacity(),
        })?;

        component.set_owner(handle);
        let index = pool.append(&mut self.arena, component)?;
        self.slot_mut(handle)?.set_component(C::KIND, Some(slot));
        Ok(index)
    }

    /// Removes the entity's component of `kind`, if any.
    ///
    /// Returns whether a component was removed.
    ///
    /// # Errors
    ///
    /// [`CoreError::DeadHandle`] if `handle` is not live.
    pub fn detach(&mut self, handle: Handle, kind: ComponentKind) -> CoreResult<bool> {
        match kind {
            ComponentKind::Graphics => self.detach_kind::<GraphicsComponent>(handle),
            ComponentKind::Movement => self.detach_kind::<MovementComponent>(handle),
            ComponentKind::Targeting => self.detach_kind::<TargetingComponent>(handle),
            ComponentKind::Dialogue => self.detach_kind::<DialogueComponent>(handle),
        }
    }

    fn detach_kind<C: Component>(&mut self, handle: Handle) -> CoreResult<bool> {
        let Some(slot) = self.live(handle)?.component(C::KIND) else {
            return Ok(false);
        };
        let index = u32::from(slot);

        let pool = C::pool_mut(&mut self.pools);
        if pool.remove_at(&mut self.arena, index)?.is_some() {
            // The tail now sits at `index`; point its owner there.
            let moved_owner = pool.get(&self.arena, index)?.owner();
            self.slot_mut(moved_owner)?.set_component(C::KIND, Some(slot));
        }
        self.slot_mut(handle)?.set_component(C::KIND, None);
        Ok(true)
    }

    /// The live entity behind `handle`.
    #[must_use]
    pub fn lookup(&self, handle: Handle) -> Option<&Entity> {
        self.live(handle).ok()
    }

    /// The live entity behind `handle`, mutably (for its position).
    pub fn lookup_mut(&mut self, handle: Handle) -> Option<&mut Entity> {
        self.slot_mut(handle).ok().filter(|e| e.is_alive())
    }

    /// Whether `handle` names a live entity.
    #[must_use]
    pub fn is_alive(&self, handle: Handle) -> bool {
        self.lookup(handle).is_some()
    }

    /// The entity's component of type `C`.
    #[must_use]
    pub fn component<C: Component>(&self, handle: Handle) -> Option<&C> {
        let slot = self.lookup(handle)?.component(C::KIND)?;
        C::pool(&self.pools).get(&self.arena, u32::from(slot)).ok()
    }

    /// The entity's component of type `C`, mutably.
    pub fn component_mut<C: Component>(&mut self, handle: Handle) -> Option<&mut C> {
        let slot = self.lookup(handle)?.component(C::KIND)?;
        C::pool(&self.pools)
            .get_mut(&mut self.arena, u32::from(slot))
            .ok()
    }

    /// The pool for `C`.
    #[inline]
    #[must_use]
    pub fn pool<C: Component>(&self) -> &ComponentPool<C> {
        C::pool(&self.pools)
    }

    /// Every `C` component, densely packed.
    ///
    /// # Errors
    ///
    /// [`CoreError::StaleSpan`] only if the arena has been corrupted.
    pub fn components<C: Component>(&self) -> CoreResult<&[C]> {
        C::pool(&self.pools).as_slice(&self.arena)
    }

    /// Every `C` component, mutably.
    ///
    /// # Errors
    ///
    /// [`CoreError::StaleSpan`] only if the arena has been corrupted.
    pub fn components_mut<C: Component>(&mut self) -> CoreResult<&mut [C]> {
        C::pool(&self.pools).as_mut_slice(&mut self.arena)
    }

    /// Visits every `C` component in pool order.
    ///
    /// # Errors
    ///
    /// [`CoreError::StaleSpan`] only if the arena has been corrupted.
    pub fn for_each<C: Component>(&self, mut f: impl FnMut(u32, &C)) -> CoreResult<()> {
        for (i, c) in (0u32..).zip(self.components::<C>()?) {
            f(i, c);
        }
        Ok(())
    }

    /// Visits every `C` component in pool order, mutably.
    ///
    /// # Errors
    ///
    /// [`CoreError::StaleSpan`] only if the arena has been corrupted.
    pub fn for_each_mut<C: Component>(&mut self, mut f: impl FnMut(u32, &mut C)) -> CoreResult<()> {
        for (i, c) in (0u32..).zip(self.components_mut::<C>()?) {
            f(i, c);
        }
        Ok(())
    }

    /// Live entities in handle order.
    pub fn iter_alive(&self) -> impl Iterator<Item = &Entity> {
        self.arena
            .slice::<Entity>(&self.entities)
            .unwrap_or(&[])
            .iter()
            .filter(|e| e.is_alive())
    }

    /// The arena's top front, for this frame's transient allocations.
    #[inline]
    pub fn scratch(&mut self) -> FrameScratch<'_> {
        self.arena.scratch()
    }

    /// Releases all frame scratch. Call exactly once per frame, after every
    /// consumer of this frame's scratch is done.
    pub fn end_frame(&mut self) {
        let used = self.arena.stats().top_used;
        self.arena.clear_top();
        tracing::trace!(scratch_bytes = used, "frame scratch cleared");
    }

    /// Checks the store's invariants.
    ///
    /// - every attached slot points at a pool element owned by that entity
    /// - every pool element's owner is live and points back at it
    /// - the free FIFO holds exactly the dead handles, once each
    /// - the arena fronts have not crossed
    ///
    /// # Errors
    ///
    /// [`CoreError::InvariantViolated`] describing the first broken rule.
    pub fn verify(&self) -> CoreResult<()> {
        let stats = self.arena.stats();
        if stats.top_used + stats.bottom_used > stats.capacity {
            return Err(violation(format!("arena fronts crossed: {stats:?}")));
        }

        let table = self.arena.slice::<Entity>(&self.entities)?;
        self.verify_kind::<GraphicsComponent>(table)?;
        self.verify_kind::<MovementComponent>(table)?;
        self.verify_kind::<TargetingComponent>(table)?;
        self.verify_kind::<DialogueComponent>(table)?;

        let live = table.iter().filter(|e| e.is_alive()).count();
        if live != self.live_count() {
            return Err(violation(format!(
                "live count {} but {live} live rows",
                self.live_count
            )));
        }

        let mut seen = [false; MAX_HANDLES as usize];
        for handle in self.free.iter(&self.arena)? {
            if std::mem::replace(&mut seen[handle.index()], true) {
                return Err(violation(format!("handle {handle} queued twice")));
            }
            if table.get(handle.index()).map_or(true, Entity::is_alive) {
                return Err(violation(format!("handle {handle} queued but live")));
            }
        }
        if self.free.len as usize + live != self.capacity() {
            return Err(violation(format!(
                "{} free + {live} live != {}",
                self.free.len, self.max_entities
            )));
        }
        Ok(())
    }

    fn verify_kind<C: Component>(&self, table: &[Entity]) -> CoreResult<()> {
        let items = self.components::<C>()?;
        for entity in table.iter().filter(|e| e.is_alive()) {
            if let Some(slot) = entity.component(C::KIND) {
                match items.get(slot as usize) {
                    Some(c) if c.owner() == entity.handle() => {}
                    _ => {
                        return Err(violation(format!(
                            "{} {} slot {slot} does not point back",
                            entity.handle(),
                            C::KIND
                        )))
                    }
                }
            }
        }
        for (i, c) in items.iter().enumerate() {
            let owner = table.get(c.owner().index());
            let points_back = owner.is_some_and(|e| {
                e.is_alive() && e.component(C::KIND).map(usize::from) == Some(i)
            });
            if !points_back {
                return Err(violation(format!(
                    "{} element {i} owned by {} which does not point back",
                    C::KIND,
                    c.owner()
                )));
            }
        }
        Ok(())
    }

    fn live(&self, handle: Handle) -> CoreResult<&Entity> {
        self.arena
            .slice::<Entity>(&self.entities)?
            .get(handle.index())
            .filter(|e| e.is_alive())
            .ok_or(CoreError::DeadHandle(handle.raw()))
    }

    fn slot_mut(&mut self, handle: Handle) -> CoreResult<&mut Entity> {
        self.arena
            .slice_mut::<Entity>(&self.entities)?
            .get_mut(handle.index())
            .ok_or(CoreError::DeadHandle(handle.raw()))
    }
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("live_count", &self.live_count)
            .field("max_entities", &self.max_entities)
            .field("pools", &self.pools)
            .field("arena", &self.arena)
            .finish_non_exhaustive()
    }
}

fn violation(message: String) -> CoreError {
    CoreError::InvariantViolated(message)
}
