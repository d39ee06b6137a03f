//! # Movement System
//!
//! Moves entities towards their movement target at constant speed. When an
//! entity first comes within tolerance of its target it snaps onto it, is
//! marked arrived, and its completion (if any) runs exactly once.
//!
//! Completions are owned closures, so they cannot live in the Pod pool.
//! They sit in a side table indexed by handle, each under a ticket that is
//! also written into the component it was started with. A completion runs
//! only for the component carrying its ticket; once that component is gone
//! from the store the completion is dropped unrun on the next update.
//!
//! A movement that has arrived stays attached until it is replaced by the
//! next [`MovementSystem::start`] or removed by [`MovementSystem::stop`].

use cadence_core::{
    Component, CoreResult, EntityStore, Handle, MovementComponent, MAX_HANDLES,
};
use cadence_shared::Vec3;

use crate::events::{FrameEvent, FrameEvents};

/// One-shot continuation run on arrival. May return an event to post.
pub type Completion = Box<dyn FnOnce(Handle) -> Option<FrameEvent>>;

/// A completion and the ticket of the component it belongs to.
struct Pending {
    ticket: u8,
    completion: Completion,
}

/// Movement update plus the completion side table.
pub struct MovementSystem {
    completions: Vec<Option<Pending>>,
    last_ticket: u8,
    tolerance: f32,
}

impl MovementSystem {
    /// Creates the system with arrival distance `tolerance`.
    #[must_use]
    pub fn new(tolerance: f32) -> Self {
        Self {
            completions: std::iter::repeat_with(|| None)
                .take(MAX_HANDLES as usize)
                .collect(),
            last_ticket: MovementComponent::NO_TICKET,
            tolerance,
        }
    }

    /// Arrival distance.
    #[must_use]
    pub const fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Starts moving `handle` towards `target`, running `on_arrival` once
    /// it gets there.
    ///
    /// A movement that has already arrived is replaced. Any completion
    /// still held for `handle` is dropped unrun.
    ///
    /// # Errors
    ///
    /// [`CoreError::AlreadyAttached`](cadence_core::CoreError::AlreadyAttached)
    /// if a movement is still in flight, or any attach error.
    pub fn start(
        &mut self,
        store: &mut EntityStore,
        handle: Handle,
        target: Vec3,
        velocity: f32,
        on_arrival: Option<Completion>,
    ) -> CoreResult<u32> {
        let finished = store
            .component::<MovementComponent>(handle)
            .is_some_and(MovementComponent::has_arrived);
        if finished {
            store.detach(handle, MovementComponent::KIND)?;
        }

        let ticket = if on_arrival.is_some() {
            self.issue_ticket()
        } else {
            MovementComponent::NO_TICKET
        };
        let movement = MovementComponent::new(target, velocity).with_ticket(ticket);
        let index = store.attach(handle, movement)?;
        self.completions[handle.index()] =
            on_arrival.map(|completion| Pending { ticket, completion });
        Ok(index)
    }

    /// Stops `handle`'s movement, dropping its completion unrun.
    ///
    /// # Errors
    ///
    /// [`CoreError::DeadHandle`](cadence_core::CoreError::DeadHandle).
    pub fn stop(&mut self, store: &mut EntityStore, handle: Handle) -> CoreResult<bool> {
        self.forget(handle);
        store.detach(handle, MovementComponent::KIND)
    }

    /// Drops `handle`'s completion.
    pub fn forget(&mut self, handle: Handle) {
        self.completions[handle.index()] = None;
    }

    /// Whether `handle` has a completion waiting.
    ///
    /// An entry whose component was removed behind the system's back stays
    /// visible here until the next [`MovementSystem::update`] drops it.
    #[must_use]
    pub fn has_completion(&self, handle: Handle) -> bool {
        self.completions[handle.index()].is_some()
    }

    /// Advances every moving entity by `dt` seconds.
    ///
    /// Returns the number of arrivals this frame.
    ///
    /// # Errors
    ///
    /// Propagates arena errors, which only occur if the store's spans were
    /// reclaimed.
    pub fn update(
        &mut self,
        store: &mut EntityStore,
        dt: f32,
        events: &mut FrameEvents,
    ) -> CoreResult<u32> {
        self.drop_orphans(store);

        let count = store.pool::<MovementComponent>().len();
        let mut arrivals = 0;

        for i in 0..count as usize {
            let mut movement = store.components::<MovementComponent>()?[i];
            if movement.has_arrived() {
                continue;
            }
            let owner = movement.owner();
            let Some(entity) = store.lookup_mut(owner) else {
                continue;
            };

            let to_target = movement.target - entity.position;
            let distance = to_target.length();
            movement.direction = to_target.normalize_or_zero();
            if distance > self.tolerance {
                let step = (movement.velocity * dt).min(distance);
                entity.position += movement.direction * step;
            }

            let arrived = entity.position.distance(movement.target) <= self.tolerance;
            if arrived {
                entity.position = movement.target;
                movement.arrived = 1;
            }
            store.components_mut::<MovementComponent>()?[i] = movement;

            if !arrived {
                continue;
            }
            arrivals += 1;
            let Some(pending) = self.completions[owner.index()].take() else {
                continue;
            };
            if pending.ticket != movement.ticket() {
                continue;
            }
            if let Some(event) = (pending.completion)(owner) {
                events.post(&mut store.scratch(), event);
            }
        }
        Ok(arrivals)
    }

    /// Drops every completion whose component no longer carries its ticket.
    fn drop_orphans(&mut self, store: &EntityStore) {
        for (raw, slot) in self.completions.iter_mut().enumerate() {
            let Some(pending) = slot.as_ref() else {
                continue;
            };
            let Ok(raw) = u8::try_from(raw) else {
                continue;
            };
            let handle = Handle::new(raw);
            let current = store
                .component::<MovementComponent>(handle)
                .map(MovementComponent::ticket);
            if current != Some(pending.ticket) {
                tracing::trace!(%handle, "dropping orphaned movement completion");
                *slot = None;
            }
        }
    }

    /// Next non-zero ticket. Tickets wrap; a handle holds at most one
    /// completion and `start` overwrites it.
    fn issue_ticket(&mut self) -> u8 {
        self.last_ticket = self.last_ticket.wrapping_add(1).max(1);
        self.last_ticket
    }
}

impl std::fmt::Debug for MovementSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.completions.iter().filter(|c| c.is_some()).count();
        f.debug_struct("MovementSystem")
            .field("tolerance", &self.tolerance)
            .field("pending_completions", &pending)
            .finish()
    }
}
