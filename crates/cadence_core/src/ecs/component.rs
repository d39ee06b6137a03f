//! # Component System
//!
//! Components are pure data stored in dense, arena-backed pools. Each one
//! carries the handle of its owning entity so the store can repair the
//! owner's index after a swap-with-last removal.

use bytemuck::{Pod, Zeroable};
use cadence_shared::{Mat4, Vec3};

use super::entity::Handle;
use super::pool::ComponentPool;

/// The component kinds the store keeps a pool for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ComponentKind {
    /// Transform, material and mesh reference.
    Graphics = 0,
    /// Target, speed and direction of travel.
    Movement = 1,
    /// Arched flight towards another entity.
    Targeting = 2,
    /// Current line of an on-screen dialogue.
    Dialogue = 3,
}

impl ComponentKind {
    /// Number of component kinds.
    pub const COUNT: usize = 4;

    /// Every kind, in pool order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Graphics,
        Self::Movement,
        Self::Targeting,
        Self::Dialogue,
    ];

    /// Position of this kind in per-entity slot arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Graphics => "graphics",
            Self::Movement => "movement",
            Self::Targeting => "targeting",
            Self::Dialogue => "dialogue",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The pools backing an [`EntityStore`](super::EntityStore), one per kind.
///
/// Only the store constructs this; it is public so [`Component`] can name it.
#[derive(Debug)]
pub struct ComponentPools {
    pub(crate) graphics: ComponentPool<GraphicsComponent>,
    pub(crate) movement: ComponentPool<MovementComponent>,
    pub(crate) targeting: ComponentPool<TargetingComponent>,
    pub(crate) dialogue: ComponentPool<DialogueComponent>,
}

impl ComponentPools {
    /// Element count of the pool for `kind`.
    #[must_use]
    pub const fn len(&self, kind: ComponentKind) -> u32 {
        match kind {
            ComponentKind::Graphics => self.graphics.len(),
            ComponentKind::Movement => self.movement.len(),
            ComponentKind::Targeting => self.targeting.len(),
            ComponentKind::Dialogue => self.dialogue.len(),
        }
    }
}

/// Trait for ECS components.
///
/// Components must be:
/// - `Pod`: plain bytes, so pools can be carved from the arena
/// - able to report and accept their owner's handle
pub trait Component: Pod + std::fmt::Debug {
    /// The pool this component lives in.
    const KIND: ComponentKind;

    /// Handle of the owning entity.
    fn owner(&self) -> Handle;

    /// Records the owning entity. Called by the store on attach.
    fn set_owner(&mut self, owner: Handle);

    /// This kind's pool.
    fn pool(pools: &ComponentPools) -> &ComponentPool<Self>;

    /// This kind's pool, mutably.
    fn pool_mut(pools: &mut ComponentPools) -> &mut ComponentPool<Self>;
}

/// Renderable state: model transform plus material and mesh references.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GraphicsComponent {
    /// Model matrix. Its translation follows the owner's position.
    pub transform: Mat4,
    /// Material index understood by the renderer.
    pub material: u32,
    /// Mesh index understood by the renderer.
    pub mesh: u32,
    owner: u8,
    /// Non-zero when the renderer should draw this component.
    pub visible: u8,
    _padding: [u8; 2],
}

impl GraphicsComponent {
    /// Creates a visible graphics component.
    #[must_use]
    pub const fn new(transform: Mat4, material: u32, mesh: u32) -> Self {
        Self {
            transform,
            material,
            mesh,
            owner: 0,
            visible: 1,
            _padding: [0; 2],
        }
    }
}

impl Default for GraphicsComponent {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, 0, 0)
    }
}

impl Component for GraphicsComponent {
    const KIND: ComponentKind = ComponentKind::Graphics;

    fn owner(&self) -> Handle {
        Handle::new(self.owner)
    }

    fn set_owner(&mut self, owner: Handle) {
        self.owner = owner.raw();
    }

    fn pool(pools: &ComponentPools) -> &ComponentPool<Self> {
        &pools.graphics
    }

    fn pool_mut(pools: &mut ComponentPools) -> &mut ComponentPool<Self> {
        &mut pools.graphics
    }
}

/// Straight-line travel towards a target point.
///
/// The completion continuation fired on arrival is owned by the movement
/// system. This record carries the ticket that continuation was issued
/// under; a continuation only runs for the component holding its ticket.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MovementComponent {
    /// Where the owner is heading.
    pub target: Vec3,
    /// Unit direction of the last step.
    pub direction: Vec3,
    /// Speed in world units per second.
    pub velocity: f32,
    owner: u8,
    /// Non-zero once the owner has reached the target.
    pub arrived: u8,
    ticket: u8,
    _padding: u8,
}

impl MovementComponent {
    /// Ticket value meaning "no completion attached".
    pub const NO_TICKET: u8 = 0;

    /// Creates a movement towards `target` at `velocity` units per second.
    #[must_use]
    pub const fn new(target: Vec3, velocity: f32) -> Self {
        Self {
            target,
            direction: Vec3::ZERO,
            velocity,
            owner: 0,
            arrived: 0,
            ticket: Self::NO_TICKET,
            _padding: 0,
        }
    }

    /// Same movement, tagged with completion ticket `ticket`.
    #[must_use]
    pub const fn with_ticket(mut self, ticket: u8) -> Self {
        self.ticket = ticket;
        self
    }

    /// Completion ticket, [`MovementComponent::NO_TICKET`] if none.
    #[inline]
    #[must_use]
    pub const fn ticket(&self) -> u8 {
        self.ticket
    }

    /// Whether the owner has reached its target.
    #[inline]
    #[must_use]
    pub const fn has_arrived(&self) -> bool {
        self.arrived != 0
    }
}

impl Component for MovementComponent {
    const KIND: ComponentKind = ComponentKind::Movement;

    fn owner(&self) -> Handle {
        Handle::new(self.owner)
    }

    fn set_owner(&mut self, owner: Handle) {
        self.owner = owner.raw();
    }

    fn pool(pools: &ComponentPools) -> &ComponentPool<Self> {
        &pools.movement
    }

    fn pool_mut(pools: &mut ComponentPools) -> &mut ComponentPool<Self> {
        &mut pools.movement
    }
}

/// Arched flight from a start point to another entity.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TargetingComponent {
    /// Where the flight started.
    pub start: Vec3,
    /// Direction the arch bulges towards.
    pub arch_normal: Vec3,
    /// Seconds left until impact.
    pub remaining: f32,
    /// Total flight time in seconds.
    pub duration: f32,
    /// Peak height of the arch.
    pub height: f32,
    target: u8,
    owner: u8,
    _padding: [u8; 2],
}

impl TargetingComponent {
    /// Creates a flight from `start` to `target` lasting `duration` seconds.
    #[must_use]
    pub const fn new(start: Vec3, target: Handle, arch_normal: Vec3, height: f32, duration: f32) -> Self {
        Self {
            start,
            arch_normal,
            remaining: duration,
            duration,
            height,
            target: target.raw(),
            owner: 0,
            _padding: [0; 2],
        }
    }

    /// The entity being flown towards.
    #[inline]
    #[must_use]
    pub const fn target(&self) -> Handle {
        Handle::new(self.target)
    }

    /// Flight progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (1.0 - self.remaining / self.duration).clamp(0.0, 1.0)
    }
}

impl Component for TargetingComponent {
    const KIND: ComponentKind = ComponentKind::Targeting;

    fn owner(&self) -> Handle {
        Handle::new(self.owner)
    }

    fn set_owner(&mut self, owner: Handle) {
        self.owner = owner.raw();
    }

    fn pool(pools: &ComponentPools) -> &ComponentPool<Self> {
        &pools.targeting
    }

    fn pool_mut(pools: &mut ComponentPools) -> &mut ComponentPool<Self> {
        &mut pools.targeting
    }
}

/// A line of dialogue shown above the owner.
///
/// The dialogue system counts `remaining` down each frame and detaches the
/// component once it reaches zero.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct DialogueComponent {
    /// Index of the line in the host's dialogue table.
    pub line: u32,
    /// Seconds the line stays on screen.
    pub remaining: f32,
    owner: u8,
    _padding: [u8; 3],
}

impl DialogueComponent {
    /// Shows `line` for `seconds`.
    #[must_use]
    pub const fn new(line: u32, seconds: f32) -> Self {
        Self {
            line,
            remaining: seconds,
            owner: 0,
            _padding: [0; 3],
        }
    }

    /// Whether the line's time on screen is up.
    #[inline]
    #[must_use]
    pub fn has_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

impl Component for DialogueComponent {
    const KIND: ComponentKind = ComponentKind::Dialogue;

    fn owner(&self) -> Handle {
        Handle::new(self.owner)
    }

    fn set_owner(&mut self, owner: Handle) {
        self.owner = owner.raw();
    }

    fn pool(pools: &ComponentPools) -> &ComponentPool<Self> {
        &pools.dialogue
    }

    fn pool_mut(pools: &mut ComponentPools) -> &mut ComponentPool<Self> {
        &mut pools.dialogue
    }
}
