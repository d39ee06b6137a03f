//! Gamepad button state and press-edge detection.
//!
//! The host polls raw button levels every frame; [`EdgeDetector`] turns
//! them into a [`GamepadSnapshot`] whose bits are set only on the frame a
//! button went from released to pressed.

use serde::{Deserialize, Serialize};

/// Bitmask over the eight buttons the game reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Buttons(u8);

impl Buttons {
    /// No buttons.
    pub const NONE: Self = Self(0);
    /// Face button A.
    pub const A: Self = Self(1 << 0);
    /// Face button B.
    pub const B: Self = Self(1 << 1);
    /// Face button X.
    pub const X: Self = Self(1 << 2);
    /// Face button Y.
    pub const Y: Self = Self(1 << 3);
    /// D-pad up.
    pub const UP: Self = Self(1 << 4);
    /// D-pad down.
    pub const DOWN: Self = Self(1 << 5);
    /// D-pad left.
    pub const LEFT: Self = Self(1 << 6);
    /// D-pad right.
    pub const RIGHT: Self = Self(1 << 7);

    /// Builds a mask from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `true` if every bit of `other` is set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// `true` if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of buttons set.
    #[inline]
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl std::ops::BitOr for Buttons {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for Buttons {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::ops::Not for Buttons {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Buttons pressed this frame (rising edges only).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GamepadSnapshot {
    /// Buttons that transitioned from released to pressed this frame.
    pub pressed: Buttons,
}

impl GamepadSnapshot {
    /// `true` if `button` was pressed this frame.
    #[inline]
    #[must_use]
    pub const fn just_pressed(&self, button: Buttons) -> bool {
        self.pressed.contains(button)
    }
}

/// Remembers last frame's levels to derive press edges.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeDetector {
    previous: Buttons,
}

impl EdgeDetector {
    /// Creates a detector that considers every button released.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous: Buttons::NONE,
        }
    }

    /// Feeds this frame's raw levels and returns the rising edges.
    pub fn update(&mut self, held: Buttons) -> GamepadSnapshot {
        let pressed = held & !self.previous;
        self.previous = held;
        GamepadSnapshot { pressed }
    }
}
