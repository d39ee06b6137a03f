//! Position in the musical timeline, as produced by the music clock.

use serde::{Deserialize, Serialize};

/// Where the song currently is.
///
/// - `period`: number of whole bars elapsed
/// - `bar_rel`: progress through the current bar, `[0, 1)`
/// - `beat_rel`: progress through the current beat, `[0, 1)`
/// - `beat`: beat index inside the current bar
///
/// Equality is total and field-wise: the float fields compare by bit
/// pattern, so every value equals itself.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct MusicPos {
    /// Whole bars elapsed.
    pub period: u32,
    /// Progress through the current bar.
    pub bar_rel: f32,
    /// Progress through the current beat.
    pub beat_rel: f32,
    /// Beat index within the bar.
    pub beat: u32,
}

impl MusicPos {
    /// Creates a music position.
    #[must_use]
    pub const fn new(period: u32, bar_rel: f32, beat_rel: f32, beat: u32) -> Self {
        Self {
            period,
            bar_rel,
            beat_rel,
            beat,
        }
    }

    /// Absolute beat number since the start of the song.
    #[must_use]
    pub const fn absolute_beat(&self, beats_per_bar: u32) -> u64 {
        self.period as u64 * beats_per_bar as u64 + self.beat as u64
    }

    /// Distance, in beats, to the closest beat boundary (`0.0..=0.5`).
    #[must_use]
    pub fn beat_offset(&self) -> f32 {
        self.beat_rel.min(1.0 - self.beat_rel).max(0.0)
    }

    /// `true` when `self` sits on a different beat than `previous`.
    #[must_use]
    pub const fn is_new_beat(&self, previous: &Self) -> bool {
        self.period != previous.period || self.beat != previous.beat
    }
}

impl PartialEq for MusicPos {
    fn eq(&self, other: &Self) -> bool {
        self.period == other.period
            && self.bar_rel.to_bits() == other.bar_rel.to_bits()
            && self.beat_rel.to_bits() == other.beat_rel.to_bits()
            && self.beat == other.beat
    }
}

impl Eq for MusicPos {}
