//! # Music Clock
//!
//! Maps song time to a [`MusicPos`]. The game only ever asks "where in the
//! bar are we"; audio playback is out of scope.

use cadence_shared::MusicPos;

/// Source of the current musical position.
pub trait MusicClock {
    /// Position at `time` seconds since the song started.
    fn position(&self, time: f64) -> MusicPos;

    /// Beats in one bar.
    fn beats_per_bar(&self) -> u32;
}

/// A constant-tempo clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedTempo {
    bpm: f32,
    beats_per_bar: u32,
    /// Seconds of lead-in before beat zero.
    offset: f64,
}

impl FixedTempo {
    /// Creates a clock at `bpm` with `beats_per_bar` beats per bar.
    ///
    /// `beats_per_bar` is clamped to at least one.
    #[must_use]
    pub fn new(bpm: f32, beats_per_bar: u32) -> Self {
        Self {
            bpm,
            beats_per_bar: beats_per_bar.max(1),
            offset: 0.0,
        }
    }

    /// Delays beat zero by `seconds`.
    #[must_use]
    pub const fn with_offset(mut self, seconds: f64) -> Self {
        self.offset = seconds;
        self
    }

    /// Seconds per beat.
    #[must_use]
    pub fn beat_seconds(&self) -> f64 {
        60.0 / f64::from(self.bpm)
    }
}

impl MusicClock for FixedTempo {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn position(&self, time: f64) -> MusicPos {
        let beats = ((time - self.offset) / self.beat_seconds()).max(0.0);
        let whole = beats.floor();
        let beat_rel = (beats - whole) as f32;

        let whole = whole as u64;
        let per_bar = u64::from(self.beats_per_bar);
        let period = u32::try_from(whole / per_bar).unwrap_or(u32::MAX);
        let beat = (whole % per_bar) as u32;
        let bar_rel = (beat as f32 + beat_rel) / self.beats_per_bar as f32;

        MusicPos::new(period, bar_rel, beat_rel, beat)
    }

    fn beats_per_bar(&self) -> u32 {
        self.beats_per_bar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_at_120_bpm() {
        let clock = FixedTempo::new(120.0, 4);
        // Half a second per beat: 2.25 s is beat 4.5, i.e. bar 1, beat 0.
        let pos = clock.position(2.25);
        assert_eq!(pos.period, 1);
        assert_eq!(pos.beat, 0);
        assert!((pos.beat_rel - 0.5).abs() < 1e-6);
        assert!((pos.bar_rel - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_lead_in_clamps_to_zero() {
        let clock = FixedTempo::new(120.0, 4).with_offset(1.0);
        assert_eq!(clock.position(0.5), MusicPos::new(0, 0.0, 0.0, 0));
        // Half a second per beat after the lead-in.
        assert_eq!(clock.position(1.5).beat, 1);
        assert_eq!(clock.position(2.0).beat, 2);
    }

    #[test]
    fn test_beats_per_bar_never_zero() {
        let clock = FixedTempo::new(60.0, 0);
        assert_eq!(clock.beats_per_bar(), 1);
        assert_eq!(clock.position(3.0).period, 3);
    }
}
