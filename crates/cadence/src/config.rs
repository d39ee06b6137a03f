//! # Game Configuration
//!
//! Everything the host sizes or tunes at startup, loaded from TOML. Every
//! field has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! arena_bytes = 65536
//! max_entities = 64
//! bpm = 128.0
//! hit_window = 0.2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use cadence_core::StoreConfig;

use crate::error::{GameError, GameResult};

/// Startup configuration for [`GameLoop`](crate::GameLoop).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Size of the single arena reservation, in bytes.
    pub arena_bytes: usize,
    /// Number of entity handles.
    pub max_entities: u16,
    /// Graphics pool capacity.
    pub graphics_capacity: u32,
    /// Movement pool capacity.
    pub movement_capacity: u32,
    /// Targeting pool capacity.
    pub targeting_capacity: u32,
    /// Dialogue pool capacity.
    pub dialogue_capacity: u32,
    /// Initial capacity of the per-frame event buffer.
    pub event_capacity: u32,
    /// Distance at which a moving entity counts as arrived.
    pub arrival_tolerance: f32,
    /// Tempo in beats per minute.
    pub bpm: f32,
    /// Beats in one bar.
    pub beats_per_bar: u32,
    /// Half-width of the hit window around a beat, in beats (`0 < w <= 0.5`).
    pub hit_window: f32,
    /// Song length in bars.
    pub song_bars: u32,
    /// Frame time above which a warning is logged, in milliseconds.
    pub frame_budget_ms: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        let store = StoreConfig::default();
        Self {
            arena_bytes: 64 * 1024,
            max_entities: store.max_entities,
            graphics_capacity: store.graphics_capacity,
            movement_capacity: store.movement_capacity,
            targeting_capacity: store.targeting_capacity,
            dialogue_capacity: store.dialogue_capacity,
            event_capacity: 32,
            arrival_tolerance: 0.01,
            bpm: 120.0,
            beats_per_bar: 4,
            hit_window: 0.15,
            song_bars: 8,
            frame_budget_ms: 16.6,
        }
    }
}

impl GameConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`GameError::ConfigParse`] for malformed TOML or unknown keys;
    /// [`GameError::InvalidConfig`] or [`GameError::Core`] for out-of-range
    /// values.
    pub fn from_toml_str(source: &str) -> GameResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`GameError::Io`] if the file cannot be read, otherwise as
    /// [`GameConfig::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> GameResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loading game config");
        Self::from_toml_str(&source)
    }

    /// The store sizes described by this configuration.
    #[must_use]
    pub const fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_entities: self.max_entities,
            graphics_capacity: self.graphics_capacity,
            movement_capacity: self.movement_capacity,
            targeting_capacity: self.targeting_capacity,
            dialogue_capacity: self.dialogue_capacity,
        }
    }

    /// Checks every value against the ranges the game can run with.
    ///
    /// # Errors
    ///
    /// [`GameError::Core`] for store sizes the core rejects;
    /// [`GameError::InvalidConfig`] for everything else.
    pub fn validate(&self) -> GameResult<()> {
        let store = self.store_config();
        store.validate()?;

        let required = store.required_bytes();
        if self.arena_bytes < required {
            return Err(invalid(format!(
                "arena_bytes {} is below the {required} bytes the store needs",
                self.arena_bytes
            )));
        }
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(invalid(format!("bpm must be positive, got {}", self.bpm)));
        }
        if self.beats_per_bar == 0 {
            return Err(invalid("beats_per_bar must be at least 1".to_owned()));
        }
        if !(self.hit_window > 0.0 && self.hit_window <= 0.5) {
            return Err(invalid(format!(
                "hit_window must be in (0, 0.5], got {}",
                self.hit_window
            )));
        }
        if self.song_bars == 0 {
            return Err(invalid("song_bars must be at least 1".to_owned()));
        }
        if !(self.arrival_tolerance >= 0.0 && self.frame_budget_ms > 0.0) {
            return Err(invalid(
                "arrival_tolerance must be >= 0 and frame_budget_ms > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

fn invalid(message: String) -> GameError {
    GameError::InvalidConfig(message)
}
