//! # Game Error Types
//!
//! Errors surfaced by the host: core failures, configuration problems and
//! I/O while loading configuration.

use thiserror::Error;

use cadence_core::CoreError;

/// Errors that can occur in the game host.
#[derive(Error, Debug)]
pub enum GameError {
    /// The arena or the entity store refused an operation.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// The configuration file is not valid TOML for [`GameConfig`](crate::GameConfig).
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading the configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for host operations.
pub type GameResult<T> = Result<T, GameError>;
