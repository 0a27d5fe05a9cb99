//! Error types for the arena simulation.
//!
//! Game-rule rejections (a blocked move, a stunned turret) are not errors and
//! never show up here. Everything in [`GameError`] is a contract violation by
//! the caller and aborts the current operation.

use thiserror::Error;

use crate::components::{EntityId, PlayerId};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// A wire enum carried a discriminant outside its range.
    #[error("Invalid {kind} value: {value}")]
    InvalidEnumValue {
        /// Name of the enum being converted.
        kind: &'static str,
        /// The rejected raw value.
        value: i64,
    },

    /// Score awards must be non-negative.
    #[error("Score must be non-negative, got {0}")]
    NegativeScore(String),

    /// Referenced player is not part of the match.
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// Referenced tank does not exist.
    #[error("Tank not found: {0}")]
    TankNotFound(EntityId),

    /// Team scoring was selected but the player has no team.
    #[error("Player {0} has no team in a team-scored match")]
    PlayerWithoutTeam(PlayerId),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Replayed simulation diverged from the recorded one.
    #[error("Desync detected at tick {tick}: local hash {local_hash}, remote hash {remote_hash}")]
    DesyncDetected {
        /// Tick where desync occurred.
        tick: u64,
        /// Local simulation hash.
        local_hash: u64,
        /// Remote simulation hash.
        remote_hash: u64,
    },
}
