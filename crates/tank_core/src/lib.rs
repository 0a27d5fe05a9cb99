//! # Tank Core
//!
//! Deterministic tick simulation for a multiplayer tank arena.
//!
//! This crate contains **only** the match rules:
//! - No networking
//! - No rendering
//! - No wall-clock time
//! - No unseeded randomness
//!
//! Fractional awards use fixed-point arithmetic and every collection is
//! iterated in a stable order, so two simulations fed the same intents stay
//! in lockstep. That is what makes replays and desync checks possible.
//!
//! ## Crate Structure
//!
//! - [`components`] - Entities, identifiers and wire enums
//! - [`grid`] - The arena and its spatial queries
//! - [`zone`] - Zone capture state machine
//! - [`score`] - Individual and team scoring
//! - [`systems`] - Per-tick systems (movement, projectiles, visibility, ...)
//! - [`simulation`] - The tick loop
//! - [`payload`] - Client snapshots
//! - [`replay`] - Recording and verification

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod collision;
pub mod components;
pub mod config;
pub mod error;
pub mod grid;
pub mod math;
pub mod payload;
pub mod replay;
pub mod roster;
pub mod score;
pub mod simulation;
pub mod systems;
pub mod world;
pub mod zone;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::MatchConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{CellMask, Grid};
    pub use crate::math::Fixed;
    pub use crate::payload::{GameStatePayload, GridPayload};
    pub use crate::replay::{Replay, ReplayPlayer};
    pub use crate::score::{ScoreKey, ScoringMode};
    pub use crate::simulation::{Simulation, TickEvents};
    pub use crate::world::{GameEvent, World};
    pub use crate::zone::ZoneState;
}
