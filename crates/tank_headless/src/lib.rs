//! Headless match runner for bot testing and CI verification.
//!
//! Drives a [`tank_core`] simulation without any client attached:
//!
//! - **Bots**: a controller plays over JSON lines on stdin/stdout
//! - **Scenarios**: RON files with an arena, seats and scripted intents
//! - **Replays**: recorded runs are re-simulated and their final hash checked
//!
//! See [`protocol`] for the command/response format.
//!
//! # Example
//!
//! ```bash
//! # Serve an empty match
//! echo '{"cmd":"step","count":60}' | cargo run -p tank_headless -- serve
//!
//! # Play a scenario and record it
//! cargo run -p tank_headless -- run scenarios/duel.ron --ticks 600 --record duel.replay
//!
//! # Check a recording
//! cargo run -p tank_headless -- verify duel.replay
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod game_runner;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use game_runner::{determinism_check, run_scenario, FinishedRun, RunOutcome};
pub use protocol::{Command, Response};
pub use runner::HeadlessRunner;
pub use scenario::{PreparedMatch, Scenario, ScenarioError};
