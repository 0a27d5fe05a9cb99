//! Match recording and playback.
//!
//! A replay stores the serialized starting state and every intent applied
//! afterwards, keyed by the tick it was applied before. Playing it back
//! re-simulates the match; the final state hash detects divergence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::{Intent, PlayerId};
use crate::error::{GameError, Result};
use crate::simulation::Simulation;

/// Replay file format version.
pub const REPLAY_VERSION: u32 = 1;

/// One recorded intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCommand {
    /// Simulation tick when the intent was applied.
    pub tick: u64,
    /// Acting player.
    pub player: PlayerId,
    /// The intent.
    pub intent: Intent,
}

/// A recorded match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    /// Format version.
    pub version: u32,
    /// Scenario name.
    pub scenario_id: String,
    /// Match seed.
    pub seed: u64,
    /// Serialized starting state.
    pub initial_state: Vec<u8>,
    /// Intents in application order.
    pub commands: Vec<ReplayCommand>,
    /// Tick the recording stopped at.
    pub final_tick: u64,
    /// State hash at `final_tick`.
    pub final_hash: u64,
}

impl Replay {
    /// Start recording from `initial_state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be serialized.
    pub fn new(scenario_id: impl Into<String>, initial_state: &Simulation) -> Result<Self> {
        Ok(Self {
            version: REPLAY_VERSION,
            scenario_id: scenario_id.into(),
            seed: initial_state.world().config.seed,
            initial_state: initial_state.serialize()?,
            commands: Vec::new(),
            final_tick: initial_state.get_tick(),
            final_hash: initial_state.state_hash(),
        })
    }

    /// Record an intent applied at `tick`.
    pub fn record(&mut self, tick: u64, player: PlayerId, intent: Intent) {
        self.commands.push(ReplayCommand {
            tick,
            player,
            intent,
        });
    }

    /// Close the recording at the simulation's current state.
    pub fn finalize(&mut self, sim: &Simulation) {
        self.final_tick = sim.get_tick();
        self.final_hash = sim.state_hash();
    }

    /// Write the replay to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to write replay file: {e}")))
    }

    /// Read a replay from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails, or the file has
    /// a different format version.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::InvalidState(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize replay: {e}")))?;
        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }
        Ok(replay)
    }

    /// The recorded starting state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be deserialized.
    pub fn restore_initial_state(&self) -> Result<Simulation> {
        Simulation::deserialize(&self.initial_state)
    }

    /// Intents applied at `tick`.
    #[must_use]
    pub fn commands_at_tick(&self, tick: u64) -> Vec<&ReplayCommand> {
        self.commands.iter().filter(|c| c.tick == tick).collect()
    }

    /// Number of recorded intents.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

/// Steps through a replay.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    simulation: Simulation,
    command_index: usize,
}

impl ReplayPlayer {
    /// Load the starting state of `replay`.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial state cannot be restored.
    pub fn new(replay: Replay) -> Result<Self> {
        let simulation = replay.restore_initial_state()?;
        Ok(Self {
            replay,
            simulation,
            command_index: 0,
        })
    }

    /// Apply this tick's intents and advance one tick. Returns whether more
    /// ticks remain.
    ///
    /// # Errors
    ///
    /// Propagates simulation errors.
    pub fn advance(&mut self) -> Result<bool> {
        if self.is_finished() {
            return Ok(false);
        }
        let tick = self.simulation.get_tick();
        while let Some(cmd) = self.replay.commands.get(self.command_index) {
            if cmd.tick > tick {
                break;
            }
            self.simulation.apply_intent(cmd.player, cmd.intent)?;
            self.command_index += 1;
        }
        self.simulation.tick()?;
        Ok(!self.is_finished())
    }

    /// Restart and play up to `target_tick`.
    ///
    /// # Errors
    ///
    /// Returns an error if state restoration or simulation fails.
    pub fn seek(&mut self, target_tick: u64) -> Result<()> {
        self.simulation = self.replay.restore_initial_state()?;
        self.command_index = 0;
        while self.simulation.get_tick() < target_tick && self.advance()? {}
        Ok(())
    }

    /// Play to the end and compare with the recorded hash.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DesyncDetected`] when the hashes differ, or any
    /// error raised while re-simulating.
    pub fn verify(&mut self) -> Result<()> {
        self.seek(self.replay.final_tick)?;
        let local_hash = self.simulation.state_hash();
        if local_hash != self.replay.final_hash {
            return Err(GameError::DesyncDetected {
                tick: self.simulation.get_tick(),
                local_hash,
                remote_hash: self.replay.final_hash,
            });
        }
        Ok(())
    }

    /// Current tick of the playback.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.simulation.get_tick()
    }

    /// Current playback state.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Whether the recorded end has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.simulation.get_tick() >= self.replay.final_tick
    }
}
