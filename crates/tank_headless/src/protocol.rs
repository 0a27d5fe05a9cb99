//! JSON-lines protocol for driving a match over stdin/stdout.
//!
//! One JSON object per line in each direction. Logs go to stderr.
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"add_player","nickname":"bot"}
//! <- {"type":"player_added","player":1}
//! -> {"cmd":"intent","player":1,"intent":{"Move":"Forward"}}
//! <- {"type":"ack","cmd":"intent"}
//! -> {"cmd":"step","count":10}
//! <- {"type":"stepped","tick":10,"events":[...]}
//! -> {"cmd":"hash"}
//! <- {"type":"state_hash","tick":10,"hash":1234}
//! -> {"cmd":"quit"}
//! <- {"type":"bye"}
//! ```

use serde::{Deserialize, Serialize};

use tank_core::components::Intent;
use tank_core::payload::GameStatePayload;
use tank_core::world::GameEvent;

/// Protocol version reported in [`Response::Ready`].
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands accepted by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Join a new player with a tank at a random free cell.
    AddPlayer {
        /// Display name.
        nickname: String,
        /// Team id, for team-scored matches.
        #[serde(default)]
        team: Option<u32>,
    },

    /// Register a team.
    AddTeam {
        /// Display name.
        name: String,
    },

    /// Remove a player and everything they own.
    RemovePlayer {
        /// Player id.
        player: u32,
    },

    /// Queue an intent for the next tick.
    Intent {
        /// Player id.
        player: u32,
        /// The intent.
        intent: Intent,
    },

    /// Advance the simulation (default: one tick).
    Step {
        /// Number of ticks.
        #[serde(default = "default_step_count")]
        count: u32,
    },

    /// Full snapshot, or one player's redacted view.
    State {
        /// Viewer; everything when absent.
        #[serde(default)]
        player: Option<u32>,
    },

    /// Current state hash.
    Hash,

    /// Restore every tank's ammo and cooldowns.
    ResetAbilities,

    /// End the session.
    Quit,
}

fn default_step_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses written by the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        /// Protocol version.
        version: String,
        /// Current tick.
        tick: u64,
    },

    /// Command accepted.
    Ack {
        /// Command name.
        cmd: String,
    },

    /// Command failed.
    Error {
        /// What went wrong.
        message: String,
        /// Command name, if the line parsed.
        cmd: Option<String>,
    },

    /// A player joined.
    PlayerAdded {
        /// Assigned id.
        player: u32,
    },

    /// A team was registered.
    TeamAdded {
        /// Assigned id.
        team: u32,
    },

    /// Ticks were simulated.
    Stepped {
        /// Tick after stepping.
        tick: u64,
        /// Events raised while stepping, oldest first.
        events: Vec<GameEvent>,
    },

    /// Match snapshot.
    State {
        /// The snapshot.
        state: Box<GameStatePayload>,
        /// State hash at the snapshot.
        hash: u64,
    },

    /// State hash for determinism checks.
    StateHash {
        /// Current tick.
        tick: u64,
        /// Hash.
        hash: u64,
    },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    #[must_use]
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    #[must_use]
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    #[must_use]
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to a JSON line (with newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Command name for acknowledgments and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddPlayer { .. } => "add_player",
            Self::AddTeam { .. } => "add_team",
            Self::RemovePlayer { .. } => "remove_player",
            Self::Intent { .. } => "intent",
            Self::Step { .. } => "step",
            Self::State { .. } => "state",
            Self::Hash => "hash",
            Self::ResetAbilities => "reset_abilities",
            Self::Quit => "quit",
        }
    }
}
