//! Scenario loading and match setup.
//!
//! A scenario is a RON file describing the arena (config, wall rows, zones),
//! the players taking part and an optional script of intents. Building it
//! yields a ready-to-run [`Simulation`] plus the mapping from seat names to
//! player ids.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tank_core::components::{Cell, Direction, Intent, PlayerId, TeamId, Zone};
use tank_core::config::MatchConfig;
use tank_core::error::GameError;
use tank_core::simulation::Simulation;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Parsed, but inconsistent.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
    /// The simulation rejected the setup.
    #[error("Scenario setup failed: {0}")]
    Game(#[from] GameError),
}

/// A fixed starting cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Initial facing.
    #[serde(default)]
    pub direction: Direction,
}

/// One seat in the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Nickname, also used to address the player in the script.
    pub nickname: String,
    /// Team name, required for team-scored matches.
    #[serde(default)]
    pub team: Option<String>,
    /// Fixed spawn; a random free cell when absent.
    #[serde(default)]
    pub spawn: Option<SpawnPoint>,
}

/// A capturable zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSetup {
    /// Label.
    pub index: char,
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Width in cells.
    pub width: i32,
    /// Height in cells.
    pub height: i32,
}

/// An intent the runner applies before simulating `tick`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedIntent {
    /// Tick the intent is applied at.
    pub tick: u64,
    /// Nickname of the acting player.
    pub player: String,
    /// What they do.
    pub intent: Intent,
}

/// A complete scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Match rules.
    #[serde(default)]
    pub config: MatchConfig,
    /// Wall rows, `#` for a wall. Empty for an open arena.
    #[serde(default)]
    pub walls: Vec<String>,
    /// Zones.
    #[serde(default)]
    pub zones: Vec<ZoneSetup>,
    /// Team names, in id order.
    #[serde(default)]
    pub teams: Vec<String>,
    /// Seats, in join order.
    pub players: Vec<PlayerSetup>,
    /// Scripted intents.
    #[serde(default)]
    pub script: Vec<ScriptedIntent>,
}

/// A built scenario.
#[derive(Debug, Clone)]
pub struct PreparedMatch {
    /// Simulation at tick 0.
    pub sim: Simulation,
    /// Player id of every seat, by nickname.
    pub seats: BTreeMap<String, PlayerId>,
    /// Script with resolved player ids, sorted by tick.
    pub script: Vec<(u64, PlayerId, Intent)>,
}

impl PreparedMatch {
    /// Scripted intents for `tick`.
    pub fn intents_at(&self, tick: u64) -> impl Iterator<Item = (PlayerId, Intent)> + '_ {
        self.script
            .iter()
            .filter(move |(t, _, _)| *t == tick)
            .map(|&(_, player, intent)| (player, intent))
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Two tanks in opposite corners of a small walled arena with one zone.
    #[must_use]
    pub fn duel() -> Self {
        Self {
            name: "duel".to_string(),
            description: "Two tanks, a wall in the middle, one zone".to_string(),
            config: MatchConfig {
                dim: 8,
                seed: 7,
                items_enabled: false,
                ..MatchConfig::default()
            },
            walls: vec![
                "........".to_string(),
                "........".to_string(),
                "........".to_string(),
                "...##...".to_string(),
                "...##...".to_string(),
                "........".to_string(),
                "........".to_string(),
                "........".to_string(),
            ],
            zones: vec![ZoneSetup {
                index: 'A',
                x: 0,
                y: 6,
                width: 2,
                height: 2,
            }],
            teams: Vec::new(),
            players: vec![
                PlayerSetup {
                    nickname: "red".to_string(),
                    team: None,
                    spawn: Some(SpawnPoint {
                        x: 0,
                        y: 7,
                        direction: Direction::Up,
                    }),
                },
                PlayerSetup {
                    nickname: "blue".to_string(),
                    team: None,
                    spawn: Some(SpawnPoint {
                        x: 7,
                        y: 0,
                        direction: Direction::Down,
                    }),
                },
            ],
            script: Vec::new(),
        }
    }

    /// Build the starting simulation.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Invalid`] for malformed walls or zones,
    /// unknown team or player names and duplicate nicknames, and
    /// [`ScenarioError::Game`] when a player cannot be placed.
    pub fn build(&self) -> Result<PreparedMatch, ScenarioError> {
        self.config.validate()?;
        let dim = self.config.dim;
        let mut sim = Simulation::new(self.config.clone());

        self.place_walls(&mut sim)?;
        for zone in &self.zones {
            if zone.width < 1 || zone.height < 1 {
                return Err(ScenarioError::Invalid(format!(
                    "zone '{}' has no area",
                    zone.index
                )));
            }
            let corner = Cell::new(zone.x + zone.width - 1, zone.y + zone.height - 1);
            if !sim.grid().is_within_bounds(Cell::new(zone.x, zone.y))
                || !sim.grid().is_within_bounds(corner)
            {
                return Err(ScenarioError::Invalid(format!(
                    "zone '{}' leaves the {dim}x{dim} arena",
                    zone.index
                )));
            }
            sim.world_mut().grid.zones.push(Zone::new(
                zone.index,
                zone.x,
                zone.y,
                zone.width,
                zone.height,
            ));
        }

        let teams: BTreeMap<&str, TeamId> = self
            .teams
            .iter()
            .map(|name| (name.as_str(), sim.world_mut().roster.add_team(name.clone())))
            .collect();

        let mut seats = BTreeMap::new();
        for setup in &self.players {
            let team = match setup.team.as_deref() {
                Some(name) => Some(*teams.get(name).ok_or_else(|| {
                    ScenarioError::Invalid(format!(
                        "player '{}' names unknown team '{name}'",
                        setup.nickname
                    ))
                })?),
                None => None,
            };
            let player = match setup.spawn {
                Some(spawn) => sim.add_player_at(
                    &setup.nickname,
                    team,
                    Cell::new(spawn.x, spawn.y),
                    spawn.direction,
                )?,
                None => sim.add_player(&setup.nickname, team)?,
            };
            if seats.insert(setup.nickname.clone(), player).is_some() {
                return Err(ScenarioError::Invalid(format!(
                    "duplicate player '{}'",
                    setup.nickname
                )));
            }
        }

        let mut script = self
            .script
            .iter()
            .map(|step| {
                seats
                    .get(&step.player)
                    .map(|&player| (step.tick, player, step.intent))
                    .ok_or_else(|| {
                        ScenarioError::Invalid(format!(
                            "script names unknown player '{}'",
                            step.player
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        script.sort_by_key(|&(tick, _, _)| tick);

        tracing::info!(
            scenario = %self.name,
            dim,
            players = seats.len(),
            scripted = script.len(),
            "Scenario built"
        );
        Ok(PreparedMatch { sim, seats, script })
    }

    fn place_walls(&self, sim: &mut Simulation) -> Result<(), ScenarioError> {
        if self.walls.is_empty() {
            return Ok(());
        }
        let dim = self.config.dim;
        let expected = usize::try_from(dim).unwrap_or(0);
        if self.walls.len() != expected {
            return Err(ScenarioError::Invalid(format!(
                "expected {dim} wall rows, found {}",
                self.walls.len()
            )));
        }
        let grid = &mut sim.world_mut().grid;
        for (y, row) in (0..).zip(&self.walls) {
            if row.chars().count() != expected {
                return Err(ScenarioError::Invalid(format!(
                    "wall row {y} should be {dim} cells wide"
                )));
            }
            for (x, ch) in (0..).zip(row.chars()) {
                grid.set_wall(Cell::new(x, y), ch == '#');
            }
        }
        Ok(())
    }
}
