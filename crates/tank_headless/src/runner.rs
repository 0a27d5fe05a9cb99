//! Interactive JSON-lines session.

use std::io::{self, BufRead, Write};

use tank_core::prelude::*;

use crate::protocol::{Command, Response};

/// Serves one match over the JSON-lines protocol.
#[derive(Debug)]
pub struct HeadlessRunner {
    sim: Simulation,
}

impl HeadlessRunner {
    /// Serve an existing match.
    #[must_use]
    pub const fn new(sim: Simulation) -> Self {
        Self { sim }
    }

    /// Serve a fresh, empty match.
    #[must_use]
    pub fn with_config(config: MatchConfig) -> Self {
        Self::new(Simulation::new(config))
    }

    /// The match being served.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Serve on stdin/stdout until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout cannot be written.
    pub fn serve(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run(stdin.lock(), stdout.lock())
    }

    /// Read commands from `input` and write responses to `output`.
    ///
    /// Unparseable lines get an error response and the session continues.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        output.write_all(Response::ready(self.sim.get_tick()).to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (response, quit) = match Command::from_json(line) {
                Ok(cmd) => {
                    let quit = matches!(cmd, Command::Quit);
                    (self.handle(cmd), quit)
                }
                Err(e) => (Response::error(format!("Parse error: {e}"), None), false),
            };
            output.write_all(response.to_json_line().as_bytes())?;
            output.flush()?;
            if quit {
                break;
            }
        }
        tracing::info!(tick = self.sim.get_tick(), "Session closed");
        Ok(())
    }

    /// Execute one command.
    pub fn handle(&mut self, cmd: Command) -> Response {
        let name = cmd.name();
        match self.execute(cmd) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(cmd = name, %err, "Command failed");
                Response::error(err.to_string(), Some(name))
            }
        }
    }

    fn execute(&mut self, cmd: Command) -> Result<Response> {
        let name = cmd.name();
        match cmd {
            Command::AddPlayer { nickname, team } => {
                let player = self.sim.add_player(&nickname, team.map(TeamId))?;
                Ok(Response::PlayerAdded { player: player.0 })
            }
            Command::AddTeam { name } => {
                let team = self.sim.world_mut().roster.add_team(name);
                Ok(Response::TeamAdded { team: team.0 })
            }
            Command::RemovePlayer { player } => {
                self.sim.remove_player(PlayerId(player))?;
                Ok(Response::ack(name))
            }
            Command::Intent { player, intent } => {
                self.sim.apply_intent(PlayerId(player), intent)?;
                Ok(Response::ack(name))
            }
            Command::Step { count } => {
                let mut events = Vec::new();
                for _ in 0..count {
                    events.extend(self.sim.tick()?.events);
                }
                Ok(Response::Stepped {
                    tick: self.sim.get_tick(),
                    events,
                })
            }
            Command::State { player } => {
                let state = match player {
                    Some(viewer) => {
                        let viewer = PlayerId(viewer);
                        if self.sim.roster().player(viewer).is_none() {
                            return Err(GameError::PlayerNotFound(viewer));
                        }
                        GameStatePayload::for_player(&self.sim, viewer)
                    }
                    None => GameStatePayload::snapshot(&self.sim),
                };
                Ok(Response::State {
                    state: Box::new(state),
                    hash: self.sim.state_hash(),
                })
            }
            Command::Hash => Ok(Response::StateHash {
                tick: self.sim.get_tick(),
                hash: self.sim.state_hash(),
            }),
            Command::ResetAbilities => {
                self.sim.reset_abilities();
                Ok(Response::ack(name))
            }
            Command::Quit => Ok(Response::Bye),
        }
    }
}
