//! The tick loop.
//!
//! [`Simulation`] owns the [`World`] and the tick counter. Drivers apply
//! player intents between ticks and then call [`Simulation::update`], which
//! runs every system in a fixed order:
//!
//! 1. stun countdown
//! 2. ability maintenance (ammo, cooldowns)
//! 3. tank regeneration
//! 4. bullets
//! 5. mines
//! 6. lasers
//! 7. zones
//! 8. visibility
//! 9. item pickup and item spawn, when items are enabled

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::components::{Cell, Direction, Intent, PlayerId, TeamId};
use crate::config::MatchConfig;
use crate::error::{GameError, Result};
use crate::grid::Grid;
use crate::roster::Roster;
use crate::systems::{abilities, bullet, control, items, laser, mine, spawn, visibility};
use crate::world::{GameEvent, World};
use crate::zone;

/// Events generated during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Tick the events belong to.
    pub tick: u64,
    /// Everything that happened, in order.
    pub events: Vec<GameEvent>,
}

/// A running match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    tick: u64,
    world: World,
}

impl Simulation {
    /// A new match at tick 0 with an empty arena.
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        Self {
            tick: 0,
            world: World::new(config),
        }
    }

    /// Ticks simulated so far.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// The arena.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.world.grid
    }

    /// Players and teams.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.world.roster
    }

    /// Full match state.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Mutable match state, for scenario setup.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Advance by one tick.
    ///
    /// # Errors
    ///
    /// See [`update`](Self::update).
    pub fn tick(&mut self) -> Result<TickEvents> {
        self.update(1)
    }

    /// Advance by one tick, letting bullets travel `tick_delta` ticks' worth
    /// of distance.
    ///
    /// # Errors
    ///
    /// Propagates contract errors raised by a system. The tick is aborted
    /// at that point and the state is not rolled back.
    pub fn update(&mut self, tick_delta: u32) -> Result<TickEvents> {
        let world = &mut self.world;
        world.events.clear();

        world.stun.update();
        spawn::update_cooldowns(world);
        spawn::update_regeneration(world);
        bullet::update(world, tick_delta)?;
        mine::update(world)?;
        laser::update(world)?;
        zone::update(world)?;
        visibility::update(world);
        if world.config.items_enabled {
            items::update_pickup(world);
            items::generate_new_item(world);
        }

        self.tick += 1;
        let events = std::mem::take(&mut self.world.events);
        tracing::debug!(
            tick = self.tick,
            state_hash = self.state_hash(),
            events = events.len(),
            "tick complete"
        );
        Ok(TickEvents {
            tick: self.tick,
            events,
        })
    }

    /// Apply one player's intent for the coming tick.
    ///
    /// Rule violations (blocked moves, stuns, empty magazines) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PlayerNotFound`] for an unknown player.
    pub fn apply_intent(&mut self, player: PlayerId, intent: Intent) -> Result<()> {
        if self.world.roster.player(player).is_none() {
            return Err(GameError::PlayerNotFound(player));
        }
        let Some(tank) = self.world.grid.tank_of(player).map(|t| t.id) else {
            return Ok(());
        };

        let world = &mut self.world;
        let applied = match intent {
            Intent::Pass => true,
            Intent::Move(movement) => {
                control::try_move_tank(&mut world.grid, &world.stun, tank, movement)
            }
            Intent::Rotate { tank: body, turret } => {
                let body = body.map_or(true, |r| {
                    control::try_rotate_tank(&mut world.grid, &world.stun, tank, r)
                });
                let turret = turret.map_or(true, |r| {
                    control::try_rotate_turret(&mut world.grid, &world.stun, tank, r)
                });
                body && turret
            }
            Intent::UseAbility(ability) => abilities::use_ability(world, tank, ability),
        };
        if !applied {
            tracing::trace!(%player, ?intent, "intent rejected");
        }
        Ok(())
    }

    /// Add a player with a tank on a random free cell.
    ///
    /// # Errors
    ///
    /// See [`spawn::add_player`].
    pub fn add_player(&mut self, nickname: &str, team: Option<TeamId>) -> Result<PlayerId> {
        spawn::add_player(&mut self.world, nickname, team)
    }

    /// Add a player with a tank at a fixed cell.
    ///
    /// # Errors
    ///
    /// See [`spawn::add_player_at`].
    pub fn add_player_at(
        &mut self,
        nickname: &str,
        team: Option<TeamId>,
        cell: Cell,
        direction: Direction,
    ) -> Result<PlayerId> {
        spawn::add_player_at(&mut self.world, nickname, team, cell, direction)
    }

    /// Remove a player and everything they own.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PlayerNotFound`] for an unknown player.
    pub fn remove_player(&mut self, player: PlayerId) -> Result<()> {
        spawn::remove_player(&mut self.world, player)
    }

    /// Clear every cooldown, refill ammo and drop radar flags.
    pub fn reset_abilities(&mut self) {
        spawn::reset_abilities(&mut self.world);
    }

    /// Hash of the observable match state, for desync detection.
    ///
    /// Entities are hashed in storage order, which is creation order and
    /// therefore identical across runs with the same inputs.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        let world = &self.world;
        self.tick.hash(&mut hasher);

        world.grid.walls().hash(&mut hasher);
        world.grid.tanks.len().hash(&mut hasher);
        for tank in &world.grid.tanks {
            tank.id.hash(&mut hasher);
            tank.owner.hash(&mut hasher);
            tank.cell.hash(&mut hasher);
            tank.direction.hash(&mut hasher);
            tank.turret_direction.hash(&mut hasher);
            tank.health.hash(&mut hasher);
            tank.respawn_remaining.hash(&mut hasher);
            tank.held_item.hash(&mut hasher);
            tank.abilities.hash(&mut hasher);
        }

        world.grid.bullets.len().hash(&mut hasher);
        for b in &world.grid.bullets {
            (b.id, b.cell, b.direction, b.damage, b.kind, b.shooter).hash(&mut hasher);
        }
        world.grid.lasers.len().hash(&mut hasher);
        for l in &world.grid.lasers {
            (l.id, l.cell, l.remaining_ticks, l.shooter).hash(&mut hasher);
        }
        world.grid.mines.len().hash(&mut hasher);
        for m in &world.grid.mines {
            (m.id, m.cell, m.layer, m.explosion_remaining).hash(&mut hasher);
        }
        for z in &world.grid.zones {
            (z.index, z.state).hash(&mut hasher);
        }
        world.grid.items.len().hash(&mut hasher);
        for item in &world.grid.items {
            (item.cell, item.kind).hash(&mut hasher);
        }

        for player in world.roster.players() {
            (player.id, player.team, player.score, player.kills).hash(&mut hasher);
        }
        for team in world.roster.teams() {
            (team.id, team.score).hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Serialize the full match state.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize simulation: {e}")))
    }

    /// Restore a match from [`serialize`](Self::serialize) output.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let mut sim: Self = bincode::deserialize(data).map_err(|e| {
            GameError::InvalidState(format!("Failed to deserialize simulation: {e}"))
        })?;
        let empty = sim.world.empty_mask();
        for tank in &mut sim.world.grid.tanks {
            if tank.is_dead() {
                tank.visibility = std::sync::Arc::clone(&empty);
            }
        }
        Ok(sim)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}
