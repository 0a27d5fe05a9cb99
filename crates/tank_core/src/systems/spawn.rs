//! Joining and leaving, spawn-point search, and respawns.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::components::{Cell, Direction, PlayerId, Tank, TeamId, MAX_HEALTH};
use crate::error::{GameError, Result};
use crate::grid::Grid;
use crate::score::ScoringMode;
use crate::systems::items::drop_item;
use crate::world::{GameEvent, World};

/// Attempts at finding a free cell for a tank.
pub const TANK_SPAWN_ATTEMPTS: u32 = 1000;

/// A random cell that is empty, outside every zone, and unseen by any tank.
pub fn find_free_cell(grid: &Grid, rng: &mut ChaCha8Rng, attempts: u32) -> Option<Cell> {
    let dim = grid.dim();
    if dim == 0 {
        return None;
    }
    (0..attempts).find_map(|_| {
        let cell = Cell::new(rng.gen_range(0..dim), rng.gen_range(0..dim));
        let free = grid.objects_at(cell).is_empty()
            && grid.tanks.iter().all(|t| t.cell != Some(cell))
            && !grid.is_in_zone(cell)
            && !grid.is_visible_by_any_tank(cell);
        free.then_some(cell)
    })
}

/// Register a player and place their tank on a random free cell.
///
/// # Errors
///
/// Fails when team scoring is active and `team` is missing, when the team
/// is unknown, or when no free cell can be found.
pub fn add_player(world: &mut World, nickname: &str, team: Option<TeamId>) -> Result<PlayerId> {
    let cell = find_free_cell(&world.grid, &mut world.rng, TANK_SPAWN_ATTEMPTS)
        .ok_or_else(|| GameError::InvalidState("no free spawn cell".to_string()))?;
    let direction = Direction::ALL[world.rng.gen_range(0..Direction::ALL.len())];
    add_player_at(world, nickname, team, cell, direction)
}

/// Register a player and place their tank at `cell`.
///
/// # Errors
///
/// Same as [`add_player`], plus an out-of-bounds or occupied `cell`.
pub fn add_player_at(
    world: &mut World,
    nickname: &str,
    team: Option<TeamId>,
    cell: Cell,
    direction: Direction,
) -> Result<PlayerId> {
    if world.config.scoring == ScoringMode::Team && team.is_none() {
        return Err(GameError::InvalidState(format!(
            "{nickname} needs a team in a team-scored match"
        )));
    }
    if !world.grid.is_within_bounds(cell)
        || world.grid.is_wall(cell)
        || world.grid.live_tank_at(cell).is_some()
    {
        return Err(GameError::InvalidState(format!(
            "cannot spawn at ({}, {})",
            cell.x, cell.y
        )));
    }

    let player = world.roster.add_player(nickname, team)?;
    let id = world.grid.next_id();
    let mut tank = Tank::new(id, player, cell, direction);
    tank.visibility = world.empty_mask();
    world.grid.tanks.push(tank);
    tracing::info!(%player, tank = id, x = cell.x, y = cell.y, "player joined");
    Ok(player)
}

/// Remove a player, their tank, and everything they fired or planted.
///
/// # Errors
///
/// Returns [`GameError::PlayerNotFound`] for an unknown player.
pub fn remove_player(world: &mut World, player: PlayerId) -> Result<()> {
    if world.roster.player(player).is_none() {
        return Err(GameError::PlayerNotFound(player));
    }

    if let Some(index) = world.grid.tanks.iter().position(|t| t.owner == player) {
        let tank = world.grid.tanks.remove(index);
        if let (Some(cell), Some(kind)) = (tank.live_cell(), tank.held_item) {
            drop_item(&mut world.grid, cell, kind);
        }
        world.heal.clear(tank.id);
        world.stun.clear(tank.id);
    }

    world.score.on_player_removed(player);
    world.zones.on_player_removed(&mut world.grid.zones, player);

    world.grid.bullets.retain(|b| b.shooter != player);
    world.pending_bullets.retain(|b| b.shooter != player);
    world.grid.lasers.retain(|l| l.shooter != player);
    world.grid.mines.retain(|m| m.layer != player);
    world.roster.remove_player(player);

    tracing::info!(%player, "player left");
    Ok(())
}

/// Count down dead tanks and respawn them on free cells.
pub fn update_regeneration(world: &mut World) {
    for i in 0..world.grid.tanks.len() {
        let tank = &mut world.grid.tanks[i];
        let Some(remaining) = tank.respawn_remaining else {
            continue;
        };
        if remaining > 1 {
            tank.respawn_remaining = Some(remaining - 1);
            continue;
        }
        tank.respawn_remaining = Some(0);

        let Some(cell) = find_free_cell(&world.grid, &mut world.rng, TANK_SPAWN_ATTEMPTS) else {
            continue;
        };
        let tank = &mut world.grid.tanks[i];
        tank.respawn_remaining = None;
        tank.health = MAX_HEALTH;
        tank.cell = Some(cell);
        tank.previous_cell = None;
        let id = tank.id;
        world.emit(GameEvent::TankRespawned { tank: id, cell });
    }
}

/// Ability upkeep for every tank: ammo regeneration and cooldowns.
pub fn update_cooldowns(world: &mut World) {
    for tank in &mut world.grid.tanks {
        tank.abilities.tick();
    }
}

/// Clear every cooldown, refill ammo and drop radar flags.
pub fn reset_abilities(world: &mut World) {
    for tank in &mut world.grid.tanks {
        tank.abilities.reset();
    }
}
