//! Mines: planting, triggering, and the lingering blast.

use std::collections::BTreeSet;

use crate::components::{Cell, EntityId, Mine, PlayerId, StunFlags};
use crate::error::Result;
use crate::systems::damage::apply_damage;
use crate::world::{GameEvent, World};

/// Damage of a mine blast.
pub const MINE_DAMAGE: u32 = 50;
/// How long a blast lingers, and how long the victim is stunned.
pub const MINE_EXPLOSION_TICKS: u32 = 10;

/// Plant a mine behind `tank`. Returns false if the tank is dead.
pub fn drop_mine(world: &mut World, tank: EntityId) -> bool {
    let Some((cell, direction, layer)) = world
        .grid
        .tank(tank)
        .and_then(|t| t.live_cell().map(|cell| (cell, t.direction, t.owner)))
    else {
        return false;
    };
    let id = world.grid.next_id();
    world.grid.mines.push(Mine {
        id,
        cell: cell.step(direction.opposite(), 1),
        damage: MINE_DAMAGE,
        layer,
        explosion_remaining: None,
    });
    true
}

/// Drop invalid mines, count down blasts, and trigger armed mines under
/// live tanks.
///
/// # Errors
///
/// Propagates damage and score errors.
pub fn update(world: &mut World) -> Result<()> {
    let mut occupied = BTreeSet::new();
    let planted = std::mem::take(&mut world.grid.mines);
    let grid = &world.grid;
    let planted: Vec<Mine> = planted
        .into_iter()
        .filter(|m| grid.is_within_bounds(m.cell) && !grid.is_wall(m.cell) && occupied.insert(m.cell))
        .collect();
    world.grid.mines = planted;

    world.grid.mines.retain_mut(|mine| match &mut mine.explosion_remaining {
        Some(0 | 1) => false,
        Some(remaining) => {
            *remaining -= 1;
            true
        }
        None => true,
    });

    let armed: Vec<(EntityId, Cell)> = world
        .grid
        .mines
        .iter()
        .filter(|m| !m.is_exploded())
        .map(|m| (m.id, m.cell))
        .collect();
    for (mine, cell) in armed {
        if let Some(tank) = world.grid.live_tank_at(cell).map(|t| t.id) {
            explode(world, mine, tank)?;
        }
    }
    Ok(())
}

/// Trigger the armed mine on `cell`, if any, against whatever live tank
/// stands there. Used by laser beams.
///
/// # Errors
///
/// Propagates damage and score errors.
pub fn try_explode_at(world: &mut World, cell: Cell) -> Result<()> {
    let Some(mine) = world
        .grid
        .mines
        .iter()
        .find(|m| m.cell == cell && !m.is_exploded())
        .map(|m| m.id)
    else {
        return Ok(());
    };
    match world.grid.live_tank_at(cell).map(|t| t.id) {
        Some(tank) => explode(world, mine, tank),
        None => {
            set_exploded(world, mine);
            Ok(())
        }
    }
}

fn set_exploded(world: &mut World, mine: EntityId) -> Option<(u32, PlayerId)> {
    let m = world.grid.mines.iter_mut().find(|m| m.id == mine)?;
    m.explosion_remaining = Some(MINE_EXPLOSION_TICKS);
    Some((m.damage, m.layer))
}

fn explode(world: &mut World, mine: EntityId, tank: EntityId) -> Result<()> {
    let Some((damage, layer)) = set_exploded(world, mine) else {
        return Ok(());
    };
    let own_tank = world.grid.tank(tank).is_some_and(|t| t.owner == layer);
    let source = (!own_tank).then_some(layer);

    let dealt = apply_damage(world, tank, damage, source)?;
    world
        .stun
        .apply_stun(tank, StunFlags::MOVEMENT | StunFlags::TANK_ROTATION, MINE_EXPLOSION_TICKS);
    let victim = world.grid.tank(tank).map(|t| t.owner);
    if let (Some(layer), Some(victim)) = (source, victim) {
        if dealt > 0 && world.scores_damage(layer, victim) {
            world
                .score
                .award_score(&mut world.roster, layer, i64::from(dealt))?;
        }
    }
    tracing::debug!(mine, tank, dealt, "mine exploded");
    world.emit(GameEvent::MineExploded { mine, tank });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Direction, Tank};
    use crate::config::MatchConfig;
    use crate::score::ScoringMode;

    fn setup() -> (World, EntityId, PlayerId, EntityId, PlayerId) {
        let mut world = World::new(MatchConfig {
            dim: 8,
            ..MatchConfig::default()
        });
        let a = world.roster.add_player("layer", None).expect("add");
        let b = world.roster.add_player("victim", None).expect("add");
        let ta = world.grid.next_id();
        let tb = world.grid.next_id();
        world.grid.tanks.push(Tank::new(ta, a, Cell::new(3, 3), Direction::Up));
        world.grid.tanks.push(Tank::new(tb, b, Cell::new(6, 6), Direction::Up));
        (world, ta, a, tb, b)
    }

    #[test]
    fn test_mine_is_planted_behind() {
        let (mut w, ta, a, ..) = setup();
        assert!(drop_mine(&mut w, ta));
        assert_eq!(w.grid.mines.len(), 1);
        assert_eq!(w.grid.mines[0].cell, Cell::new(3, 4));
        assert_eq!(w.grid.mines[0].layer, a);
    }

    #[test]
    fn test_victim_is_damaged_stunned_and_layer_scores() {
        let (mut w, ta, a, tb, _) = setup();
        drop_mine(&mut w, ta);
        if let Some(t) = w.grid.tank_mut(tb) {
            t.cell = Some(Cell::new(3, 4));
        }
        update(&mut w).expect("update");

        assert_eq!(w.grid.tank(tb).map(|t| t.health), Some(50));
        assert!(w.stun.is_blocked(tb, StunFlags::TANK_ROTATION));
        assert!(!w.stun.is_blocked(tb, StunFlags::TURRET_ROTATION));
        assert_eq!(w.roster.player(a).map(|p| p.score), Some(50));
        assert!(w.grid.mines[0].is_exploded());

        // The blast lingers and does not hit twice.
        update(&mut w).expect("update");
        assert_eq!(w.grid.tank(tb).map(|t| t.health), Some(50));
    }

    #[test]
    fn test_blast_expires() {
        let (mut w, ta, _, tb, _) = setup();
        drop_mine(&mut w, ta);
        if let Some(t) = w.grid.tank_mut(tb) {
            t.cell = Some(Cell::new(3, 4));
        }
        update(&mut w).expect("update");
        for _ in 0..MINE_EXPLOSION_TICKS {
            update(&mut w).expect("update");
        }
        assert!(w.grid.mines.is_empty());
    }

    #[test]
    fn test_own_mine_hurts_without_score() {
        let (mut w, ta, a, ..) = setup();
        drop_mine(&mut w, ta);
        if let Some(t) = w.grid.tank_mut(ta) {
            t.cell = Some(Cell::new(3, 4));
        }
        update(&mut w).expect("update");
        assert_eq!(w.grid.tank(ta).map(|t| t.health), Some(50));
        assert_eq!(w.roster.player(a).map(|p| p.score), Some(0));
        assert!(w
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::TankHit { source: None, .. })));
    }

    #[test]
    fn test_teammate_blast_earns_no_team_score() {
        let mut w = World::new(MatchConfig {
            dim: 8,
            scoring: ScoringMode::Team,
            ..MatchConfig::default()
        });
        let red = w.roster.add_team("red");
        let blue = w.roster.add_team("blue");
        let a = w.roster.add_player("a", Some(red)).expect("add");
        let b = w.roster.add_player("b", Some(red)).expect("add");
        let c = w.roster.add_player("c", Some(blue)).expect("add");
        let [ta, tb, tc] = [w.grid.next_id(), w.grid.next_id(), w.grid.next_id()];
        w.grid.tanks.push(Tank::new(ta, a, Cell::new(3, 3), Direction::Up));
        w.grid.tanks.push(Tank::new(tb, b, Cell::new(3, 4), Direction::Up));
        w.grid.tanks.push(Tank::new(tc, c, Cell::new(0, 0), Direction::Up));

        drop_mine(&mut w, ta);
        update(&mut w).expect("update");
        assert_eq!(w.grid.tank(tb).map(|t| t.health), Some(50));
        assert_eq!(w.roster.team(red).map(|t| t.score), Some(0));

        let id = w.grid.next_id();
        w.grid.mines.push(Mine {
            id,
            cell: Cell::new(0, 0),
            damage: MINE_DAMAGE,
            layer: a,
            explosion_remaining: None,
        });
        update(&mut w).expect("update");
        assert_eq!(w.grid.tank(tc).map(|t| t.health), Some(50));
        assert_eq!(w.roster.team(red).map(|t| t.score), Some(50));
        assert_eq!(w.roster.team(blue).map(|t| t.score), Some(0));
    }

    #[test]
    fn test_invalid_and_duplicate_mines_are_removed() {
        let (mut w, _, a, ..) = setup();
        w.grid.set_wall(Cell::new(1, 1), true);
        for cell in [Cell::new(1, 1), Cell::new(-1, 0), Cell::new(5, 5), Cell::new(5, 5)] {
            let id = w.grid.next_id();
            w.grid.mines.push(Mine {
                id,
                cell,
                damage: MINE_DAMAGE,
                layer: a,
                explosion_remaining: None,
            });
        }
        update(&mut w).expect("update");
        assert_eq!(w.grid.mines.len(), 1);
        assert_eq!(w.grid.mines[0].cell, Cell::new(5, 5));
    }

    #[test]
    fn test_laser_detonates_empty_mine() {
        let (mut w, ta, ..) = setup();
        drop_mine(&mut w, ta);
        try_explode_at(&mut w, Cell::new(3, 4)).expect("explode");
        assert!(w.grid.mines[0].is_exploded());
    }
}
