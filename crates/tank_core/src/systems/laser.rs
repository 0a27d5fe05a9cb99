//! Laser beams.
//!
//! A beam is one [`Laser`] entity per covered cell, running from the cell in
//! front of the turret up to the first wall or the border.

use crate::components::{Cell, EntityId, Laser, StunFlags};
use crate::error::Result;
use crate::systems::damage::apply_damage;
use crate::systems::mine::try_explode_at;
use crate::world::World;

/// Damage dealt per tick to a tank inside the beam.
pub const LASER_DAMAGE: u32 = 80;
/// Beam lifetime, and how long the shooter is stunned.
pub const LASER_TICKS: u32 = 10;

/// Fire a beam along the turret of `tank`. Returns false if the tank is
/// dead.
pub fn fire_laser(world: &mut World, tank: EntityId) -> bool {
    let Some((origin, turret, shooter)) = world
        .grid
        .tank(tank)
        .and_then(|t| t.live_cell().map(|cell| (cell, t.turret_direction, t.owner)))
    else {
        return false;
    };

    let mut cell = origin.step(turret, 1);
    while world.grid.is_within_bounds(cell) && !world.grid.is_wall(cell) {
        let id = world.grid.next_id();
        world.grid.lasers.push(Laser {
            id,
            cell,
            orientation: turret.orientation(),
            damage: LASER_DAMAGE,
            remaining_ticks: LASER_TICKS,
            shooter,
        });
        cell = cell.step(turret, 1);
    }
    world.stun.apply_stun(tank, StunFlags::ALL, LASER_TICKS);
    true
}

/// Age every beam cell, expire spent ones, and burn whatever is still
/// inside the beam.
///
/// # Errors
///
/// Propagates damage and score errors.
pub fn update(world: &mut World) -> Result<()> {
    world.grid.lasers.retain_mut(|laser| {
        laser.remaining_ticks = laser.remaining_ticks.saturating_sub(1);
        laser.remaining_ticks > 0
    });

    let beams: Vec<(Cell, u32, _)> = world
        .grid
        .lasers
        .iter()
        .map(|l| (l.cell, l.damage, l.shooter))
        .collect();
    for (cell, damage, shooter) in beams {
        if let Some((tank, owner)) = world.grid.live_tank_at(cell).map(|t| (t.id, t.owner)) {
            let dealt = apply_damage(world, tank, damage, Some(shooter))?;
            if dealt > 0 && owner != shooter && world.scores_damage(shooter, owner) {
                world
                    .score
                    .award_score(&mut world.roster, shooter, i64::from(dealt))?;
            }
        }
        try_explode_at(world, cell)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Direction, Orientation, PlayerId, Tank};
    use crate::config::MatchConfig;
    use crate::score::ScoringMode;

    fn setup() -> (World, EntityId, PlayerId, EntityId) {
        let mut world = World::new(MatchConfig {
            dim: 8,
            ..MatchConfig::default()
        });
        let a = world.roster.add_player("gunner", None).expect("add");
        let b = world.roster.add_player("target", None).expect("add");
        let ta = world.grid.next_id();
        let tb = world.grid.next_id();
        world.grid.tanks.push(Tank::new(ta, a, Cell::new(0, 2), Direction::Right));
        world.grid.tanks.push(Tank::new(tb, b, Cell::new(4, 2), Direction::Up));
        (world, ta, a, tb)
    }

    #[test]
    fn test_beam_stops_at_wall() {
        let (mut w, ta, ..) = setup();
        w.grid.set_wall(Cell::new(6, 2), true);
        assert!(fire_laser(&mut w, ta));
        let cells: Vec<Cell> = w.grid.lasers.iter().map(|l| l.cell).collect();
        assert_eq!(cells, (1..6).map(|x| Cell::new(x, 2)).collect::<Vec<_>>());
        assert!(w.grid.lasers.iter().all(|l| l.orientation == Orientation::Horizontal));
        assert!(w.stun.is_blocked(ta, StunFlags::ALL));
    }

    #[test]
    fn test_beam_damages_and_scores() {
        let (mut w, ta, a, tb) = setup();
        fire_laser(&mut w, ta);
        update(&mut w).expect("update");
        assert_eq!(w.grid.tank(tb).map(|t| t.health), Some(20));
        assert_eq!(w.roster.player(a).map(|p| p.score), Some(80));

        update(&mut w).expect("update");
        assert!(w.grid.tank(tb).is_some_and(Tank::is_dead));
        assert_eq!(w.roster.player(a).map(|p| p.kills), Some(1));
    }

    #[test]
    fn test_beam_scores_only_against_opponents_in_team_match() {
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
        w.grid.tanks.push(Tank::new(ta, a, Cell::new(0, 2), Direction::Right));
        w.grid.tanks.push(Tank::new(tb, b, Cell::new(4, 2), Direction::Up));
        w.grid.tanks.push(Tank::new(tc, c, Cell::new(2, 2), Direction::Up));

        fire_laser(&mut w, ta);
        update(&mut w).expect("update");
        assert_eq!(w.grid.tank(tb).map(|t| t.health), Some(20));
        assert_eq!(w.grid.tank(tc).map(|t| t.health), Some(20));
        assert_eq!(w.roster.team(red).map(|t| t.score), Some(80));
    }

    #[test]
    fn test_beam_expires() {
        let (mut w, ta, ..) = setup();
        fire_laser(&mut w, ta);
        for _ in 0..LASER_TICKS - 1 {
            update(&mut w).expect("update");
        }
        assert!(!w.grid.lasers.is_empty());
        update(&mut w).expect("update");
        assert!(w.grid.lasers.is_empty());
    }

    #[test]
    fn test_beam_detonates_mines() {
        let (mut w, ta, a, _) = setup();
        let id = w.grid.next_id();
        w.grid.mines.push(crate::components::Mine {
            id,
            cell: Cell::new(2, 2),
            damage: 50,
            layer: a,
            explosion_remaining: None,
        });
        fire_laser(&mut w, ta);
        update(&mut w).expect("update");
        assert!(w.grid.mines[0].is_exploded());
    }
}
