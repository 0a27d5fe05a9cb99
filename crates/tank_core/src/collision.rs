//! Collision classification.
//!
//! A pure query: what would a tank or bullet run into when entering a cell.
//! Movement and projectile systems decide what to do with the answer.

use serde::{Deserialize, Serialize};

use crate::components::Cell;
use crate::grid::Grid;

/// What occupies a cell a tank or bullet tries to enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionKind {
    /// Outside the arena.
    Border,
    /// A wall.
    Wall,
    /// A live tank.
    Tank,
    /// A bullet.
    Bullet,
    /// An active laser beam.
    Laser,
}

/// Classify `cell`.
///
/// Out-of-bounds always reports [`CollisionKind::Border`]. Inside the arena
/// the first match wins in the order wall, tank, bullet, laser. Dead tanks
/// are ignored. Returns `None` for a free cell.
#[must_use]
pub fn classify(grid: &Grid, cell: Cell) -> Option<CollisionKind> {
    if !grid.is_within_bounds(cell) {
        return Some(CollisionKind::Border);
    }
    if grid.is_wall(cell) {
        return Some(CollisionKind::Wall);
    }
    if grid.live_tank_at(cell).is_some() {
        return Some(CollisionKind::Tank);
    }
    if grid.bullets.iter().any(|b| b.cell == cell) {
        return Some(CollisionKind::Bullet);
    }
    if grid.lasers.iter().any(|l| l.cell == cell) {
        return Some(CollisionKind::Laser);
    }
    None
}

/// Whether a tank may drive into `cell`.
///
/// Bullets and lasers do not stop a tank; the projectile systems resolve
/// them on their own turn.
#[must_use]
pub fn blocks_tank(kind: Option<CollisionKind>) -> bool {
    matches!(
        kind,
        Some(CollisionKind::Border | CollisionKind::Wall | CollisionKind::Tank)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Bullet, BulletKind, Direction, PlayerId, Tank};

    fn bullet_at(grid: &mut Grid, cell: Cell) {
        let id = grid.next_id();
        grid.bullets.push(Bullet {
            id,
            cell,
            direction: Direction::Up,
            speed: 2,
            damage: 20,
            kind: BulletKind::Basic,
            shooter: PlayerId(9),
        });
    }

    #[test]
    fn test_border_wins_over_everything() {
        let grid = Grid::new(3);
        assert_eq!(classify(&grid, Cell::new(-1, 0)), Some(CollisionKind::Border));
        assert_eq!(classify(&grid, Cell::new(0, 3)), Some(CollisionKind::Border));
    }

    #[test]
    fn test_precedence_wall_tank_bullet() {
        let mut grid = Grid::new(3);
        let cell = Cell::new(1, 1);
        assert_eq!(classify(&grid, cell), None);

        bullet_at(&mut grid, cell);
        assert_eq!(classify(&grid, cell), Some(CollisionKind::Bullet));

        let id = grid.next_id();
        grid.tanks.push(Tank::new(id, PlayerId(1), cell, Direction::Up));
        assert_eq!(classify(&grid, cell), Some(CollisionKind::Tank));

        grid.set_wall(cell, true);
        assert_eq!(classify(&grid, cell), Some(CollisionKind::Wall));
    }

    #[test]
    fn test_dead_tank_is_not_an_obstacle() {
        let mut grid = Grid::new(3);
        let cell = Cell::new(2, 2);
        let id = grid.next_id();
        let mut tank = Tank::new(id, PlayerId(1), cell, Direction::Up);
        tank.health = 0;
        grid.tanks.push(tank);
        assert_eq!(classify(&grid, cell), None);
    }

    #[test]
    fn test_blocks_tank() {
        assert!(blocks_tank(Some(CollisionKind::Wall)));
        assert!(blocks_tank(Some(CollisionKind::Border)));
        assert!(blocks_tank(Some(CollisionKind::Tank)));
        assert!(!blocks_tank(Some(CollisionKind::Bullet)));
        assert!(!blocks_tank(None));
    }
}
