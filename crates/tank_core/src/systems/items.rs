//! Secondary items: dropping, picking up, and spawning.

use std::collections::{BTreeSet, VecDeque};

use rand::Rng;

use crate::components::{Cell, SecondaryItem, SecondaryItemType};
use crate::grid::Grid;
use crate::systems::spawn::find_free_cell;
use crate::world::{GameEvent, World};

/// Attempts at finding a free cell for a new item.
pub const ITEM_SPAWN_ATTEMPTS: u32 = 200;

/// Spawn weights in thousandths. The remainder of [`SPAWN_ROLL_TOTAL`] means
/// no item this tick.
const SPAWN_WEIGHTS: [(SecondaryItemType, u32); 4] = [
    (SecondaryItemType::DoubleBullet, 900),
    (SecondaryItemType::Mine, 500),
    (SecondaryItemType::Radar, 300),
    (SecondaryItemType::Laser, 90),
];

/// Size of the spawn roll; includes the weight of spawning nothing.
const SPAWN_ROLL_TOTAL: u32 = 900 + 500 + 300 + 90 + 99_500;

/// Place `kind` on the nearest non-wall cell around `from` that holds no
/// item. Returns the chosen cell.
pub fn drop_item(grid: &mut Grid, from: Cell, kind: SecondaryItemType) -> Option<Cell> {
    let mut queue = VecDeque::from([from]);
    let mut seen = BTreeSet::from([from]);

    while let Some(cell) = queue.pop_front() {
        if !grid.is_within_bounds(cell) || grid.is_wall(cell) {
            continue;
        }
        if !grid.items.iter().any(|item| item.cell == cell) {
            grid.items.push(SecondaryItem { cell, kind });
            return Some(cell);
        }
        for next in cell.neighbours() {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    None
}

/// Live tanks without an item take the item on their cell.
pub fn update_pickup(world: &mut World) {
    let World { grid, events, .. } = world;
    for tank in &mut grid.tanks {
        if tank.held_item.is_some() {
            continue;
        }
        let Some(cell) = tank.live_cell() else {
            continue;
        };
        if let Some(index) = grid.items.iter().position(|item| item.cell == cell) {
            let item = grid.items.remove(index);
            tank.held_item = Some(item.kind);
            events.push(GameEvent::ItemPickedUp {
                tank: tank.id,
                kind: item.kind,
            });
        }
    }
}

/// Roll for a new item and place it on a free, unseen cell.
pub fn generate_new_item(world: &mut World) {
    let cap = usize::try_from(world.grid.dim()).unwrap_or(0) * 2;
    if world.grid.items.len() >= cap {
        return;
    }

    let roll = world.rng.gen_range(0..SPAWN_ROLL_TOTAL);
    let Some(kind) = pick_weighted(roll) else {
        return;
    };
    let Some(cell) = find_free_cell(&world.grid, &mut world.rng, ITEM_SPAWN_ATTEMPTS) else {
        return;
    };

    world.grid.items.push(SecondaryItem { cell, kind });
    world.emit(GameEvent::ItemSpawned { cell, kind });
}

fn pick_weighted(mut roll: u32) -> Option<SecondaryItemType> {
    for (kind, weight) in SPAWN_WEIGHTS {
        if roll < weight {
            return Some(kind);
        }
        roll -= weight;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Direction, PlayerId, Tank};
    use crate::config::MatchConfig;

    #[test]
    fn test_drop_skips_occupied_cells() {
        let mut grid = Grid::new(3);
        let origin = Cell::new(1, 1);
        assert_eq!(drop_item(&mut grid, origin, SecondaryItemType::Mine), Some(origin));
        let second = drop_item(&mut grid, origin, SecondaryItemType::Radar).expect("room");
        assert_ne!(second, origin);
        assert_eq!(second, Cell::new(1, 0));
    }

    #[test]
    fn test_drop_avoids_walls() {
        let mut grid = Grid::new(2);
        grid.set_wall(Cell::new(1, 0), true);
        grid.items.push(SecondaryItem {
            cell: Cell::new(0, 0),
            kind: SecondaryItemType::Laser,
        });
        assert_eq!(
            drop_item(&mut grid, Cell::new(0, 0), SecondaryItemType::Mine),
            Some(Cell::new(0, 1))
        );
    }

    #[test]
    fn test_pickup_only_without_item() {
        let mut world = World::new(MatchConfig {
            dim: 4,
            ..MatchConfig::default()
        });
        let id = world.grid.next_id();
        world
            .grid
            .tanks
            .push(Tank::new(id, PlayerId(1), Cell::new(2, 2), Direction::Up));
        world.grid.items.push(SecondaryItem {
            cell: Cell::new(2, 2),
            kind: SecondaryItemType::Laser,
        });

        update_pickup(&mut world);
        assert_eq!(
            world.grid.tank(id).and_then(|t| t.held_item),
            Some(SecondaryItemType::Laser)
        );
        assert!(world.grid.items.is_empty());

        world.grid.items.push(SecondaryItem {
            cell: Cell::new(2, 2),
            kind: SecondaryItemType::Mine,
        });
        update_pickup(&mut world);
        assert_eq!(world.grid.items.len(), 1);
    }

    #[test]
    fn test_weighted_pick_covers_all_kinds() {
        assert_eq!(pick_weighted(0), Some(SecondaryItemType::DoubleBullet));
        assert_eq!(pick_weighted(900), Some(SecondaryItemType::Mine));
        assert_eq!(pick_weighted(1400), Some(SecondaryItemType::Radar));
        assert_eq!(pick_weighted(1700), Some(SecondaryItemType::Laser));
        assert_eq!(pick_weighted(1790), None);
    }

    #[test]
    fn test_item_count_is_capped() {
        let mut world = World::new(MatchConfig {
            dim: 2,
            ..MatchConfig::default()
        });
        for x in 0..2 {
            for y in 0..2 {
                world.grid.items.push(SecondaryItem {
                    cell: Cell::new(x, y),
                    kind: SecondaryItemType::Radar,
                });
            }
        }
        for _ in 0..1000 {
            generate_new_item(&mut world);
        }
        assert_eq!(world.grid.items.len(), 4);
    }
}
