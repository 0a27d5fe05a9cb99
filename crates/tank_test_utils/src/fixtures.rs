//! Test fixtures and helpers.
//!
//! Pre-built arenas and matches for consistent testing.

use tank_core::components::{Cell, Direction, PlayerId, Zone};
use tank_core::config::MatchConfig;
use tank_core::math::Fixed;
use tank_core::simulation::Simulation;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Simulation code never touches floats; this is for test setup.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// Match config used by the fixtures: seeded, items off.
#[must_use]
pub fn test_config(dim: i32) -> MatchConfig {
    MatchConfig {
        dim,
        seed: 0x5EED,
        items_enabled: false,
        ..MatchConfig::default()
    }
}

/// An empty, wall-less arena.
#[must_use]
pub fn open_arena(dim: i32) -> Simulation {
    Simulation::new(test_config(dim))
}

/// An arena from ASCII rows, `#` for walls and anything else for floor.
///
/// The side length is the number of rows.
#[must_use]
pub fn walled_arena(rows: &[&str]) -> Simulation {
    let dim = i32::try_from(rows.len()).unwrap_or(0);
    let mut sim = open_arena(dim);
    let grid = &mut sim.world_mut().grid;
    for (y, row) in (0..).zip(rows) {
        for (x, ch) in (0..).zip(row.chars()) {
            if ch == '#' {
                grid.set_wall(Cell::new(x, y), true);
            }
        }
    }
    sim
}

/// Two tanks in opposite corners of an open arena.
#[derive(Debug, Clone)]
pub struct Duel {
    /// The match.
    pub sim: Simulation,
    /// Player in the bottom-left corner, facing up.
    pub first: PlayerId,
    /// Player in the top-right corner, facing down.
    pub second: PlayerId,
}

/// Set up a [`Duel`] on a `dim` x `dim` arena.
///
/// # Panics
///
/// Panics if `dim` is too small to hold two tanks.
#[must_use]
pub fn duel(dim: i32) -> Duel {
    let mut sim = open_arena(dim);
    let first = sim
        .add_player_at("first", None, Cell::new(0, dim - 1), Direction::Up)
        .expect("first tank fits");
    let second = sim
        .add_player_at("second", None, Cell::new(dim - 1, 0), Direction::Down)
        .expect("second tank fits");
    Duel { sim, first, second }
}

/// A [`Duel`] whose first tank starts inside a 2x2 zone `'A'` in its corner.
///
/// # Panics
///
/// Panics if `dim` is too small to hold two tanks.
#[must_use]
pub fn duel_with_zone(dim: i32) -> Duel {
    let mut d = duel(dim);
    d.sim
        .world_mut()
        .grid
        .zones
        .push(Zone::new('A', 0, dim - 2, 2, 2));
    d
}
