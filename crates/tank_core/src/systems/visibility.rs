//! Fog of war.
//!
//! Geometry is done in quarter-cell units: cell `(x, y)` spans
//! `[4x, 4x + 4)` on each axis, a tank sits at `(4x + 2, 4y + 2)`, and the
//! four sample points of a cell are at offsets 1 and 3. Everything is
//! integer, so a mirrored arena yields a mirrored mask.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::components::{Cell, Tank};
use crate::grid::{CellMask, Grid};
use crate::world::World;

/// `cos^2` of the half cone angle (72 degrees), scaled by [`COS_SCALE`].
const COS_SQ_HALF_CONE: i64 = 95_492;
const COS_SCALE: i64 = 1_000_000;

const SAMPLE_OFFSETS: [(i64, i64); 4] = [(1, 1), (3, 1), (1, 3), (3, 3)];

/// Recompute every tank's mask.
///
/// Dead tanks share the world's empty mask. A tank with an active radar
/// sees the whole arena for this tick, and the radar switches off.
pub fn update(world: &mut World) {
    let empty = world.empty_mask();
    let dim = world.grid.dim();
    let masks: Vec<Arc<CellMask>> = world
        .grid
        .tanks
        .iter()
        .map(|tank| {
            if tank.is_dead() {
                Arc::clone(&empty)
            } else if tank.abilities.radar_active {
                Arc::new(CellMask::filled(dim))
            } else {
                Arc::new(compute_visibility(&world.grid, tank))
            }
        })
        .collect();

    for (tank, mask) in world.grid.tanks.iter_mut().zip(masks) {
        tank.visibility = mask;
        tank.abilities.radar_active = false;
    }
}

/// The cells a live tank can see. Dead tanks see nothing.
#[must_use]
pub fn compute_visibility(grid: &Grid, tank: &Tank) -> CellMask {
    let mut mask = CellMask::new(grid.dim());
    let Some(origin) = tank.live_cell() else {
        return mask;
    };
    let centre = (4 * i64::from(origin.x) + 2, 4 * i64::from(origin.y) + 2);
    let facing = tank.direction.normal();
    let facing = (i64::from(facing.0), i64::from(facing.1));

    mask.set(origin, true);
    let mut queue = VecDeque::from([origin]);
    let mut seen = CellMask::new(grid.dim());
    seen.set(origin, true);

    while let Some(cell) = queue.pop_front() {
        for next in cell.neighbours() {
            if !grid.is_within_bounds(next) || grid.is_wall(next) || seen.get(next) {
                continue;
            }
            seen.set(next, true);
            if is_cell_visible(grid, centre, facing, next) {
                mask.set(next, true);
                queue.push_back(next);
            }
        }
    }

    let mut ray = origin.step(tank.turret_direction, 1);
    while grid.is_within_bounds(ray) && !grid.is_wall(ray) {
        mask.set(ray, true);
        ray = ray.step(tank.turret_direction, 1);
    }
    mask
}

fn is_cell_visible(grid: &Grid, centre: (i64, i64), facing: (i64, i64), cell: Cell) -> bool {
    SAMPLE_OFFSETS.iter().any(|&(ox, oy)| {
        let point = (4 * i64::from(cell.x) + ox, 4 * i64::from(cell.y) + oy);
        in_cone(centre, facing, point) && has_line_of_sight(grid, centre, point)
    })
}

fn in_cone(centre: (i64, i64), facing: (i64, i64), point: (i64, i64)) -> bool {
    let (vx, vy) = (point.0 - centre.0, point.1 - centre.1);
    let dot = vx * facing.0 + vy * facing.1;
    let len_sq = vx * vx + vy * vy;
    dot > 0 && dot * dot * COS_SCALE >= len_sq * COS_SQ_HALF_CONE
}

/// Whether the segment between two quarter-unit points crosses no wall.
///
/// Cells are walked in the order the segment enters them. When it passes
/// exactly through a grid corner, a wall on either side of the corner
/// blocks it.
#[must_use]
pub fn has_line_of_sight(grid: &Grid, from: (i64, i64), to: (i64, i64)) -> bool {
    let cell_of = |p: (i64, i64)| {
        Cell::new(
            i32::try_from(p.0.div_euclid(4)).unwrap_or(i32::MIN),
            i32::try_from(p.1.div_euclid(4)).unwrap_or(i32::MIN),
        )
    };
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let sx = i32::from(dx > 0) - i32::from(dx < 0);
    let sy = i32::from(dy > 0) - i32::from(dy < 0);
    let target = cell_of(to);
    let mut cell = cell_of(from);
    let blocked = |cell: Cell| !grid.is_within_bounds(cell) || grid.is_wall(cell);

    while cell != target {
        let boundary_x = 4 * i64::from(cell.x) + if sx > 0 { 4 } else { 0 };
        let boundary_y = 4 * i64::from(cell.y) + if sy > 0 { 4 } else { 0 };
        let cross_x = (boundary_x - from.0).abs() * dy.abs();
        let cross_y = (boundary_y - from.1).abs() * dx.abs();

        let step_x = Cell::new(cell.x + sx, cell.y);
        let step_y = Cell::new(cell.x, cell.y + sy);
        cell = if sy == 0 || (sx != 0 && cross_x < cross_y) {
            step_x
        } else if sx == 0 || cross_y < cross_x {
            step_y
        } else {
            if blocked(step_x) || blocked(step_y) {
                return false;
            }
            Cell::new(cell.x + sx, cell.y + sy)
        };
        if blocked(cell) {
            return false;
        }
    }
    true
}
