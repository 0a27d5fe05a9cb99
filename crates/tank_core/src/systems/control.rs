//! Movement and rotation of tanks and turrets.
//!
//! All three operations are silent on rejection: a stunned, dead, or
//! blocked tank simply stays put. The return value says whether anything
//! changed, for logging and tests.

use crate::collision::{blocks_tank, classify};
use crate::components::{EntityId, MovementDirection, Rotation, StunFlags};
use crate::grid::Grid;
use crate::systems::stun::StunSystem;

/// Move a tank one cell along its facing (or against it).
pub fn try_move_tank(
    grid: &mut Grid,
    stun: &StunSystem,
    tank: EntityId,
    movement: MovementDirection,
) -> bool {
    if stun.is_blocked(tank, StunFlags::MOVEMENT) {
        return false;
    }
    let Some((from, direction)) = grid
        .tank(tank)
        .and_then(|t| t.live_cell().map(|cell| (cell, t.direction)))
    else {
        return false;
    };

    let to = from.step(direction, movement.step());
    if blocks_tank(classify(grid, to)) {
        return false;
    }

    match grid.tank_mut(tank) {
        Some(t) => {
            t.previous_cell = Some(from);
            t.cell = Some(to);
            true
        }
        None => false,
    }
}

/// Rotate a tank body one step.
pub fn try_rotate_tank(grid: &mut Grid, stun: &StunSystem, tank: EntityId, rotation: Rotation) -> bool {
    if stun.is_blocked(tank, StunFlags::TANK_ROTATION) {
        return false;
    }
    match grid.tank_mut(tank) {
        Some(t) if !t.is_dead() => {
            t.direction = t.direction.rotated(rotation);
            true
        }
        _ => false,
    }
}

/// Rotate a turret one step.
pub fn try_rotate_turret(
    grid: &mut Grid,
    stun: &StunSystem,
    tank: EntityId,
    rotation: Rotation,
) -> bool {
    if stun.is_blocked(tank, StunFlags::TURRET_ROTATION) {
        return false;
    }
    match grid.tank_mut(tank) {
        Some(t) if !t.is_dead() => {
            t.turret_direction = t.turret_direction.rotated(rotation);
            true
        }
        _ => false,
    }
}
