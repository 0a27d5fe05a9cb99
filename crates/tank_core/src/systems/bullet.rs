//! Bullet flight and impact resolution.
//!
//! Bullets advance one cell at a time, `speed * tick_delta` cells per tick,
//! all bullets in lock-step so that two bullets flying into each other meet
//! on a cell instead of passing through. Bullets fired this tick join after
//! the existing ones have moved and are checked on their spawn cell.

use crate::collision::{classify, CollisionKind};
use crate::components::{Bullet, BulletKind, EntityId, StunFlags};
use crate::error::Result;
use crate::systems::damage::apply_damage;
use crate::systems::heal::HealSystem;
use crate::world::{GameEvent, World};

/// Cells a bullet travels per tick.
pub const BULLET_SPEED: u32 = 2;
/// Damage of a basic bullet.
pub const BULLET_DAMAGE: u32 = 20;
/// Health restored by a healing bullet.
pub const HEALING_BULLET_AMOUNT: u32 = 20;
/// Stun length of a stun bullet.
pub const STUN_BULLET_TICKS: u32 = 10;

/// Queue a bullet of `kind` in front of the turret of `tank`. Returns false
/// if the tank is dead.
pub fn fire_bullet(world: &mut World, tank: EntityId, kind: BulletKind) -> bool {
    let Some((cell, direction, shooter)) = world
        .grid
        .tank(tank)
        .and_then(|t| t.live_cell().map(|cell| (cell, t.turret_direction, t.owner)))
    else {
        return false;
    };
    let damage = match kind {
        BulletKind::Basic => BULLET_DAMAGE,
        BulletKind::Double => BULLET_DAMAGE * 2,
        BulletKind::Stun | BulletKind::Healing => 0,
    };
    let id = world.grid.next_id();
    world.pending_bullets.push(Bullet {
        id,
        cell: cell.step(direction, 1),
        direction,
        speed: BULLET_SPEED,
        damage,
        kind,
        shooter,
    });
    true
}

/// Outcome of a bullet entering a cell.
enum Impact {
    Destroyed,
    Tank(EntityId),
    Bullet(EntityId),
}

/// Advance every bullet and resolve impacts.
///
/// # Errors
///
/// Propagates damage and score errors.
pub fn update(world: &mut World, tick_delta: u32) -> Result<()> {
    // Tanks may have driven onto a bullet since the last tick.
    for id in bullet_ids(world) {
        let Some(cell) = bullet(world, id).map(|b| b.cell) else {
            continue;
        };
        if let Some(tank) = world.grid.live_tank_at(cell).map(|t| t.id) {
            hit_tank(world, id, tank)?;
        }
    }

    let max_steps = world
        .grid
        .bullets
        .iter()
        .map(|b| b.speed.saturating_mul(tick_delta))
        .max()
        .unwrap_or(0);

    for step in 0..max_steps {
        if world.grid.bullets.is_empty() {
            break;
        }
        for id in bullet_ids(world) {
            let Some(b) = world.grid.bullets.iter_mut().find(|b| b.id == id) else {
                continue;
            };
            if b.speed.saturating_mul(tick_delta) <= step {
                continue;
            }
            b.cell = b.cell.step(b.direction, 1);
            resolve(world, id)?;
        }
    }

    for fresh in std::mem::take(&mut world.pending_bullets) {
        let id = fresh.id;
        world.grid.bullets.push(fresh);
        resolve(world, id)?;
    }
    Ok(())
}

fn bullet_ids(world: &World) -> Vec<EntityId> {
    world.grid.bullets.iter().map(|b| b.id).collect()
}

fn bullet(world: &World, id: EntityId) -> Option<&Bullet> {
    world.grid.bullets.iter().find(|b| b.id == id)
}

fn impact_of(world: &World, moving: &Bullet) -> Option<Impact> {
    match classify(&world.grid, moving.cell)? {
        CollisionKind::Border | CollisionKind::Wall | CollisionKind::Laser => {
            Some(Impact::Destroyed)
        }
        CollisionKind::Tank => world
            .grid
            .live_tank_at(moving.cell)
            .map(|t| Impact::Tank(t.id)),
        CollisionKind::Bullet => world
            .grid
            .bullets
            .iter()
            .find(|other| {
                other.id != moving.id
                    && other.cell == moving.cell
                    && other.direction != moving.direction
            })
            .map(|other| Impact::Bullet(other.id))
            .or_else(|| {
                world
                    .grid
                    .lasers
                    .iter()
                    .any(|l| l.cell == moving.cell)
                    .then_some(Impact::Destroyed)
            }),
    }
}

fn resolve(world: &mut World, id: EntityId) -> Result<()> {
    let Some(moving) = bullet(world, id) else {
        return Ok(());
    };
    match impact_of(world, moving) {
        None => Ok(()),
        Some(Impact::Destroyed) => {
            remove(world, id);
            Ok(())
        }
        Some(Impact::Tank(tank)) => hit_tank(world, id, tank),
        Some(Impact::Bullet(other)) => {
            bullets_collide(world, id, other);
            Ok(())
        }
    }
}

fn remove(world: &mut World, id: EntityId) -> Option<Bullet> {
    let index = world.grid.bullets.iter().position(|b| b.id == id)?;
    Some(world.grid.bullets.remove(index))
}

/// Both bullets are destroyed, except that a double bullet meeting any
/// other kind survives as a basic bullet with half damage.
fn bullets_collide(world: &mut World, a: EntityId, b: EntityId) {
    let kind_of = |world: &World, id| bullet(world, id).map(|b| b.kind);
    let (ka, kb) = (kind_of(world, a), kind_of(world, b));
    let survivor = match (ka, kb) {
        (Some(BulletKind::Double), Some(other)) if other != BulletKind::Double => Some(a),
        (Some(other), Some(BulletKind::Double)) if other != BulletKind::Double => Some(b),
        _ => None,
    };

    for id in [a, b] {
        if Some(id) == survivor {
            if let Some(bullet) = world.grid.bullets.iter_mut().find(|x| x.id == id) {
                bullet.kind = BulletKind::Basic;
                bullet.damage /= 2;
            }
        } else {
            remove(world, id);
        }
    }
    world.emit(GameEvent::BulletsCollided { first: a, second: b });
}

fn hit_tank(world: &mut World, id: EntityId, tank: EntityId) -> Result<()> {
    let Some(hit) = remove(world, id) else {
        return Ok(());
    };
    match hit.kind {
        BulletKind::Basic | BulletKind::Double => {
            let dealt = apply_damage(world, tank, hit.damage, Some(hit.shooter))?;
            if dealt > 0 && world.roster.player(hit.shooter).is_some() {
                world
                    .score
                    .award_score(&mut world.roster, hit.shooter, i64::from(dealt / 2))?;
            }
        }
        BulletKind::Stun => world
            .stun
            .apply_stun(tank, StunFlags::MOVEMENT, STUN_BULLET_TICKS),
        BulletKind::Healing => {
            if let Some(target) = world.grid.tank_mut(tank) {
                HealSystem::heal(target, HEALING_BULLET_AMOUNT);
            }
        }
    }
    Ok(())
}
