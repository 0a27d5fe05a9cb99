//! Ability use.
//!
//! Bullets are always available while ammo lasts. The secondary abilities
//! depend on the match variant: individual matches unlock them with a held
//! item, team matches put each one on a cooldown and add the stun and
//! healing bullets.

use crate::components::{AbilityType, BulletKind, EntityId, StunFlags};
use crate::score::ScoringMode;
use crate::systems::bullet::fire_bullet;
use crate::systems::laser::fire_laser;
use crate::systems::mine::drop_mine;
use crate::world::World;

/// Laser cooldown in team matches.
pub const LASER_COOLDOWN: u32 = 400;
/// Mine cooldown in team matches.
pub const MINE_COOLDOWN: u32 = 80;
/// Radar cooldown in team matches.
pub const RADAR_COOLDOWN: u32 = 200;
/// Stun bullet cooldown.
pub const STUN_BULLET_COOLDOWN: u32 = 200;
/// Healing bullet cooldown.
pub const HEALING_BULLET_COOLDOWN: u32 = 200;

/// Use `ability` with `tank`. Returns whether it went off.
///
/// Dead tanks, tanks stunned for ability use, empty magazines, missing
/// items and running cooldowns all reject the request without side
/// effects.
pub fn use_ability(world: &mut World, tank: EntityId, ability: AbilityType) -> bool {
    if world.stun.is_blocked(tank, StunFlags::ABILITY_USE) {
        return false;
    }
    let Some(t) = world.grid.tank_mut(tank).filter(|t| !t.is_dead()) else {
        return false;
    };

    if ability == AbilityType::FireBullet {
        return t.abilities.ammo.consume() && fire_bullet(world, tank, BulletKind::Basic);
    }

    let ready = match world.config.scoring {
        ScoringMode::Individual => {
            let unlocked = t.held_item.is_some_and(|item| item.ability() == ability);
            if unlocked {
                t.held_item = None;
            }
            unlocked
        }
        ScoringMode::Team => {
            let abilities = &mut t.abilities;
            let slot = match ability {
                AbilityType::UseLaser => Some((&mut abilities.laser, LASER_COOLDOWN)),
                AbilityType::DropMine => Some((&mut abilities.mine, MINE_COOLDOWN)),
                AbilityType::UseRadar => Some((&mut abilities.radar, RADAR_COOLDOWN)),
                AbilityType::FireStunBullet => {
                    Some((&mut abilities.stun_bullet, STUN_BULLET_COOLDOWN))
                }
                AbilityType::FireHealingBullet => {
                    Some((&mut abilities.healing_bullet, HEALING_BULLET_COOLDOWN))
                }
                AbilityType::FireBullet | AbilityType::FireDoubleBullet => None,
            };
            match slot {
                Some((cooldown, ticks)) if cooldown.is_ready() => {
                    cooldown.trigger(ticks);
                    true
                }
                _ => false,
            }
        }
    };
    if !ready {
        tracing::trace!(tank, ?ability, "ability rejected");
        return false;
    }

    match ability {
        AbilityType::FireBullet => false,
        AbilityType::FireDoubleBullet => fire_bullet(world, tank, BulletKind::Double),
        AbilityType::FireStunBullet => fire_bullet(world, tank, BulletKind::Stun),
        AbilityType::FireHealingBullet => fire_bullet(world, tank, BulletKind::Healing),
        AbilityType::UseLaser => fire_laser(world, tank),
        AbilityType::DropMine => drop_mine(world, tank),
        AbilityType::UseRadar => {
            if let Some(t) = world.grid.tank_mut(tank) {
                t.abilities.radar_active = true;
            }
            true
        }
    }
}
