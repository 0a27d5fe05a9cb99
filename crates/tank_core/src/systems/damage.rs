//! Damage and death.

use crate::components::{EntityId, PlayerId};
use crate::error::{GameError, Result};
use crate::score::ScoringMode;
use crate::systems::heal::HealSystem;
use crate::systems::items::drop_item;
use crate::world::{GameEvent, World};

/// Deal up to `amount` damage to a tank and return what was dealt.
///
/// A tank brought to zero health dies: it loses its cell and held item
/// (dropped nearby), its heal buffer is cleared and the respawn countdown
/// starts. A killer other than the owner gets the kill and, in individual
/// matches, heals by the damage of the final blow.
///
/// # Errors
///
/// Returns [`GameError::TankNotFound`] for an unknown tank and propagates
/// roster errors for an unknown killer.
pub fn apply_damage(
    world: &mut World,
    tank: EntityId,
    amount: u32,
    source: Option<PlayerId>,
) -> Result<u32> {
    let respawn_ticks = world.config.respawn_ticks;
    let target = world
        .grid
        .tank_mut(tank)
        .ok_or(GameError::TankNotFound(tank))?;
    if target.is_dead() {
        return Ok(0);
    }

    let dealt = amount.min(target.health);
    target.health -= dealt;
    if dealt > 0 {
        world.emit(GameEvent::TankHit {
            tank,
            dealt,
            source,
        });
    }

    let Some(target) = world.grid.tank_mut(tank) else {
        return Ok(dealt);
    };
    if !target.is_dead() {
        return Ok(dealt);
    }

    let owner = target.owner;
    let death_cell = target.cell.take();
    let item = target.held_item.take();
    target.previous_cell = None;
    target.respawn_remaining = Some(respawn_ticks);
    world.heal.clear(tank);

    if let (Some(cell), Some(kind)) = (death_cell, item) {
        drop_item(&mut world.grid, cell, kind);
    }

    let killer = source.filter(|killer| *killer != owner);
    if let Some(killer) = killer {
        world.roster.player_mut(killer)?.kills += 1;
        if world.config.scoring == ScoringMode::Individual {
            if let Some(killer_tank) = world.grid.tanks.iter_mut().find(|t| t.owner == killer) {
                HealSystem::heal(killer_tank, dealt);
            }
        }
    }

    tracing::info!(tank, ?killer, "tank destroyed");
    world.emit(GameEvent::TankKilled { tank, killer });
    Ok(dealt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Cell, Direction, SecondaryItemType, Tank, MAX_HEALTH};
    use crate::config::MatchConfig;

    fn world_with_duel() -> (World, EntityId, EntityId, PlayerId) {
        let mut world = World::new(MatchConfig {
            dim: 6,
            ..MatchConfig::default()
        });
        let a = world.roster.add_player("a", None).expect("add");
        let b = world.roster.add_player("b", None).expect("add");
        let ta = world.grid.next_id();
        let tb = world.grid.next_id();
        world.grid.tanks.push(Tank::new(ta, a, Cell::new(0, 0), Direction::Down));
        world.grid.tanks.push(Tank::new(tb, b, Cell::new(3, 3), Direction::Up));
        (world, ta, tb, a)
    }

    #[test]
    fn test_damage_is_capped_by_health() {
        let (mut world, _, tb, a) = world_with_duel();
        assert_eq!(apply_damage(&mut world, tb, 30, Some(a)).expect("damage"), 30);
        assert_eq!(world.grid.tank(tb).map(|t| t.health), Some(70));
        assert_eq!(apply_damage(&mut world, tb, 500, Some(a)).expect("damage"), 70);
        assert_eq!(apply_damage(&mut world, tb, 10, Some(a)).expect("damage"), 0);
    }

    #[test]
    fn test_kill_credits_and_heals_killer() {
        let (mut world, ta, tb, a) = world_with_duel();
        if let Some(t) = world.grid.tank_mut(ta) {
            t.health = 40;
        }
        if let Some(t) = world.grid.tank_mut(tb) {
            t.health = 20;
            t.held_item = Some(SecondaryItemType::Laser);
        }

        apply_damage(&mut world, tb, 50, Some(a)).expect("damage");

        let victim = world.grid.tank(tb).expect("victim");
        assert!(victim.is_dead());
        assert_eq!(victim.cell, None);
        assert_eq!(victim.respawn_remaining, Some(world.config.respawn_ticks));
        assert_eq!(world.roster.player(a).map(|p| p.kills), Some(1));
        assert_eq!(world.grid.tank(ta).map(|t| t.health), Some(60));
        assert_eq!(world.grid.items.len(), 1);
        assert_eq!(world.grid.items[0].cell, Cell::new(3, 3));
        assert!(world
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::TankKilled { killer: Some(k), .. } if *k == a)));
    }

    #[test]
    fn test_self_kill_gives_no_credit() {
        let (mut world, _, tb, _) = world_with_duel();
        let owner = world.grid.tank(tb).map(|t| t.owner).expect("tank");
        apply_damage(&mut world, tb, MAX_HEALTH, Some(owner)).expect("damage");
        assert_eq!(world.roster.player(owner).map(|p| p.kills), Some(0));
    }

    #[test]
    fn test_unknown_tank_is_an_error() {
        let (mut world, ..) = world_with_duel();
        assert!(matches!(
            apply_damage(&mut world, 999, 10, None),
            Err(GameError::TankNotFound(999))
        ));
    }
}
