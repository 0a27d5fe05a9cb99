//! End-to-end matches driven through the public API.

use tank_core::prelude::*;
use tank_test_utils::fixtures::{duel, duel_with_zone, walled_arena};

#[test]
fn test_zone_capture_then_award_every_tick() {
    let mut d = duel_with_zone(10);
    let ticks = d.sim.world().config.ticks_to_capture;

    let events = d.sim.tick().unwrap();
    assert!(matches!(
        d.sim.grid().zones[0].state,
        ZoneState::BeingCaptured { player, .. } if player == d.first
    ));
    assert!(events
        .events
        .iter()
        .any(|e| matches!(e, GameEvent::ZoneChanged { zone: 'A', .. })));

    for _ in 1..ticks {
        d.sim.tick().unwrap();
    }
    assert_eq!(
        d.sim.grid().zones[0].state,
        ZoneState::Captured { player: d.first }
    );
    assert_eq!(d.sim.roster().player(d.first).map(|p| p.score), Some(0));

    // Half a point per tick while held.
    for expected in 1..=5 {
        d.sim.tick().unwrap();
        d.sim.tick().unwrap();
        assert_eq!(
            d.sim.roster().player(d.first).map(|p| p.score),
            Some(expected)
        );
    }
    assert_eq!(d.sim.roster().player(d.second).map(|p| p.score), Some(0));
}

#[test]
fn test_leaving_early_never_captures() {
    let mut d = duel_with_zone(10);
    let ticks = d.sim.world().config.ticks_to_capture;
    for _ in 0..ticks - 5 {
        d.sim.tick().unwrap();
    }
    // The zone spans the bottom two rows; two steps up leave it.
    d.sim
        .apply_intent(d.first, Intent::Move(MovementDirection::Forward))
        .unwrap();
    d.sim.tick().unwrap();
    d.sim
        .apply_intent(d.first, Intent::Move(MovementDirection::Forward))
        .unwrap();
    for _ in 0..ticks * 2 {
        d.sim.tick().unwrap();
    }
    assert_eq!(d.sim.grid().zones[0].state, ZoneState::Neutral);
}

#[test]
fn test_shootout_kills_and_respawns() {
    let mut d = duel(10);
    // Line up on column 0: move the second tank above the first, facing down.
    {
        let world = d.sim.world_mut();
        let tank = world
            .grid
            .tanks
            .iter_mut()
            .find(|t| t.owner == d.second)
            .unwrap();
        tank.cell = Some(Cell::new(0, 2));
    }

    let mut killed = false;
    for _ in 0..60 {
        d.sim
            .apply_intent(d.first, Intent::UseAbility(AbilityType::FireBullet))
            .unwrap();
        let events = d.sim.tick().unwrap();
        if events
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::TankKilled { killer: Some(k), .. } if *k == d.first))
        {
            killed = true;
            break;
        }
    }
    assert!(killed);
    assert_eq!(d.sim.roster().player(d.first).map(|p| p.kills), Some(1));
    assert_eq!(d.sim.roster().player(d.first).map(|p| p.score), Some(50));
    assert!(d.sim.grid().tank_of(d.second).is_some_and(Tank::is_dead));

    let respawn = d.sim.world().config.respawn_ticks;
    for _ in 0..respawn {
        d.sim.tick().unwrap();
    }
    let tank = d.sim.grid().tank_of(d.second).unwrap();
    assert_eq!(tank.health, MAX_HEALTH);
    assert!(tank.cell.is_some());
}

#[test]
fn test_walls_stop_tanks_and_bullets() {
    let mut sim = walled_arena(&["......", "......", "######", "......", "......", "......"]);
    let p = sim
        .add_player_at("p", None, Cell::new(2, 3), Direction::Up)
        .unwrap();

    sim.apply_intent(p, Intent::Move(MovementDirection::Forward))
        .unwrap();
    sim.apply_intent(p, Intent::UseAbility(AbilityType::FireBullet))
        .unwrap();
    sim.tick().unwrap();

    assert_eq!(
        sim.grid().tank_of(p).and_then(|t| t.cell),
        Some(Cell::new(2, 3))
    );
    assert!(sim.grid().bullets.is_empty());
    let visible = &sim.grid().tank_of(p).unwrap().visibility;
    assert!(!visible.get(Cell::new(2, 1)));
}

#[test]
fn test_removed_player_leaves_no_trace() {
    let mut d = duel_with_zone(10);
    d.sim
        .apply_intent(d.first, Intent::UseAbility(AbilityType::FireBullet))
        .unwrap();
    d.sim.tick().unwrap();
    d.sim.remove_player(d.first).unwrap();
    d.sim.tick().unwrap();

    assert!(d.sim.grid().tank_of(d.first).is_none());
    assert!(d.sim.grid().bullets.is_empty());
    assert_eq!(d.sim.grid().zones[0].state, ZoneState::Neutral);
    assert!(matches!(
        d.sim.apply_intent(d.first, Intent::Pass),
        Err(GameError::PlayerNotFound(_))
    ));
}
