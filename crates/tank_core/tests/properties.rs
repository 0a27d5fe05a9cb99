//! Property tests for stuns, fractional scoring and facings.

use proptest::prelude::*;
use tank_core::components::{Cell, Rotation, Tank};
use tank_core::score::ScoreKey;
use tank_test_utils::determinism::strategies::{
    arb_direction, arb_fraction, arb_stun_flags, arb_stun_ticks,
};
use tank_test_utils::fixtures::{duel, fixed, fixed_f, open_arena};

#[test]
fn test_four_quarters_make_a_point() {
    let mut sim = open_arena(8);
    let ace = sim.add_player("ace", None).unwrap();
    let world = sim.world_mut();
    for _ in 0..4 {
        world
            .score
            .award_fraction(&mut world.roster, ace, fixed_f(0.25))
            .unwrap();
    }
    assert_eq!(sim.roster().player(ace).map(|p| p.score), Some(1));
    assert_eq!(sim.world().score.buffered(ScoreKey::Player(ace)), fixed(0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_fractional_awards_are_conserved(
        awards in proptest::collection::vec(arb_fraction(), 1..24),
    ) {
        let mut sim = open_arena(8);
        let ace = sim.add_player("ace", None).unwrap();
        let world = sim.world_mut();
        for &award in &awards {
            world.score.award_fraction(&mut world.roster, ace, award).unwrap();
        }

        let total = awards.iter().fold(fixed(0), |sum, &a| sum + a);
        let whole = sim.roster().player(ace).map_or(0, |p| p.score);
        let rest = sim.world().score.buffered(ScoreKey::Player(ace));
        prop_assert!(rest >= fixed(0) && rest < fixed(1));
        prop_assert_eq!(fixed(i32::try_from(whole).unwrap()) + rest, total);
    }

    #[test]
    fn prop_stun_holds_for_its_full_length(
        flags in arb_stun_flags(),
        ticks in arb_stun_ticks(),
    ) {
        let mut d = duel(10);
        let tank = d.sim.grid().tank_of(d.first).map(|t| t.id).unwrap();
        d.sim.world_mut().stun.apply_stun(tank, flags, ticks);

        for _ in 1..ticks {
            d.sim.tick().unwrap();
            prop_assert!(d.sim.world().stun.is_blocked(tank, flags));
        }
        d.sim.tick().unwrap();
        prop_assert!(!d.sim.world().stun.is_blocked(tank, flags));
    }

    #[test]
    fn prop_spawned_tank_keeps_its_facing(direction in arb_direction()) {
        let mut sim = open_arena(9);
        let player = sim
            .add_player_at("p", None, Cell::new(4, 4), direction)
            .unwrap();
        let tank: &Tank = sim.grid().tank_of(player).unwrap();
        prop_assert_eq!(tank.direction, direction);
        prop_assert_eq!(tank.turret_direction, direction);

        let turned = (0..4).fold(direction, |d, _| d.rotated(Rotation::Right));
        prop_assert_eq!(turned, direction);
        prop_assert_eq!(
            Cell::new(4, 4).step(direction, 1).step(direction.opposite(), 1),
            Cell::new(4, 4)
        );
    }
}
