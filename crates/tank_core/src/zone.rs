//! Zone capture state machine.
//!
//! Every zone is in one of five [`ZoneState`]s. Each state answers three
//! questions through a `match` arm: what happens while in it
//! ([`ZoneState::handle`]), where it goes given the current occupants
//! ([`ZoneState::next_state`]), and what a player leaving the match does to
//! it ([`ZoneState::on_player_removed`]).
//!
//! Capture progress lives in a [`ZoneContext`] per zone: a countdown of
//! remaining ticks per player. A player alone in a zone they do not hold
//! counts down by one per tick; a player with progress who is not inside
//! counts back up and is forgotten once fully regressed.
//!
//! Per tick and per zone the order is fixed: handle the current state,
//! update progress, compute and commit the next state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{PlayerId, Zone};
use crate::error::Result;
use crate::world::{GameEvent, World};

/// Capture state of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ZoneState {
    /// Nobody holds or is taking the zone.
    #[default]
    Neutral,
    /// `player` is taking an unowned zone.
    BeingCaptured {
        /// Capturing player.
        player: PlayerId,
        /// Ticks left until capture.
        remaining_ticks: u32,
    },
    /// `player` holds the zone.
    Captured {
        /// Owner.
        player: PlayerId,
    },
    /// Several players are inside; nobody progresses.
    BeingContested {
        /// Owner before the contest began, if any.
        captured_by: Option<PlayerId>,
    },
    /// `retaken_by` is taking the zone away from `captured_by`.
    BeingRetaken {
        /// Current owner.
        captured_by: PlayerId,
        /// Challenger.
        retaken_by: PlayerId,
        /// Ticks left until the challenger takes over.
        remaining_ticks: u32,
    },
}

/// Side effect requested by a state's per-tick handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneEffect {
    /// Pay the owner the captured-zone award and heal their tank.
    RewardOwner(PlayerId),
}

impl ZoneState {
    /// The player currently holding the zone, if any.
    #[must_use]
    pub const fn holder(&self) -> Option<PlayerId> {
        match *self {
            Self::Captured { player } => Some(player),
            Self::BeingRetaken { captured_by, .. } => Some(captured_by),
            Self::BeingContested { captured_by } => captured_by,
            Self::Neutral | Self::BeingCaptured { .. } => None,
        }
    }

    /// Per-tick side effects of being in this state.
    #[must_use]
    pub const fn handle(&self) -> Option<ZoneEffect> {
        match *self {
            Self::Captured { player } => Some(ZoneEffect::RewardOwner(player)),
            _ => None,
        }
    }

    /// Transition for the given live occupants (sorted, deduplicated).
    #[must_use]
    pub fn next_state(&self, context: &ZoneContext, occupants: &[PlayerId]) -> Self {
        let sole = match occupants {
            [only] => Some(*only),
            _ => None,
        };
        let crowded = occupants.len() > 1;

        match *self {
            Self::Neutral => match sole {
                Some(player) => context.being_captured(player),
                None if crowded => Self::BeingContested { captured_by: None },
                None => Self::Neutral,
            },

            Self::BeingCaptured { player, .. } => match sole {
                Some(p) if p == player && context.remaining_ticks(p) == 0 => {
                    Self::Captured { player }
                }
                Some(p) => context.being_captured(p),
                None if crowded => Self::BeingContested { captured_by: None },
                None => context.fall_back(),
            },

            Self::Captured { player } => match sole {
                Some(p) if p == player => *self,
                Some(p) => context.being_retaken(player, p),
                None if crowded => Self::BeingContested {
                    captured_by: Some(player),
                },
                None => *self,
            },

            Self::BeingRetaken { captured_by, .. } => match sole {
                Some(p) if p == captured_by => Self::Captured { player: captured_by },
                Some(p) => context.being_retaken(captured_by, p),
                None if crowded => Self::BeingContested {
                    captured_by: Some(captured_by),
                },
                None => match context.closest_to_capture() {
                    Some(challenger) if challenger != captured_by => {
                        context.being_retaken(captured_by, challenger)
                    }
                    _ => Self::Captured { player: captured_by },
                },
            },

            Self::BeingContested { captured_by } => match (sole, captured_by) {
                (_, _) if crowded => *self,
                (Some(p), Some(owner)) if p == owner => Self::Captured { player: owner },
                (Some(p), Some(owner)) => context.being_retaken(owner, p),
                (Some(p), None) => context.being_captured(p),
                (None, Some(owner)) => Self::Captured { player: owner },
                (None, None) => context.fall_back(),
            },
        }
    }

    /// Transition when `player` leaves the match.
    ///
    /// `context` must already have forgotten the player's progress.
    #[must_use]
    pub fn on_player_removed(&self, context: &ZoneContext, player: PlayerId) -> Self {
        match *self {
            Self::BeingCaptured { player: p, .. } if p == player => context.fall_back(),
            Self::Captured { player: p } if p == player => Self::Neutral,
            Self::BeingRetaken {
                captured_by,
                retaken_by,
                ..
            } => {
                if captured_by == player {
                    context.being_captured(retaken_by)
                } else if retaken_by == player {
                    Self::Captured {
                        player: captured_by,
                    }
                } else {
                    *self
                }
            }
            Self::BeingContested {
                captured_by: Some(p),
            } if p == player => Self::BeingContested { captured_by: None },
            _ => *self,
        }
    }
}

/// Capture progress of one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneContext {
    zone: char,
    ticks_to_capture: u32,
    progress: BTreeMap<PlayerId, u32>,
}

impl ZoneContext {
    /// Empty progress for `zone`.
    #[must_use]
    pub fn new(zone: char, ticks_to_capture: u32) -> Self {
        Self {
            zone,
            ticks_to_capture,
            progress: BTreeMap::new(),
        }
    }

    /// Label of the zone this context tracks.
    #[must_use]
    pub const fn zone(&self) -> char {
        self.zone
    }

    /// Ticks `player` still needs; a full countdown if untracked.
    #[must_use]
    pub fn remaining_ticks(&self, player: PlayerId) -> u32 {
        self.progress
            .get(&player)
            .copied()
            .unwrap_or(self.ticks_to_capture)
    }

    /// Whether `player` has any progress.
    #[must_use]
    pub fn is_tracked(&self, player: PlayerId) -> bool {
        self.progress.contains_key(&player)
    }

    /// Tracked player nearest to capture; ties go to the lower id.
    #[must_use]
    pub fn closest_to_capture(&self) -> Option<PlayerId> {
        self.progress
            .iter()
            .min_by_key(|(player, remaining)| (**remaining, **player))
            .map(|(player, _)| *player)
    }

    /// Advance progress for one tick.
    ///
    /// Players outside regress and are dropped once fully regressed. A
    /// sole occupant who does not hold the zone counts down. Several
    /// occupants freeze each other.
    pub fn update_progress(&mut self, state: &ZoneState, occupants: &[PlayerId]) {
        let limit = self.ticks_to_capture;
        self.progress.retain(|player, remaining| {
            if occupants.contains(player) {
                return true;
            }
            *remaining += 1;
            *remaining < limit
        });

        if let [sole] = occupants {
            if state.holder() != Some(*sole) {
                let remaining = self.progress.entry(*sole).or_insert(limit);
                *remaining = remaining.saturating_sub(1);
            }
        }
    }

    /// Forget a player's progress.
    pub fn forget(&mut self, player: PlayerId) {
        self.progress.remove(&player);
    }

    fn being_captured(&self, player: PlayerId) -> ZoneState {
        ZoneState::BeingCaptured {
            player,
            remaining_ticks: self.remaining_ticks(player),
        }
    }

    fn being_retaken(&self, captured_by: PlayerId, retaken_by: PlayerId) -> ZoneState {
        let remaining_ticks = self.remaining_ticks(retaken_by);
        if remaining_ticks == 0 {
            return ZoneState::Captured { player: retaken_by };
        }
        ZoneState::BeingRetaken {
            captured_by,
            retaken_by,
            remaining_ticks,
        }
    }

    fn fall_back(&self) -> ZoneState {
        self.closest_to_capture()
            .map_or(ZoneState::Neutral, |player| self.being_captured(player))
    }
}

/// Zone contexts, keyed by zone label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSystem {
    ticks_to_capture: u32,
    contexts: BTreeMap<char, ZoneContext>,
}

impl ZoneSystem {
    /// No contexts yet; zones are picked up on first sight.
    #[must_use]
    pub fn new(ticks_to_capture: u32) -> Self {
        Self {
            ticks_to_capture,
            contexts: BTreeMap::new(),
        }
    }

    fn context_mut(&mut self, zone: char) -> &mut ZoneContext {
        let ticks_to_capture = self.ticks_to_capture;
        self.contexts
            .entry(zone)
            .or_insert_with(|| ZoneContext::new(zone, ticks_to_capture))
    }

    /// Context of a zone, if it has been seen.
    #[must_use]
    pub fn context(&self, zone: char) -> Option<&ZoneContext> {
        self.contexts.get(&zone)
    }

    /// Number of live contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether no zone has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Forget `player` everywhere and let each zone react.
    pub fn on_player_removed(&mut self, zones: &mut [Zone], player: PlayerId) {
        for zone in zones {
            let context = self.context_mut(zone.index);
            context.forget(player);
            zone.state = zone.state.on_player_removed(context, player);
        }
    }
}

/// Live occupants of `zone`, sorted and deduplicated.
fn occupants(world: &World, zone: &Zone) -> Vec<PlayerId> {
    let mut players: Vec<PlayerId> = world
        .grid
        .tanks
        .iter()
        .filter(|tank| tank.live_cell().is_some_and(|cell| zone.contains(cell)))
        .map(|tank| tank.owner)
        .collect();
    players.sort_unstable();
    players.dedup();
    players
}

/// Run one tick of the state machine for every zone.
///
/// # Errors
///
/// Propagates score errors from the captured-zone award.
pub fn update(world: &mut World) -> Result<()> {
    world
        .zones
        .contexts
        .retain(|index, _| world.grid.zones.iter().any(|zone| zone.index == *index));

    for i in 0..world.grid.zones.len() {
        let zone = world.grid.zones[i].clone();
        let inside = occupants(world, &zone);

        if let Some(ZoneEffect::RewardOwner(owner)) = zone.state.handle() {
            reward_owner(world, owner)?;
        }

        let context = world.zones.context_mut(zone.index);
        context.update_progress(&zone.state, &inside);
        let next = zone.state.next_state(context, &inside);

        if next != zone.state {
            if let ZoneState::Captured { player } = next {
                context.forget(player);
                tracing::info!(zone = %zone.index, %player, "zone captured");
            }
            world.grid.zones[i].state = next;
            world.emit(GameEvent::ZoneChanged {
                zone: zone.index,
                state: next,
            });
        }
    }
    Ok(())
}

fn reward_owner(world: &mut World, owner: PlayerId) -> Result<()> {
    let World {
        config,
        grid,
        roster,
        score,
        heal,
        ..
    } = world;

    if roster.player(owner).is_none() {
        return Ok(());
    }
    score.award_fraction(roster, owner, config.captured_zone_award)?;

    if let Some(tank) = grid.tanks.iter_mut().find(|t| t.owner == owner) {
        if !tank.is_dead() && tank.health < config.captured_zone_heal_threshold {
            heal.heal_fraction(tank, config.captured_zone_heal);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u32 = 5;
    const A: PlayerId = PlayerId(1);
    const B: PlayerId = PlayerId(2);

    /// Drive one zone through `ticks` ticks with fixed occupants.
    fn run(state: &mut ZoneState, context: &mut ZoneContext, occupants: &[PlayerId], ticks: u32) {
        for _ in 0..ticks {
            context.update_progress(state, occupants);
            let next = state.next_state(context, occupants);
            if let ZoneState::Captured { player } = next {
                if *state != next {
                    context.forget(player);
                }
            }
            *state = next;
        }
    }

    #[test]
    fn test_empty_zone_stays_neutral() {
        let mut state = ZoneState::Neutral;
        let mut context = ZoneContext::new('A', T);
        run(&mut state, &mut context, &[], 20);
        assert_eq!(state, ZoneState::Neutral);
    }

    #[test]
    fn test_sole_occupant_captures_in_exactly_ticks_to_capture() {
        let mut state = ZoneState::Neutral;
        let mut context = ZoneContext::new('A', T);

        run(&mut state, &mut context, &[A], 1);
        assert_eq!(
            state,
            ZoneState::BeingCaptured {
                player: A,
                remaining_ticks: T - 1
            }
        );

        run(&mut state, &mut context, &[A], T - 2);
        assert!(matches!(state, ZoneState::BeingCaptured { remaining_ticks: 1, .. }));

        run(&mut state, &mut context, &[A], 1);
        assert_eq!(state, ZoneState::Captured { player: A });
        assert!(!context.is_tracked(A));
    }

    #[test]
    fn test_leaving_early_regresses_then_resets() {
        let mut state = ZoneState::Neutral;
        let mut context = ZoneContext::new('A', T);
        run(&mut state, &mut context, &[A], 3);
        assert_eq!(context.remaining_ticks(A), T - 3);

        run(&mut state, &mut context, &[], 1);
        assert_eq!(
            state,
            ZoneState::BeingCaptured {
                player: A,
                remaining_ticks: T - 2
            }
        );

        run(&mut state, &mut context, &[], 2);
        assert_eq!(state, ZoneState::Neutral);
        assert!(!context.is_tracked(A));
    }

    #[test]
    fn test_two_occupants_contest_and_freeze() {
        let mut state = ZoneState::Neutral;
        let mut context = ZoneContext::new('A', T);
        run(&mut state, &mut context, &[A], 2);
        run(&mut state, &mut context, &[A, B], 10);
        assert_eq!(state, ZoneState::BeingContested { captured_by: None });
        assert_eq!(context.remaining_ticks(A), T - 2);

        run(&mut state, &mut context, &[A], 1);
        assert_eq!(
            state,
            ZoneState::BeingCaptured {
                player: A,
                remaining_ticks: T - 3
            }
        );
    }

    #[test]
    fn test_owner_keeps_zone_and_challenger_retakes() {
        let mut state = ZoneState::Captured { player: A };
        let mut context = ZoneContext::new('A', T);

        run(&mut state, &mut context, &[A], 3);
        assert_eq!(state, ZoneState::Captured { player: A });
        assert!(!context.is_tracked(A));

        run(&mut state, &mut context, &[B], 1);
        assert_eq!(
            state,
            ZoneState::BeingRetaken {
                captured_by: A,
                retaken_by: B,
                remaining_ticks: T - 1
            }
        );

        run(&mut state, &mut context, &[B], T - 1);
        assert_eq!(state, ZoneState::Captured { player: B });
    }

    #[test]
    fn test_owner_returning_stops_retake() {
        let mut state = ZoneState::Captured { player: A };
        let mut context = ZoneContext::new('A', T);
        run(&mut state, &mut context, &[B], 2);
        run(&mut state, &mut context, &[A], 1);
        assert_eq!(state, ZoneState::Captured { player: A });
    }

    #[test]
    fn test_contest_over_owned_zone_returns_to_owner() {
        let mut state = ZoneState::Captured { player: A };
        let mut context = ZoneContext::new('A', T);
        run(&mut state, &mut context, &[A, B], 1);
        assert_eq!(state, ZoneState::BeingContested { captured_by: Some(A) });
        run(&mut state, &mut context, &[], 1);
        assert_eq!(state, ZoneState::Captured { player: A });
    }

    #[test]
    fn test_captured_state_rewards_owner() {
        assert_eq!(
            ZoneState::Captured { player: A }.handle(),
            Some(ZoneEffect::RewardOwner(A))
        );
        assert_eq!(ZoneState::Neutral.handle(), None);
    }

    #[test]
    fn test_player_removal_rules() {
        let mut context = ZoneContext::new('A', T);
        run(&mut ZoneState::Neutral, &mut context, &[B], 2);

        let captured = ZoneState::Captured { player: A };
        assert_eq!(captured.on_player_removed(&context, A), ZoneState::Neutral);
        assert_eq!(captured.on_player_removed(&context, B), captured);

        let retaken = ZoneState::BeingRetaken {
            captured_by: A,
            retaken_by: B,
            remaining_ticks: T - 2,
        };
        assert_eq!(
            retaken.on_player_removed(&context, A),
            ZoneState::BeingCaptured {
                player: B,
                remaining_ticks: T - 2
            }
        );
        assert_eq!(
            retaken.on_player_removed(&context, B),
            ZoneState::Captured { player: A }
        );

        let contested = ZoneState::BeingContested { captured_by: Some(A) };
        assert_eq!(
            contested.on_player_removed(&context, A),
            ZoneState::BeingContested { captured_by: None }
        );

        context.forget(B);
        let capturing = ZoneState::BeingCaptured {
            player: B,
            remaining_ticks: T - 2,
        };
        assert_eq!(capturing.on_player_removed(&context, B), ZoneState::Neutral);
    }

    #[test]
    fn test_contexts_follow_the_grid_zones() {
        use crate::components::{Cell, Direction, Tank};
        use crate::config::MatchConfig;

        let mut world = World::new(MatchConfig {
            dim: 8,
            ..MatchConfig::default()
        });
        let a = world.roster.add_player("a", None).expect("add");
        let tank = world.grid.next_id();
        world.grid.tanks.push(Tank::new(tank, a, Cell::new(0, 0), Direction::Up));
        world.grid.zones.push(Zone::new('A', 0, 0, 2, 2));
        world.grid.zones.push(Zone::new('B', 5, 5, 2, 2));
        assert!(world.zones.is_empty());

        update(&mut world).expect("update");
        assert_eq!(world.zones.len(), 2);
        assert!(world.zones.context('A').is_some_and(|c| c.is_tracked(a)));
        assert!(world.zones.context('B').is_some_and(|c| !c.is_tracked(a)));

        world.grid.zones.retain(|zone| zone.index != 'A');
        update(&mut world).expect("update");
        assert_eq!(world.zones.len(), 1);
        assert!(world.zones.context('A').is_none());
        assert!(world.zones.context('B').is_some());
    }

    #[test]
    fn test_closest_to_capture_breaks_ties_by_id() {
        let mut context = ZoneContext::new('A', T);
        context.update_progress(&ZoneState::Neutral, &[B]);
        context.update_progress(&ZoneState::Neutral, &[B]);
        context.update_progress(&ZoneState::Neutral, &[A]);
        assert_eq!(context.remaining_ticks(A), T - 1);
        assert_eq!(context.remaining_ticks(B), T - 1);
        assert_eq!(context.closest_to_capture(), Some(A));

        context.update_progress(&ZoneState::Neutral, &[A]);
        assert!(!context.is_tracked(B));
        assert_eq!(context.closest_to_capture(), Some(A));
    }
}
