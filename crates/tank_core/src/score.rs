//! Score accounting.
//!
//! Whole points go straight to the visible score. Fractional awards collect
//! in a per-target buffer; whenever the buffer holds a whole point it is
//! flushed and the remainder kept. The target is the player in individual
//! matches and the player's team in team matches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{Player, PlayerId, TeamId};
use crate::error::{GameError, Result};
use crate::math::{fixed_map_serde, split_whole, Fixed};
use crate::roster::Roster;

/// Who receives score. Picked once per match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScoringMode {
    /// Every player scores for themselves.
    #[default]
    Individual,
    /// Awards are redirected to the player's team.
    Team,
}

/// Key of a score buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScoreKey {
    /// Individual target.
    Player(PlayerId),
    /// Team target.
    Team(TeamId),
}

impl ScoringMode {
    /// The score target for `player` under this mode.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PlayerWithoutTeam`] in team mode for a player
    /// without a team.
    pub fn key_for(self, player: &Player) -> Result<ScoreKey> {
        match self {
            Self::Individual => Ok(ScoreKey::Player(player.id)),
            Self::Team => player
                .team
                .map(ScoreKey::Team)
                .ok_or(GameError::PlayerWithoutTeam(player.id)),
        }
    }
}

/// Score buffers and award entry points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSystem {
    mode: ScoringMode,
    #[serde(with = "fixed_map_serde")]
    buffers: BTreeMap<ScoreKey, Fixed>,
}

impl ScoreSystem {
    /// A score system for the given mode.
    #[must_use]
    pub fn new(mode: ScoringMode) -> Self {
        Self {
            mode,
            buffers: BTreeMap::new(),
        }
    }

    /// The scoring mode.
    #[must_use]
    pub const fn mode(&self) -> ScoringMode {
        self.mode
    }

    /// Award whole points to `player` (or their team).
    ///
    /// # Errors
    ///
    /// Fails on a negative award, an unknown player, or a teamless player
    /// in team mode.
    pub fn award_score(&self, roster: &mut Roster, player: PlayerId, score: i64) -> Result<()> {
        if score < 0 {
            return Err(GameError::NegativeScore(score.to_string()));
        }
        let key = self.key_of(roster, player)?;
        credit(roster, key, score)
    }

    /// Award a fractional amount to `player` (or their team).
    ///
    /// # Errors
    ///
    /// Same as [`award_score`](Self::award_score).
    pub fn award_fraction(
        &mut self,
        roster: &mut Roster,
        player: PlayerId,
        score: Fixed,
    ) -> Result<()> {
        if score < Fixed::ZERO {
            return Err(GameError::NegativeScore(score.to_string()));
        }
        let key = self.key_of(roster, player)?;
        let buffer = self.buffers.entry(key).or_insert(Fixed::ZERO);
        let (whole, rest) = split_whole(*buffer + score);
        *buffer = rest;
        if whole > 0 {
            credit(roster, key, whole)?;
        }
        Ok(())
    }

    /// Forget the individual buffer of a departing player.
    ///
    /// Team buffers outlive their members.
    pub fn on_player_removed(&mut self, player: PlayerId) {
        self.buffers.remove(&ScoreKey::Player(player));
    }

    /// Current buffered remainder for `key`.
    #[must_use]
    pub fn buffered(&self, key: ScoreKey) -> Fixed {
        self.buffers.get(&key).copied().unwrap_or(Fixed::ZERO)
    }

    fn key_of(&self, roster: &Roster, player: PlayerId) -> Result<ScoreKey> {
        let player = roster
            .player(player)
            .ok_or(GameError::PlayerNotFound(player))?;
        self.mode.key_for(player)
    }
}

fn credit(roster: &mut Roster, key: ScoreKey, points: i64) -> Result<()> {
    match key {
        ScoreKey::Player(id) => roster.player_mut(id)?.score += points,
        ScoreKey::Team(id) => roster.team_mut(id)?.score += points,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn roster_with_player() -> (Roster, PlayerId) {
        let mut roster = Roster::new();
        let id = roster.add_player("ace", None).expect("add");
        (roster, id)
    }

    #[test]
    fn test_fractions_flush_whole_points() {
        let (mut roster, id) = roster_with_player();
        let mut score = ScoreSystem::new(ScoringMode::Individual);

        score
            .award_fraction(&mut roster, id, Fixed::from_num(0.6))
            .expect("award");
        assert_eq!(roster.player(id).map(|p| p.score), Some(0));

        score
            .award_fraction(&mut roster, id, Fixed::from_num(0.5))
            .expect("award");
        assert_eq!(roster.player(id).map(|p| p.score), Some(1));

        let rest = score.buffered(ScoreKey::Player(id));
        assert!((rest - Fixed::from_num(0.1)).abs() < Fixed::from_num(0.000_001));
    }

    #[test]
    fn test_negative_awards_fail() {
        let (mut roster, id) = roster_with_player();
        let mut score = ScoreSystem::new(ScoringMode::Individual);
        assert!(matches!(
            score.award_score(&mut roster, id, -1),
            Err(GameError::NegativeScore(_))
        ));
        assert!(score
            .award_fraction(&mut roster, id, Fixed::from_num(-0.5))
            .is_err());
        assert_eq!(roster.player(id).map(|p| p.score), Some(0));
    }

    #[test]
    fn test_team_mode_redirects_to_team() {
        let mut roster = Roster::new();
        let team = roster.add_team("red");
        let a = roster.add_player("a", Some(team)).expect("add");
        let b = roster.add_player("b", Some(team)).expect("add");
        let mut score = ScoreSystem::new(ScoringMode::Team);

        score.award_score(&mut roster, a, 3).expect("award");
        score
            .award_fraction(&mut roster, a, Fixed::from_num(0.5))
            .expect("award");
        score
            .award_fraction(&mut roster, b, Fixed::from_num(0.5))
            .expect("award");

        assert_eq!(roster.team(team).map(|t| t.score), Some(4));
        assert_eq!(roster.player(a).map(|p| p.score), Some(0));
        assert_eq!(score.buffered(ScoreKey::Team(team)), Fixed::ZERO);
    }

    #[test]
    fn test_team_mode_requires_team() {
        let (mut roster, id) = roster_with_player();
        let score = ScoreSystem::new(ScoringMode::Team);
        assert!(matches!(
            score.award_score(&mut roster, id, 1),
            Err(GameError::PlayerWithoutTeam(_))
        ));
    }

    #[test]
    fn test_removed_player_buffer_is_dropped() {
        let (mut roster, id) = roster_with_player();
        let mut score = ScoreSystem::new(ScoringMode::Individual);
        score
            .award_fraction(&mut roster, id, Fixed::from_num(0.75))
            .expect("award");
        score.on_player_removed(id);
        assert_eq!(score.buffered(ScoreKey::Player(id)), Fixed::ZERO);
    }

    proptest! {
        #[test]
        fn prop_fractions_are_never_lost(millis in proptest::collection::vec(0i64..3_000, 0..40)) {
            let (mut roster, id) = roster_with_player();
            let mut score = ScoreSystem::new(ScoringMode::Individual);
            let mut total = Fixed::ZERO;
            for milli in millis {
                let award = Fixed::from_num(milli) / Fixed::from_num(1_000);
                total += award;
                score.award_fraction(&mut roster, id, award).unwrap();
            }

            let rest = score.buffered(ScoreKey::Player(id));
            let whole = roster.player(id).map_or(0, |p| p.score);
            prop_assert!(rest >= Fixed::ZERO && rest < Fixed::ONE);
            prop_assert_eq!(Fixed::from_num(whole) + rest, total);
        }
    }
}
