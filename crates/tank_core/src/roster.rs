//! Players and teams taking part in a match.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{Player, PlayerId, Team, TeamId};
use crate::error::{GameError, Result};

/// Every player and team, keyed by stable id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    players: BTreeMap<PlayerId, Player>,
    teams: BTreeMap<TeamId, Team>,
    next_player: u32,
    next_team: u32,
}

impl Roster {
    /// An empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a team.
    pub fn add_team(&mut self, name: impl Into<String>) -> TeamId {
        self.next_team += 1;
        let id = TeamId(self.next_team);
        self.teams.insert(
            id,
            Team {
                id,
                name: name.into(),
                score: 0,
            },
        );
        id
    }

    /// Register a player. Ids are never reused.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] when `team` is not registered.
    pub fn add_player(&mut self, nickname: impl Into<String>, team: Option<TeamId>) -> Result<PlayerId> {
        if let Some(team) = team {
            if !self.teams.contains_key(&team) {
                return Err(GameError::InvalidState(format!("unknown {team}")));
            }
        }
        self.next_player += 1;
        let id = PlayerId(self.next_player);
        self.players.insert(
            id,
            Player {
                id,
                nickname: nickname.into(),
                team,
                score: 0,
                kills: 0,
            },
        );
        Ok(id)
    }

    /// Drop a player.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        self.players.remove(&id)
    }

    /// Player by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Mutable player by id.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PlayerNotFound`] for unknown ids.
    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players.get_mut(&id).ok_or(GameError::PlayerNotFound(id))
    }

    /// Team by id.
    #[must_use]
    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.get(&id)
    }

    /// Mutable team by id.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] for unknown ids.
    pub fn team_mut(&mut self, id: TeamId) -> Result<&mut Team> {
        self.teams
            .get_mut(&id)
            .ok_or_else(|| GameError::InvalidState(format!("unknown {id}")))
    }

    /// Players in id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Teams in id order.
    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    /// Whether two players share a team.
    #[must_use]
    pub fn are_teammates(&self, a: PlayerId, b: PlayerId) -> bool {
        let team_of = |id| self.players.get(&id).and_then(|p| p.team);
        matches!((team_of(a), team_of(b)), (Some(x), Some(y)) if x == y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_not_reused() {
        let mut roster = Roster::new();
        let a = roster.add_player("a", None).expect("add");
        roster.remove_player(a);
        let b = roster.add_player("b", None).expect("add");
        assert_ne!(a, b);
    }

    #[test]
    fn test_unknown_team_is_rejected() {
        let mut roster = Roster::new();
        assert!(roster.add_player("a", Some(TeamId(7))).is_err());
    }

    #[test]
    fn test_teammates() {
        let mut roster = Roster::new();
        let red = roster.add_team("red");
        let blue = roster.add_team("blue");
        let a = roster.add_player("a", Some(red)).expect("add");
        let b = roster.add_player("b", Some(red)).expect("add");
        let c = roster.add_player("c", Some(blue)).expect("add");
        assert!(roster.are_teammates(a, b));
        assert!(!roster.are_teammates(a, c));
        assert!(matches!(
            roster.player_mut(PlayerId(99)),
            Err(GameError::PlayerNotFound(_))
        ));
    }
}
