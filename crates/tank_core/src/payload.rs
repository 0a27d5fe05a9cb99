//! Serializable snapshots handed to clients.
//!
//! [`GameStatePayload::snapshot`] captures everything; [`GameStatePayload::for_player`]
//! hides enemy tanks the viewer cannot see.

use serde::{Deserialize, Serialize};

use crate::components::{
    Bullet, Cell, Direction, EntityId, Laser, Mine, PlayerId, SecondaryItem, SecondaryItemType,
    Tank, TeamId, Zone,
};
use crate::grid::{CellMask, Grid};
use crate::roster::Roster;
use crate::simulation::Simulation;

/// Client view of a tank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankPayload {
    /// Entity id.
    pub id: EntityId,
    /// Owner.
    pub owner: PlayerId,
    /// Position, absent while dead.
    pub cell: Option<Cell>,
    /// Body facing.
    pub direction: Direction,
    /// Turret facing.
    pub turret_direction: Direction,
    /// Remaining health.
    pub health: u32,
    /// Ticks until respawn, while dead.
    pub respawn_remaining: Option<u32>,
    /// Held item.
    pub held_item: Option<SecondaryItemType>,
}

impl From<&Tank> for TankPayload {
    fn from(tank: &Tank) -> Self {
        Self {
            id: tank.id,
            owner: tank.owner,
            cell: tank.cell,
            direction: tank.direction,
            turret_direction: tank.turret_direction,
            health: tank.health,
            respawn_remaining: tank.respawn_remaining,
            held_item: tank.held_item,
        }
    }
}

/// Spatial snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPayload {
    /// Side length.
    pub dim: i32,
    /// Wall mask, one `'0'`/`'1'` string per row.
    pub walls: Vec<String>,
    /// Tanks.
    pub tanks: Vec<TankPayload>,
    /// Bullets in flight.
    pub bullets: Vec<Bullet>,
    /// Active beam cells.
    pub lasers: Vec<Laser>,
    /// Planted mines.
    pub mines: Vec<Mine>,
    /// Zones with their state.
    pub zones: Vec<Zone>,
    /// Items lying on the map.
    pub items: Vec<SecondaryItem>,
}

impl From<&Grid> for GridPayload {
    fn from(grid: &Grid) -> Self {
        Self {
            dim: grid.dim(),
            walls: grid.walls().to_rows(),
            tanks: grid.tanks.iter().map(TankPayload::from).collect(),
            bullets: grid.bullets.clone(),
            lasers: grid.lasers.clone(),
            mines: grid.mines.clone(),
            zones: grid.zones.clone(),
            items: grid.items.clone(),
        }
    }
}

/// Client view of a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPayload {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub nickname: String,
    /// Team, if any.
    pub team: Option<TeamId>,
    /// Score.
    pub score: i64,
    /// Kills.
    pub kills: u32,
}

/// Client view of a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPayload {
    /// Team id.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Score.
    pub score: i64,
}

/// One player's fog-of-war mask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityPayload {
    /// Whose mask.
    pub player: PlayerId,
    /// One `'0'`/`'1'` string per row.
    pub rows: Vec<String>,
}

/// Full match snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatePayload {
    /// Tick the snapshot was taken at.
    pub tick: u64,
    /// Players.
    pub players: Vec<PlayerPayload>,
    /// Teams.
    pub teams: Vec<TeamPayload>,
    /// Arena.
    pub grid: GridPayload,
    /// Per-player visibility.
    pub visibility: Vec<VisibilityPayload>,
}

impl GameStatePayload {
    /// Everything, unredacted.
    #[must_use]
    pub fn snapshot(sim: &Simulation) -> Self {
        let roster = sim.roster();
        Self {
            tick: sim.get_tick(),
            players: players(roster),
            teams: roster
                .teams()
                .map(|t| TeamPayload {
                    id: t.id,
                    name: t.name.clone(),
                    score: t.score,
                })
                .collect(),
            grid: GridPayload::from(sim.grid()),
            visibility: sim
                .grid()
                .tanks
                .iter()
                .map(|t| VisibilityPayload {
                    player: t.owner,
                    rows: t.visibility.to_rows(),
                })
                .collect(),
        }
    }

    /// The snapshot as `viewer` may see it.
    ///
    /// Enemy tanks outside the combined mask of the viewer and their
    /// teammates are removed, and only those masks are included.
    #[must_use]
    pub fn for_player(sim: &Simulation, viewer: PlayerId) -> Self {
        let roster = sim.roster();
        let grid = sim.grid();
        let allied = |owner: PlayerId| owner == viewer || roster.are_teammates(owner, viewer);

        let mut sight = CellMask::new(grid.dim());
        for tank in grid.tanks.iter().filter(|t| allied(t.owner)) {
            sight.union_with(&tank.visibility);
        }

        let mut state = Self::snapshot(sim);
        state
            .grid
            .tanks
            .retain(|t| allied(t.owner) || t.cell.is_some_and(|cell| sight.get(cell)));
        state.visibility.retain(|v| allied(v.player));
        state
    }
}

fn players(roster: &Roster) -> Vec<PlayerPayload> {
    roster
        .players()
        .map(|p| PlayerPayload {
            id: p.id,
            nickname: p.nickname.clone(),
            team: p.team,
            score: p.score,
            kills: p.kills,
        })
        .collect()
}
