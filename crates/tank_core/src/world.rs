//! Mutable match state shared by every system.
//!
//! Systems are free functions over `&mut World`. Each one destructures the
//! fields it needs, so the borrow checker sees disjoint borrows and no system
//! holds on to another system's bookkeeping.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::components::{Bullet, Cell, EntityId, PlayerId, SecondaryItemType};
use crate::config::MatchConfig;
use crate::grid::{CellMask, Grid};
use crate::roster::Roster;
use crate::score::{ScoreSystem, ScoringMode};
use crate::systems::heal::HealSystem;
use crate::systems::stun::StunSystem;
use crate::zone::{ZoneState, ZoneSystem};

/// Something that happened during a tick.
///
/// Events are informational; the game layer uses them for effects and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A tank took damage.
    TankHit {
        /// Damaged tank.
        tank: EntityId,
        /// Health removed.
        dealt: u32,
        /// Player responsible, if any.
        source: Option<PlayerId>,
    },
    /// A tank was destroyed.
    TankKilled {
        /// Destroyed tank.
        tank: EntityId,
        /// Player credited with the kill.
        killer: Option<PlayerId>,
    },
    /// A dead tank came back.
    TankRespawned {
        /// Respawned tank.
        tank: EntityId,
        /// Where it appeared.
        cell: Cell,
    },
    /// Two bullets destroyed each other.
    BulletsCollided {
        /// First bullet.
        first: EntityId,
        /// Second bullet.
        second: EntityId,
    },
    /// A mine went off.
    MineExploded {
        /// The mine.
        mine: EntityId,
        /// Tank that triggered it.
        tank: EntityId,
    },
    /// A zone changed state.
    ZoneChanged {
        /// Zone label.
        zone: char,
        /// The new state.
        state: ZoneState,
    },
    /// A tank picked up an item.
    ItemPickedUp {
        /// The tank.
        tank: EntityId,
        /// Item kind.
        kind: SecondaryItemType,
    },
    /// An item appeared on the map.
    ItemSpawned {
        /// Where.
        cell: Cell,
        /// Item kind.
        kind: SecondaryItemType,
    },
}

/// Everything the tick loop mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// Match tunables.
    pub config: MatchConfig,
    /// Spatial state.
    pub grid: Grid,
    /// Players and teams.
    pub roster: Roster,
    /// Stun effects.
    pub stun: StunSystem,
    /// Score buffers.
    pub score: ScoreSystem,
    /// Heal buffers.
    pub heal: HealSystem,
    /// Zone capture progress.
    pub zones: ZoneSystem,
    /// Bullets fired since the last bullet update.
    pub pending_bullets: Vec<Bullet>,
    /// Seeded source for spawn points and item rolls.
    pub rng: ChaCha8Rng,
    #[serde(skip)]
    empty_mask: Arc<CellMask>,
    /// Events emitted since the last drain.
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl World {
    /// A fresh world for `config`, without walls, zones or players.
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        Self {
            grid: Grid::new(config.dim),
            roster: Roster::new(),
            stun: StunSystem::new(),
            score: ScoreSystem::new(config.scoring),
            heal: HealSystem::new(),
            zones: ZoneSystem::new(config.ticks_to_capture),
            pending_bullets: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            empty_mask: Arc::new(CellMask::new(config.dim)),
            events: Vec::new(),
            config,
        }
    }

    /// The cached empty mask, rebuilt if the arena size changed.
    pub fn empty_mask(&mut self) -> Arc<CellMask> {
        if self.empty_mask.dim() != self.grid.dim() {
            self.empty_mask = Arc::new(CellMask::new(self.grid.dim()));
        }
        Arc::clone(&self.empty_mask)
    }

    /// Record an event.
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Whether `attacker` earns score for damaging a tank of `victim`.
    ///
    /// Team matches pay nothing for damage between teammates.
    #[must_use]
    pub fn scores_damage(&self, attacker: PlayerId, victim: PlayerId) -> bool {
        self.roster.player(attacker).is_some()
            && !(self.config.scoring == ScoringMode::Team
                && self.roster.are_teammates(attacker, victim))
    }
}
