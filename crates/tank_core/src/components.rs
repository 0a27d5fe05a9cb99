//! Entity and value types for the arena.
//!
//! Components are plain data. Rules live in [`crate::systems`] and
//! [`crate::zone`]; the [`crate::grid::Grid`] owns every spatial entity.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::CellMask;
use crate::zone::ZoneState;

/// Unique identifier for spatial entities (tanks, bullets, lasers, mines).
pub type EntityId = u64;

/// Maximum tank health.
pub const MAX_HEALTH: u32 = 100;

// ============================================================================
// Identifiers
// ============================================================================

/// Stable identifier of a connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Stable identifier of a team (team-scored matches only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team#{}", self.0)
    }
}

/// A grid cell coordinate. May lie outside the grid while a move or shot
/// is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    /// Column, growing to the right.
    pub x: i32,
    /// Row, growing downwards.
    pub y: i32,
}

impl Cell {
    /// Create a new cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell `steps` cells along `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction, steps: i32) -> Self {
        let (nx, ny) = direction.normal();
        Self {
            x: self.x + nx * steps,
            y: self.y + ny * steps,
        }
    }

    /// The four orthogonal neighbours in [`Direction::ALL`] order.
    #[must_use]
    pub fn neighbours(self) -> [Self; 4] {
        Direction::ALL.map(|direction| self.step(direction, 1))
    }
}

// ============================================================================
// Orientation Types
// ============================================================================

/// Facing of a tank, turret or bullet.
///
/// Ordered clockwise; left and right rotations move to the predecessor and
/// successor in this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Direction {
    /// Towards row 0.
    #[default]
    Up = 0,
    /// Towards the last column.
    Right = 1,
    /// Towards the last row.
    Down = 2,
    /// Towards column 0.
    Left = 3,
}

impl Direction {
    /// All directions in clockwise order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Unit vector of this direction in grid coordinates.
    #[must_use]
    pub const fn normal(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }

    /// Clockwise neighbour.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }

    /// Counter-clockwise neighbour.
    #[must_use]
    pub const fn previous(self) -> Self {
        match self {
            Self::Up => Self::Left,
            Self::Right => Self::Up,
            Self::Down => Self::Right,
            Self::Left => Self::Down,
        }
    }

    /// The reverse direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        self.next().next()
    }

    /// Apply one discrete rotation step.
    #[must_use]
    pub const fn rotated(self, rotation: Rotation) -> Self {
        match rotation {
            Rotation::Left => self.previous(),
            Rotation::Right => self.next(),
        }
    }

    /// Whether the direction runs along rows or columns.
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        match self {
            Self::Up | Self::Down => Orientation::Vertical,
            Self::Left | Self::Right => Orientation::Horizontal,
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(GameError::InvalidEnumValue {
                kind: "Direction",
                value: i64::from(value),
            })
    }
}

/// Rotation intent for a tank or turret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    /// Counter-clockwise.
    Left = 0,
    /// Clockwise.
    Right = 1,
}

impl TryFrom<u8> for Rotation {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Left),
            1 => Ok(Self::Right),
            _ => Err(GameError::InvalidEnumValue {
                kind: "Rotation",
                value: i64::from(value),
            }),
        }
    }
}

/// Movement intent relative to the tank's facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementDirection {
    /// Along the facing.
    Forward = 0,
    /// Against the facing.
    Backward = 1,
}

impl MovementDirection {
    /// Signed number of cells moved along the facing.
    #[must_use]
    pub const fn step(self) -> i32 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

impl TryFrom<u8> for MovementDirection {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Forward),
            1 => Ok(Self::Backward),
            _ => Err(GameError::InvalidEnumValue {
                kind: "MovementDirection",
                value: i64::from(value),
            }),
        }
    }
}

/// Axis of a laser beam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Beam runs along a row.
    Horizontal,
    /// Beam runs along a column.
    Vertical,
}

// ============================================================================
// Stun Flags
// ============================================================================

/// Set of actions a stun effect blocks.
///
/// Hand-rolled bitflags over `u8`. Effects are keyed by their flag set, so
/// the type is `Ord`.
///
/// ```
/// use tank_core::components::StunFlags;
///
/// let stun = StunFlags::MOVEMENT | StunFlags::TANK_ROTATION;
/// assert!(stun.intersects(StunFlags::ROTATION));
/// assert!(!stun.intersects(StunFlags::ABILITY_USE));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct StunFlags(u8);

impl StunFlags {
    /// Tank cannot move.
    pub const MOVEMENT: Self = Self(1 << 0);
    /// Tank body cannot rotate.
    pub const TANK_ROTATION: Self = Self(1 << 1);
    /// Turret cannot rotate.
    pub const TURRET_ROTATION: Self = Self(1 << 2);
    /// Tank cannot fire or use abilities.
    pub const ABILITY_USE: Self = Self(1 << 3);

    /// Both rotations.
    pub const ROTATION: Self = Self(Self::TANK_ROTATION.0 | Self::TURRET_ROTATION.0);
    /// Every action.
    pub const ALL: Self = Self(
        Self::MOVEMENT.0 | Self::TANK_ROTATION.0 | Self::TURRET_ROTATION.0 | Self::ABILITY_USE.0,
    );

    /// No flags set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Whether no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every flag of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether at least one flag of `other` is set.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Combine two flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Create from raw bits, dropping unknown ones.
    #[must_use]
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }
}

impl std::ops::BitOr for StunFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for StunFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

// ============================================================================
// Abilities and Items
// ============================================================================

/// Ability a player can activate in a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityType {
    /// Fire a basic bullet from the turret.
    FireBullet = 0,
    /// Fire a laser beam along the turret.
    UseLaser = 1,
    /// Fire a double-damage bullet.
    FireDoubleBullet = 2,
    /// Reveal the whole map for one tick.
    UseRadar = 3,
    /// Drop a mine behind the tank.
    DropMine = 4,
    /// Fire a bullet that heals the tank it hits (team matches).
    FireHealingBullet = 5,
    /// Fire a bullet that stuns the tank it hits (team matches).
    FireStunBullet = 6,
}

impl TryFrom<u8> for AbilityType {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::FireBullet,
            1 => Self::UseLaser,
            2 => Self::FireDoubleBullet,
            3 => Self::UseRadar,
            4 => Self::DropMine,
            5 => Self::FireHealingBullet,
            6 => Self::FireStunBullet,
            _ => {
                return Err(GameError::InvalidEnumValue {
                    kind: "AbilityType",
                    value: i64::from(value),
                })
            }
        })
    }
}

/// Item lying on the map or held by a tank (individual matches).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SecondaryItemType {
    /// Unlocks one laser shot.
    Laser = 0,
    /// Unlocks one double bullet.
    DoubleBullet = 1,
    /// Unlocks one radar sweep.
    Radar = 2,
    /// Unlocks one mine.
    Mine = 3,
}

impl SecondaryItemType {
    /// The ability this item unlocks.
    #[must_use]
    pub const fn ability(self) -> AbilityType {
        match self {
            Self::Laser => AbilityType::UseLaser,
            Self::DoubleBullet => AbilityType::FireDoubleBullet,
            Self::Radar => AbilityType::UseRadar,
            Self::Mine => AbilityType::DropMine,
        }
    }
}

impl TryFrom<u8> for SecondaryItemType {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::Laser,
            1 => Self::DoubleBullet,
            2 => Self::Radar,
            3 => Self::Mine,
            _ => {
                return Err(GameError::InvalidEnumValue {
                    kind: "SecondaryItemType",
                    value: i64::from(value),
                })
            }
        })
    }
}

/// Turret magazine. Rounds come back one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BulletAmmo {
    /// Rounds ready to fire.
    pub count: u8,
    /// Ticks until the next round is back, when not full.
    pub regen_remaining: Option<u32>,
}

impl BulletAmmo {
    /// Magazine size.
    pub const MAX: u8 = 3;
    /// Ticks to regenerate one round.
    pub const REGEN_TICKS: u32 = 10;

    /// A full magazine.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            count: Self::MAX,
            regen_remaining: None,
        }
    }

    /// Spend one round. Returns false when empty.
    pub fn consume(&mut self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.count -= 1;
        if self.regen_remaining.is_none() {
            self.regen_remaining = Some(Self::REGEN_TICKS);
        }
        true
    }

    /// Advance regeneration by one tick.
    pub fn tick(&mut self) {
        let Some(remaining) = self.regen_remaining else {
            return;
        };
        if remaining > 1 {
            self.regen_remaining = Some(remaining - 1);
            return;
        }
        self.count = (self.count + 1).min(Self::MAX);
        self.regen_remaining = (self.count < Self::MAX).then_some(Self::REGEN_TICKS);
    }
}

impl Default for BulletAmmo {
    fn default() -> Self {
        Self::full()
    }
}

/// A per-ability cooldown counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cooldown {
    /// Ticks until the ability is ready again.
    pub remaining: u32,
}

impl Cooldown {
    /// Whether the ability can be used now.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        self.remaining == 0
    }

    /// Start the cooldown.
    pub fn trigger(&mut self, ticks: u32) {
        self.remaining = ticks;
    }

    /// Advance by one tick.
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

/// Ability bookkeeping carried by every tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TankAbilities {
    /// Turret magazine.
    pub ammo: BulletAmmo,
    /// Laser cooldown (team matches).
    pub laser: Cooldown,
    /// Mine cooldown (team matches).
    pub mine: Cooldown,
    /// Radar cooldown (team matches).
    pub radar: Cooldown,
    /// Stun bullet cooldown (team matches).
    pub stun_bullet: Cooldown,
    /// Healing bullet cooldown (team matches).
    pub healing_bullet: Cooldown,
    /// Radar revealed the map this tick.
    pub radar_active: bool,
}

impl TankAbilities {
    /// Advance every cooldown and the magazine by one tick.
    pub fn tick(&mut self) {
        self.ammo.tick();
        for cooldown in [
            &mut self.laser,
            &mut self.mine,
            &mut self.radar,
            &mut self.stun_bullet,
            &mut self.healing_bullet,
        ] {
            cooldown.tick();
        }
    }

    /// Clear every cooldown and refill the magazine.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Spatial Entities
// ============================================================================

/// A player's tank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tank {
    /// Entity id.
    pub id: EntityId,
    /// Owning player.
    pub owner: PlayerId,
    /// Current cell, `None` while dead.
    pub cell: Option<Cell>,
    /// Cell before the last successful move.
    pub previous_cell: Option<Cell>,
    /// Body facing.
    pub direction: Direction,
    /// Turret facing.
    pub turret_direction: Direction,
    /// Remaining health, zero while dead.
    pub health: u32,
    /// Ticks until respawn while dead.
    pub respawn_remaining: Option<u32>,
    /// Item picked up from the map.
    pub held_item: Option<SecondaryItemType>,
    /// Cooldowns and ammo.
    pub abilities: TankAbilities,
    /// Fog-of-war mask, recomputed every tick.
    pub visibility: Arc<CellMask>,
}

impl Tank {
    /// A fresh, live tank at `cell`.
    #[must_use]
    pub fn new(id: EntityId, owner: PlayerId, cell: Cell, direction: Direction) -> Self {
        Self {
            id,
            owner,
            cell: Some(cell),
            previous_cell: None,
            direction,
            turret_direction: direction,
            health: MAX_HEALTH,
            respawn_remaining: None,
            held_item: None,
            abilities: TankAbilities::default(),
            visibility: Arc::default(),
        }
    }

    /// Whether the tank is in its dead sub-state.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Cell of a live tank.
    #[must_use]
    pub fn live_cell(&self) -> Option<Cell> {
        if self.is_dead() {
            None
        } else {
            self.cell
        }
    }
}

/// Bullet flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulletKind {
    /// Plain damage.
    Basic,
    /// Double damage, downgraded to basic when it trades with a basic bullet.
    Double,
    /// Stuns the tank it hits.
    Stun,
    /// Heals the tank it hits.
    Healing,
}

/// A bullet in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bullet {
    /// Entity id.
    pub id: EntityId,
    /// Current cell.
    pub cell: Cell,
    /// Travel direction.
    pub direction: Direction,
    /// Cells travelled per tick.
    pub speed: u32,
    /// Damage dealt on hit.
    pub damage: u32,
    /// Flavour.
    pub kind: BulletKind,
    /// Player who fired it.
    pub shooter: PlayerId,
}

/// One cell of an active laser beam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Laser {
    /// Entity id.
    pub id: EntityId,
    /// Covered cell.
    pub cell: Cell,
    /// Beam axis.
    pub orientation: Orientation,
    /// Damage dealt each tick to a tank on the cell.
    pub damage: u32,
    /// Ticks until the beam fades.
    pub remaining_ticks: u32,
    /// Player who fired it.
    pub shooter: PlayerId,
}

/// A mine on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mine {
    /// Entity id.
    pub id: EntityId,
    /// Cell it lies on.
    pub cell: Cell,
    /// Damage dealt when triggered.
    pub damage: u32,
    /// Player who dropped it.
    pub layer: PlayerId,
    /// Blast ticks left once triggered.
    pub explosion_remaining: Option<u32>,
}

impl Mine {
    /// Whether the mine already went off.
    #[must_use]
    pub const fn is_exploded(&self) -> bool {
        self.explosion_remaining.is_some()
    }
}

/// An item waiting on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryItem {
    /// Cell it lies on.
    pub cell: Cell,
    /// Item kind.
    pub kind: SecondaryItemType,
}

/// A capturable rectangular region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone label shown to players.
    pub index: char,
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Width in cells.
    pub width: i32,
    /// Height in cells.
    pub height: i32,
    /// Capture state.
    pub state: ZoneState,
}

impl Zone {
    /// A neutral zone.
    #[must_use]
    pub const fn new(index: char, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            index,
            x,
            y,
            width,
            height,
            state: ZoneState::Neutral,
        }
    }

    /// Whether `cell` lies inside the zone.
    #[must_use]
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.x
            && cell.x < self.x + self.width
            && cell.y >= self.y
            && cell.y < self.y + self.height
    }
}

// ============================================================================
// Participants
// ============================================================================

/// A connected player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub nickname: String,
    /// Team, in team-scored matches.
    pub team: Option<TeamId>,
    /// Authoritative score (individual matches).
    pub score: i64,
    /// Kill counter.
    pub kills: u32,
}

/// A team of players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team id.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Authoritative score (team matches).
    pub score: i64,
}

// ============================================================================
// Intents
// ============================================================================

/// A validated player action for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Intent {
    /// Do nothing.
    #[default]
    Pass,
    /// Move one cell.
    Move(MovementDirection),
    /// Rotate the body, the turret, or both.
    Rotate {
        /// Body rotation.
        tank: Option<Rotation>,
        /// Turret rotation.
        turret: Option<Rotation>,
    },
    /// Activate an ability.
    UseAbility(AbilityType),
}
