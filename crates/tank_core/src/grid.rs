//! Spatial state of the arena.
//!
//! The [`Grid`] is the single owner of walls and every spatial entity for
//! the duration of a tick. Systems borrow it; none of them keeps copies of
//! entity state.

use serde::{Deserialize, Serialize};

use crate::components::{
    Bullet, Cell, EntityId, Laser, Mine, PlayerId, SecondaryItem, Tank, Zone,
};

/// A boolean mask with one entry per cell, stored row-major.
///
/// Used for the wall layout and for per-tank visibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellMask {
    dim: i32,
    cells: Vec<bool>,
}

impl CellMask {
    /// An all-false mask for a `dim` x `dim` grid.
    #[must_use]
    pub fn new(dim: i32) -> Self {
        let side = usize::try_from(dim).unwrap_or(0);
        Self {
            dim: dim.max(0),
            cells: vec![false; side * side],
        }
    }

    /// An all-true mask for a `dim` x `dim` grid.
    #[must_use]
    pub fn filled(dim: i32) -> Self {
        let mut mask = Self::new(dim);
        mask.cells.fill(true);
        mask
    }

    /// Side length.
    #[must_use]
    pub const fn dim(&self) -> i32 {
        self.dim
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.dim || cell.y >= self.dim {
            return None;
        }
        usize::try_from(cell.y * self.dim + cell.x).ok()
    }

    /// Value at `cell`; false outside the mask.
    #[must_use]
    pub fn get(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| self.cells[i])
    }

    /// Set the value at `cell`. Out-of-range cells are ignored.
    pub fn set(&mut self, cell: Cell, value: bool) {
        if let Some(i) = self.index(cell) {
            self.cells[i] = value;
        }
    }

    /// Number of set cells.
    #[must_use]
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&set| set).count()
    }

    /// Element-wise OR with another mask of the same size.
    pub fn union_with(&mut self, other: &Self) {
        for (mine, theirs) in self.cells.iter_mut().zip(&other.cells) {
            *mine |= *theirs;
        }
    }

    /// Rows encoded as `'0'`/`'1'` strings, top row first.
    #[must_use]
    pub fn to_rows(&self) -> Vec<String> {
        let side = usize::try_from(self.dim).unwrap_or(0);
        if side == 0 {
            return Vec::new();
        }
        self.cells
            .chunks(side)
            .map(|row| row.iter().map(|&set| if set { '1' } else { '0' }).collect())
            .collect()
    }
}

/// What occupies a single cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellObjects<'a> {
    /// The cell holds a wall.
    pub wall: bool,
    /// Live tanks on the cell.
    pub tanks: Vec<&'a Tank>,
    /// Bullets on the cell.
    pub bullets: Vec<&'a Bullet>,
    /// Laser beams on the cell.
    pub lasers: Vec<&'a Laser>,
    /// Mines on the cell.
    pub mines: Vec<&'a Mine>,
    /// Items on the cell.
    pub items: Vec<&'a SecondaryItem>,
}

impl CellObjects<'_> {
    /// Whether nothing at all is on the cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.wall
            && self.tanks.is_empty()
            && self.bullets.is_empty()
            && self.lasers.is_empty()
            && self.mines.is_empty()
            && self.items.is_empty()
    }
}

/// The square arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    dim: i32,
    walls: CellMask,
    /// Tanks, in spawn order.
    pub tanks: Vec<Tank>,
    /// Bullets in flight, in firing order.
    pub bullets: Vec<Bullet>,
    /// Active laser beam cells.
    pub lasers: Vec<Laser>,
    /// Mines on the map.
    pub mines: Vec<Mine>,
    /// Capturable zones.
    pub zones: Vec<Zone>,
    /// Items waiting to be picked up.
    pub items: Vec<SecondaryItem>,
    next_entity_id: EntityId,
}

impl Grid {
    /// An empty `dim` x `dim` arena without walls.
    #[must_use]
    pub fn new(dim: i32) -> Self {
        Self {
            dim: dim.max(0),
            walls: CellMask::new(dim),
            tanks: Vec::new(),
            bullets: Vec::new(),
            lasers: Vec::new(),
            mines: Vec::new(),
            zones: Vec::new(),
            items: Vec::new(),
            next_entity_id: 1,
        }
    }

    /// Side length.
    #[must_use]
    pub const fn dim(&self) -> i32 {
        self.dim
    }

    /// Allocate the next stable entity id.
    pub fn next_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    /// Whether `cell` lies inside the arena.
    #[must_use]
    pub const fn is_within_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.dim && cell.y < self.dim
    }

    /// Whether `cell` holds a wall.
    #[must_use]
    pub fn is_wall(&self, cell: Cell) -> bool {
        self.walls.get(cell)
    }

    /// Place or clear a wall.
    pub fn set_wall(&mut self, cell: Cell, wall: bool) {
        self.walls.set(cell, wall);
    }

    /// The wall layout.
    #[must_use]
    pub const fn walls(&self) -> &CellMask {
        &self.walls
    }

    /// Every in-bounds cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let dim = self.dim;
        (0..dim).flat_map(move |y| (0..dim).map(move |x| Cell::new(x, y)))
    }

    /// Everything on `cell`. Dead tanks are not listed.
    #[must_use]
    pub fn objects_at(&self, cell: Cell) -> CellObjects<'_> {
        CellObjects {
            wall: self.is_wall(cell),
            tanks: self
                .tanks
                .iter()
                .filter(|t| t.live_cell() == Some(cell))
                .collect(),
            bullets: self.bullets.iter().filter(|b| b.cell == cell).collect(),
            lasers: self.lasers.iter().filter(|l| l.cell == cell).collect(),
            mines: self.mines.iter().filter(|m| m.cell == cell).collect(),
            items: self.items.iter().filter(|i| i.cell == cell).collect(),
        }
    }

    /// The live tank standing on `cell`.
    #[must_use]
    pub fn live_tank_at(&self, cell: Cell) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.live_cell() == Some(cell))
    }

    /// The first zone containing `cell`.
    #[must_use]
    pub fn zone_at(&self, cell: Cell) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.contains(cell))
    }

    /// Whether `cell` lies inside any zone.
    #[must_use]
    pub fn is_in_zone(&self, cell: Cell) -> bool {
        self.zone_at(cell).is_some()
    }

    /// Tank by entity id.
    #[must_use]
    pub fn tank(&self, id: EntityId) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.id == id)
    }

    /// Mutable tank by entity id.
    pub fn tank_mut(&mut self, id: EntityId) -> Option<&mut Tank> {
        self.tanks.iter_mut().find(|t| t.id == id)
    }

    /// Tank owned by `player`.
    #[must_use]
    pub fn tank_of(&self, player: PlayerId) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.owner == player)
    }

    /// Whether any tank's visibility mask covers `cell`.
    #[must_use]
    pub fn is_visible_by_any_tank(&self, cell: Cell) -> bool {
        self.tanks.iter().any(|t| t.visibility.get(cell))
    }
}
