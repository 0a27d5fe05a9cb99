//! Healing, whole and fractional.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Tank, MAX_HEALTH};
use crate::math::{fixed_map_serde, split_whole, Fixed};

/// Per-tank fractional heal buffers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealSystem {
    #[serde(with = "fixed_map_serde")]
    buffers: BTreeMap<EntityId, Fixed>,
}

impl HealSystem {
    /// No buffered healing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore whole health points, capped at [`MAX_HEALTH`].
    ///
    /// Dead tanks are not revived by healing. Returns the points applied.
    pub fn heal(tank: &mut Tank, points: u32) -> u32 {
        if tank.is_dead() {
            return 0;
        }
        let healed = points.min(MAX_HEALTH.saturating_sub(tank.health));
        tank.health += healed;
        healed
    }

    /// Buffer a fractional heal and apply the whole part.
    pub fn heal_fraction(&mut self, tank: &mut Tank, points: Fixed) -> u32 {
        if tank.is_dead() || points <= Fixed::ZERO {
            return 0;
        }
        let buffer = self.buffers.entry(tank.id).or_insert(Fixed::ZERO);
        let (whole, rest) = split_whole(*buffer + points);
        *buffer = rest;
        Self::heal(tank, u32::try_from(whole).unwrap_or(u32::MAX))
    }

    /// Drop a tank's buffer (on death or removal).
    pub fn clear(&mut self, tank: EntityId) {
        self.buffers.remove(&tank);
    }

    /// Buffered remainder for a tank.
    #[must_use]
    pub fn buffered(&self, tank: EntityId) -> Fixed {
        self.buffers.get(&tank).copied().unwrap_or(Fixed::ZERO)
    }
}
