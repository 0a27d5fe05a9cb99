//! Stun bookkeeping.
//!
//! Each tank carries zero or more effects, keyed by the flag set they
//! block. The tick loop runs [`StunSystem::update`] first, so every gated
//! system in the same tick sees the decremented state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, StunFlags};

/// Active stun effects per tank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StunSystem {
    effects: BTreeMap<EntityId, BTreeMap<StunFlags, u32>>,
}

impl StunSystem {
    /// No active effects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply or extend an effect.
    ///
    /// An effect with the same flags and at least `ticks` remaining is left
    /// alone. Zero-length and empty effects are ignored.
    pub fn apply_stun(&mut self, tank: EntityId, flags: StunFlags, ticks: u32) {
        if ticks == 0 || flags.is_empty() {
            return;
        }
        let remaining = self.effects.entry(tank).or_default().entry(flags).or_insert(0);
        if *remaining < ticks {
            *remaining = ticks;
        }
    }

    /// Advance every effect by one tick and drop the expired ones.
    pub fn update(&mut self) {
        self.effects.retain(|_, effects| {
            effects.retain(|_, remaining| {
                *remaining = remaining.saturating_sub(1);
                *remaining > 0
            });
            !effects.is_empty()
        });
    }

    /// Whether any active effect on `tank` blocks one of `flags`.
    #[must_use]
    pub fn is_blocked(&self, tank: EntityId, flags: StunFlags) -> bool {
        self.effects
            .get(&tank)
            .is_some_and(|effects| effects.keys().any(|active| active.intersects(flags)))
    }

    /// Ticks left on the effect with exactly `flags`.
    #[must_use]
    pub fn remaining(&self, tank: EntityId, flags: StunFlags) -> Option<u32> {
        self.effects.get(&tank)?.get(&flags).copied()
    }

    /// Forget a tank that left the match.
    pub fn clear(&mut self, tank: EntityId) {
        self.effects.remove(&tank);
    }

    /// Number of tanks with at least one active effect.
    #[must_use]
    pub fn stunned_count(&self) -> usize {
        self.effects.len()
    }
}
