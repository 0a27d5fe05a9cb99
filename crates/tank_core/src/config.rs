//! Match configuration.
//!
//! Chosen once at match setup. The scoring mode picks the score target and
//! the ability rules; nothing else in the simulation branches on build-time
//! switches.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{decimal_serde, Fixed};
use crate::score::ScoringMode;

/// Tunables for one match.
///
/// Every field has a default, so a RON file only needs the values it
/// changes:
///
/// ```
/// use tank_core::config::MatchConfig;
/// use tank_core::score::ScoringMode;
///
/// let config = MatchConfig::from_ron_str("(dim: 12, scoring: Team)").unwrap();
/// assert_eq!(config.dim, 12);
/// assert_eq!(config.scoring, ScoringMode::Team);
/// assert_eq!(config.ticks_to_capture, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Side length of the square arena.
    pub dim: i32,
    /// Seed for spawn points and item drops.
    pub seed: u64,
    /// Who receives score, and which ability rules apply.
    pub scoring: ScoringMode,
    /// Whether items spawn on the map and can be picked up.
    pub items_enabled: bool,
    /// Consecutive solo-occupancy ticks needed to capture a zone.
    pub ticks_to_capture: u32,
    /// Fractional score paid to a zone owner every tick.
    #[serde(with = "decimal_serde")]
    pub captured_zone_award: Fixed,
    /// Fractional health restored to a zone owner's tank every tick.
    #[serde(with = "decimal_serde")]
    pub captured_zone_heal: Fixed,
    /// Owner tanks at or above this health are not healed by zones.
    pub captured_zone_heal_threshold: u32,
    /// Ticks a destroyed tank waits before respawning.
    pub respawn_ticks: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            dim: 24,
            seed: 0,
            scoring: ScoringMode::Individual,
            items_enabled: true,
            ticks_to_capture: 50,
            captured_zone_award: Fixed::from_num(0.5),
            captured_zone_heal: Fixed::from_num(0.25),
            captured_zone_heal_threshold: 80,
            respawn_ticks: 50,
        }
    }
}

impl MatchConfig {
    /// Parse and validate a RON config.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] for malformed RON and
    /// [`GameError::InvalidState`] for out-of-range values.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| GameError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.dim < 1 {
            return Err(GameError::InvalidState(format!(
                "dim must be positive, got {}",
                self.dim
            )));
        }
        if self.ticks_to_capture == 0 {
            return Err(GameError::InvalidState(
                "ticks_to_capture must be positive".to_string(),
            ));
        }
        if self.captured_zone_award < Fixed::ZERO || self.captured_zone_heal < Fixed::ZERO {
            return Err(GameError::InvalidState(
                "zone awards must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(MatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config =
            MatchConfig::from_ron_str("(captured_zone_award: 0.25, items_enabled: false)")
                .expect("valid config");
        assert_eq!(config.captured_zone_award, Fixed::from_num(0.25));
        assert!(!config.items_enabled);
        assert_eq!(config.dim, 24);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            MatchConfig::from_ron_str("(dim: 0)"),
            Err(GameError::InvalidState(_))
        ));
        assert!(matches!(
            MatchConfig::from_ron_str("(dim: \"big\")"),
            Err(GameError::DataParseError { .. })
        ));
    }
}
