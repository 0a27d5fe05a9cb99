//! Fixed-point math utilities for deterministic simulation.
//!
//! Scores and heals accumulate sub-integer amounts between ticks. Those
//! buffers use fixed-point arithmetic so every replay and every platform
//! flushes exactly the same whole points.

use std::collections::BTreeMap;

use fixed::types::I32F32;

/// Fixed-point number type for all fractional simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Splits a non-negative amount into its whole part and the remainder.
///
/// ```
/// use tank_core::math::{split_whole, Fixed};
///
/// let (whole, rest) = split_whole(Fixed::from_num(2.25));
/// assert_eq!(whole, 2);
/// assert_eq!(rest, Fixed::from_num(0.25));
/// ```
#[must_use]
pub fn split_whole(value: Fixed) -> (i64, Fixed) {
    let whole = value.floor();
    (whole.to_num::<i64>(), value - whole)
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for human-edited fixed-point values.
///
/// Config files write `0.5`, not raw bits. The conversion happens once at
/// load time so the simulation itself never touches floats.
pub mod decimal_serde {
    use super::Fixed;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    /// Serialize as a decimal number.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    /// Deserialize from a decimal number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| D::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

/// Serde support for maps with fixed-point values.
pub mod fixed_map_serde {
    use super::{BTreeMap, Fixed};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize every value as its raw bit representation.
    pub fn serialize<K, S>(map: &BTreeMap<K, Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize + Ord,
        S: Serializer,
    {
        let bits: BTreeMap<&K, i64> = map.iter().map(|(k, v)| (k, v.to_bits())).collect();
        bits.serialize(serializer)
    }

    /// Deserialize a map of raw bit representations.
    pub fn deserialize<'de, K, D>(deserializer: D) -> Result<BTreeMap<K, Fixed>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        D: Deserializer<'de>,
    {
        let bits = BTreeMap::<K, i64>::deserialize(deserializer)?;
        Ok(bits
            .into_iter()
            .map(|(k, v)| (k, Fixed::from_bits(v)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_whole_keeps_remainder() {
        let total = Fixed::from_num(0.6) + Fixed::from_num(0.5);
        let (whole, rest) = split_whole(total);
        assert_eq!(whole, 1);
        let diff = (rest - Fixed::from_num(0.1)).abs();
        assert!(diff < Fixed::from_num(0.000_001), "remainder drifted: {rest}");
    }

    #[test]
    fn test_split_whole_below_one() {
        let (whole, rest) = split_whole(Fixed::from_num(0.25));
        assert_eq!(whole, 0);
        assert_eq!(rest, Fixed::from_num(0.25));
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }

    #[test]
    fn test_fixed_map_roundtrip() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Buffers {
            #[serde(with = "fixed_map_serde")]
            values: BTreeMap<u32, Fixed>,
        }

        let mut values = BTreeMap::new();
        values.insert(3, Fixed::from_num(0.75));
        let bytes = bincode::serialize(&Buffers { values }).expect("serialize");
        let restored: Buffers = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored.values[&3], Fixed::from_num(0.75));
    }
}
