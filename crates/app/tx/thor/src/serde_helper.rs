//! Serde helpers for loosely typed JSON input.

use alloy_primitives::U256;
use serde::{de, Deserialize, Deserializer};

/// A quantity given as a JSON number, a decimal string or a `0x` hex string.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(u64),
    // serde_json hands integers above u64::MAX over as f64
    Float(f64),
    Str(String),
}

impl NumberOrString {
    fn try_into_u256<E: de::Error>(self) -> Result<U256, E> {
        match self {
            Self::Int(n) => Ok(U256::from(n)),
            Self::Float(f) => {
                if !f.is_finite() || f < 0.0 || f.fract() != 0.0 {
                    return Err(E::custom(format!(
                        "invalid quantity {f}: expected a non-negative integer"
                    )));
                }
                U256::try_from(f).map_err(|_| E::custom(format!("quantity {f} is out of range")))
            }
            Self::Str(s) => s
                .trim()
                .parse::<U256>()
                .map_err(|e| E::custom(format!("invalid quantity {s:?}: {e}"))),
        }
    }
}

/// Deserializes a [`U256`] from a number, a decimal string or a hex string.
pub fn quantity<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?.try_into_u256()
}

/// Like [`quantity`], for fields that may be absent.
pub fn quantity_opt<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(val) => val.try_into_u256().map(Some),
        None => Ok(None),
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing key
/// (`None`, via `#[serde(default)]`).
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
