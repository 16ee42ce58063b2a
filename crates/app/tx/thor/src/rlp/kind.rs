//! Field kind profiles.
//!
//! A [`Kind`] says how one logical field maps to RLP. Leaf kinds describe
//! the payload of a single byte string; [`Kind::Record`] and
//! [`Kind::ListOf`] describe lists.
//!
//! | kind | encode | decode rejects |
//! |---|---|---|
//! | `Numeric` | big-endian, leading zeros trimmed, `0` is empty | longer than `max_bytes`, leading zero |
//! | `CompactFixedBlob` | leading zeros trimmed | longer than `width`, leading zero |
//! | `NullableFixedBlob` | exactly `width` bytes, null is empty | any other length |
//! | `Blob` | unchanged | nothing |

use alloy_primitives::{Bytes, U256};

use super::{Path, Value};
use crate::error::RlpResult;

/// Describes the wire shape of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Unsigned integer of at most `max_bytes` bytes.
    Numeric { max_bytes: usize },
    /// Fixed-width blob stored without its leading zero bytes.
    CompactFixedBlob { width: usize },
    /// Fixed-width blob, or empty for null.
    NullableFixedBlob { width: usize },
    /// Raw bytes, passed through.
    Blob,
    /// Ordered fixed-arity list of heterogeneous fields.
    Record(&'static [Field]),
    /// Variable-length list of items sharing one kind.
    ListOf(&'static Kind),
}

/// A named slot of a [`Kind::Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: Kind,
}

impl Field {
    pub const fn new(name: &'static str, kind: Kind) -> Self {
        Self { name, kind }
    }
}

impl Kind {
    /// Turn a leaf value into the payload of its RLP byte string.
    pub(crate) fn encode_blob(&self, value: &Value, path: &Path<'_>) -> RlpResult<Bytes> {
        match *self {
            Kind::Numeric { max_bytes } => {
                let n = value.as_number(path)?;
                if n.byte_len() > max_bytes {
                    return Err(path.mismatch("number within kind width"));
                }
                Ok(Bytes::copy_from_slice(trim_leading_zeros(
                    &n.to_be_bytes::<32>(),
                )))
            }
            Kind::CompactFixedBlob { width } => {
                let bytes = value.as_bytes(path)?;
                if bytes.len() != width {
                    return Err(path.mismatch("blob of kind width"));
                }
                Ok(Bytes::copy_from_slice(trim_leading_zeros(bytes)))
            }
            Kind::NullableFixedBlob { width } => match value {
                Value::Null => Ok(Bytes::new()),
                Value::Bytes(bytes) if bytes.len() == width => Ok(bytes.clone()),
                _ => Err(path.mismatch("null or blob of kind width")),
            },
            Kind::Blob => value.as_bytes(path).cloned(),
            Kind::Record(_) | Kind::ListOf(_) => Err(path.mismatch("byte string kind")),
        }
    }

    /// Turn the payload of an RLP byte string back into a leaf value.
    pub(crate) fn decode_blob(&self, payload: &[u8], path: &Path<'_>) -> RlpResult<Value> {
        match *self {
            Kind::Numeric { max_bytes } => {
                check_compact(payload, max_bytes, path)?;
                U256::try_from_be_slice(payload)
                    .map(Value::Number)
                    .ok_or_else(|| path.malformed("number exceeds 256 bits"))
            }
            Kind::CompactFixedBlob { width } => {
                check_compact(payload, width, path)?;
                let mut padded = vec![0u8; width - payload.len()];
                padded.extend_from_slice(payload);
                Ok(Value::bytes(padded))
            }
            Kind::NullableFixedBlob { width } => match payload.len() {
                0 => Ok(Value::Null),
                len if len == width => Ok(Value::bytes(payload.to_vec())),
                len => Err(path.malformed(format!("expected {width} bytes or empty, got {len}"))),
            },
            Kind::Blob => Ok(Value::bytes(payload.to_vec())),
            Kind::Record(_) | Kind::ListOf(_) => Err(path.malformed("expected list, got byte string")),
        }
    }
}

/// Strip leading zero bytes; an all-zero input becomes empty.
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes.get(start..).unwrap_or_default()
}

fn check_compact(payload: &[u8], max: usize, path: &Path<'_>) -> RlpResult<()> {
    if payload.len() > max {
        return Err(path.malformed(format!(
            "expected at most {max} bytes, got {}",
            payload.len()
        )));
    }
    if payload.first() == Some(&0) {
        return Err(path.malformed("leading zero byte"));
    }
    Ok(())
}
