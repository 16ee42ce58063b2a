//! Kind-driven RLP codec.
//!
//! Values are described by a [`Kind`] tree. One generic engine walks the
//! value and its kind together: leaf kinds turn a [`Value`] into the payload
//! of an RLP byte string (and back), composite kinds map onto RLP lists.
//!
//! Decoding is strict. Anything that is not the unique canonical encoding of
//! the expected shape is rejected with [`RlpError::MalformedEncoding`], tagged
//! with the dotted path of the field that failed.

pub mod kind;

use std::fmt;

use alloy_primitives::{Bytes, U256};
use alloy_rlp::{Header, EMPTY_STRING_CODE};

use crate::error::{RlpError, RlpResult};

pub use kind::{Field, Kind};

/// A dynamically shaped value understood by the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Unsigned integer for [`Kind::Numeric`].
    Number(U256),
    /// Byte payload for blob kinds.
    Bytes(Bytes),
    /// Absent value of a [`Kind::NullableFixedBlob`].
    Null,
    /// Items of a record or list.
    List(Vec<Value>),
}

impl Value {
    pub fn number(value: u64) -> Self {
        Self::Number(U256::from(value))
    }

    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self::Bytes(value.into())
    }

    pub(crate) fn as_number(&self, path: &Path<'_>) -> RlpResult<U256> {
        match self {
            Self::Number(n) => Ok(*n),
            _ => Err(path.mismatch("number")),
        }
    }

    pub(crate) fn as_bytes(&self, path: &Path<'_>) -> RlpResult<&Bytes> {
        match self {
            Self::Bytes(b) => Ok(b),
            _ => Err(path.mismatch("bytes")),
        }
    }

    pub(crate) fn into_list(self, path: &Path<'_>) -> RlpResult<Vec<Value>> {
        match self {
            Self::List(items) => Ok(items),
            _ => Err(path.mismatch("list")),
        }
    }
}

/// Location of a value inside the structure being encoded or decoded.
///
/// Paths borrow their parent so building one per field costs nothing; the
/// dotted string is only rendered when an error is produced.
#[derive(Debug, Clone, Copy)]
pub struct Path<'a> {
    parent: Option<&'a Path<'a>>,
    segment: Segment,
}

#[derive(Debug, Clone, Copy)]
enum Segment {
    Name(&'static str),
    Index(usize),
}

impl<'a> Path<'a> {
    pub fn root(name: &'static str) -> Self {
        Self {
            parent: None,
            segment: Segment::Name(name),
        }
    }

    pub fn field(&'a self, name: &'static str) -> Path<'a> {
        Path {
            parent: Some(self),
            segment: Segment::Name(name),
        }
    }

    pub fn index(&'a self, index: usize) -> Path<'a> {
        Path {
            parent: Some(self),
            segment: Segment::Index(index),
        }
    }

    pub(crate) fn malformed(&self, reason: impl Into<String>) -> RlpError {
        RlpError::MalformedEncoding {
            context: self.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(&self, expected: &'static str) -> RlpError {
        RlpError::KindMismatch {
            context: self.to_string(),
            expected,
        }
    }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = self.parent {
            write!(f, "{parent}.")?;
        }
        match self.segment {
            Segment::Name(name) => f.write_str(name),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Encode `value` as described by `kind`.
///
/// Only fails when `value` does not conform to `kind`.
pub fn encode(value: &Value, kind: &Kind, context: &'static str) -> RlpResult<Vec<u8>> {
    let mut out = Vec::new();
    encode_into(value, kind, &Path::root(context), &mut out)?;
    Ok(out)
}

/// Decode exactly one item of `kind` spanning all of `data`.
pub fn decode(data: &[u8], kind: &Kind, context: &'static str) -> RlpResult<Value> {
    let path = Path::root(context);
    let mut buf = data;
    let value = decode_item(&mut buf, kind, &path)?;
    if !buf.is_empty() {
        return Err(path.malformed(format!("{} trailing bytes", buf.len())));
    }
    Ok(value)
}

fn encode_into(value: &Value, kind: &Kind, path: &Path<'_>, out: &mut Vec<u8>) -> RlpResult<()> {
    match kind {
        Kind::Record(fields) => {
            let Value::List(items) = value else {
                return Err(path.mismatch("record"));
            };
            if items.len() != fields.len() {
                return Err(path.mismatch("record of matching arity"));
            }
            let mut payload = Vec::new();
            for (field, item) in fields.iter().zip(items) {
                encode_into(item, &field.kind, &path.field(field.name), &mut payload)?;
            }
            write_list(&payload, out);
        }
        Kind::ListOf(inner) => {
            let Value::List(items) = value else {
                return Err(path.mismatch("list"));
            };
            let mut payload = Vec::new();
            for (i, item) in items.iter().enumerate() {
                encode_into(item, inner, &path.index(i), &mut payload)?;
            }
            write_list(&payload, out);
        }
        leaf => write_bytes(&leaf.encode_blob(value, path)?, out),
    }
    Ok(())
}

fn decode_item(buf: &mut &[u8], kind: &Kind, path: &Path<'_>) -> RlpResult<Value> {
    let (is_list, payload) = take_item(buf, path)?;
    match kind {
        Kind::Record(fields) => {
            if !is_list {
                return Err(path.malformed("expected list, got byte string"));
            }
            let count = count_items(payload, path)?;
            if count != fields.len() {
                return Err(path.malformed(format!(
                    "expected {} items, got {count}",
                    fields.len()
                )));
            }
            let mut rest = payload;
            let mut values = Vec::with_capacity(fields.len());
            for field in *fields {
                values.push(decode_item(&mut rest, &field.kind, &path.field(field.name))?);
            }
            Ok(Value::List(values))
        }
        Kind::ListOf(inner) => {
            if !is_list {
                return Err(path.malformed("expected list, got byte string"));
            }
            let mut rest = payload;
            let mut values = Vec::new();
            while !rest.is_empty() {
                let item_path = path.index(values.len());
                values.push(decode_item(&mut rest, inner, &item_path)?);
            }
            Ok(Value::List(values))
        }
        leaf => {
            if is_list {
                return Err(path.malformed("expected byte string, got list"));
            }
            leaf.decode_blob(payload, path)
        }
    }
}

/// Split the next item off `buf`, returning whether it is a list and its payload.
fn take_item<'a>(buf: &mut &'a [u8], path: &Path<'_>) -> RlpResult<(bool, &'a [u8])> {
    let header = Header::decode(buf).map_err(|e| path.malformed(e.to_string()))?;
    let data: &'a [u8] = *buf;
    let payload = data
        .get(..header.payload_length)
        .ok_or_else(|| path.malformed("input too short"))?;
    *buf = data.get(header.payload_length..).unwrap_or_default();
    Ok((header.list, payload))
}

fn count_items(mut payload: &[u8], path: &Path<'_>) -> RlpResult<usize> {
    let mut count = 0;
    while !payload.is_empty() {
        take_item(&mut payload, &path.index(count))?;
        count += 1;
    }
    Ok(count)
}

fn write_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    if let [single] = bytes {
        if *single < EMPTY_STRING_CODE {
            out.push(*single);
            return;
        }
    }
    Header {
        list: false,
        payload_length: bytes.len(),
    }
    .encode(out);
    out.extend_from_slice(bytes);
}

fn write_list(payload: &[u8], out: &mut Vec<u8>) {
    Header {
        list: true,
        payload_length: payload.len(),
    }
    .encode(out);
    out.extend_from_slice(payload);
}
