//! Wire layout of a transaction body.
//!
//! The unsigned layout is
//! `[chainTag, blockRef, expiration, clauses, gasPriceCoef, gas, dependsOn, nonce, reserved]`
//! and the signed layout appends the signature blob. `reserved` is always
//! present on the wire, as an empty list when the body has none.

use alloy_primitives::{Address, Bytes, FixedBytes, U256};

use crate::body::{Clause, Reserved, TransactionBody};
use crate::error::RlpResult;
use crate::rlp::kind::trim_leading_zeros;
use crate::rlp::{self, Field, Kind, Path, Value};

const CONTEXT: &str = "tx";

const CLAUSE_FIELDS: &[Field] = &[
    Field::new("to", Kind::NullableFixedBlob { width: 20 }),
    Field::new("value", Kind::Numeric { max_bytes: 32 }),
    Field::new("data", Kind::Blob),
];

/// One clause: `[to, value, data]`.
pub const CLAUSE: Kind = Kind::Record(CLAUSE_FIELDS);
pub const CLAUSES: Kind = Kind::ListOf(&CLAUSE);
/// Reserved entries as raw blobs; the first one holds the features.
pub const RESERVED: Kind = Kind::ListOf(&Kind::Blob);
/// Kind of the features entry inside `reserved`.
pub const FEATURES: Kind = Kind::Numeric { max_bytes: 4 };

const CHAIN_TAG: Field = Field::new("chainTag", Kind::Numeric { max_bytes: 1 });
const BLOCK_REF: Field = Field::new("blockRef", Kind::CompactFixedBlob { width: 8 });
const EXPIRATION: Field = Field::new("expiration", Kind::Numeric { max_bytes: 4 });
const CLAUSES_FIELD: Field = Field::new("clauses", CLAUSES);
const GAS_PRICE_COEF: Field = Field::new("gasPriceCoef", Kind::Numeric { max_bytes: 1 });
const GAS: Field = Field::new("gas", Kind::Numeric { max_bytes: 8 });
const DEPENDS_ON: Field = Field::new("dependsOn", Kind::NullableFixedBlob { width: 32 });
const NONCE: Field = Field::new("nonce", Kind::Numeric { max_bytes: 8 });
const RESERVED_FIELD: Field = Field::new("reserved", RESERVED);
const SIGNATURE: Field = Field::new("signature", Kind::Blob);

/// Body without signature.
pub const UNSIGNED_TX: Kind = Kind::Record(&[
    CHAIN_TAG,
    BLOCK_REF,
    EXPIRATION,
    CLAUSES_FIELD,
    GAS_PRICE_COEF,
    GAS,
    DEPENDS_ON,
    NONCE,
    RESERVED_FIELD,
]);

/// Body followed by its signature.
pub const SIGNED_TX: Kind = Kind::Record(&[
    CHAIN_TAG,
    BLOCK_REF,
    EXPIRATION,
    CLAUSES_FIELD,
    GAS_PRICE_COEF,
    GAS,
    DEPENDS_ON,
    NONCE,
    RESERVED_FIELD,
    SIGNATURE,
]);

/// RLP of the unsigned layout. This is what gets hashed for signing.
pub fn encode_unsigned(body: &TransactionBody) -> RlpResult<Vec<u8>> {
    rlp::encode(&Value::List(body_values(body)), &UNSIGNED_TX, CONTEXT)
}

/// RLP of the signed layout.
pub fn encode_signed(body: &TransactionBody, signature: &[u8]) -> RlpResult<Vec<u8>> {
    let mut items = body_values(body);
    items.push(Value::bytes(signature.to_vec()));
    rlp::encode(&Value::List(items), &SIGNED_TX, CONTEXT)
}

pub fn decode_unsigned(data: &[u8]) -> RlpResult<TransactionBody> {
    let path = Path::root(CONTEXT);
    let items = rlp::decode(data, &UNSIGNED_TX, CONTEXT)?.into_list(&path)?;
    body_from_values(items, &path)
}

/// Decode the signed layout into the body and its signature bytes.
pub fn decode_signed(data: &[u8]) -> RlpResult<(TransactionBody, Bytes)> {
    let path = Path::root(CONTEXT);
    let mut items = rlp::decode(data, &SIGNED_TX, CONTEXT)?.into_list(&path)?;
    let signature_path = path.field(SIGNATURE.name);
    let signature = items
        .pop()
        .ok_or_else(|| signature_path.mismatch("signature"))?
        .as_bytes(&signature_path)?
        .clone();
    Ok((body_from_values(items, &path)?, signature))
}

/// Reserved entries as written on the wire.
///
/// The features word comes first, followed by the unused entries. Trailing
/// empty entries are dropped, so a default [`Reserved`] yields no entries.
pub fn encode_reserved(reserved: &Reserved) -> Vec<Bytes> {
    let mut entries = Vec::with_capacity(reserved.unused.len() + 1);
    entries.push(Bytes::copy_from_slice(trim_leading_zeros(
        &reserved.features.to_be_bytes(),
    )));
    entries.extend(reserved.unused.iter().cloned());
    while entries.last().is_some_and(|entry| entry.is_empty()) {
        entries.pop();
    }
    entries
}

/// Inverse of [`encode_reserved`]. No entries means no reserved field.
pub fn decode_reserved(value: Value, path: &Path<'_>) -> RlpResult<Option<Reserved>> {
    let mut entries = Vec::new();
    for (i, entry) in value.into_list(path)?.into_iter().enumerate() {
        entries.push(entry.as_bytes(&path.index(i))?.clone());
    }
    if entries.last().is_some_and(|entry| entry.is_empty()) {
        return Err(path.malformed("reserved fields not trimmed"));
    }
    let Some((features, unused)) = entries.split_first() else {
        return Ok(None);
    };

    let features_path = path.index(0);
    let features = number(FEATURES.decode_blob(features, &features_path)?, &features_path)?;
    Ok(Some(Reserved {
        features,
        unused: unused.to_vec(),
    }))
}

fn body_values(body: &TransactionBody) -> Vec<Value> {
    let reserved = body
        .reserved
        .as_ref()
        .map(encode_reserved)
        .unwrap_or_default();

    vec![
        Value::number(body.chain_tag.into()),
        Value::bytes(body.block_ref.to_vec()),
        Value::number(body.expiration.into()),
        Value::List(body.clauses.iter().map(clause_values).collect()),
        Value::number(body.gas_price_coef.into()),
        Value::number(body.gas),
        body.depends_on
            .map_or(Value::Null, |id| Value::bytes(id.to_vec())),
        Value::number(body.nonce),
        Value::List(reserved.into_iter().map(Value::Bytes).collect()),
    ]
}

fn clause_values(clause: &Clause) -> Value {
    Value::List(vec![
        clause
            .to
            .map_or(Value::Null, |to| Value::bytes(to.to_vec())),
        Value::Number(clause.value),
        Value::Bytes(clause.data.clone()),
    ])
}

fn body_from_values(items: Vec<Value>, path: &Path<'_>) -> RlpResult<TransactionBody> {
    let [chain_tag, block_ref, expiration, clauses, gas_price_coef, gas, depends_on, nonce, reserved]: [Value; 9] =
        items
            .try_into()
            .map_err(|_| path.mismatch("unsigned transaction record"))?;

    let clauses_path = path.field(CLAUSES_FIELD.name);
    let clauses = clauses
        .into_list(&clauses_path)?
        .into_iter()
        .enumerate()
        .map(|(i, clause)| clause_from_value(clause, &clauses_path.index(i)))
        .collect::<RlpResult<Vec<_>>>()?;

    Ok(TransactionBody {
        chain_tag: number(chain_tag, &path.field(CHAIN_TAG.name))?,
        block_ref: fixed(block_ref, &path.field(BLOCK_REF.name))?,
        expiration: number(expiration, &path.field(EXPIRATION.name))?,
        clauses,
        gas_price_coef: number(gas_price_coef, &path.field(GAS_PRICE_COEF.name))?,
        gas: number(gas, &path.field(GAS.name))?,
        depends_on: nullable(depends_on, &path.field(DEPENDS_ON.name))?,
        nonce: number(nonce, &path.field(NONCE.name))?,
        reserved: decode_reserved(reserved, &path.field(RESERVED_FIELD.name))?,
    })
}

fn clause_from_value(value: Value, path: &Path<'_>) -> RlpResult<Clause> {
    let [to, value, data]: [Value; 3] = value
        .into_list(path)?
        .try_into()
        .map_err(|_| path.mismatch("clause record"))?;
    Ok(Clause {
        to: nullable::<20>(to, &path.field("to"))?.map(Address::from),
        value: value.as_number(&path.field("value"))?,
        data: data.as_bytes(&path.field("data"))?.clone(),
    })
}

fn number<T: TryFrom<U256>>(value: Value, path: &Path<'_>) -> RlpResult<T> {
    T::try_from(value.as_number(path)?).map_err(|_| path.mismatch("number within field range"))
}

fn fixed<const N: usize>(value: Value, path: &Path<'_>) -> RlpResult<FixedBytes<N>> {
    let bytes = value.as_bytes(path)?;
    if bytes.len() != N {
        return Err(path.mismatch("blob of field width"));
    }
    Ok(FixedBytes::from_slice(bytes))
}

fn nullable<const N: usize>(value: Value, path: &Path<'_>) -> RlpResult<Option<FixedBytes<N>>> {
    match value {
        Value::Null => Ok(None),
        value => fixed(value, path).map(Some),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::RlpError;
    use alloy_primitives::{B256, B64};

    const UNSIGNED_HEX: &str = "f8540184aabbccdd20f840df947567d83b7b8d80addcb281a71d54fc7b3364ffed82271086000000606060df947567d83b7b8d80addcb281a71d54fc7b3364ffed824e208600000060606081808252088083bc614ec0";

    fn vector_body() -> TransactionBody {
        let to: Address = "0x7567d83b7b8d80addcb281a71d54fc7b3364ffed".parse().unwrap();
        let data = Bytes::from(vec![0, 0, 0, 0x60, 0x60, 0x60]);
        TransactionBody {
            chain_tag: 1,
            block_ref: B64::from(0x00000000aabbccddu64.to_be_bytes()),
            expiration: 32,
            clauses: vec![
                Clause {
                    to: Some(to),
                    value: U256::from(10000u64),
                    data: data.clone(),
                },
                Clause {
                    to: Some(to),
                    value: U256::from(20000u64),
                    data,
                },
            ],
            gas_price_coef: 128,
            gas: 21000,
            depends_on: None,
            nonce: 12_345_678,
            reserved: None,
        }
    }

    fn malformed(data: &[u8]) -> (String, String) {
        match decode_unsigned(data).unwrap_err() {
            RlpError::MalformedEncoding { context, reason } => (context, reason),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_encode_unsigned_known_vector() {
        let encoded = encode_unsigned(&vector_body()).unwrap();
        assert_eq!(hex::encode(&encoded), UNSIGNED_HEX);
        assert_eq!(decode_unsigned(&encoded).unwrap(), vector_body());
    }

    #[test]
    fn test_signed_layout_appends_signature() {
        let signature = vec![0x11u8; 65];
        let encoded = encode_signed(&vector_body(), &signature).unwrap();
        let (body, decoded_signature) = decode_signed(&encoded).unwrap();
        assert_eq!(body, vector_body());
        assert_eq!(decoded_signature.as_ref(), signature.as_slice());

        // unsigned bytes are not a signed transaction
        let unsigned = hex::decode(UNSIGNED_HEX).unwrap();
        assert!(decode_signed(&unsigned).is_err());
    }

    #[test]
    fn test_reserved_transform_trims_trailing_empties() {
        assert!(encode_reserved(&Reserved::default()).is_empty());
        assert_eq!(encode_reserved(&Reserved::delegated()), vec![Bytes::from(vec![1u8])]);

        let reserved = Reserved {
            features: 0,
            unused: vec![Bytes::from(vec![0xaa]), Bytes::new()],
        };
        assert_eq!(
            encode_reserved(&reserved),
            vec![Bytes::new(), Bytes::from(vec![0xaa])]
        );

        let wide = Reserved {
            features: 0x0100,
            unused: vec![],
        };
        assert_eq!(encode_reserved(&wide), vec![Bytes::from(vec![1u8, 0])]);
    }

    #[test]
    fn test_reserved_decode() {
        let path = Path::root("reserved");
        assert_eq!(decode_reserved(Value::List(vec![]), &path).unwrap(), None);

        let entries = Value::List(vec![Value::bytes(vec![0x03]), Value::bytes(vec![0xaa])]);
        assert_eq!(
            decode_reserved(entries, &path).unwrap(),
            Some(Reserved {
                features: 3,
                unused: vec![Bytes::from(vec![0xaa])],
            })
        );

        let untrimmed = Value::List(vec![Value::bytes(vec![0x01]), Value::bytes(vec![])]);
        assert_eq!(
            decode_reserved(untrimmed, &path).unwrap_err(),
            RlpError::MalformedEncoding {
                context: "reserved".into(),
                reason: "reserved fields not trimmed".into()
            }
        );

        let wide = Value::List(vec![Value::bytes(vec![1, 2, 3, 4, 5])]);
        assert!(decode_reserved(wide, &path).is_err());
    }

    #[test]
    fn test_default_reserved_normalizes_to_none() {
        let mut body = vector_body();
        body.reserved = Some(Reserved::default());
        let encoded = encode_unsigned(&body).unwrap();
        assert_eq!(hex::encode(&encoded), UNSIGNED_HEX);
        assert_eq!(decode_unsigned(&encoded).unwrap().reserved, None);
    }

    #[test]
    fn test_delegated_body_encodes_feature_entry() {
        let mut body = vector_body();
        body.reserved = Some(Reserved::delegated());
        let encoded = hex::encode(encode_unsigned(&body).unwrap());
        assert!(encoded.starts_with("f855"));
        assert!(encoded.ends_with("bc614ec101"));
    }

    #[test]
    fn test_depends_on_and_contract_creation() {
        let mut body = vector_body();
        body.depends_on = Some(B256::repeat_byte(0x42));
        body.clauses[1].to = None;
        let encoded = encode_unsigned(&body).unwrap();
        assert_eq!(decode_unsigned(&encoded).unwrap(), body);
    }

    #[test]
    fn test_untrimmed_reserved_rejected() {
        let hex = UNSIGNED_HEX.replacen("f854", "f855", 1);
        let hex = format!("{}c180", &hex[..hex.len() - 2]);
        let (context, reason) = malformed(&hex::decode(hex).unwrap());
        assert_eq!(context, "tx.reserved");
        assert_eq!(reason, "reserved fields not trimmed");
    }

    #[test]
    fn test_leading_zero_gas_rejected() {
        let hex = UNSIGNED_HEX
            .replacen("f854", "f855", 1)
            .replacen("825208", "83005208", 1);
        let (context, reason) = malformed(&hex::decode(hex).unwrap());
        assert_eq!(context, "tx.gas");
        assert_eq!(reason, "leading zero byte");
    }

    #[test]
    fn test_short_address_rejected() {
        // drop the last byte of the first clause's recipient
        let hex = UNSIGNED_HEX
            .replacen("f854", "f853", 1)
            .replacen("f840df94", "f83fde93", 1)
            .replacen("3364ffed822710", "3364ff822710", 1);
        let (context, _) = malformed(&hex::decode(hex).unwrap());
        assert_eq!(context, "tx.clauses.0.to");
    }
}
