//! Transaction body types.
//!
//! [`TransactionBody`] is the strongly typed body every other module works
//! with. [`RawTransactionBody`] is the loosely typed JSON form in which any
//! field may be missing; converting it is where body completeness and range
//! validation happens.

use alloy_primitives::{Address, Bytes, FixedBytes, B256, B64, U256};
use serde::{Deserialize, Serialize};

use crate::error::{TxError, TxResult};
use crate::serde_helper;

/// One action of a transaction: a transfer, a call, or a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clause {
    /// Recipient, or `None` for contract creation.
    pub to: Option<Address>,
    #[serde(deserialize_with = "serde_helper::quantity")]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
}

impl Clause {
    pub fn transfer(to: Address, value: U256) -> Self {
        Self {
            to: Some(to),
            value,
            data: Bytes::new(),
        }
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// Forward-compatible extension slot of a body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Reserved {
    /// Feature bitfield. Bit 0 marks fee delegation.
    #[serde(default)]
    pub features: u32,
    /// Extension entries carried as raw bytes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unused: Vec<Bytes>,
}

impl Reserved {
    /// Feature bit for fee delegation.
    pub const DELEGATION: u32 = 1;

    /// Reserved field with only the delegation feature set.
    pub fn delegated() -> Self {
        Self {
            features: Self::DELEGATION,
            unused: Vec::new(),
        }
    }

    pub fn is_delegated(&self) -> bool {
        self.features & Self::DELEGATION == Self::DELEGATION
    }
}

/// The signed-over content of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTransactionBody")]
pub struct TransactionBody {
    /// Last byte of the genesis block id.
    pub chain_tag: u8,
    /// First 8 bytes of the referenced block id.
    pub block_ref: B64,
    /// Number of blocks after `block_ref` the transaction stays valid.
    pub expiration: u32,
    pub clauses: Vec<Clause>,
    pub gas_price_coef: u8,
    pub gas: u64,
    /// Id of a transaction that must be included first.
    pub depends_on: Option<B256>,
    pub nonce: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved: Option<Reserved>,
}

impl TransactionBody {
    /// Feature bits, `0` when `reserved` is absent.
    pub fn features(&self) -> u32 {
        self.reserved.as_ref().map_or(0, |r| r.features)
    }

    /// Whether bit 0 of the feature field is set.
    pub fn is_delegated(&self) -> bool {
        self.features() & Reserved::DELEGATION == Reserved::DELEGATION
    }

    /// Block reference as the big-endian number it encodes.
    pub fn block_ref_number(&self) -> u64 {
        u64::from_be_bytes(self.block_ref.0)
    }
}

/// Loosely typed body as accepted from JSON.
///
/// Quantities may be numbers, decimal strings or hex strings. `dependsOn`
/// must be present but may be `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionBody {
    #[serde(default, deserialize_with = "serde_helper::quantity_opt")]
    pub chain_tag: Option<U256>,
    #[serde(default)]
    pub block_ref: Option<String>,
    #[serde(default, deserialize_with = "serde_helper::quantity_opt")]
    pub expiration: Option<U256>,
    #[serde(default)]
    pub clauses: Option<Vec<Clause>>,
    #[serde(default, deserialize_with = "serde_helper::quantity_opt")]
    pub gas_price_coef: Option<U256>,
    #[serde(default, deserialize_with = "serde_helper::quantity_opt")]
    pub gas: Option<U256>,
    #[serde(default, deserialize_with = "serde_helper::present")]
    pub depends_on: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helper::quantity_opt")]
    pub nonce: Option<U256>,
    #[serde(default)]
    pub reserved: Option<Reserved>,
}

impl TryFrom<RawTransactionBody> for TransactionBody {
    type Error = TxError;

    fn try_from(raw: RawTransactionBody) -> TxResult<Self> {
        let depends_on = match required(raw.depends_on, "dependsOn")? {
            Some(id) => Some(fixed_hex::<32>(&id, "dependsOn")?),
            None => None,
        };
        Ok(Self {
            chain_tag: narrow(required(raw.chain_tag, "chainTag")?, "chainTag")?,
            block_ref: fixed_hex::<8>(&required(raw.block_ref, "blockRef")?, "blockRef")?,
            expiration: narrow(required(raw.expiration, "expiration")?, "expiration")?,
            clauses: required(raw.clauses, "clauses")?,
            gas_price_coef: narrow(
                required(raw.gas_price_coef, "gasPriceCoef")?,
                "gasPriceCoef",
            )?,
            gas: narrow(required(raw.gas, "gas")?, "gas")?,
            depends_on,
            nonce: narrow(required(raw.nonce, "nonce")?, "nonce")?,
            reserved: raw.reserved,
        })
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> TxResult<T> {
    value.ok_or_else(|| TxError::invalid_body(field, "is missing"))
}

fn narrow<T: TryFrom<U256>>(value: U256, field: &'static str) -> TxResult<T> {
    T::try_from(value).map_err(|_| TxError::invalid_body(field, format!("{value} is out of range")))
}

fn fixed_hex<const N: usize>(input: &str, field: &'static str) -> TxResult<FixedBytes<N>> {
    let digits = input
        .strip_prefix("0x")
        .ok_or_else(|| TxError::invalid_body(field, "must be 0x-prefixed hex"))?;
    let bytes =
        hex::decode(digits).map_err(|e| TxError::invalid_body(field, format!("is not hex: {e}")))?;
    if bytes.len() != N {
        return Err(TxError::invalid_body(
            field,
            format!("must be {N} bytes, got {}", bytes.len()),
        ));
    }
    Ok(FixedBytes::from_slice(&bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BODY_JSON: &str = r#"{
        "chainTag": 74,
        "blockRef": "0x00000000aabbccdd",
        "expiration": 32,
        "clauses": [
            {"to": "0x7567d83b7b8d80addcb281a71d54fc7b3364ffed", "value": "10000", "data": "0x000000606060"},
            {"to": null, "value": 100000000000000000000, "data": "0x6060"}
        ],
        "gasPriceCoef": 128,
        "gas": 21000,
        "dependsOn": null,
        "nonce": "0xbc614e"
    }"#;

    fn raw() -> RawTransactionBody {
        serde_json::from_str(BODY_JSON).unwrap()
    }

    #[test]
    fn test_valid_raw_body_converts() {
        let body = TransactionBody::try_from(raw()).unwrap();
        assert_eq!(body.chain_tag, 0x4a);
        assert_eq!(body.block_ref_number(), 0xaabbccdd);
        assert_eq!(body.nonce, 12_345_678);
        assert_eq!(body.clauses[0].value, U256::from(10000u64));
        assert!(body.clauses[1].is_contract_creation());
        assert_eq!(
            body.clauses[1].value,
            U256::from(100u64) * U256::from(10u64).pow(U256::from(18u64))
        );
        assert_eq!(body.depends_on, None);
        assert_eq!(body.reserved, None);
        assert!(!body.is_delegated());
    }

    #[test]
    fn test_body_deserializes_through_validation() {
        let body: TransactionBody = serde_json::from_str(BODY_JSON).unwrap();
        assert_eq!(body, TransactionBody::try_from(raw()).unwrap());

        let missing_gas = BODY_JSON.replace(r#""gas": 21000,"#, "");
        let err = serde_json::from_str::<TransactionBody>(&missing_gas).unwrap_err();
        assert!(err.to_string().contains("gas is missing"), "{err}");
    }

    #[test]
    fn test_missing_fields_rejected() {
        let cases: [(&str, fn(&mut RawTransactionBody)); 8] = [
            ("chainTag", |r| r.chain_tag = None),
            ("blockRef", |r| r.block_ref = None),
            ("expiration", |r| r.expiration = None),
            ("clauses", |r| r.clauses = None),
            ("gasPriceCoef", |r| r.gas_price_coef = None),
            ("gas", |r| r.gas = None),
            ("dependsOn", |r| r.depends_on = None),
            ("nonce", |r| r.nonce = None),
        ];
        for (field, strip) in cases {
            let mut body = raw();
            strip(&mut body);
            let err = TransactionBody::try_from(body).unwrap_err();
            assert_eq!(
                err,
                TxError::InvalidTransactionBody {
                    field,
                    reason: "is missing".into()
                }
            );
        }
    }

    #[test]
    fn test_chain_tag_range() {
        let mut body = raw();
        body.chain_tag = Some(U256::from(255u64));
        assert!(TransactionBody::try_from(body.clone()).is_ok());
        body.chain_tag = Some(U256::from(256u64));
        let err = TransactionBody::try_from(body).unwrap_err();
        assert!(matches!(
            err,
            TxError::InvalidTransactionBody { field: "chainTag", .. }
        ));
    }

    #[test]
    fn test_block_ref_must_be_eight_bytes() {
        for bad in ["0xaabbccdd", "00000000aabbccdd", "0x00000000aabbccddee", "0x00000000aabbccdz"] {
            let mut body = raw();
            body.block_ref = Some(bad.to_string());
            let err = TransactionBody::try_from(body).unwrap_err();
            assert!(
                matches!(err, TxError::InvalidTransactionBody { field: "blockRef", .. }),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn test_depends_on_parsed() {
        let mut body = raw();
        body.depends_on = Some(Some(format!("0x{}", "ab".repeat(32))));
        let body = TransactionBody::try_from(body).unwrap();
        assert_eq!(body.depends_on, Some(B256::repeat_byte(0xab)));
    }

    #[test]
    fn test_delegation_bit_only_checks_bit_zero() {
        let mut body = TransactionBody::try_from(raw()).unwrap();
        for (features, delegated) in [(0, false), (1, true), (2, false), (3, true), (4, false), (5, true)] {
            body.reserved = Some(Reserved {
                features,
                unused: vec![],
            });
            assert_eq!(body.is_delegated(), delegated, "features={features}");
        }
    }

    #[test]
    fn test_serialize_camel_case() {
        let body = TransactionBody::try_from(raw()).unwrap();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["chainTag"], 74);
        assert_eq!(json["blockRef"], "0x00000000aabbccdd");
        assert!(json["dependsOn"].is_null());
        assert!(json.get("reserved").is_none());
    }
}
