//! Structured fuzzing with arbitrary transaction bodies.
//!
//! Builds well-typed bodies, attaches a (cryptographically meaningless)
//! signature of the length the body asks for and runs the full
//! encode / decode / recover pipeline.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use alloy_primitives::{Address, Bytes, B256, B64, U256};
use thor_tx::{Clause, Reserved, ThorTransaction, TransactionBody};

/// Fuzzable clause parameters
#[derive(Debug, Arbitrary)]
struct FuzzClause {
    to: Option<[u8; 20]>,
    value: [u8; 32],
    data: Vec<u8>,
}

/// Fuzzable body parameters
#[derive(Debug, Arbitrary)]
struct FuzzBody {
    chain_tag: u8,
    block_ref: [u8; 8],
    expiration: u32,
    clauses: Vec<FuzzClause>,
    gas_price_coef: u8,
    gas: u64,
    depends_on: Option<[u8; 32]>,
    nonce: u64,
    reserved: Option<(u32, Vec<Vec<u8>>)>,
}

/// Combined fuzz input
#[derive(Debug, Arbitrary)]
enum FuzzInput {
    Body(FuzzBody, Vec<u8>),
    Raw(Vec<u8>),
}

impl FuzzBody {
    fn into_body(self) -> TransactionBody {
        TransactionBody {
            chain_tag: self.chain_tag,
            block_ref: B64::from(self.block_ref),
            expiration: self.expiration,
            clauses: self
                .clauses
                .into_iter()
                .map(|clause| Clause {
                    to: clause.to.map(Address::from),
                    value: U256::from_be_bytes(clause.value),
                    data: Bytes::from(clause.data),
                })
                .collect(),
            gas_price_coef: self.gas_price_coef,
            gas: self.gas,
            depends_on: self.depends_on.map(B256::from),
            nonce: self.nonce,
            reserved: self.reserved.map(|(features, unused)| Reserved {
                features,
                unused: unused.into_iter().map(Bytes::from).collect(),
            }),
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    match input {
        FuzzInput::Body(body, signature_seed) => {
            let body = body.into_body();
            let unsigned = ThorTransaction::new(body, None).expect("unsigned body is accepted");
            let encoded = unsigned.encoded().expect("typed body encodes");

            // Reserved entries that end empty are trimmed, so the round trip
            // may legitimately change the body; it must still decode
            let decoded = ThorTransaction::decode_unsigned(&encoded).expect("encoding decodes");
            assert_eq!(decoded.encoded().expect("re-encodes"), encoded);

            let len = if unsigned.is_delegated() { 130 } else { 65 };
            let mut signature = signature_seed;
            signature.resize(len, 0);
            let signed = unsigned
                .with_signature(signature)
                .expect("signature length matches body");

            // Random signatures usually fail recovery, but must not panic
            let _ = signed.origin();
            let _ = signed.delegator();
            let _ = signed.id();

            let raw = signed.encoded().expect("signed body encodes");
            assert!(ThorTransaction::decode(&raw).is_ok());
        }

        FuzzInput::Raw(data) => {
            if let Ok(tx) = ThorTransaction::decode(&data) {
                let _ = tx.origin();
                let _ = tx.delegator();
                let _ = tx.id();
            }
        }
    }
});
