//! Fuzz target for encode/decode roundtrip consistency.
//!
//! Decoding is strict, so any input that decodes must be the canonical
//! encoding of what it decodes to.

#![no_main]

use libfuzzer_sys::fuzz_target;

use thor_tx::ThorTransaction;

fuzz_target!(|data: &[u8]| {
    let Ok(tx1) = ThorTransaction::decode(data) else {
        return;
    };

    let encoded = tx1.encoded().expect("decoded transaction re-encodes");
    assert_eq!(encoded, data, "decoded input was not canonical");

    let Ok(tx2) = ThorTransaction::decode(&encoded) else {
        panic!("Failed to decode re-encoded transaction");
    };

    assert_eq!(tx1, tx2, "transaction mismatch");
    assert_eq!(tx1.signing_hash(), tx2.signing_hash(), "signing hash mismatch");
    assert_eq!(tx1.origin(), tx2.origin(), "origin mismatch");
});
