//! Fuzz target for raw transaction decoding.
//!
//! Arbitrary bytes are fed to both decoders. Errors are fine; panics,
//! runaway loops and huge allocations are not.

#![no_main]

use libfuzzer_sys::fuzz_target;

use thor_tx::{GasSchedule, ThorTransaction};

fuzz_target!(|data: &[u8]| {
    if let Ok(tx) = ThorTransaction::decode(data) {
        // If decode succeeds, every derivation must return without panicking
        let _ = tx.signing_hash();
        let _ = tx.origin();
        let _ = tx.delegator();
        let _ = tx.id();
        let _ = tx.encoded();
        let _ = tx.intrinsic_gas(&GasSchedule::default());
    }

    if let Ok(tx) = ThorTransaction::decode_unsigned(data) {
        let _ = tx.signing_hash();
        let _ = tx.origin();
        let _ = tx.is_delegated();
    }
});
