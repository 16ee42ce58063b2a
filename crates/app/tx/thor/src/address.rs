//! Textual address handling.

use alloy_primitives::Address;

use crate::error::{TxError, TxResult};

/// Returns true for `0x` followed by exactly 40 hex digits, in any case.
pub fn is_address(input: &str) -> bool {
    input
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Parse a well-formed textual address.
pub fn parse_address(input: &str) -> TxResult<Address> {
    let invalid = || TxError::InvalidAddress(input.to_string());
    let digits = input
        .strip_prefix("0x")
        .filter(|_| is_address(input))
        .ok_or_else(invalid)?;
    let bytes = hex::decode(digits).map_err(|_| invalid())?;
    Ok(Address::from_slice(&bytes))
}

/// Render an address as `0x`-prefixed lowercase hex.
pub fn to_hex(address: &Address) -> String {
    format!("{address:#x}")
}
