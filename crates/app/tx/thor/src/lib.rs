//! VeChain Thor transaction support.
//!
//! This crate encodes Thor transactions to their canonical RLP form, derives
//! the hashes signers sign, and recovers the origin, fee delegator and id of
//! signed transactions.
//!
//! # Usage
//!
//! ```text
//! use thor_tx::{ThorTransaction, GasSchedule};
//!
//! let body: TransactionBody = serde_json::from_str(json)?;
//! let tx = ThorTransaction::new(body, None)?;
//!
//! // hand the signing hash to an external signer
//! let hash = tx.signing_hash()?;
//! let signed = tx.with_signature(signature)?;
//!
//! let raw = signed.encoded()?;
//! let origin = ThorTransaction::decode(&raw)?.origin()?;
//! ```
//!
//! # Architecture
//!
//! 1. [`rlp`] - A single codec driven by [`Kind`] descriptors
//! 2. [`schema`] - The unsigned and signed transaction layouts
//! 3. [`Transaction`] - Immutable body + signature with lazy derivations
//! 4. [`Crypto`] / [`IntrinsicGas`] - Injected hashing, signing and gas model

pub mod address;
pub mod body;
pub mod crypto;
pub mod error;
pub mod gas;
pub mod rlp;
pub mod schema;
pub mod serde_helper;
pub mod transaction;

// Re-export main types
pub use address::{is_address, parse_address, to_hex};
pub use body::{Clause, RawTransactionBody, Reserved, TransactionBody};
pub use crypto::{Crypto, ThorCrypto, SIGNATURE_LENGTH};
pub use error::*;
pub use gas::{
    load_gas_schedule, load_gas_schedule_from_str, GasConfigError, GasSchedule, IntrinsicGas,
};
pub use rlp::{Kind, Value};
pub use transaction::{ThorTransaction, Transaction};
