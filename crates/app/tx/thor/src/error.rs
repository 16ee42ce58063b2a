//! Transaction-specific error types.

use thiserror::Error;

/// Errors raised by the kind-driven RLP codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RlpError {
    /// The input bytes are not a canonical encoding of the expected kind.
    ///
    /// `context` is the dotted path of the offending field, e.g.
    /// `tx.clauses.1.value`.
    #[error("malformed encoding at {context}: {reason}")]
    MalformedEncoding { context: String, reason: String },

    /// A value handed to the encoder does not have the shape its kind describes.
    #[error("value at {context} does not fit kind: expected {expected}")]
    KindMismatch {
        context: String,
        expected: &'static str,
    },
}

/// Errors surfaced by transaction construction and derivation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    /// A required body field is missing or out of range.
    #[error("invalid transaction body: {field} {reason}")]
    InvalidTransactionBody { field: &'static str, reason: String },

    /// Signature length does not match the delegation flag of the body.
    #[error("invalid signature: expected {expected} bytes, got {actual}")]
    InvalidSignature { expected: usize, actual: usize },

    /// Origin, delegator or id requested on an unsigned transaction.
    #[error("transaction is not signed")]
    NotSigned,

    /// Delegator requested on a transaction without the delegation feature.
    #[error("transaction is not delegated")]
    NotDelegated,

    /// A textual address is not `0x` followed by 40 hex digits.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Encoding or decoding failed.
    #[error(transparent)]
    Rlp(#[from] RlpError),

    /// Public key recovery from a signature failed.
    #[error("failed to recover signer: {0}")]
    Recovery(String),

    /// The crypto capability refused to sign.
    #[error("failed to sign: {0}")]
    Signing(String),
}

impl TxError {
    pub(crate) fn invalid_body(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTransactionBody {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for RLP codec operations.
pub type RlpResult<T> = Result<T, RlpError>;

/// Result type for transaction operations.
pub type TxResult<T> = Result<T, TxError>;
