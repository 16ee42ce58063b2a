//! The transaction entity.
//!
//! A [`Transaction`] pairs a body with an optional signature and is
//! immutable: attaching or dropping a signature builds a new value. Every
//! derived property (signing hash, origin, delegator, id) is recomputed on
//! demand through the [`Crypto`] capability the transaction is typed over.

use std::fmt;
use std::marker::PhantomData;

use alloy_primitives::{Address, Bytes, B256};

use crate::address::parse_address;
use crate::body::{RawTransactionBody, TransactionBody};
use crate::crypto::{Crypto, ThorCrypto, SIGNATURE_LENGTH};
use crate::error::{TxError, TxResult};
use crate::gas::IntrinsicGas;
use crate::schema;

/// Transaction using the Thor crypto suite.
pub type ThorTransaction = Transaction<ThorCrypto>;

/// A body with an optional signature.
///
/// The signature is `origin_signature` (65 bytes) for ordinary transactions
/// and `origin_signature || delegator_signature` (130 bytes) when the body
/// carries the delegation feature. [`Transaction::new`] enforces this.
pub struct Transaction<C: Crypto = ThorCrypto> {
    body: TransactionBody,
    signature: Option<Bytes>,
    _crypto: PhantomData<fn() -> C>,
}

impl<C: Crypto> Transaction<C> {
    /// Create a transaction, checking the signature length against the
    /// delegation flag of `body`.
    pub fn new(body: TransactionBody, signature: Option<Bytes>) -> TxResult<Self> {
        if let Some(signature) = &signature {
            let expected = expected_signature_length(&body);
            if signature.len() != expected {
                return Err(TxError::InvalidSignature {
                    expected,
                    actual: signature.len(),
                });
            }
        }
        Ok(Self {
            body,
            signature,
            _crypto: PhantomData,
        })
    }

    /// Validate a loosely typed body and create a transaction from it.
    pub fn from_raw(raw: RawTransactionBody, signature: Option<Bytes>) -> TxResult<Self> {
        Self::new(TransactionBody::try_from(raw)?, signature)
    }

    /// Decode the signed layout.
    pub fn decode(data: &[u8]) -> TxResult<Self> {
        let (body, signature) = schema::decode_signed(data)?;
        tracing::debug!(
            target: "thor_tx",
            clauses = body.clauses.len(),
            delegated = body.is_delegated(),
            "decoded signed transaction"
        );
        Self::new(body, Some(signature))
    }

    /// Decode the unsigned layout.
    pub fn decode_unsigned(data: &[u8]) -> TxResult<Self> {
        let body = schema::decode_unsigned(data)?;
        tracing::debug!(
            target: "thor_tx",
            clauses = body.clauses.len(),
            delegated = body.is_delegated(),
            "decoded unsigned transaction"
        );
        Self::new(body, None)
    }

    pub fn body(&self) -> &TransactionBody {
        &self.body
    }

    pub fn signature(&self) -> Option<&Bytes> {
        self.signature.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Whether bit 0 of the body's features is set.
    pub fn is_delegated(&self) -> bool {
        self.body.is_delegated()
    }

    /// Same body with `signature` attached.
    pub fn with_signature(&self, signature: impl Into<Bytes>) -> TxResult<Self> {
        Self::new(self.body.clone(), Some(signature.into()))
    }

    /// Same body without a signature.
    pub fn unsigned(&self) -> Self {
        Self {
            body: self.body.clone(),
            signature: None,
            _crypto: PhantomData,
        }
    }

    pub fn intrinsic_gas(&self, model: &impl IntrinsicGas) -> u64 {
        model.intrinsic_gas(&self.body.clauses)
    }

    /// Hash the origin signs: the digest of the unsigned encoding.
    pub fn signing_hash(&self) -> TxResult<B256> {
        Ok(C::hash(&schema::encode_unsigned(&self.body)?))
    }

    /// Hash a fee delegator signs on behalf of `delegate_for`, the origin.
    pub fn signing_hash_for(&self, delegate_for: &Address) -> TxResult<B256> {
        let hash = self.signing_hash()?;
        Ok(C::hash_concat(&[hash.as_slice(), delegate_for.as_slice()]))
    }

    /// [`Self::signing_hash_for`] with the origin given as `0x` hex.
    pub fn delegated_signing_hash(&self, delegate_for: &str) -> TxResult<B256> {
        self.signing_hash_for(&parse_address(delegate_for)?)
    }

    /// Signed layout when a signature is attached, unsigned layout otherwise.
    pub fn encoded(&self) -> TxResult<Vec<u8>> {
        let encoded = match &self.signature {
            Some(signature) => schema::encode_signed(&self.body, signature)?,
            None => schema::encode_unsigned(&self.body)?,
        };
        Ok(encoded)
    }

    /// Address recovered from the origin signature.
    pub fn origin(&self) -> TxResult<Address> {
        let signature = self.signature.as_ref().ok_or(TxError::NotSigned)?;
        let origin_signature = signature
            .get(..SIGNATURE_LENGTH)
            .ok_or_else(|| self.length_error(signature))?;

        let public_key = C::recover(&self.signing_hash()?, origin_signature)?;
        let origin = C::address_from_public_key(&public_key);
        tracing::trace!(target: "thor_tx", %origin, "recovered origin");
        Ok(origin)
    }

    /// Address recovered from the delegator signature.
    ///
    /// Fails with [`TxError::NotDelegated`] before looking at the signature.
    pub fn delegator(&self) -> TxResult<Address> {
        if !self.is_delegated() {
            return Err(TxError::NotDelegated);
        }
        let signature = self.signature.as_ref().ok_or(TxError::NotSigned)?;
        let delegator_signature = signature
            .get(SIGNATURE_LENGTH..)
            .ok_or_else(|| self.length_error(signature))?;

        let origin = self.origin()?;
        let public_key = C::recover(&self.signing_hash_for(&origin)?, delegator_signature)?;
        let delegator = C::address_from_public_key(&public_key);
        tracing::trace!(target: "thor_tx", %origin, %delegator, "recovered delegator");
        Ok(delegator)
    }

    /// Transaction id: `hash(signing_hash || origin)`.
    pub fn id(&self) -> TxResult<B256> {
        let origin = self.origin()?;
        let hash = self.signing_hash()?;
        Ok(C::hash_concat(&[hash.as_slice(), origin.as_slice()]))
    }

    /// Sign as the origin of a non-delegated transaction.
    pub fn sign(&self, secret: &C::SecretKey) -> TxResult<Self> {
        let signature = C::sign(&self.signing_hash()?, secret)?;
        self.with_signature(signature.to_vec())
    }

    /// Run the fee delegation protocol with both parties' keys.
    ///
    /// The origin signs the signing hash, the delegator signs the hash
    /// bound to the origin's address, and the two signatures are joined.
    pub fn sign_delegated(
        &self,
        origin_secret: &C::SecretKey,
        delegator_secret: &C::SecretKey,
    ) -> TxResult<Self> {
        let hash = self.signing_hash()?;
        let origin_signature = C::sign(&hash, origin_secret)?;
        let origin = C::address_from_public_key(&C::recover(&hash, &origin_signature)?);
        let delegator_signature = C::sign(&self.signing_hash_for(&origin)?, delegator_secret)?;

        let mut signature = Vec::with_capacity(2 * SIGNATURE_LENGTH);
        signature.extend_from_slice(&origin_signature);
        signature.extend_from_slice(&delegator_signature);
        self.with_signature(signature)
    }

    fn length_error(&self, signature: &Bytes) -> TxError {
        TxError::InvalidSignature {
            expected: expected_signature_length(&self.body),
            actual: signature.len(),
        }
    }
}

fn expected_signature_length(body: &TransactionBody) -> usize {
    if body.is_delegated() {
        2 * SIGNATURE_LENGTH
    } else {
        SIGNATURE_LENGTH
    }
}

impl<C: Crypto> From<TransactionBody> for Transaction<C> {
    fn from(body: TransactionBody) -> Self {
        Self {
            body,
            signature: None,
            _crypto: PhantomData,
        }
    }
}

impl<C: Crypto> Clone for Transaction<C> {
    fn clone(&self) -> Self {
        Self {
            body: self.body.clone(),
            signature: self.signature.clone(),
            _crypto: PhantomData,
        }
    }
}

impl<C: Crypto> PartialEq for Transaction<C> {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body && self.signature == other.signature
    }
}

impl<C: Crypto> Eq for Transaction<C> {}

impl<C: Crypto> fmt::Debug for Transaction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("body", &self.body)
            .field("signature", &self.signature)
            .finish()
    }
}
