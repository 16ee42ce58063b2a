//! Cryptographic capability consumed by transactions.
//!
//! Transactions never touch curve arithmetic directly. They are generic over
//! a [`Crypto`] implementation providing hashing, signing, public key
//! recovery and address derivation. [`ThorCrypto`] is the VeChain Thor
//! flavour: blake2b-256 digests, recoverable secp256k1 signatures laid out as
//! `r || s || recovery_id`, and keccak-256 derived addresses.

use std::sync::OnceLock;

use alloy_primitives::{keccak256, Address, B256};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};

use crate::error::{TxError, TxResult};

/// Length of one recoverable signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Stateless hash / sign / recover / derive-address capability.
///
/// All functions are associated functions: implementations carry no state,
/// so a transaction only needs the type, never an instance.
pub trait Crypto {
    type PublicKey;
    type SecretKey;

    /// 32-byte digest of `data`.
    fn hash(data: &[u8]) -> B256;

    /// Sign a digest, returning `r || s || recovery_id`.
    fn sign(digest: &B256, secret: &Self::SecretKey) -> TxResult<[u8; SIGNATURE_LENGTH]>;

    /// Recover the signer's public key from a 65-byte signature over `digest`.
    fn recover(digest: &B256, signature: &[u8]) -> TxResult<Self::PublicKey>;

    fn address_from_public_key(public_key: &Self::PublicKey) -> Address;

    /// Hash the concatenation of several byte slices.
    fn hash_concat(parts: &[&[u8]]) -> B256 {
        Self::hash(&parts.concat())
    }
}

/// VeChain Thor crypto: blake2b-256 + secp256k1 + keccak-256 addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThorCrypto;

type Blake2b256 = Blake2b<U32>;

impl ThorCrypto {
    /// Address controlled by `secret`.
    pub fn address_of(secret: &SecretKey) -> Address {
        Self::address_from_public_key(&PublicKey::from_secret_key(secp(), secret))
    }
}

impl Crypto for ThorCrypto {
    type PublicKey = PublicKey;
    type SecretKey = SecretKey;

    fn hash(data: &[u8]) -> B256 {
        B256::from_slice(&Blake2b256::digest(data))
    }

    fn sign(digest: &B256, secret: &SecretKey) -> TxResult<[u8; SIGNATURE_LENGTH]> {
        let msg = Message::from_digest(digest.0);
        let (recid, compact) = secp()
            .sign_ecdsa_recoverable(&msg, secret)
            .serialize_compact();
        let recid =
            u8::try_from(recid.to_i32()).map_err(|_| TxError::Signing("recovery id".into()))?;

        let mut signature = [0u8; SIGNATURE_LENGTH];
        let (rs, v) = signature.split_at_mut(compact.len());
        rs.copy_from_slice(&compact);
        v.copy_from_slice(&[recid]);
        Ok(signature)
    }

    fn recover(digest: &B256, signature: &[u8]) -> TxResult<PublicKey> {
        let [compact @ .., v] = signature else {
            return Err(TxError::Recovery("empty signature".into()));
        };
        if signature.len() != SIGNATURE_LENGTH {
            return Err(TxError::Recovery(format!(
                "expected {SIGNATURE_LENGTH} signature bytes, got {}",
                signature.len()
            )));
        }

        let recid =
            RecoveryId::from_i32(i32::from(*v)).map_err(|e| TxError::Recovery(e.to_string()))?;
        let recoverable = RecoverableSignature::from_compact(compact, recid)
            .map_err(|e| TxError::Recovery(e.to_string()))?;
        let msg = Message::from_digest(digest.0);
        secp()
            .recover_ecdsa(&msg, &recoverable)
            .map_err(|e| TxError::Recovery(e.to_string()))
    }

    fn address_from_public_key(public_key: &PublicKey) -> Address {
        let uncompressed = public_key.serialize_uncompressed();
        let payload = uncompressed.get(1..).unwrap_or_default();
        Address::from_word(keccak256(payload))
    }
}

fn secp() -> &'static Secp256k1<All> {
    static SECP: OnceLock<Secp256k1<All>> = OnceLock::new();
    SECP.get_or_init(Secp256k1::new)
}
