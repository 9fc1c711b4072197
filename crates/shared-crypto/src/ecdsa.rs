//! # ECDSA Signatures (secp256k1)
//!
//! Recoverable secp256k1 signatures over 32-byte prehashes, and
//! Ethereum-style address derivation.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization (EIP-2), enforced by k256 on signing
//! - Signer identity is recovered from the signature, never trusted from input

use crate::hashing::{from_hex_prefixed, keccak256, to_hex_prefixed, Hash};
use crate::CryptoError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use shared_types::Address;

/// Recoverable ECDSA signature (65 bytes, r||s||v with v in {0, 1}).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature([u8; 65]);

impl RecoverableSignature {
    /// Create from bytes (65 bytes).
    pub fn from_bytes(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }

    /// Parse from `0x`-prefixed hex.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let raw = from_hex_prefixed(s)?;
        let bytes: [u8; 65] = raw
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureFormat)?;
        Ok(Self(bytes))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// Encode as `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        to_hex_prefixed(&self.0)
    }
}

/// secp256k1 ECDSA keypair.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Create from a hex-encoded secret key (64 hex chars, optional `0x`).
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let raw = from_hex_prefixed(s)?;
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: raw.len(),
            })?;
        Self::from_bytes(bytes)
    }

    /// Ethereum-style address of this keypair.
    pub fn address(&self) -> Address {
        address_from_verifying_key(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte prehash (deterministic RFC 6979).
    pub fn sign_prehash(&self, prehash: &Hash) -> Result<RecoverableSignature, CryptoError> {
        let (sig, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(prehash)
            .map_err(|_| CryptoError::InvalidInput("prehash signing failed".to_string()))?;
        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&sig.to_bytes());
        bytes[64] = recovery_id.to_byte();
        Ok(RecoverableSignature(bytes))
    }

    /// Get secret key bytes (for serialization).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

/// Recover the signer's address from a prehash and its signature.
pub fn recover_address(
    prehash: &Hash,
    signature: &RecoverableSignature,
) -> Result<Address, CryptoError> {
    let bytes = signature.as_bytes();
    let sig = Signature::from_slice(&bytes[..64]).map_err(|_| CryptoError::InvalidSignature)?;
    // Accept both raw (0/1) and Ethereum-style (27/28) recovery bytes.
    let v = match bytes[64] {
        27 | 28 => bytes[64] - 27,
        other => other,
    };
    let recovery_id = RecoveryId::from_byte(v).ok_or(CryptoError::InvalidSignatureFormat)?;
    let key = VerifyingKey::recover_from_prehash(prehash, &sig, recovery_id)
        .map_err(|_| CryptoError::SignatureVerificationFailed)?;
    Ok(address_from_verifying_key(&key))
}

/// Derive the Ethereum-style address of a public key.
pub fn address_from_verifying_key(public_key: &VerifyingKey) -> Address {
    let pubkey_bytes = public_key.to_encoded_point(false);
    // Keccak256 of the uncompressed key without the 0x04 tag; last 20 bytes.
    let hash = keccak256(&pubkey_bytes.as_bytes()[1..]);
    to_hex_prefixed(&hash[12..])
}
