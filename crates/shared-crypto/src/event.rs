//! # Event Construction and Verification
//!
//! `make_event` builds a salted, hashed and signed [`FullEvent`];
//! `check_event` is the inverse gate applied to every event a client
//! submits: the hash must match the base and the signature must recover
//! to the declared creator.

use crate::ecdsa::{recover_address, RecoverableSignature, Secp256k1KeyPair};
use crate::hashing::{from_hex_prefixed, hash_base_event, to_hex_prefixed, Hash};
use crate::CryptoError;
use shared_types::{Address, BaseEvent, EventHash, FullEvent, Payload, StreamError};

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Signing identity used to author events.
///
/// Clients hold one per wallet; the node holds one for derived events.
pub struct SignerContext {
    keypair: Secp256k1KeyPair,
    creator_address: Address,
}

impl SignerContext {
    /// Signer backed by a fresh random key.
    #[must_use]
    pub fn random() -> Self {
        Self::from_keypair(Secp256k1KeyPair::generate())
    }

    /// Signer backed by a hex-encoded secret key.
    pub fn from_secret_hex(secret: &str) -> Result<Self, CryptoError> {
        Ok(Self::from_keypair(Secp256k1KeyPair::from_hex(secret)?))
    }

    /// Signer backed by an existing keypair.
    #[must_use]
    pub fn from_keypair(keypair: Secp256k1KeyPair) -> Self {
        let creator_address = keypair.address();
        Self {
            keypair,
            creator_address,
        }
    }

    /// Address written into `creator_address` of every event.
    #[must_use]
    pub fn creator_address(&self) -> &Address {
        &self.creator_address
    }

    /// Sign a 32-byte event hash, returning `0x`-hex r||s||v.
    pub fn sign_hash(&self, hash: &Hash) -> Result<String, CryptoError> {
        Ok(self.keypair.sign_prehash(hash)?.to_hex())
    }
}

impl std::fmt::Debug for SignerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerContext")
            .field("creator_address", &self.creator_address)
            .finish_non_exhaustive()
    }
}

/// Build one signed event with a fresh random salt.
pub fn make_event(
    signer: &SignerContext,
    payload: Payload,
    prev_events: Vec<EventHash>,
) -> Result<FullEvent, CryptoError> {
    let salt: [u8; SALT_LEN] = rand::random();
    let base = BaseEvent {
        creator_address: signer.creator_address().clone(),
        salt: hex::encode(salt),
        prev_events,
        payload,
    };
    let hash = hash_base_event(&base)?;
    let signature = signer.sign_hash(&hash)?;
    Ok(FullEvent {
        hash: to_hex_prefixed(&hash),
        signature,
        base,
    })
}

/// Build a chain of events: the first points at `prev_events`, every later
/// one at its predecessor.
pub fn make_events(
    signer: &SignerContext,
    payloads: Vec<Payload>,
    prev_events: Vec<EventHash>,
) -> Result<Vec<FullEvent>, CryptoError> {
    let mut events = Vec::with_capacity(payloads.len());
    let mut prev = prev_events;
    for payload in payloads {
        let event = make_event(signer, payload, prev)?;
        prev = vec![event.hash.clone()];
        events.push(event);
    }
    Ok(events)
}

/// Verify hash and signature of a submitted event.
///
/// # Errors
///
/// - `BadEventHash` if `hash` does not match the canonical encoding of `base`
/// - `BadEventSignature` if the signature is malformed or recovers to an
///   address other than `creator_address`
pub fn check_event(event: &FullEvent) -> Result<(), StreamError> {
    let computed = hash_base_event(&event.base).map_err(|e| StreamError::BadEvent {
        reason: e.to_string(),
    })?;
    let declared = from_hex_prefixed(&event.hash).map_err(|_| StreamError::BadEventHash {
        hash: event.hash.clone(),
    })?;
    if declared.as_slice() != computed.as_slice() {
        return Err(StreamError::BadEventHash {
            hash: event.hash.clone(),
        });
    }

    let signature = RecoverableSignature::from_hex(&event.signature).map_err(|e| {
        StreamError::BadEventSignature {
            reason: e.to_string(),
        }
    })?;
    let signer = recover_address(&computed, &signature).map_err(|e| {
        StreamError::BadEventSignature {
            reason: e.to_string(),
        }
    })?;
    if !signer.eq_ignore_ascii_case(event.creator()) {
        return Err(StreamError::BadEventSignature {
            reason: format!(
                "signed by {} but creator is {}",
                signer,
                event.creator()
            ),
        });
    }
    Ok(())
}
