//! # Keccak-256 Hashing
//!
//! Event identity hashing. An event hash is Keccak-256 over the canonical
//! JSON encoding of its `BaseEvent` (struct field order, payload `kind`
//! first, absent optionals omitted).

use crate::CryptoError;
use sha3::{Digest, Keccak256};
use shared_types::{BaseEvent, EventHash};

/// Keccak-256 output (256-bit).
pub type Hash = [u8; 32];

/// Hash data with Keccak-256 (one-shot).
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Canonical byte encoding of an event base.
pub fn canonical_bytes(base: &BaseEvent) -> Result<Vec<u8>, CryptoError> {
    serde_json::to_vec(base).map_err(|e| CryptoError::InvalidInput(e.to_string()))
}

/// Raw hash of an event base.
pub fn hash_base_event(base: &BaseEvent) -> Result<Hash, CryptoError> {
    Ok(keccak256(&canonical_bytes(base)?))
}

/// `0x`-prefixed hex hash of an event base, as stored in `FullEvent::hash`.
pub fn event_hash_hex(base: &BaseEvent) -> Result<EventHash, CryptoError> {
    Ok(to_hex_prefixed(&hash_base_event(base)?))
}

/// Encode bytes as `0x`-prefixed lowercase hex.
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode `0x`-prefixed (or bare) hex.
pub fn from_hex_prefixed(s: &str) -> Result<Vec<u8>, CryptoError> {
    let body = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(body).map_err(|e| CryptoError::InvalidInput(e.to_string()))
}
