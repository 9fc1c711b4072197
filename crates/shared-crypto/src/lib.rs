//! # Shared Crypto - Event Hashing and Signing
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Event identity hashes |
//! | `ecdsa` | secp256k1 (recoverable) | Creator signatures, wallet addresses |
//! | `event` | - | `make_event` / `check_event` |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic, low-S normalization (EIP-2)
//! - **Addresses**: last 20 bytes of Keccak-256 over the uncompressed public key
//! - **Salts**: 16 random bytes per event

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod event;
pub mod hashing;

// Re-exports
pub use ecdsa::{address_from_verifying_key, recover_address, RecoverableSignature, Secp256k1KeyPair};
pub use errors::CryptoError;
pub use event::{check_event, make_event, make_events, SignerContext};
pub use hashing::{event_hash_hex, hash_base_event, keccak256, Hash};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
