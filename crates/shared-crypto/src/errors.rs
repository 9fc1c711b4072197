//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Public key could not be recovered from the signature
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Signature is not 65 bytes or has a bad recovery byte
    #[error("Invalid signature format")]
    InvalidSignatureFormat,

    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// r/s out of range
    #[error("Invalid signature")]
    InvalidSignature,

    /// Invalid input for cryptographic operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
