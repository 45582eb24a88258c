//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
///
/// Every check fails closed: a malformed input is an error, never a
/// best-effort interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Invalid encoding: wrong length or format")]
    InvalidEncoding,

    #[error("Point not on curve or outside the prime-order subgroup")]
    InvalidPoint,

    #[error("Proof verification failed")]
    InvalidProof,

    #[error("Commitment does not match the claimed opening")]
    InvalidOpening,

    #[error("Decryption failed")]
    DecryptionFailure,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Secure random generator failed")]
    RandomnessFailure,
}
