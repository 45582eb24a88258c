//! Error types for the settlement pipeline.

use std::time::Duration;

use auction_circuit::CircuitError;
use auction_crypto::CryptoError;
use thiserror::Error;

/// Errors raised by setup, proving and the settlement flow.
///
/// None of these are retried: a failed proof is never regenerated
/// automatically.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("Circuit error: {0}")]
    Circuit(#[from] CircuitError),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("No valid revealed bids to settle")]
    NoValidBids,

    #[error("Auction {auction_id} is {phase}, settlement requires an ended auction")]
    NotEnded { auction_id: String, phase: &'static str },

    #[error("Generated proof failed verification")]
    InvalidProof,

    #[error("Proving cancelled")]
    Cancelled,

    #[error("Proving timed out after {0:?}")]
    Timeout(Duration),

    #[error("Key material error: {0}")]
    KeyMaterial(String),

    #[error("Proving worker failed: {0}")]
    Worker(String),
}

impl From<bellman::SynthesisError> for SettlementError {
    fn from(err: bellman::SynthesisError) -> Self {
        match err {
            bellman::SynthesisError::IoError(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                SettlementError::Cancelled
            }
            other => SettlementError::Circuit(other.into()),
        }
    }
}
