//! Error types for settlement circuit operations.

use auction_crypto::CryptoError;
use thiserror::Error;

/// Errors raised while assembling, synthesising or verifying a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    #[error("{bids} bids exceed circuit capacity {capacity}")]
    CapacityExceeded { bids: usize, capacity: usize },

    #[error("No bids to settle")]
    NoBids,

    #[error("Opening in lane {0} does not match its commitment")]
    InvalidOpening(usize),

    #[error("Bid in lane {0} exceeds the declared winning value")]
    WinnerNotMaximum(usize),

    #[error("Winner index {index} out of range for {bids} bids")]
    WinnerOutOfRange { index: usize, bids: usize },

    #[error("Winning commitment is not among the settled commitments")]
    WinnerNotIncluded,

    #[error("Invalid commitment: {0}")]
    InvalidPoint(#[from] CryptoError),

    #[error("Key material error: {0}")]
    KeyMaterial(String),

    #[error("Settlement proof rejected")]
    InvalidProof,

    #[error("Constraint synthesis failed: {0}")]
    Synthesis(String),
}

impl From<bellman::SynthesisError> for CircuitError {
    fn from(err: bellman::SynthesisError) -> Self {
        CircuitError::Synthesis(err.to_string())
    }
}
