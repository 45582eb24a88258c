//! Genesis configuration for the auction module.
//!
//! Fixes the settlement circuit the ledger accepts proofs for: its capacity
//! and the verifying key produced by setup.

use std::path::Path;

use serde::{Deserialize, Serialize};

use auction_circuit::{SettlementVerifier, DEFAULT_CAPACITY};

/// Genesis configuration for the auction module.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuctionGenesisConfig {
    /// Capacity of the settlement circuit
    pub settlement_capacity: usize,

    /// Hex of the encoded settlement verifying key (capacity header included)
    pub verifying_key: String,
}

impl Default for AuctionGenesisConfig {
    fn default() -> Self {
        Self {
            settlement_capacity: DEFAULT_CAPACITY,
            verifying_key: String::new(),
        }
    }
}

impl AuctionGenesisConfig {
    /// Config for an encoded verifying key.
    pub fn new(settlement_capacity: usize, verifying_key: &[u8]) -> Self {
        Self {
            settlement_capacity,
            verifying_key: hex::encode(verifying_key),
        }
    }

    /// Read a JSON genesis file.
    pub fn from_json_file(path: &Path) -> Result<Self, GenesisValidationError> {
        let bytes = std::fs::read(path)
            .map_err(|e| GenesisValidationError::Io(format!("{}: {}", path.display(), e)))?;
        serde_json::from_slice(&bytes).map_err(|e| GenesisValidationError::Format(e.to_string()))
    }

    /// Validate the genesis configuration and build the settlement verifier.
    pub fn verifier(&self) -> Result<SettlementVerifier, GenesisValidationError> {
        if self.settlement_capacity == 0 {
            return Err(GenesisValidationError::InvalidCapacity(
                "Capacity cannot be zero".into(),
            ));
        }

        let bytes = hex::decode(&self.verifying_key)
            .map_err(|e| GenesisValidationError::InvalidVerifyingKey(e.to_string()))?;
        let verifier = SettlementVerifier::from_bytes(&bytes)
            .map_err(|e| GenesisValidationError::InvalidVerifyingKey(e.to_string()))?;

        if verifier.capacity() != self.settlement_capacity {
            return Err(GenesisValidationError::CapacityMismatch {
                expected: self.settlement_capacity,
                got: verifier.capacity(),
            });
        }
        Ok(verifier)
    }

    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        self.verifier().map(|_| ())
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Invalid capacity configuration: {0}")]
    InvalidCapacity(String),

    #[error("Verifying key capacity mismatch: expected {expected}, got {got}")]
    CapacityMismatch { expected: usize, got: usize },

    #[error("Invalid verifying key: {0}")]
    InvalidVerifyingKey(String),

    #[error("Failed to read genesis file: {0}")]
    Io(String),

    #[error("Malformed genesis file: {0}")]
    Format(String),
}
