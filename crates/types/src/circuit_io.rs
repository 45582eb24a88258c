//! Public statement of a settlement proof.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::CompressedPoint;

/// The public side of a settlement: which commitments were settled and
/// which of them won.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SettlementStatement {
    /// Commitments covered by the proof, in lane order (without padding)
    pub commitments: Vec<CompressedPoint>,

    /// Commitment of the winning bid
    pub winning_commitment: CompressedPoint,
}

/// Why a statement is inconsistent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementError {
    NoCommitments,
    WinnerNotIncluded,
}

impl SettlementStatement {
    /// Validate input consistency
    pub fn validate(&self) -> Result<(), StatementError> {
        if self.commitments.is_empty() {
            return Err(StatementError::NoCommitments);
        }
        if !self.commitments.contains(&self.winning_commitment) {
            return Err(StatementError::WinnerNotIncluded);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_validation() {
        let statement = SettlementStatement {
            commitments: vec![CompressedPoint([1u8; 32]), CompressedPoint([2u8; 32])],
            winning_commitment: CompressedPoint([2u8; 32]),
        };
        assert!(statement.validate().is_ok());
    }

    #[test]
    fn test_statement_validation_foreign_winner() {
        let statement = SettlementStatement {
            commitments: vec![CompressedPoint([1u8; 32])],
            winning_commitment: CompressedPoint([2u8; 32]),
        };
        assert_eq!(statement.validate(), Err(StatementError::WinnerNotIncluded));

        let empty = SettlementStatement {
            commitments: vec![],
            winning_commitment: CompressedPoint([2u8; 32]),
        };
        assert_eq!(empty.validate(), Err(StatementError::NoCommitments));
    }
}
