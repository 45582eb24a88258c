//! Auction module error types.

use thiserror::Error;

use auction_circuit::CircuitError;
use auction_types::{AuctionPhase, SchemeId};

/// Errors raised by the ledger collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid state key: {0:?}")]
    InvalidKey(String),

    #[error("Write to {key} requires endorsement by {org}")]
    EndorsementPolicyFailure { key: String, org: String },
}

/// Errors that can occur in the auction module.
///
/// Any error rejects the whole transaction; none of its writes are applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Auction not found: {0}")]
    AuctionNotFound(String),

    #[error("Auction already exists: {0}")]
    AuctionExists(String),

    #[error("Invalid phase. Expected: {expected:?}, Got: {got:?}")]
    InvalidPhase {
        expected: AuctionPhase,
        got: AuctionPhase,
    },

    #[error("Not authorized")]
    NotAuthorized,

    #[error("Bid not found: {0}")]
    BidNotFound(String),

    #[error("Bid already revealed: {0}")]
    AlreadyRevealed(String),

    #[error("Commitment already submitted to this auction")]
    DuplicateCommitment,

    #[error("Commitment scheme {0:?} is not accepted")]
    UnsupportedScheme(SchemeId),

    #[error("Invalid auctioneer public key")]
    InvalidAuctioneerKey,

    #[error("Invalid commitment encoding")]
    InvalidCommitment,

    #[error("Invalid proof of knowledge")]
    InvalidProof,

    #[error("Invalid encrypted payload")]
    InvalidPayload,

    #[error("No bids have been revealed")]
    NoRevealedBids,

    #[error("Invalid settlement: {0}")]
    InvalidSettlement(String),

    #[error("Exclusion of bid {0} is not justified")]
    InvalidExclusion(String),

    #[error("Settlement proof rejected: {0}")]
    SettlementProofRejected(CircuitError),

    #[error("Corrupt auction record: {0}")]
    CorruptRecord(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
