//! Call message types for the auction module.

use std::sync::Arc;

use borsh::{BorshDeserialize, BorshSerialize};

use auction_circuit::SettlementVerifier;
use auction_types::{
    BidCommitment, BidId, CompressedPoint, EncryptedPayload, KnowledgeProofBytes,
    SettlementRecord,
};

use crate::genesis::{AuctionGenesisConfig, GenesisValidationError};
use crate::handlers::{self, HandlerResult};
use crate::ledger::LedgerContext;

/// Call messages for the auction module.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum AuctionCall {
    // === Auction Lifecycle ===
    /// Create a new auction; the caller becomes the seller.
    CreateAuction {
        auction_id: String,
        item: String,
        auctioneer_pk: CompressedPoint,
    },

    /// Submit a commitment with a proof of knowledge of its opening.
    SubmitCommitment {
        auction_id: String,
        commitment: BidCommitment,
        proof: KnowledgeProofBytes,
    },

    /// Reveal a committed bid to the auctioneer.
    RevealBid {
        auction_id: String,
        bid_id: BidId,
        bidder: String,
        payload: EncryptedPayload,
        proof: KnowledgeProofBytes,
    },

    /// Stop accepting commitments (seller only).
    CloseAuction { auction_id: String },

    /// Stop accepting reveals (seller only).
    EndAuction { auction_id: String },

    // === Settlement ===
    /// Declare the winner with a settlement proof (seller only).
    DeclareWinner {
        auction_id: String,
        settlement: SettlementRecord,
    },
}

/// Outcome of a successful call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallResponse {
    Done,
    /// Id assigned to a submitted commitment
    BidId(BidId),
}

/// The auction module: dispatches calls against a ledger.
///
/// Holds only the settlement verifier, which is read-only and shared.
#[derive(Clone, Debug)]
pub struct AuctionModule {
    verifier: Arc<SettlementVerifier>,
}

impl AuctionModule {
    pub fn new(verifier: Arc<SettlementVerifier>) -> Self {
        Self { verifier }
    }

    pub fn from_genesis(config: &AuctionGenesisConfig) -> Result<Self, GenesisValidationError> {
        Ok(Self::new(Arc::new(config.verifier()?)))
    }

    pub fn verifier(&self) -> &SettlementVerifier {
        &self.verifier
    }

    /// Execute one call inside the current transaction.
    pub fn execute<L: LedgerContext + ?Sized>(
        &self,
        ctx: &mut L,
        call: AuctionCall,
    ) -> HandlerResult<CallResponse> {
        match call {
            AuctionCall::CreateAuction {
                auction_id,
                item,
                auctioneer_pk,
            } => handlers::handle_create_auction(ctx, &auction_id, &item, auctioneer_pk)
                .map(|_| CallResponse::Done),

            AuctionCall::SubmitCommitment {
                auction_id,
                commitment,
                proof,
            } => handlers::handle_submit_commitment(ctx, &auction_id, commitment, proof)
                .map(CallResponse::BidId),

            AuctionCall::RevealBid {
                auction_id,
                bid_id,
                bidder,
                payload,
                proof,
            } => handlers::handle_reveal_bid(ctx, &auction_id, &bid_id, bidder, payload, proof)
                .map(|_| CallResponse::Done),

            AuctionCall::CloseAuction { auction_id } => {
                handlers::handle_close_auction(ctx, &auction_id).map(|_| CallResponse::Done)
            }

            AuctionCall::EndAuction { auction_id } => {
                handlers::handle_end_auction(ctx, &auction_id).map(|_| CallResponse::Done)
            }

            AuctionCall::DeclareWinner {
                auction_id,
                settlement,
            } => handlers::handle_declare_winner(ctx, &self.verifier, &auction_id, settlement)
                .map(|_| CallResponse::Done),
        }
    }
}
