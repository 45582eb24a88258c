//! Query handlers for the auction module.
//!
//! These functions provide read-only access to auction state.

use serde::{Deserialize, Serialize};

use auction_types::{AuctionPhase, AuctionRecord, BidId, CompressedPoint};

use crate::error::AuctionError;
use crate::ledger::{CallerIdentity, LedgerContext};
use crate::state::load_auction;

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    /// Get the full auction record.
    GetAuction { auction_id: String },

    /// Get the public key bids are encrypted to.
    GetAuctioneerPk { auction_id: String },

    /// Get the settlement outcome, if declared.
    GetResult { auction_id: String },

    /// Get the identity of the caller.
    GetCallerId,
}

/// Query response types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    /// Auction record.
    Auction(AuctionRecord),

    /// Auctioneer public key.
    AuctioneerPk(CompressedPoint),

    /// Settlement outcome.
    Result(Option<AuctionResult>),

    /// Caller identity.
    CallerId(CallerIdentity),
}

/// Public outcome of a settled auction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionResult {
    pub winner: BidId,
    /// Bids the settlement proof covers
    pub included: Vec<BidId>,
    /// Revealed bids shown not to open, left out of the settlement
    pub excluded: Vec<BidId>,
}

impl AuctionResult {
    pub fn from_record(record: &AuctionRecord) -> Option<Self> {
        let settlement = record.settlement.as_ref()?;
        Some(Self {
            winner: settlement.winner.clone(),
            included: settlement.included.clone(),
            excluded: settlement.excluded.iter().map(|e| e.bid_id.clone()).collect(),
        })
    }
}

/// Handle a query.
pub fn handle_query<L: LedgerContext + ?Sized>(
    ctx: &L,
    query: AuctionQuery,
) -> Result<AuctionQueryResponse, AuctionError> {
    match query {
        AuctionQuery::GetAuction { auction_id } => {
            load_auction(ctx, &auction_id).map(AuctionQueryResponse::Auction)
        }

        AuctionQuery::GetAuctioneerPk { auction_id } => {
            let record = load_auction(ctx, &auction_id)?;
            Ok(AuctionQueryResponse::AuctioneerPk(record.auctioneer_pk))
        }

        AuctionQuery::GetResult { auction_id } => {
            let record = load_auction(ctx, &auction_id)?;
            if record.phase != AuctionPhase::WinnerDeclared {
                return Ok(AuctionQueryResponse::Result(None));
            }
            Ok(AuctionQueryResponse::Result(AuctionResult::from_record(&record)))
        }

        AuctionQuery::GetCallerId => Ok(AuctionQueryResponse::CallerId(
            ctx.caller_identity().clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::state::store_auction;
    use auction_types::{
        BidCommitment, BidRecord, EncryptedPayload, ExcludedBid, KeyDisclosureBytes,
        KnowledgeProofBytes, RevealedBid, SettlementProof, SettlementRecord,
    };

    fn seller() -> CallerIdentity {
        CallerIdentity::new("seller", "Org1MSP")
    }

    fn revealed(commitment: u8) -> BidRecord {
        BidRecord {
            commitment: BidCommitment::pedersen(CompressedPoint([commitment; 32])),
            commit_proof: KnowledgeProofBytes([0u8; 96]),
            revealed: Some(RevealedBid {
                bidder: "b".to_string(),
                payload: EncryptedPayload(vec![0u8; 96]),
                proof: KnowledgeProofBytes([0u8; 96]),
            }),
        }
    }

    fn ledger_with(record: &AuctionRecord) -> MemoryLedger {
        let ledger = MemoryLedger::new(["Org1MSP"]);
        ledger
            .submit(&seller(), |tx| store_auction(tx, record))
            .unwrap();
        ledger
    }

    fn record() -> AuctionRecord {
        AuctionRecord::new(
            "a1",
            "rug",
            "seller".to_string(),
            "Org1MSP",
            CompressedPoint([5u8; 32]),
        )
    }

    #[test]
    fn test_get_auction_and_pk() {
        let record = record();
        let ledger = ledger_with(&record);

        let response = ledger
            .evaluate(&seller(), |tx| {
                handle_query(tx, AuctionQuery::GetAuction { auction_id: "a1".into() })
            })
            .unwrap();
        assert_eq!(response, AuctionQueryResponse::Auction(record.clone()));

        let response = ledger
            .evaluate(&seller(), |tx| {
                handle_query(tx, AuctionQuery::GetAuctioneerPk { auction_id: "a1".into() })
            })
            .unwrap();
        assert_eq!(response, AuctionQueryResponse::AuctioneerPk(CompressedPoint([5u8; 32])));
    }

    #[test]
    fn test_get_missing_auction() {
        let ledger = MemoryLedger::new(["Org1MSP"]);
        let result = ledger.evaluate(&seller(), |tx| {
            handle_query(tx, AuctionQuery::GetAuction { auction_id: "x".into() })
        });
        assert_eq!(result, Err(AuctionError::AuctionNotFound("x".to_string())));
    }

    #[test]
    fn test_get_caller_id() {
        let ledger = MemoryLedger::new(["Org1MSP"]);
        let bob = CallerIdentity::new("bob", "Org2MSP");
        let response = ledger
            .evaluate(&bob, |tx| handle_query(tx, AuctionQuery::GetCallerId))
            .unwrap();
        assert_eq!(response, AuctionQueryResponse::CallerId(bob));
    }

    #[test]
    fn test_result_lists_excluded_bids() {
        let mut record = record();
        record.bids.insert("t1".to_string(), revealed(1));
        record.bids.insert("t2".to_string(), revealed(2));
        record.phase = AuctionPhase::WinnerDeclared;
        record.settlement = Some(SettlementRecord {
            winner: "t1".to_string(),
            included: vec!["t1".to_string()],
            excluded: vec![ExcludedBid {
                bid_id: "t2".to_string(),
                disclosure: KeyDisclosureBytes([0u8; 96]),
            }],
            proof: SettlementProof {
                proof_bytes: vec![],
                capacity: 1,
                vkey_hash: [0u8; 32],
            },
        });
        let ledger = ledger_with(&record);

        let response = ledger
            .evaluate(&seller(), |tx| {
                handle_query(tx, AuctionQuery::GetResult { auction_id: "a1".into() })
            })
            .unwrap();
        assert_eq!(
            response,
            AuctionQueryResponse::Result(Some(AuctionResult {
                winner: "t1".to_string(),
                included: vec!["t1".to_string()],
                excluded: vec!["t2".to_string()],
            }))
        );
    }

    #[test]
    fn test_result_absent_before_declaration() {
        let ledger = ledger_with(&record());
        let response = ledger
            .evaluate(&seller(), |tx| {
                handle_query(tx, AuctionQuery::GetResult { auction_id: "a1".into() })
            })
            .unwrap();
        assert_eq!(response, AuctionQueryResponse::Result(None));
    }
}
