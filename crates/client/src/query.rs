//! Query functions for auction state.

use auction_module::{
    handle_query, AuctionError, AuctionQuery, AuctionQueryResponse, AuctionResult,
    CallerIdentity, MemoryLedger,
};
use auction_types::{AuctionRecord, CompressedPoint};

/// Query interface for auction data.
pub trait AuctionReader {
    /// Get the full auction record.
    fn auction(&self, auction_id: &str) -> Result<AuctionRecord, AuctionError>;

    /// Get the key reveals must be sealed to.
    fn auctioneer_pk(&self, auction_id: &str) -> Result<CompressedPoint, AuctionError>;

    /// Get the settlement outcome, if the winner has been declared.
    fn result(&self, auction_id: &str) -> Result<Option<AuctionResult>, AuctionError>;
}

/// Reader evaluating queries against a [`MemoryLedger`] as one caller.
#[derive(Clone, Debug)]
pub struct LedgerReader {
    ledger: MemoryLedger,
    caller: CallerIdentity,
}

impl LedgerReader {
    pub fn new(ledger: MemoryLedger, caller: CallerIdentity) -> Self {
        Self { ledger, caller }
    }

    fn query(&self, query: AuctionQuery) -> Result<AuctionQueryResponse, AuctionError> {
        self.ledger.evaluate(&self.caller, |tx| handle_query(tx, query))
    }
}

fn unexpected(response: AuctionQueryResponse) -> AuctionError {
    AuctionError::CorruptRecord(format!("unexpected query response {:?}", response))
}

impl AuctionReader for LedgerReader {
    fn auction(&self, auction_id: &str) -> Result<AuctionRecord, AuctionError> {
        match self.query(AuctionQuery::GetAuction {
            auction_id: auction_id.to_string(),
        })? {
            AuctionQueryResponse::Auction(record) => Ok(record),
            other => Err(unexpected(other)),
        }
    }

    fn auctioneer_pk(&self, auction_id: &str) -> Result<CompressedPoint, AuctionError> {
        match self.query(AuctionQuery::GetAuctioneerPk {
            auction_id: auction_id.to_string(),
        })? {
            AuctionQueryResponse::AuctioneerPk(pk) => Ok(pk),
            other => Err(unexpected(other)),
        }
    }

    fn result(&self, auction_id: &str) -> Result<Option<AuctionResult>, AuctionError> {
        match self.query(AuctionQuery::GetResult {
            auction_id: auction_id.to_string(),
        })? {
            AuctionQueryResponse::Result(result) => Ok(result),
            other => Err(unexpected(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_auction() {
        let reader = LedgerReader::new(
            MemoryLedger::new(["Org1MSP"]),
            CallerIdentity::new("bob", "Org2MSP"),
        );
        assert_eq!(
            reader.auctioneer_pk("a1"),
            Err(AuctionError::AuctionNotFound("a1".to_string()))
        );
    }
}
