//! Auction records on the ledger.
//!
//! Each auction is stored under its id as a borsh-encoded
//! [`AuctionRecord`].

use auction_types::AuctionRecord;

use crate::error::AuctionError;
use crate::ledger::LedgerContext;

/// Read an auction record, failing if it does not exist.
pub fn load_auction<L: LedgerContext + ?Sized>(
    ctx: &L,
    auction_id: &str,
) -> Result<AuctionRecord, AuctionError> {
    let bytes = ctx
        .get_state(auction_id)?
        .ok_or_else(|| AuctionError::AuctionNotFound(auction_id.to_string()))?;
    borsh::from_slice(&bytes).map_err(|e| AuctionError::CorruptRecord(e.to_string()))
}

/// Whether an auction id is taken.
pub fn auction_exists<L: LedgerContext + ?Sized>(
    ctx: &L,
    auction_id: &str,
) -> Result<bool, AuctionError> {
    Ok(ctx.get_state(auction_id)?.is_some())
}

/// Write an auction record under its id.
pub fn store_auction<L: LedgerContext + ?Sized>(
    ctx: &mut L,
    record: &AuctionRecord,
) -> Result<(), AuctionError> {
    let bytes = borsh::to_vec(record).map_err(|e| AuctionError::CorruptRecord(e.to_string()))?;
    ctx.put_state(&record.auction_id, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{CallerIdentity, MemoryLedger};
    use auction_types::CompressedPoint;

    #[test]
    fn test_store_and_load() {
        let ledger = MemoryLedger::new(["Org1MSP"]);
        let caller = CallerIdentity::new("seller", "Org1MSP");
        let record = AuctionRecord::new(
            "a1",
            "vase",
            "seller".to_string(),
            "Org1MSP",
            CompressedPoint([0u8; 32]),
        );

        ledger
            .submit(&caller, |tx| store_auction(tx, &record))
            .unwrap();

        let loaded = ledger.evaluate(&caller, |tx| load_auction(tx, "a1")).unwrap();
        assert_eq!(loaded, record);
        assert!(ledger.evaluate(&caller, |tx| auction_exists(tx, "a1")).unwrap());
    }

    #[test]
    fn test_missing_and_corrupt() {
        let ledger = MemoryLedger::new(["Org1MSP"]);
        let caller = CallerIdentity::new("seller", "Org1MSP");
        assert_eq!(
            ledger.evaluate(&caller, |tx| load_auction(tx, "nope")),
            Err(AuctionError::AuctionNotFound("nope".to_string()))
        );

        ledger
            .submit(&caller, |tx| Ok(tx.put_state("junk", vec![0xff; 3])?))
            .unwrap();
        assert!(matches!(
            ledger.evaluate(&caller, |tx| load_auction(tx, "junk")),
            Err(AuctionError::CorruptRecord(_))
        ));
    }
}
