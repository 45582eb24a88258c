//! Auctioneer settlement flow.
//!
//! The settlement service:
//! 1. Opens every revealed bid with the auctioneer's secret key
//! 2. Excludes bids that fail any check, logging why, and discloses the box
//!    key of each so the ledger can confirm it does not open
//! 3. Checks the remaining bid count against the circuit capacity
//! 4. Picks the highest value (earliest bid id wins ties)
//! 5. Proves the settlement and returns the record to declare on the ledger

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::OsRng;
use tracing::{debug, info, warn};

use auction_circuit::{BidLane, CircuitError, SettlementWitness};
use auction_crypto::{
    reveal_message, verify_knowledge_bytes, AuctioneerKeypair, Commitment, CryptoError,
};
use auction_types::{
    AuctionPhase, AuctionRecord, BidId, ExcludedBid, RevealedBid, SettlementRecord,
};

use crate::config::SettlerConfig;
use crate::error::SettlementError;
use crate::prover::{prove_with_timeout, SettlementKeys};

/// A revealed bid the auctioneer managed to open.
#[derive(Clone, Debug)]
pub struct DecryptedBid {
    pub bid_id: BidId,
    pub bidder: String,
    pub lane: BidLane,
}

impl DecryptedBid {
    pub fn value(&self) -> u32 {
        self.lane.opening.value
    }
}

/// Revealed bids of an auction, split by whether they open.
#[derive(Clone, Debug, Default)]
pub struct OpenedBids {
    /// Bids that open to their commitment, in bid id order
    pub valid: Vec<DecryptedBid>,
    /// Bids that do not, each with a disclosure of its box key
    pub excluded: Vec<ExcludedBid>,
}

/// The settlement service.
pub struct SettlementService {
    config: SettlerConfig,
    keys: Arc<SettlementKeys>,
    keypair: AuctioneerKeypair,
}

impl SettlementService {
    /// Create a new settlement service.
    pub fn new(
        config: SettlerConfig,
        keys: Arc<SettlementKeys>,
        keypair: AuctioneerKeypair,
    ) -> Result<Self, SettlementError> {
        if keys.capacity() != config.capacity {
            return Err(SettlementError::KeyMaterial(format!(
                "keys are for capacity {}, configured {}",
                keys.capacity(),
                config.capacity
            )));
        }
        Ok(Self {
            config,
            keys,
            keypair,
        })
    }

    /// Load keys from the configured key directory.
    pub fn from_config(
        config: SettlerConfig,
        keypair: AuctioneerKeypair,
    ) -> Result<Self, SettlementError> {
        let keys = Arc::new(SettlementKeys::load(&config)?);
        Self::new(config, keys, keypair)
    }

    pub fn keys(&self) -> &Arc<SettlementKeys> {
        &self.keys
    }

    fn open_bid(
        &self,
        auction_id: &str,
        bid_id: &BidId,
        commitment: &[u8; 32],
        revealed: &RevealedBid,
    ) -> Result<BidLane, CryptoError> {
        let commitment_point = Commitment::from_bytes(commitment)?;

        let message = reveal_message(auction_id, bid_id, &revealed.payload.0);
        if !verify_knowledge_bytes(&revealed.proof.0, commitment, &message) {
            return Err(CryptoError::InvalidProof);
        }

        let opening = self.keypair.open(&revealed.payload)?;
        if opening.commitment() != commitment_point {
            return Err(CryptoError::InvalidOpening);
        }

        debug!(bid_id = %bid_id, "opened revealed bid");
        Ok(BidLane {
            opening,
            commitment: commitment_point,
        })
    }

    /// Open every revealed bid, in bid id order.
    ///
    /// Bids whose reveal proof fails, that do not decrypt, or whose opening
    /// does not match are excluded. Bids that are not Pedersen commitments
    /// are skipped; the ledger never holds them.
    pub fn decrypt_bids(&self, record: &AuctionRecord) -> OpenedBids {
        let mut opened = OpenedBids::default();

        for (bid_id, bid, revealed) in record.revealed_bids() {
            let Some(point) = bid.commitment.pedersen_point() else {
                warn!(
                    auction_id = %record.auction_id,
                    bid_id = %bid_id,
                    scheme = ?bid.commitment.scheme,
                    "skipping bid with non-settleable commitment scheme"
                );
                continue;
            };

            let error = match self.open_bid(&record.auction_id, bid_id, &point.0, revealed) {
                Ok(lane) => {
                    opened.valid.push(DecryptedBid {
                        bid_id: bid_id.clone(),
                        bidder: revealed.bidder.clone(),
                        lane,
                    });
                    continue;
                }
                Err(e) => e,
            };

            match self.keypair.disclose(&revealed.payload, &mut OsRng) {
                Ok(disclosure) => {
                    warn!(
                        auction_id = %record.auction_id,
                        bid_id = %bid_id,
                        error = %error,
                        "excluding revealed bid"
                    );
                    opened.excluded.push(ExcludedBid {
                        bid_id: bid_id.clone(),
                        disclosure: disclosure.to_record(),
                    });
                }
                Err(e) => warn!(
                    auction_id = %record.auction_id,
                    bid_id = %bid_id,
                    error = %error,
                    disclosure_error = %e,
                    "cannot exclude revealed bid"
                ),
            }
        }

        opened
    }

/// Index of the highest bid; the first one wins a tie.
    pub fn select_winner(bids: &[DecryptedBid]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, bid) in bids.iter().enumerate() {
            match best {
                Some(b) if bids[b].value() >= bid.value() => {}
                _ => best = Some(i),
            }
        }
        best
    }

    /// Check capacity, pick the winner and assemble the witness.
    pub fn build_witness(
        &self,
        bids: &[DecryptedBid],
    ) -> Result<(SettlementWitness, usize), SettlementError> {
        if bids.len() > self.keys.capacity() {
            return Err(CircuitError::CapacityExceeded {
                bids: bids.len(),
                capacity: self.keys.capacity(),
            }
            .into());
        }
        let winner = Self::select_winner(bids).ok_or(SettlementError::NoValidBids)?;

        let lanes = bids.iter().map(|b| b.lane.clone()).collect();
        let witness = SettlementWitness::assemble(self.keys.capacity(), lanes, winner)?;
        Ok((witness, winner))
    }

    /// Settle an ended auction.
    ///
    /// Returns the record to submit with the winner declaration.
    pub async fn settle(
        &self,
        record: &AuctionRecord,
    ) -> Result<SettlementRecord, SettlementError> {
        if record.phase != AuctionPhase::Ended {
            return Err(SettlementError::NotEnded {
                auction_id: record.auction_id.clone(),
                phase: record.phase.as_str(),
            });
        }

        let opened = self.decrypt_bids(record);
        info!(
            auction_id = %record.auction_id,
            revealed = record.revealed_count(),
            valid = opened.valid.len(),
            excluded = opened.excluded.len(),
            capacity = self.keys.capacity(),
            "settling auction"
        );

        let (witness, winner) = self.build_witness(&opened.valid)?;
        let timeout: Duration = self.config.proving_timeout();
        let proof = prove_with_timeout(self.keys.clone(), witness, timeout).await?;

        let winning = &opened.valid[winner];
        info!(
            auction_id = %record.auction_id,
            winner = %winning.bid_id,
            bidder = %winning.bidder,
            winning_value = winning.value(),
            "settlement proof ready"
        );

        Ok(SettlementRecord {
            winner: winning.bid_id.clone(),
            included: opened.valid.iter().map(|b| b.bid_id.clone()).collect(),
            excluded: opened.excluded,
            proof,
        })
    }
}
