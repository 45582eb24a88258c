//! Bid commitment and reveal.

use rand::{CryptoRng, RngCore};
use thiserror::Error;

use auction_crypto::{
    commit, commit_message, encrypt, prove_knowledge, reveal_message, value_from_i64, CryptoError,
    Fr, Opening,
};
use auction_module::AuctionCall;
use auction_types::{
    BidCommitment, BidId, CompressedPoint, EncryptedPayload, KnowledgeProofBytes,
};

/// Errors that can occur during bid creation.
#[derive(Debug, Error)]
pub enum BidError {
    #[error("Bid value must be in [0, 2^32): {0}")]
    InvalidValue(i64),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// A committed bid. The opening stays with the bidder until reveal.
#[derive(Debug, Clone)]
pub struct PreparedBid {
    /// Auction the commitment proof is bound to
    pub auction_id: String,
    /// Pedersen commitment to the bid value
    pub commitment: BidCommitment,
    /// Proof of knowledge of the opening, bound to `auction_id`
    pub proof: KnowledgeProofBytes,
    /// Value and randomness (keep secret until reveal)
    pub opening: Opening,
}

/// A reveal ready for submission.
#[derive(Debug, Clone)]
pub struct PreparedReveal {
    pub auction_id: String,
    pub bid_id: BidId,
    /// Opening sealed to the auctioneer
    pub payload: EncryptedPayload,
    /// Proof of knowledge bound to the auction, the bid id and `payload`
    pub proof: KnowledgeProofBytes,
}

/// Commit to a bid value in an auction.
///
/// Negative values and values of 2^32 or more are rejected.
pub fn create_bid<R: RngCore + CryptoRng>(
    auction_id: &str,
    bid_value: i64,
    rng: &mut R,
) -> Result<PreparedBid, BidError> {
    let value = value_from_i64(bid_value).map_err(|_| BidError::InvalidValue(bid_value))?;
    let (commitment, randomness) = commit(value, rng)?;
    let encoded = commitment.to_bytes();
    let proof = prove_knowledge(value, &randomness, &encoded.0, &commit_message(auction_id), rng)?;

    Ok(PreparedBid {
        auction_id: auction_id.to_string(),
        commitment: commitment.to_record(),
        proof: proof.to_record(),
        opening: Opening::new(value, randomness),
    })
}

impl PreparedBid {
    pub fn value(&self) -> u32 {
        self.opening.value
    }

    pub fn randomness(&self) -> &Fr {
        &self.opening.randomness
    }

    /// Seal the opening to the auctioneer and prove knowledge bound to it.
    ///
    /// `bid_id` is the id the ledger assigned to the commitment. Every call
    /// draws a fresh ephemeral key and fresh proof nonces.
    pub fn reveal<R: RngCore + CryptoRng>(
        &self,
        bid_id: BidId,
        auctioneer_pk: &CompressedPoint,
        rng: &mut R,
    ) -> Result<PreparedReveal, BidError> {
        let payload = encrypt(self.value(), self.randomness(), auctioneer_pk, rng)?;
        let proof = prove_knowledge(
            self.value(),
            self.randomness(),
            &self.commitment.bytes,
            &reveal_message(&self.auction_id, &bid_id, &payload.0),
            rng,
        )?;
        Ok(PreparedReveal {
            auction_id: self.auction_id.clone(),
            bid_id,
            payload,
            proof: proof.to_record(),
        })
    }

    /// The call submitting this commitment.
    pub fn submit_call(&self) -> AuctionCall {
        AuctionCall::SubmitCommitment {
            auction_id: self.auction_id.clone(),
            commitment: self.commitment.clone(),
            proof: self.proof.clone(),
        }
    }
}

impl PreparedReveal {
    /// The call revealing this bid under the label `bidder`.
    pub fn reveal_call(self, bidder: &str) -> AuctionCall {
        AuctionCall::RevealBid {
            auction_id: self.auction_id,
            bid_id: self.bid_id,
            bidder: bidder.to_string(),
            payload: self.payload,
            proof: self.proof,
        }
    }
}

/// Builder for creating bids with additional options.
pub struct BidBuilder {
    auction_id: String,
    bid_value: i64,
}

impl BidBuilder {
    /// Create a new bid builder.
    pub fn new(auction_id: impl Into<String>) -> Self {
        Self {
            auction_id: auction_id.into(),
            bid_value: 0,
        }
    }

    /// Set the bid value.
    pub fn bid_value(mut self, value: i64) -> Self {
        self.bid_value = value;
        self
    }

    /// Build the prepared bid and its submission call.
    pub fn build<R: RngCore + CryptoRng>(
        self,
        rng: &mut R,
    ) -> Result<(PreparedBid, AuctionCall), BidError> {
        let bid = create_bid(&self.auction_id, self.bid_value, rng)?;
        let call = bid.submit_call();
        Ok((bid, call))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_crypto::{check_commit, verify_knowledge_bytes, AuctioneerKeypair};
    use rand::rngs::OsRng;

    #[test]
    fn test_create_bid() {
        let bid = create_bid("a1", 1000, &mut OsRng).unwrap();
        assert_eq!(bid.value(), 1000);
        assert!(check_commit(1000, bid.randomness(), &bid.commitment.bytes));
        let bytes = &bid.commitment.bytes;
        assert!(verify_knowledge_bytes(&bid.proof.0, bytes, &commit_message("a1")));
        assert!(!verify_knowledge_bytes(&bid.proof.0, bytes, &commit_message("a2")));
    }

    #[test]
    fn test_value_range() {
        assert!(matches!(
            create_bid("a1", -1, &mut OsRng),
            Err(BidError::InvalidValue(-1))
        ));
        assert!(matches!(
            create_bid("a1", 1 << 32, &mut OsRng),
            Err(BidError::InvalidValue(_))
        ));
        assert!(create_bid("a1", u32::MAX as i64, &mut OsRng).is_ok());
    }

    #[test]
    fn test_reveal_bound_to_payload_and_bid() {
        let auctioneer = AuctioneerKeypair::generate(&mut OsRng).unwrap();
        let bid = create_bid("a1", 42, &mut OsRng).unwrap();
        let reveal = bid
            .reveal("tx-1".to_string(), &auctioneer.public_key(), &mut OsRng)
            .unwrap();

        let bytes = &bid.commitment.bytes;
        let message = reveal_message("a1", "tx-1", &reveal.payload.0);
        assert!(verify_knowledge_bytes(&reveal.proof.0, bytes, &message));
        let elsewhere = reveal_message("a1", "tx-2", &reveal.payload.0);
        assert!(!verify_knowledge_bytes(&reveal.proof.0, bytes, &elsewhere));
        assert!(!verify_knowledge_bytes(&reveal.proof.0, bytes, &reveal.payload.0));

        let opening = auctioneer.open(&reveal.payload).unwrap();
        assert_eq!(opening, bid.opening);

        // A second reveal is a fresh ciphertext.
        let again = bid
            .reveal("tx-1".to_string(), &auctioneer.public_key(), &mut OsRng)
            .unwrap();
        assert_ne!(again.payload, reveal.payload);

        match reveal.reveal_call("bob") {
            AuctionCall::RevealBid {
                auction_id,
                bid_id,
                bidder,
                ..
            } => {
                assert_eq!(auction_id, "a1");
                assert_eq!(bid_id, "tx-1");
                assert_eq!(bidder, "bob");
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_bid_builder() {
        let (bid, call) = BidBuilder::new("a1").bid_value(500).build(&mut OsRng).unwrap();
        assert_eq!(bid.value(), 500);
        assert_eq!(bid.auction_id, "a1");
        match call {
            AuctionCall::SubmitCommitment {
                auction_id,
                commitment,
                ..
            } => {
                assert_eq!(auction_id, "a1");
                assert_eq!(commitment, bid.commitment);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }
}
