//! End-to-end integration tests for the sealed-bid auction system.
//!
//! These tests exercise the full auction lifecycle:
//! 1. Trusted setup of the settlement circuit
//! 2. Auction creation
//! 3. Commitment submission and reveal
//! 4. Settlement by the auctioneer
//! 5. Winner declaration with proof verification on the ledger

#![cfg(test)]

use std::fs;
use std::sync::Arc;

use once_cell::sync::Lazy;
use rand::rngs::OsRng;

use auction_circuit::CircuitError;
use auction_client::{AuctionReader, BidBuilder, LedgerReader, PreparedBid};
use auction_crypto::AuctioneerKeypair;
use auction_module::{
    AuctionCall, AuctionError, AuctionGenesisConfig, AuctionModule, AuctionResult,
    CallResponse, CallerIdentity, MemoryLedger,
};
use auction_settler::{
    run_setup, SettlementError, SettlementKeys, SettlementService, SettlerConfig,
};
use auction_types::{AuctionPhase, AuctionRecord, BidId, ExcludedBid};

const CAPACITY: usize = 3;

struct Setup {
    config: SettlerConfig,
    keys: Arc<SettlementKeys>,
    genesis: AuctionGenesisConfig,
}

/// One trusted setup shared by every test.
static SETUP: Lazy<Setup> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let config = SettlerConfig {
        capacity: CAPACITY,
        key_dir: std::env::temp_dir().join(format!("auction-it-keys-{}", std::process::id())),
        check_proving_key: false,
        ..Default::default()
    };
    let (_, descriptor) = run_setup(&config, &mut OsRng).expect("setup");
    assert_eq!(descriptor.public_inputs, 2 * CAPACITY + 2);

    // Settle with keys read back from disk, as a separate auctioneer would.
    let keys = Arc::new(SettlementKeys::load(&config).expect("load keys"));
    let vk = fs::read(config.verifying_key_path()).expect("read verifying key");
    let genesis = AuctionGenesisConfig::new(CAPACITY, &vk);

    Setup {
        config,
        keys,
        genesis,
    }
});

struct Auction {
    id: String,
    ledger: MemoryLedger,
    module: AuctionModule,
    seller: CallerIdentity,
    auctioneer: AuctioneerKeypair,
}

impl Auction {
    fn create(id: &str) -> Self {
        let module = AuctionModule::from_genesis(&SETUP.genesis).expect("genesis");
        let auction = Self {
            id: id.to_string(),
            ledger: MemoryLedger::new(["Org1MSP", "Org2MSP"]),
            module,
            seller: CallerIdentity::new("seller", "Org1MSP"),
            auctioneer: AuctioneerKeypair::generate(&mut OsRng).expect("auctioneer key"),
        };
        let create = AuctionCall::CreateAuction {
            auction_id: id.to_string(),
            item: "painting".to_string(),
            auctioneer_pk: auction.auctioneer.public_key(),
        };
        auction.call(&auction.seller, create).expect("create auction");
        auction
    }

    fn call(
        &self,
        caller: &CallerIdentity,
        call: AuctionCall,
    ) -> Result<CallResponse, AuctionError> {
        self.ledger
            .submit(caller, |tx| self.module.execute(tx, call))
            .map(|(response, _)| response)
    }

    fn seller_call(&self, call: AuctionCall) -> Result<CallResponse, AuctionError> {
        self.call(&self.seller, call)
    }

    fn reader(&self, caller: &CallerIdentity) -> LedgerReader {
        LedgerReader::new(self.ledger.clone(), caller.clone())
    }

    fn bid(&self, bidder: &CallerIdentity, value: i64) -> (PreparedBid, BidId) {
        let (bid, call) = BidBuilder::new(self.id.as_str())
            .bid_value(value)
            .build(&mut OsRng)
            .expect("bid");
        match self.call(bidder, call).expect("submit commitment") {
            CallResponse::BidId(id) => (bid, id),
            other => panic!("unexpected response {:?}", other),
        }
    }

    fn reveal(&self, bidder: &CallerIdentity, bid: &PreparedBid, bid_id: &BidId) {
        let pk = self.reader(bidder).auctioneer_pk(&self.id).expect("auctioneer pk");
        let reveal = bid.reveal(bid_id.clone(), &pk, &mut OsRng).expect("reveal");
        self.call(bidder, reveal.reveal_call(&bidder.id))
            .expect("reveal bid");
    }

    fn close(&self) {
        self.seller_call(AuctionCall::CloseAuction {
            auction_id: self.id.clone(),
        })
        .expect("close");
    }

    fn end(&self) {
        self.seller_call(AuctionCall::EndAuction {
            auction_id: self.id.clone(),
        })
        .expect("end");
    }

    fn record(&self) -> AuctionRecord {
        self.reader(&self.seller).auction(&self.id).expect("record")
    }

    fn service(&self) -> SettlementService {
        SettlementService::new(
            SETUP.config.clone(),
            SETUP.keys.clone(),
            AuctioneerKeypair::from_secret(*self.auctioneer.secret()),
        )
        .expect("service")
    }
}

fn bidder(name: &str) -> CallerIdentity {
    CallerIdentity::new(name, "Org2MSP")
}

#[tokio::test]
async fn test_full_auction_flow() {
    let auction = Auction::create("auction-1");
    let (alice, bob, carol) = (bidder("alice"), bidder("bob"), bidder("carol"));

    // Open: commitments only.
    let (a, a_id) = auction.bid(&alice, 120);
    let (b, b_id) = auction.bid(&bob, 450);
    let (c, c_id) = auction.bid(&carol, 300);
    assert_eq!(auction.record().bids.len(), 3);
    assert!(auction.record().revealed_bids().next().is_none());

    // Closed: reveals.
    auction.close();
    auction.reveal(&alice, &a, &a_id);
    auction.reveal(&bob, &b, &b_id);
    auction.reveal(&carol, &c, &c_id);
    auction.end();

    // The auctioneer settles off-ledger.
    let record = auction.record();
    assert_eq!(record.phase, AuctionPhase::Ended);
    let settlement = auction.service().settle(&record).await.unwrap();
    assert_eq!(settlement.winner, b_id);
    assert_eq!(settlement.included.len(), 3);

    auction
        .seller_call(AuctionCall::DeclareWinner {
            auction_id: auction.id.clone(),
            settlement: settlement.clone(),
        })
        .unwrap();

    let record = auction.record();
    assert_eq!(record.phase, AuctionPhase::WinnerDeclared);
    assert_eq!(record.winner(), Some(&b_id));
    assert_eq!(record.settlement, Some(settlement));

    let result = auction.reader(&alice).result(&auction.id).unwrap().unwrap();
    assert_eq!(result.winner, b_id);
    assert!(result.excluded.is_empty());
}

#[tokio::test]
async fn test_declare_winner_rejects_forged_settlements() {
    let auction = Auction::create("auction-2");
    let (alice, bob) = (bidder("alice"), bidder("bob"));

    let (a, a_id) = auction.bid(&alice, 10);
    let (b, b_id) = auction.bid(&bob, 20);
    auction.close();
    auction.reveal(&alice, &a, &a_id);
    auction.reveal(&bob, &b, &b_id);
    auction.end();

    let settlement = auction.service().settle(&auction.record()).await.unwrap();
    assert_eq!(settlement.winner, b_id);

    let declare = |settlement| AuctionCall::DeclareWinner {
        auction_id: auction.id.clone(),
        settlement,
    };

    // Only the seller declares.
    let by_bidder = auction.call(&alice, declare(settlement.clone()));
    assert_eq!(by_bidder.unwrap_err(), AuctionError::NotAuthorized);

    // The proof does not carry over to another winner.
    let mut swapped = settlement.clone();
    swapped.winner = a_id.clone();
    assert_eq!(
        auction.seller_call(declare(swapped)).unwrap_err(),
        AuctionError::SettlementProofRejected(CircuitError::InvalidProof)
    );

    // Nor to another lane order.
    let mut reordered = settlement.clone();
    reordered.included.reverse();
    assert_eq!(
        auction.seller_call(declare(reordered)).unwrap_err(),
        AuctionError::SettlementProofRejected(CircuitError::InvalidProof)
    );

    // Every revealed bid must be accounted for.
    let mut partial = settlement.clone();
    partial.included.retain(|id| id == &b_id);
    assert!(matches!(
        auction.seller_call(declare(partial)),
        Err(AuctionError::InvalidSettlement(_))
    ));

    let mut tampered = settlement.clone();
    tampered.proof.proof_bytes[100] ^= 0x01;
    assert!(matches!(
        auction.seller_call(declare(tampered)),
        Err(AuctionError::SettlementProofRejected(_))
    ));

    assert_eq!(auction.record().phase, AuctionPhase::Ended);

    auction.seller_call(declare(settlement)).unwrap();
    assert_eq!(auction.record().phase, AuctionPhase::WinnerDeclared);
}

#[tokio::test]
async fn test_undecryptable_reveal_is_excluded() {
    let auction = Auction::create("auction-3");
    let (alice, bob, mallory) = (bidder("alice"), bidder("bob"), bidder("mallory"));

    let (a, a_id) = auction.bid(&alice, 70);
    let (b, b_id) = auction.bid(&bob, 40);
    let (m, m_id) = auction.bid(&mallory, 1_000);
    let (_, silent_id) = auction.bid(&bidder("dave"), 5_000);
    auction.close();
    auction.reveal(&alice, &a, &a_id);
    auction.reveal(&bob, &b, &b_id);

    // Sealed to a key the auctioneer does not hold; the ledger cannot tell.
    let stranger = AuctioneerKeypair::generate(&mut OsRng).unwrap();
    let reveal = m.reveal(m_id.clone(), &stranger.public_key(), &mut OsRng).unwrap();
    auction.call(&mallory, reveal.reveal_call("mallory")).unwrap();
    auction.end();

    let settlement = auction.service().settle(&auction.record()).await.unwrap();
    assert_eq!(settlement.winner, a_id);
    assert!(!settlement.included.contains(&m_id));
    assert!(!settlement.included.contains(&silent_id));
    assert_eq!(settlement.excluded.len(), 1);
    assert_eq!(settlement.excluded[0].bid_id, m_id);

    auction
        .seller_call(AuctionCall::DeclareWinner {
            auction_id: auction.id.clone(),
            settlement,
        })
        .unwrap();

    // The excluded reveal stays visible.
    let result = auction.reader(&bob).result(&auction.id).unwrap();
    assert_eq!(
        result,
        Some(AuctionResult {
            winner: a_id.clone(),
            included: {
                let mut ids = vec![a_id, b_id];
                ids.sort();
                ids
            },
            excluded: vec![m_id],
        })
    );
}

#[tokio::test]
async fn test_declare_winner_requires_every_revealed_bid() {
    let auction = Auction::create("auction-7");
    let (alice, bob) = (bidder("alice"), bidder("bob"));

    let (a, a_id) = auction.bid(&alice, 10);
    let (b, b_id) = auction.bid(&bob, 20);
    auction.close();
    auction.reveal(&alice, &a, &a_id);
    auction.reveal(&bob, &b, &b_id);
    auction.end();

    // A valid proof over a record with the top bid removed.
    let mut trimmed = auction.record();
    trimmed.bids.remove(&b_id);
    let without_top = auction.service().settle(&trimmed).await.unwrap();
    assert_eq!(without_top.winner, a_id);

    let declare = |settlement| AuctionCall::DeclareWinner {
        auction_id: auction.id.clone(),
        settlement,
    };
    assert!(matches!(
        auction.seller_call(declare(without_top.clone())),
        Err(AuctionError::InvalidSettlement(_))
    ));

    // Claiming the top bid does not open is checked against its payload.
    let record = auction.record();
    let payload = &record.bids[&b_id].revealed.as_ref().unwrap().payload;
    let disclosure = auction.auctioneer.disclose(payload, &mut OsRng).unwrap();
    let mut excluding_top = without_top;
    excluding_top.excluded.push(ExcludedBid {
        bid_id: b_id.clone(),
        disclosure: disclosure.to_record(),
    });
    assert_eq!(
        auction.seller_call(declare(excluding_top)).unwrap_err(),
        AuctionError::InvalidExclusion(b_id.clone())
    );
    assert_eq!(auction.record().phase, AuctionPhase::Ended);

    let settlement = auction.service().settle(&auction.record()).await.unwrap();
    auction.seller_call(declare(settlement)).unwrap();
    assert_eq!(auction.record().winner(), Some(&b_id));
}

#[test]
fn test_copied_commitment_rejected() {
    let auction = Auction::create("auction-8");
    let other = Auction::create("auction-9");
    let (alice, mallory) = (bidder("alice"), bidder("mallory"));

    let (a, a_id) = auction.bid(&alice, 50);
    let copy = |auction_id: &str| AuctionCall::SubmitCommitment {
        auction_id: auction_id.to_string(),
        commitment: a.commitment.clone(),
        proof: a.proof.clone(),
    };

    // Same auction: the commitment is already taken.
    assert_eq!(
        auction.call(&mallory, copy(&auction.id)).unwrap_err(),
        AuctionError::DuplicateCommitment
    );
    // Another auction: the proof is bound to the first one.
    assert_eq!(
        other.call(&mallory, copy(&other.id)).unwrap_err(),
        AuctionError::InvalidProof
    );

    // Alice's reveal does not carry over to a bid id Mallory owns.
    let (_, m_id) = auction.bid(&mallory, 1);
    auction.close();
    let pk = auction.auctioneer.public_key();
    let reveal = a.reveal(a_id.clone(), &pk, &mut OsRng).unwrap();
    let replayed = AuctionCall::RevealBid {
        auction_id: auction.id.clone(),
        bid_id: m_id,
        bidder: "mallory".to_string(),
        payload: reveal.payload.clone(),
        proof: reveal.proof.clone(),
    };
    assert_eq!(
        auction.call(&mallory, replayed).unwrap_err(),
        AuctionError::InvalidProof
    );
    auction.call(&alice, reveal.reveal_call("alice")).unwrap();
    assert_eq!(auction.record().bids.len(), 2);
}

#[tokio::test]
async fn test_capacity_exceeded_before_proving() {
    let auction = Auction::create("auction-4");
    let bidders: Vec<_> = (0..=CAPACITY).map(|i| bidder(&format!("bidder-{}", i))).collect();

    let bids: Vec<_> = bidders
        .iter()
        .enumerate()
        .map(|(i, who)| auction.bid(who, 100 + i as i64))
        .collect();
    auction.close();
    for (who, (bid, id)) in bidders.iter().zip(&bids) {
        auction.reveal(who, bid, id);
    }
    auction.end();

    let result = auction.service().settle(&auction.record()).await;
    assert!(matches!(
        result,
        Err(SettlementError::Circuit(CircuitError::CapacityExceeded { bids, capacity }))
            if bids == CAPACITY + 1 && capacity == CAPACITY
    ));
}

#[test]
fn test_end_requires_revealed_bid() {
    let auction = Auction::create("auction-5");
    auction.bid(&bidder("alice"), 1);
    auction.close();

    let result = auction.seller_call(AuctionCall::EndAuction {
        auction_id: auction.id.clone(),
    });
    assert_eq!(result.unwrap_err(), AuctionError::NoRevealedBids);
    assert_eq!(auction.record().phase, AuctionPhase::Closed);
}

#[test]
fn test_settlement_requires_ended_auction() {
    let auction = Auction::create("auction-6");
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let result = runtime.block_on(auction.service().settle(&auction.record()));
    assert!(matches!(result, Err(SettlementError::NotEnded { .. })));
}
