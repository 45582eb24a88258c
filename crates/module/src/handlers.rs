//! Call handlers for the auction module.
//!
//! Every handler reads the auction record, checks caller and phase, and
//! writes the record back once. A handler that returns an error has written
//! nothing the ledger will keep.

use std::collections::BTreeSet;

use tracing::{debug, info};

use auction_circuit::{SettlementPublicInputs, SettlementVerifier};
use auction_crypto::{
    check_commit, commit_message, decode_point, ephemeral_key, open_disclosed, reveal_message,
    verify_knowledge_bytes, CryptoError, KeyDisclosure,
};
use auction_types::{
    circuit_io::SettlementStatement, AuctionPhase, AuctionRecord, BidCommitment, BidId, BidRecord,
    CompressedPoint, EncryptedPayload, ExcludedBid, KnowledgeProofBytes, RevealedBid, SchemeId,
    SettlementRecord,
};

use crate::error::AuctionError;
use crate::ledger::LedgerContext;
use crate::state::{auction_exists, load_auction, store_auction};

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

fn require_phase(record: &AuctionRecord, expected: AuctionPhase) -> HandlerResult<()> {
    if record.phase != expected {
        return Err(AuctionError::InvalidPhase {
            expected,
            got: record.phase,
        });
    }
    Ok(())
}

fn require_seller<L: LedgerContext + ?Sized>(ctx: &L, record: &AuctionRecord) -> HandlerResult<()> {
    if ctx.caller_identity().id != record.seller {
        return Err(AuctionError::NotAuthorized);
    }
    Ok(())
}

/// Handle CreateAuction call.
///
/// The caller becomes the seller, and writes to the auction require
/// endorsement by the seller's organization from now on.
pub fn handle_create_auction<L: LedgerContext + ?Sized>(
    ctx: &mut L,
    auction_id: &str,
    item: &str,
    auctioneer_pk: CompressedPoint,
) -> HandlerResult<()> {
    decode_point(&auctioneer_pk.0).map_err(|_| AuctionError::InvalidAuctioneerKey)?;
    if auction_exists(ctx, auction_id)? {
        return Err(AuctionError::AuctionExists(auction_id.to_string()));
    }

    let caller = ctx.caller_identity().clone();
    let record = AuctionRecord::new(
        auction_id,
        item,
        caller.id.clone(),
        caller.org.clone(),
        auctioneer_pk,
    );

    store_auction(ctx, &record)?;
    ctx.set_endorsement_policy(auction_id, &caller.org)?;

    info!(auction_id, seller = %caller.id, org = %caller.org, "auction created");
    Ok(())
}

/// Handle SubmitCommitment call.
///
/// The commitment is accepted only with a proof of knowledge of its opening
/// bound to this auction, and only once per auction. Returns the bid id,
/// which is the transaction id.
pub fn handle_submit_commitment<L: LedgerContext + ?Sized>(
    ctx: &mut L,
    auction_id: &str,
    commitment: BidCommitment,
    proof: KnowledgeProofBytes,
) -> HandlerResult<BidId> {
    if commitment.scheme != SchemeId::Pedersen {
        return Err(AuctionError::UnsupportedScheme(commitment.scheme));
    }
    decode_point(&commitment.bytes).map_err(|_| AuctionError::InvalidCommitment)?;
    if !verify_knowledge_bytes(&proof.0, &commitment.bytes, &commit_message(auction_id)) {
        return Err(AuctionError::InvalidProof);
    }

    let mut record = load_auction(ctx, auction_id)?;
    require_phase(&record, AuctionPhase::Open)?;
    if record.bids.values().any(|bid| bid.commitment == commitment) {
        return Err(AuctionError::DuplicateCommitment);
    }

    let bid_id = ctx.transaction_id().to_string();
    record.bids.insert(
        bid_id.clone(),
        BidRecord {
            commitment,
            commit_proof: proof,
            revealed: None,
        },
    );
    store_auction(ctx, &record)?;

    debug!(auction_id, bid_id = %bid_id, bids = record.bids.len(), "commitment accepted");
    Ok(bid_id)
}

/// Handle RevealBid call.
///
/// The proof must be bound to this auction, this bid id and the encrypted
/// payload, so a proof lifted from another reveal or from the commitment
/// itself is rejected.
pub fn handle_reveal_bid<L: LedgerContext + ?Sized>(
    ctx: &mut L,
    auction_id: &str,
    bid_id: &str,
    bidder: String,
    payload: EncryptedPayload,
    proof: KnowledgeProofBytes,
) -> HandlerResult<()> {
    ephemeral_key(&payload).map_err(|_| AuctionError::InvalidPayload)?;

    let mut record = load_auction(ctx, auction_id)?;
    require_phase(&record, AuctionPhase::Closed)?;

    let bid = record
        .bids
        .get_mut(bid_id)
        .ok_or_else(|| AuctionError::BidNotFound(bid_id.to_string()))?;
    if bid.revealed.is_some() {
        return Err(AuctionError::AlreadyRevealed(bid_id.to_string()));
    }
    let message = reveal_message(auction_id, bid_id, &payload.0);
    if !verify_knowledge_bytes(&proof.0, &bid.commitment.bytes, &message) {
        return Err(AuctionError::InvalidProof);
    }

    bid.revealed = Some(RevealedBid {
        bidder,
        payload,
        proof,
    });
    store_auction(ctx, &record)?;

    debug!(auction_id, bid_id, revealed = record.revealed_count(), "bid revealed");
    Ok(())
}

/// Handle CloseAuction call: stop accepting commitments, start reveals.
pub fn handle_close_auction<L: LedgerContext + ?Sized>(
    ctx: &mut L,
    auction_id: &str,
) -> HandlerResult<()> {
    let mut record = load_auction(ctx, auction_id)?;
    require_seller(ctx, &record)?;
    require_phase(&record, AuctionPhase::Open)?;

    record.phase = AuctionPhase::Closed;
    store_auction(ctx, &record)?;

    info!(auction_id, bids = record.bids.len(), "auction closed");
    Ok(())
}

/// Handle EndAuction call: stop accepting reveals.
///
/// At least one bid must have been revealed.
pub fn handle_end_auction<L: LedgerContext + ?Sized>(
    ctx: &mut L,
    auction_id: &str,
) -> HandlerResult<()> {
    let mut record = load_auction(ctx, auction_id)?;
    require_seller(ctx, &record)?;
    require_phase(&record, AuctionPhase::Closed)?;
    if record.revealed_count() == 0 {
        return Err(AuctionError::NoRevealedBids);
    }

    record.phase = AuctionPhase::Ended;
    store_auction(ctx, &record)?;

    info!(auction_id, revealed = record.revealed_count(), "auction ended");
    Ok(())
}

/// A revealed bid listed in a settlement.
fn settled_bid<'a>(
    record: &'a AuctionRecord,
    seen: &mut BTreeSet<&'a str>,
    bid_id: &'a str,
) -> HandlerResult<(&'a BidRecord, &'a RevealedBid)> {
    if !seen.insert(bid_id) {
        return Err(AuctionError::InvalidSettlement(format!(
            "bid {} listed twice",
            bid_id
        )));
    }
    let bid = record
        .bids
        .get(bid_id)
        .ok_or_else(|| AuctionError::BidNotFound(bid_id.to_string()))?;
    let revealed = bid.revealed.as_ref().ok_or_else(|| {
        AuctionError::InvalidSettlement(format!("bid {} was never revealed", bid_id))
    })?;
    Ok((bid, revealed))
}

/// An exclusion stands if the disclosed box key is the auctioneer's and the
/// payload does not open to the bid's commitment under it.
fn check_exclusion(
    record: &AuctionRecord,
    excluded: &ExcludedBid,
    bid: &BidRecord,
    revealed: &RevealedBid,
) -> HandlerResult<()> {
    let rejected = || AuctionError::InvalidExclusion(excluded.bid_id.clone());

    let disclosure = KeyDisclosure::from_record(&excluded.disclosure).map_err(|_| rejected())?;
    match open_disclosed(&disclosure, &revealed.payload, &record.auctioneer_pk) {
        Ok(opening) if check_commit(opening.value, &opening.randomness, &bid.commitment.bytes) => {
            Err(rejected())
        }
        Ok(_) | Err(CryptoError::DecryptionFailure) => Ok(()),
        Err(_) => Err(rejected()),
    }
}

/// Byte-level statement of a settlement against the stored record.
///
/// Every revealed bid must be listed exactly once: included in the proof,
/// or excluded with a disclosure showing it does not open.
fn settlement_statement(
    record: &AuctionRecord,
    settlement: &SettlementRecord,
) -> HandlerResult<SettlementStatement> {
    if settlement.included.is_empty() {
        return Err(AuctionError::InvalidSettlement("no bids included".to_string()));
    }

    let mut seen = BTreeSet::new();
    let mut commitments = Vec::with_capacity(settlement.included.len());
    for bid_id in &settlement.included {
        let (bid, _) = settled_bid(record, &mut seen, bid_id)?;
        let point = bid
            .commitment
            .pedersen_point()
            .ok_or(AuctionError::UnsupportedScheme(bid.commitment.scheme))?;
        commitments.push(point);
    }
    if !seen.contains(settlement.winner.as_str()) {
        return Err(AuctionError::InvalidSettlement(format!(
            "winner {} is not among the included bids",
            settlement.winner
        )));
    }

    for excluded in &settlement.excluded {
        let (bid, revealed) = settled_bid(record, &mut seen, &excluded.bid_id)?;
        check_exclusion(record, excluded, bid, revealed)?;
    }

    let revealed = record.revealed_count();
    if seen.len() != revealed {
        return Err(AuctionError::InvalidSettlement(format!(
            "settlement accounts for {} of {} revealed bids",
            seen.len(),
            revealed
        )));
    }

    let winning_commitment = record
        .bids
        .get(&settlement.winner)
        .and_then(|bid| bid.commitment.pedersen_point())
        .ok_or_else(|| AuctionError::BidNotFound(settlement.winner.clone()))?;

    Ok(SettlementStatement {
        commitments,
        winning_commitment,
    })
}

/// Handle DeclareWinner call.
///
/// The settlement proof must verify against the commitments of the included
/// bids, in the given order, and the winner's commitment. Revealed bids
/// outside the proof must each carry a valid exclusion.
pub fn handle_declare_winner<L: LedgerContext + ?Sized>(
    ctx: &mut L,
    verifier: &SettlementVerifier,
    auction_id: &str,
    settlement: SettlementRecord,
) -> HandlerResult<()> {
    let mut record = load_auction(ctx, auction_id)?;
    require_seller(ctx, &record)?;
    require_phase(&record, AuctionPhase::Ended)?;

    let statement = settlement_statement(&record, &settlement)?;
    let inputs = SettlementPublicInputs::from_statement(verifier.capacity(), &statement)
        .map_err(AuctionError::SettlementProofRejected)?;
    verifier
        .verify(&settlement.proof, &inputs)
        .map_err(AuctionError::SettlementProofRejected)?;

    info!(
        auction_id,
        winner = %settlement.winner,
        included = settlement.included.len(),
        excluded = settlement.excluded.len(),
        "winner declared"
    );

    record.settlement = Some(settlement);
    record.phase = AuctionPhase::WinnerDeclared;
    store_auction(ctx, &record)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{CallerIdentity, MemoryLedger};
    use auction_crypto::{commit, encrypt, prove_knowledge, AuctioneerKeypair, Fr};
    use auction_types::SettlementProof;
    use rand::rngs::OsRng;

    fn seller() -> CallerIdentity {
        CallerIdentity::new("seller", "Org1MSP")
    }

    fn bidder() -> CallerIdentity {
        CallerIdentity::new("bidder", "Org2MSP")
    }

    struct Bid {
        value: u32,
        randomness: Fr,
        commitment: BidCommitment,
        proof: KnowledgeProofBytes,
    }

    fn make_bid_for(auction_id: &str, value: u32) -> Bid {
        let (commitment, randomness) = commit(value, &mut OsRng).unwrap();
        let message = commit_message(auction_id);
        let proof =
            prove_knowledge(value, &randomness, &commitment.to_bytes().0, &message, &mut OsRng)
                .unwrap();
        Bid {
            value,
            randomness,
            commitment: commitment.to_record(),
            proof: proof.to_record(),
        }
    }

    fn make_bid(value: u32) -> Bid {
        make_bid_for("a1", value)
    }

    fn reveal_parts(
        bid: &Bid,
        bid_id: &str,
        pk: &CompressedPoint,
    ) -> (EncryptedPayload, KnowledgeProofBytes) {
        let payload = encrypt(bid.value, &bid.randomness, pk, &mut OsRng).unwrap();
        let proof = prove_knowledge(
            bid.value,
            &bid.randomness,
            &bid.commitment.bytes,
            &reveal_message("a1", bid_id, &payload.0),
            &mut OsRng,
        )
        .unwrap();
        (payload, proof.to_record())
    }

    fn setup() -> (MemoryLedger, AuctioneerKeypair) {
        let ledger = MemoryLedger::new(["Org1MSP", "Org2MSP"]);
        let keypair = AuctioneerKeypair::generate(&mut OsRng).unwrap();
        let pk = keypair.public_key();
        ledger
            .submit(&seller(), |tx| handle_create_auction(tx, "a1", "vase", pk))
            .unwrap();
        (ledger, keypair)
    }

    fn submit(ledger: &MemoryLedger, bid: &Bid) -> HandlerResult<BidId> {
        ledger
            .submit(&bidder(), |tx| {
                handle_submit_commitment(tx, "a1", bid.commitment.clone(), bid.proof.clone())
            })
            .map(|(id, _)| id)
    }

    fn reveal(
        ledger: &MemoryLedger,
        bid_id: &str,
        payload: &EncryptedPayload,
        proof: &KnowledgeProofBytes,
    ) -> HandlerResult<()> {
        ledger
            .submit(&bidder(), |tx| {
                handle_reveal_bid(tx, "a1", bid_id, "bob".into(), payload.clone(), proof.clone())
            })
            .map(|(out, _)| out)
    }

    fn close(ledger: &MemoryLedger) {
        ledger
            .submit(&seller(), |tx| handle_close_auction(tx, "a1"))
            .unwrap();
    }

    fn load(ledger: &MemoryLedger) -> AuctionRecord {
        ledger.evaluate(&seller(), |tx| load_auction(tx, "a1")).unwrap()
    }

    #[test]
    fn test_create_auction() {
        let (ledger, keypair) = setup();
        let record = load(&ledger);
        assert_eq!(record.seller, "seller");
        assert_eq!(record.seller_org, "Org1MSP");
        assert_eq!(record.auctioneer_pk, keypair.public_key());
        assert_eq!(record.phase, AuctionPhase::Open);
        assert_eq!(ledger.endorsement_policy("a1"), Some("Org1MSP".to_string()));

        let again = ledger.submit(&seller(), |tx| {
            handle_create_auction(tx, "a1", "vase", keypair.public_key())
        });
        assert_eq!(again.unwrap_err(), AuctionError::AuctionExists("a1".to_string()));
    }

    #[test]
    fn test_create_rejects_bad_key() {
        let ledger = MemoryLedger::new(["Org1MSP"]);
        let result = ledger.submit(&seller(), |tx| {
            handle_create_auction(tx, "a1", "vase", CompressedPoint([0xff; 32]))
        });
        assert_eq!(result.unwrap_err(), AuctionError::InvalidAuctioneerKey);
    }

    #[test]
    fn test_submit_commitment_uses_tx_id() {
        let (ledger, _) = setup();
        let bid = make_bid(10);
        let (bid_id, tx_id) = ledger
            .submit(&bidder(), |tx| {
                handle_submit_commitment(tx, "a1", bid.commitment.clone(), bid.proof.clone())
            })
            .unwrap();
        assert_eq!(bid_id, tx_id);

        let record = load(&ledger);
        assert_eq!(record.bids[&bid_id].commitment, bid.commitment);
        assert!(record.bids[&bid_id].revealed.is_none());
    }

    #[test]
    fn test_submit_commitment_rejections() {
        let (ledger, _) = setup();
        let bid = make_bid(10);

        // A proof for another commitment.
        let other = make_bid(10);
        let forged = Bid {
            proof: other.proof.clone(),
            ..make_bid(10)
        };
        assert_eq!(submit(&ledger, &forged), Err(AuctionError::InvalidProof));

        // A proof bound to another auction.
        let elsewhere = make_bid_for("a2", 10);
        assert_eq!(submit(&ledger, &elsewhere), Err(AuctionError::InvalidProof));

        let legacy = Bid {
            commitment: BidCommitment {
                scheme: SchemeId::LegacySha256,
                bytes: bid.commitment.bytes,
            },
            ..make_bid(10)
        };
        assert_eq!(
            submit(&ledger, &legacy),
            Err(AuctionError::UnsupportedScheme(SchemeId::LegacySha256))
        );

        close(&ledger);
        assert!(matches!(
            submit(&ledger, &bid),
            Err(AuctionError::InvalidPhase {
                expected: AuctionPhase::Open,
                got: AuctionPhase::Closed
            })
        ));
        assert!(load(&ledger).bids.is_empty());
    }

    #[test]
    fn test_copied_commitment_rejected() {
        let (ledger, _) = setup();
        let bid = make_bid(10);
        submit(&ledger, &bid).unwrap();

        // Resubmitting the same commitment and proof from the ledger.
        assert_eq!(submit(&ledger, &bid), Err(AuctionError::DuplicateCommitment));
        assert_eq!(load(&ledger).bids.len(), 1);
    }

    #[test]
    fn test_reveal_bid() {
        let (ledger, keypair) = setup();
        let bid = make_bid(77);
        let bid_id = submit(&ledger, &bid).unwrap();
        let (payload, proof) = reveal_parts(&bid, &bid_id, &keypair.public_key());

        // Reveals wait for the auction to close.
        let early = reveal(&ledger, &bid_id, &payload, &proof);
        assert!(matches!(early, Err(AuctionError::InvalidPhase { .. })));

        close(&ledger);

        // The commit-time proof is bound to the auction, not the payload.
        let replayed = reveal(&ledger, &bid_id, &payload, &bid.proof);
        assert_eq!(replayed, Err(AuctionError::InvalidProof));

        reveal(&ledger, &bid_id, &payload, &proof).unwrap();

        let record = load(&ledger);
        let revealed = record.bids[&bid_id].revealed.as_ref().unwrap();
        assert_eq!(revealed.bidder, "bob");
        assert_eq!(keypair.open(&revealed.payload).unwrap().value, 77);

        let twice = reveal(&ledger, &bid_id, &payload, &proof);
        assert_eq!(twice, Err(AuctionError::AlreadyRevealed(bid_id.clone())));
    }

    #[test]
    fn test_reveal_bound_to_bid_id() {
        let (ledger, keypair) = setup();
        let bid = make_bid(12);
        let bid_id = submit(&ledger, &bid).unwrap();
        close(&ledger);

        let (payload, proof) = reveal_parts(&bid, "another-bid", &keypair.public_key());
        assert_eq!(
            reveal(&ledger, &bid_id, &payload, &proof),
            Err(AuctionError::InvalidProof)
        );
        assert!(load(&ledger).bids[&bid_id].revealed.is_none());
    }

    #[test]
    fn test_reveal_rejects_bad_payload_and_unknown_bid() {
        let (ledger, keypair) = setup();
        let bid = make_bid(5);
        let bid_id = submit(&ledger, &bid).unwrap();
        close(&ledger);
        let (payload, proof) = reveal_parts(&bid, &bid_id, &keypair.public_key());

        let short = reveal(&ledger, &bid_id, &EncryptedPayload(vec![0; 10]), &proof);
        assert_eq!(short, Err(AuctionError::InvalidPayload));

        // The ephemeral key must be a valid point.
        let mut bad_point = payload.clone();
        bad_point.0[..32].copy_from_slice(&[0xff; 32]);
        assert_eq!(
            reveal(&ledger, &bid_id, &bad_point, &proof),
            Err(AuctionError::InvalidPayload)
        );

        let unknown = reveal(&ledger, "missing", &payload, &proof);
        assert_eq!(unknown, Err(AuctionError::BidNotFound("missing".to_string())));
    }

    #[test]
    fn test_phase_transitions_seller_only() {
        let (ledger, _) = setup();

        let by_bidder = ledger.submit(&bidder(), |tx| handle_close_auction(tx, "a1"));
        assert_eq!(by_bidder.unwrap_err(), AuctionError::NotAuthorized);

        close(&ledger);
        let closed_twice = ledger.submit(&seller(), |tx| handle_close_auction(tx, "a1"));
        assert!(matches!(closed_twice, Err(AuctionError::InvalidPhase { .. })));

        // Ending needs a revealed bid.
        let empty = ledger.submit(&seller(), |tx| handle_end_auction(tx, "a1"));
        assert_eq!(empty.unwrap_err(), AuctionError::NoRevealedBids);
        assert_eq!(load(&ledger).phase, AuctionPhase::Closed);
    }

    #[test]
    fn test_end_auction_with_revealed_bid() {
        let (ledger, keypair) = setup();
        let bid = make_bid(9);
        let bid_id = submit(&ledger, &bid).unwrap();
        close(&ledger);
        let (payload, proof) = reveal_parts(&bid, &bid_id, &keypair.public_key());
        reveal(&ledger, &bid_id, &payload, &proof).unwrap();

        let by_bidder = ledger.submit(&bidder(), |tx| handle_end_auction(tx, "a1"));
        assert_eq!(by_bidder.unwrap_err(), AuctionError::NotAuthorized);

        ledger
            .submit(&seller(), |tx| handle_end_auction(tx, "a1"))
            .unwrap();
        assert_eq!(load(&ledger).phase, AuctionPhase::Ended);
    }

    fn settlement(winner: &str, included: &[&str], excluded: Vec<ExcludedBid>) -> SettlementRecord {
        SettlementRecord {
            winner: winner.to_string(),
            included: included.iter().map(|id| id.to_string()).collect(),
            excluded,
            proof: SettlementProof {
                proof_bytes: vec![],
                capacity: 1,
                vkey_hash: [0u8; 32],
            },
        }
    }

    #[test]
    fn test_settlement_statement_checks() {
        let (ledger, keypair) = setup();
        let stranger = AuctioneerKeypair::generate(&mut OsRng).unwrap();
        let (a, b, c, d) = (make_bid(1), make_bid(2), make_bid(3), make_bid(4));
        let ids: Vec<BidId> = [&a, &b, &c, &d]
            .iter()
            .map(|bid| submit(&ledger, bid).unwrap())
            .collect();
        close(&ledger);

        let pk = keypair.public_key();
        for (bid, id, key) in [(&a, &ids[0], &pk), (&b, &ids[1], &pk)] {
            let (payload, proof) = reveal_parts(bid, id, key);
            reveal(&ledger, id, &payload, &proof).unwrap();
        }
        // Sealed to a key the auctioneer does not hold; c stays unrevealed.
        let (payload, proof) = reveal_parts(&d, &ids[3], &stranger.public_key());
        reveal(&ledger, &ids[3], &payload, &proof).unwrap();

        let record = load(&ledger);
        let (ai, bi, ci, di) = (ids[0].as_str(), ids[1].as_str(), ids[2].as_str(), ids[3].as_str());
        let exclude = |id: &str| {
            let payload = &record.bids[id].revealed.as_ref().unwrap().payload;
            ExcludedBid {
                bid_id: id.to_string(),
                disclosure: keypair.disclose(payload, &mut OsRng).unwrap().to_record(),
            }
        };

        let ok = settlement_statement(&record, &settlement(ai, &[ai, bi], vec![exclude(di)]))
            .unwrap();
        assert_eq!(ok.commitments.len(), 2);
        assert_eq!(ok.winning_commitment.0, a.commitment.bytes);

        let invalid = |s: SettlementRecord| {
            matches!(
                settlement_statement(&record, &s),
                Err(AuctionError::InvalidSettlement(_))
            )
        };
        // A revealed bid left out entirely.
        assert!(invalid(settlement(ai, &[ai, bi], vec![])));
        assert!(invalid(settlement(ai, &[ai], vec![exclude(di)])));
        // Unrevealed bid.
        assert!(invalid(settlement(ai, &[ai, bi, ci], vec![exclude(di)])));
        // Duplicate lane, or listed on both sides.
        assert!(invalid(settlement(ai, &[ai, ai, bi], vec![exclude(di)])));
        assert!(invalid(settlement(ai, &[ai, bi], vec![exclude(bi), exclude(di)])));
        // Winner outside the settled set.
        assert!(invalid(settlement(di, &[ai, bi], vec![exclude(di)])));
        assert!(invalid(settlement(ai, &[], vec![])));

        // A bid that opens cannot be excluded.
        assert_eq!(
            settlement_statement(&record, &settlement(ai, &[ai], vec![exclude(bi), exclude(di)])),
            Err(AuctionError::InvalidExclusion(bi.to_string()))
        );

        // A disclosure made for another payload does not carry over.
        let borrowed = ExcludedBid {
            bid_id: di.to_string(),
            disclosure: exclude(bi).disclosure,
        };
        assert_eq!(
            settlement_statement(&record, &settlement(ai, &[ai, bi], vec![borrowed])),
            Err(AuctionError::InvalidExclusion(di.to_string()))
        );
    }
}
