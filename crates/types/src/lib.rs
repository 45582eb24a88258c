//! Core type definitions for sealed-bid auctions.
//!
//! This crate provides the byte-level data structures shared across the
//! auction system: encoded commitments and proofs, bid records, the auction
//! record stored by the ledger, and the settlement proof envelope. Curve
//! arithmetic lives in `auction-crypto`; everything here is plain data.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::collections::BTreeMap;

pub mod circuit_io;

/// Length of an encoded commitment.
pub const COMMITMENT_LEN: usize = 32;

/// Length of an encoded proof of knowledge of an opening.
pub const KNOWLEDGE_PROOF_LEN: usize = 96;

/// Length of an encoded key disclosure: shared point ‖ challenge ‖ response.
pub const DISCLOSURE_LEN: usize = 96;

// =========================
// CRYPTOGRAPHIC PRIMITIVES
// =========================

/// Compressed Jubjub point (32 bytes)
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct CompressedPoint(pub [u8; 32]);

impl CompressedPoint {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Identifier of the scheme a commitment was produced with.
///
/// Persisted next to every commitment so that records never rely on an
/// implicit scheme.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub enum SchemeId {
    /// SHA-256 over 4 bytes of randomness and the little-endian value
    LegacySha256,
    /// Pedersen commitment g^value · h^randomness on Jubjub
    Pedersen,
}

/// A commitment to a bid value as stored on the ledger
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BidCommitment {
    pub scheme: SchemeId,
    pub bytes: [u8; COMMITMENT_LEN],
}

impl BidCommitment {
    /// Wrap a compressed Pedersen commitment point.
    pub fn pedersen(point: CompressedPoint) -> Self {
        Self {
            scheme: SchemeId::Pedersen,
            bytes: point.0,
        }
    }

    /// The commitment point, if this is a Pedersen commitment.
    pub fn pedersen_point(&self) -> Option<CompressedPoint> {
        match self.scheme {
            SchemeId::Pedersen => Some(CompressedPoint(self.bytes)),
            SchemeId::LegacySha256 => None,
        }
    }
}

/// Encoded proof of knowledge of a commitment opening: t ‖ s1 ‖ s2
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct KnowledgeProofBytes(#[serde_as(as = "[_; 96]")] pub [u8; KNOWLEDGE_PROOF_LEN]);

impl KnowledgeProofBytes {
    /// Copy from a slice, `None` unless it is exactly 96 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; KNOWLEDGE_PROOF_LEN] = bytes.try_into().ok()?;
        Some(Self(array))
    }
}

/// Disclosed sealed-box shared point with a proof that it was derived from
/// the auctioneer's key
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct KeyDisclosureBytes(#[serde_as(as = "[_; 96]")] pub [u8; DISCLOSURE_LEN]);

/// Sealed-box ciphertext carrying a bid opening for the auctioneer
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct EncryptedPayload(pub Vec<u8>);

// =========================
// AUCTION TYPES
// =========================

/// Bid identifier: the id of the transaction that submitted the commitment
pub type BidId = String;

/// Opaque identity of a ledger participant
pub type ParticipantId = String;

/// Auction lifecycle phase
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum AuctionPhase {
    /// Accepting commitments
    Open,
    /// Commitments locked, bidders reveal encrypted openings
    Closed,
    /// Reveals locked, awaiting settlement
    Ended,
    /// Winner declared with a settlement proof
    WinnerDeclared,
}

impl AuctionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionPhase::Open => "open",
            AuctionPhase::Closed => "closed",
            AuctionPhase::Ended => "ended",
            AuctionPhase::WinnerDeclared => "winner_declared",
        }
    }
}

/// The revealed part of a bid: an encrypted opening and a proof bound to it
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RevealedBid {
    pub bidder: String,
    pub payload: EncryptedPayload,
    pub proof: KnowledgeProofBytes,
}

/// A bid as stored in the auction record
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BidRecord {
    pub commitment: BidCommitment,
    /// Proof of knowledge presented with the commitment, bound to the auction id
    pub commit_proof: KnowledgeProofBytes,
    pub revealed: Option<RevealedBid>,
}

/// Groth16 proof of a correct settlement
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SettlementProof {
    /// Serialized Groth16 proof
    pub proof_bytes: Vec<u8>,

    /// Circuit capacity the proof was produced for
    pub capacity: u32,

    /// SHA-256 of the verifying key the proof is meant for
    pub vkey_hash: [u8; 32],
}

/// A revealed bid left out of a settlement, with the evidence that its
/// payload does not open the commitment
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ExcludedBid {
    pub bid_id: BidId,
    pub disclosure: KeyDisclosureBytes,
}

/// Settlement published with the winner declaration
///
/// Every revealed bid appears exactly once, either in `included` or in
/// `excluded`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub winner: BidId,
    /// Bids covered by the proof, in lane order
    pub included: Vec<BidId>,
    /// Revealed bids that do not open to their commitment
    pub excluded: Vec<ExcludedBid>,
    pub proof: SettlementProof,
}

/// Full auction record, owned by the ledger
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionRecord {
    pub auction_id: String,
    pub item: String,
    pub seller: ParticipantId,
    pub seller_org: String,

    /// Public key bids are encrypted to at reveal time
    pub auctioneer_pk: CompressedPoint,

    pub phase: AuctionPhase,
    pub bids: BTreeMap<BidId, BidRecord>,
    pub settlement: Option<SettlementRecord>,
}

impl AuctionRecord {
    /// Create an open auction with no bids.
    pub fn new(
        auction_id: impl Into<String>,
        item: impl Into<String>,
        seller: ParticipantId,
        seller_org: impl Into<String>,
        auctioneer_pk: CompressedPoint,
    ) -> Self {
        Self {
            auction_id: auction_id.into(),
            item: item.into(),
            seller,
            seller_org: seller_org.into(),
            auctioneer_pk,
            phase: AuctionPhase::Open,
            bids: BTreeMap::new(),
            settlement: None,
        }
    }

    /// Iterate revealed bids in bid id order.
    pub fn revealed_bids(&self) -> impl Iterator<Item = (&BidId, &BidRecord, &RevealedBid)> {
        self.bids
            .iter()
            .filter_map(|(id, bid)| bid.revealed.as_ref().map(|r| (id, bid, r)))
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed_bids().count()
    }

    /// The declared winner, once settled.
    pub fn winner(&self) -> Option<&BidId> {
        self.settlement.as_ref().map(|s| &s.winner)
    }
}

// =========================
// HELPER FUNCTIONS
// =========================

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    Sha256::digest(data).into()
}
