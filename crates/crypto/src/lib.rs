//! Cryptographic primitives for sealed-bid auctions.
//!
//! All group operations happen in the prime-order subgroup of Jubjub, the
//! twisted Edwards curve defined over the BLS12-381 scalar field. The
//! settlement circuit re-derives commitments in that field natively.
//!
//! # Overview
//!
//! 1. **Commit**: a bidder commits to a value with a Pedersen commitment
//!    C = g^value · h^randomness and proves knowledge of the opening.
//!
//! 2. **Reveal**: the opening is sealed to the auctioneer's public key and a
//!    fresh proof of knowledge is bound to the sealed payload, so the proof
//!    cannot be replayed against another payload.
//!
//! 3. **Settle**: the auctioneer opens every payload and proves in zero
//!    knowledge that the declared winner holds the maximum value (see the
//!    `auction-circuit` crate). A payload that does not open is excluded
//!    with a verifiable disclosure of its box key.

pub mod disclosure;
pub mod error;
pub mod pedersen;
pub mod primitives;
pub mod scheme;
pub mod sealed;
pub mod sigma;

pub use error::CryptoError;
pub use primitives::{decode_point, encode_point, generators, random_nonzero_scalar, Generators};
pub use pedersen::{
    check_commit, commit, commit_with_randomness, value_from_i64, Commitment, Opening,
};
pub use scheme::{CommitmentScheme, LegacySha256, Pedersen};
pub use disclosure::{check_disclosure, open_disclosed, KeyDisclosure};
pub use sealed::{decrypt, encrypt, ephemeral_key, AuctioneerKeypair};
pub use sigma::{
    check_knowledge, commit_message, prove_knowledge, reveal_message, verify_knowledge,
    verify_knowledge_bytes, KnowledgeProof,
};

/// Scalar field of the Jubjub subgroup.
pub use jubjub::Fr;
