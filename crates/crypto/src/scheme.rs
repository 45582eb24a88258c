//! Commitment scheme capability.
//!
//! Every stored commitment carries the `SchemeId` it was produced with.
//! Pedersen is the canonical scheme: it is the only one the settlement
//! circuit can re-derive. The legacy SHA-256 scheme is recognised so that
//! historical records can still be checked.

use jubjub::Fr;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use auction_types::{BidCommitment, SchemeId};

use crate::error::CryptoError;
use crate::pedersen::{commit_with_randomness, Commitment};
use crate::primitives::random_nonzero_scalar;

/// A commitment scheme with a persisted identifier.
pub trait CommitmentScheme {
    /// Identifier stored next to every commitment of this scheme.
    const ID: SchemeId;

    /// Secret randomness used to hide the value.
    type Randomness;

    /// Draw fresh randomness from a secure generator.
    fn sample<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self::Randomness, CryptoError>;

    /// Encoded commitment for a value under given randomness.
    fn commit_with(value: u32, randomness: &Self::Randomness) -> [u8; 32];

    /// Commit with fresh randomness, returning the tagged commitment.
    fn commit<R: RngCore + CryptoRng>(
        value: u32,
        rng: &mut R,
    ) -> Result<(BidCommitment, Self::Randomness), CryptoError> {
        let randomness = Self::sample(rng)?;
        let commitment = BidCommitment {
            scheme: Self::ID,
            bytes: Self::commit_with(value, &randomness),
        };
        Ok((commitment, randomness))
    }

    /// Check an opening. A commitment tagged with another scheme never matches.
    fn check(value: u32, randomness: &Self::Randomness, commitment: &BidCommitment) -> bool {
        commitment.scheme == Self::ID && Self::commit_with(value, randomness) == commitment.bytes
    }
}

/// Pedersen commitment g^value · h^randomness on Jubjub.
#[derive(Debug, Clone, Copy)]
pub struct Pedersen;

impl CommitmentScheme for Pedersen {
    const ID: SchemeId = SchemeId::Pedersen;
    type Randomness = Fr;

    fn sample<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Fr, CryptoError> {
        random_nonzero_scalar(rng)
    }

    fn commit_with(value: u32, randomness: &Fr) -> [u8; 32] {
        commit_with_randomness(value, randomness).to_bytes().0
    }

    fn check(value: u32, randomness: &Fr, commitment: &BidCommitment) -> bool {
        if commitment.scheme != Self::ID {
            return false;
        }
        // Decode first so an off-curve encoding is rejected, not just unequal.
        match Commitment::from_bytes(&commitment.bytes) {
            Ok(point) => commit_with_randomness(value, randomness) == point,
            Err(_) => false,
        }
    }
}

/// SHA-256 over 4 bytes of randomness followed by the little-endian value.
///
/// Not homomorphic and only hiding for as long as 32 bits of randomness
/// resist brute force, so it is accepted for reading old records only.
#[derive(Debug, Clone, Copy)]
pub struct LegacySha256;

impl CommitmentScheme for LegacySha256 {
    const ID: SchemeId = SchemeId::LegacySha256;
    type Randomness = [u8; 4];

    fn sample<R: RngCore + CryptoRng>(rng: &mut R) -> Result<[u8; 4], CryptoError> {
        let mut randomness = [0u8; 4];
        rng.try_fill_bytes(&mut randomness)
            .map_err(|_| CryptoError::RandomnessFailure)?;
        Ok(randomness)
    }

    fn commit_with(value: u32, randomness: &[u8; 4]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(randomness);
        hasher.update(value.to_le_bytes());
        hasher.finalize().into()
    }
}
