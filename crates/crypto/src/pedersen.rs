//! Pedersen commitments on the Jubjub prime-order subgroup.
//!
//! A Pedersen commitment C = g^v · h^r is:
//! - **Hiding**: Given C, cannot determine v without r
//! - **Binding**: Cannot find different (v', r') with same C
//!
//! Bid values are `u32`, so `0 ≤ v < 2^32` holds by construction. The
//! settlement circuit decomposes v into exactly 32 bits.

use std::fmt;
use std::ops::Add;

use jubjub::{Fr, SubgroupPoint};
use rand::{CryptoRng, RngCore};

use auction_types::{BidCommitment, CompressedPoint};

use crate::error::CryptoError;
use crate::primitives::{
    decode_point, encode_point, generators, random_nonzero_scalar, value_scalar,
};

/// A Pedersen commitment point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Commitment(SubgroupPoint);

impl Commitment {
    /// Decode a commitment from untrusted bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        decode_point(bytes).map(Self)
    }

    pub fn to_bytes(&self) -> CompressedPoint {
        encode_point(&self.0)
    }

    pub fn point(&self) -> &SubgroupPoint {
        &self.0
    }

    /// The ledger form of this commitment, tagged with its scheme.
    pub fn to_record(&self) -> BidCommitment {
        BidCommitment::pedersen(self.to_bytes())
    }
}

impl From<SubgroupPoint> for Commitment {
    fn from(point: SubgroupPoint) -> Self {
        Self(point)
    }
}

/// Homomorphic addition: C1 + C2 commits to v1 + v2 with randomness r1 + r2.
impl Add for Commitment {
    type Output = Commitment;

    fn add(self, rhs: Commitment) -> Commitment {
        Commitment(self.0 + rhs.0)
    }
}

/// The secret behind a commitment.
#[derive(Clone, PartialEq, Eq)]
pub struct Opening {
    pub value: u32,
    pub randomness: Fr,
}

impl Opening {
    pub fn new(value: u32, randomness: Fr) -> Self {
        Self { value, randomness }
    }

    /// Recompute the commitment this opening produces.
    pub fn commitment(&self) -> Commitment {
        commit_with_randomness(self.value, &self.randomness)
    }
}

impl fmt::Debug for Opening {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opening")
            .field("value", &self.value)
            .field("randomness", &"<redacted>")
            .finish()
    }
}

/// Commit to a value with fresh randomness drawn from `[1, order)`.
///
/// Returns the commitment and the randomness needed to open it.
pub fn commit<R: RngCore + CryptoRng>(
    value: u32,
    rng: &mut R,
) -> Result<(Commitment, Fr), CryptoError> {
    let randomness = random_nonzero_scalar(rng)?;
    Ok((commit_with_randomness(value, &randomness), randomness))
}

/// Commit to a value with specific randomness.
///
/// Used when reconstructing a commitment for verification.
pub fn commit_with_randomness(value: u32, randomness: &Fr) -> Commitment {
    let gens = generators();
    Commitment(gens.g * value_scalar(value) + gens.h * randomness)
}

/// Check an opening against encoded commitment bytes.
///
/// Returns false, never an error, when the bytes are not a valid point.
pub fn check_commit(value: u32, randomness: &Fr, commitment_bytes: &[u8]) -> bool {
    match Commitment::from_bytes(commitment_bytes) {
        Ok(commitment) => commit_with_randomness(value, randomness) == commitment,
        Err(_) => false,
    }
}

/// Verify an opening, reporting a mismatch as `InvalidOpening`.
pub fn verify_opening(commitment: &Commitment, opening: &Opening) -> Result<(), CryptoError> {
    if opening.commitment() == *commitment {
        Ok(())
    } else {
        Err(CryptoError::InvalidOpening)
    }
}

/// Convert an externally supplied integer into a bid value.
///
/// Negative values and values of 2^32 or more have no opening.
pub fn value_from_i64(value: i64) -> Result<u32, CryptoError> {
    u32::try_from(value).map_err(|_| CryptoError::InvalidOpening)
}
