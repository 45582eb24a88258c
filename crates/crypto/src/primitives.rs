//! Jubjub group and scalar primitives.
//!
//! Scalars are elements of `Fr`, the field of integers modulo the order of
//! the Jubjub prime-order subgroup. Group elements are `SubgroupPoint`s; any
//! point decoded from untrusted bytes is checked to be on the curve and in
//! the prime-order subgroup before use.
//!
//! Scalars are written big-endian on the wire and reduced modulo the group
//! order when read back.

use ff::Field;
use group::{cofactor::CofactorGroup, Group, GroupEncoding};
use jubjub::{AffinePoint, ExtendedPoint, Fq, Fr, SubgroupPoint};
use once_cell::sync::Lazy;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use auction_types::CompressedPoint;

use crate::error::CryptoError;

/// Domain separator for deriving the second Pedersen base.
const H_DOMAIN: &[u8] = b"SEALED_BID_PEDERSEN_H_JUBJUB_V1";

/// Pedersen bases for commitments C = g^value · h^randomness.
///
/// `h` is derived by hashing to the curve, so nobody knows log_g(h).
#[derive(Debug)]
pub struct Generators {
    /// Base point g (subgroup generator)
    pub g: SubgroupPoint,
    /// Base point h (nothing-up-my-sleeve generation)
    pub h: SubgroupPoint,
}

static GENERATORS: Lazy<Generators> = Lazy::new(|| Generators {
    g: SubgroupPoint::generator(),
    h: derive_h_point(),
});

/// The process-wide Pedersen bases, computed on first use.
pub fn generators() -> &'static Generators {
    &GENERATORS
}

/// Derive the h point using try-and-increment.
///
/// SHA-256(domain ‖ counter) is read as a compressed point; the first
/// candidate that decodes and is not of small order, after clearing the
/// cofactor, becomes h.
fn derive_h_point() -> SubgroupPoint {
    let mut counter = 0u32;
    loop {
        let mut hasher = Sha256::new();
        hasher.update(H_DOMAIN);
        hasher.update(counter.to_le_bytes());
        let candidate: [u8; 32] = hasher.finalize().into();

        let decoded: Option<ExtendedPoint> = ExtendedPoint::from_bytes(&candidate).into();
        if let Some(point) = decoded {
            let h = point.clear_cofactor();
            if !bool::from(h.is_identity()) {
                return h;
            }
        }
        counter += 1;
    }
}

/// Compress a subgroup point to bytes.
pub fn encode_point(point: &SubgroupPoint) -> CompressedPoint {
    CompressedPoint(point.to_bytes())
}

/// Decompress a subgroup point from untrusted bytes.
///
/// Wrong length is `InvalidEncoding`; bytes that are not a canonical
/// encoding of a prime-order point are `InvalidPoint`.
pub fn decode_point(bytes: &[u8]) -> Result<SubgroupPoint, CryptoError> {
    let array: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidEncoding)?;
    Option::from(SubgroupPoint::from_bytes(&array)).ok_or(CryptoError::InvalidPoint)
}

/// Affine (u, v) coordinates of a subgroup point over the BLS12-381 scalar field.
pub fn affine_coordinates(point: &SubgroupPoint) -> (Fq, Fq) {
    let affine = AffinePoint::from(ExtendedPoint::from(*point));
    (affine.get_u(), affine.get_v())
}

/// Draw a uniformly random scalar in [1, order).
///
/// A generator error is reported as `RandomnessFailure`; there is no
/// fallback source.
pub fn random_nonzero_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Fr, CryptoError> {
    loop {
        let mut wide = [0u8; 64];
        rng.try_fill_bytes(&mut wide)
            .map_err(|_| CryptoError::RandomnessFailure)?;
        let scalar = Fr::from_bytes_wide(&wide);
        wide.zeroize();

        if !bool::from(scalar.is_zero()) {
            return Ok(scalar);
        }
    }
}

/// Scalar for a bid value.
pub fn value_scalar(value: u32) -> Fr {
    Fr::from(u64::from(value))
}

/// Big-endian fixed-width encoding of a scalar.
pub fn scalar_to_be_bytes(scalar: &Fr) -> [u8; 32] {
    let mut bytes = scalar.to_bytes();
    bytes.reverse();
    bytes
}

/// Read a big-endian integer and reduce it modulo the group order.
pub fn scalar_from_be_bytes(bytes: &[u8; 32]) -> Fr {
    let mut wide = [0u8; 64];
    for (dst, src) in wide.iter_mut().zip(bytes.iter().rev()) {
        *dst = *src;
    }
    Fr::from_bytes_wide(&wide)
}

/// Read a big-endian scalar, rejecting values not below the group order.
pub fn scalar_from_be_bytes_canonical(bytes: &[u8; 32]) -> Option<Fr> {
    let mut le = *bytes;
    le.reverse();
    Fr::from_bytes(&le).into()
}
