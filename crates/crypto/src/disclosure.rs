//! Verifiable disclosure of a sealed-box key.
//!
//! When a revealed payload does not open to its commitment, the auctioneer
//! shows it by publishing the shared point S = E·sk of that payload with a
//! Chaum-Pedersen proof that log_g(pk) == log_E(S). Anyone can then derive
//! the box key, try the payload, and see for themselves that it does not
//! open. The secret key stays hidden.
//!
//! Proof: sample k, set A1 = g·k, A2 = E·k,
//! c = H(domain ‖ pk ‖ E ‖ S ‖ A1 ‖ A2) mod order and z = k + c·sk.
//! The verifier recomputes A1 = g·z - pk·c and A2 = E·z - S·c and checks c.
//!
//! Encoding: S(32) ‖ c(32, big-endian) ‖ z(32, big-endian).

use jubjub::{Fr, SubgroupPoint};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use auction_types::{CompressedPoint, EncryptedPayload, KeyDisclosureBytes, DISCLOSURE_LEN};

use crate::error::CryptoError;
use crate::pedersen::Opening;
use crate::primitives::{
    decode_point, encode_point, generators, random_nonzero_scalar, scalar_from_be_bytes,
    scalar_to_be_bytes,
};
use crate::sealed::{ephemeral_key, open_with_shared, AuctioneerKeypair};

const DLEQ_DOMAIN: &[u8] = b"SEALED_BID_KEY_DISCLOSURE_V1";

/// A disclosed shared point and its proof of correct derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyDisclosure {
    pub shared: SubgroupPoint,
    pub c: Fr,
    pub z: Fr,
}

impl KeyDisclosure {
    pub fn to_bytes(&self) -> [u8; DISCLOSURE_LEN] {
        let mut out = [0u8; DISCLOSURE_LEN];
        out[..32].copy_from_slice(&encode_point(&self.shared).0);
        out[32..64].copy_from_slice(&scalar_to_be_bytes(&self.c));
        out[64..].copy_from_slice(&scalar_to_be_bytes(&self.z));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != DISCLOSURE_LEN {
            return Err(CryptoError::InvalidEncoding);
        }
        let shared = decode_point(&bytes[..32])?;

        let mut c = [0u8; 32];
        c.copy_from_slice(&bytes[32..64]);
        let mut z = [0u8; 32];
        z.copy_from_slice(&bytes[64..]);

        Ok(Self {
            shared,
            c: scalar_from_be_bytes(&c),
            z: scalar_from_be_bytes(&z),
        })
    }

    pub fn to_record(&self) -> KeyDisclosureBytes {
        KeyDisclosureBytes(self.to_bytes())
    }

    pub fn from_record(record: &KeyDisclosureBytes) -> Result<Self, CryptoError> {
        Self::from_bytes(&record.0)
    }
}

fn challenge(
    pk: &SubgroupPoint,
    ephemeral: &SubgroupPoint,
    shared: &SubgroupPoint,
    a1: &SubgroupPoint,
    a2: &SubgroupPoint,
) -> Fr {
    let mut hasher = Sha256::new();
    hasher.update(DLEQ_DOMAIN);
    for point in [pk, ephemeral, shared, a1, a2] {
        hasher.update(encode_point(point).0);
    }
    let digest: [u8; 32] = hasher.finalize().into();
    scalar_from_be_bytes(&digest)
}

impl AuctioneerKeypair {
    /// Disclose the shared point of one payload, with proof.
    pub fn disclose<R: RngCore + CryptoRng>(
        &self,
        payload: &EncryptedPayload,
        rng: &mut R,
    ) -> Result<KeyDisclosure, CryptoError> {
        let pk = generators().g * self.secret();
        let ephemeral = ephemeral_key(payload)?;
        let shared = ephemeral * self.secret();

        let k = random_nonzero_scalar(rng)?;
        let a1 = generators().g * k;
        let a2 = ephemeral * k;
        let c = challenge(&pk, &ephemeral, &shared, &a1, &a2);

        Ok(KeyDisclosure {
            shared,
            c,
            z: k + c * self.secret(),
        })
    }
}

/// Check that a disclosure carries the shared point of `payload` under the
/// auctioneer key `recipient_pk`.
pub fn check_disclosure(
    disclosure: &KeyDisclosure,
    payload: &EncryptedPayload,
    recipient_pk: &CompressedPoint,
) -> Result<(), CryptoError> {
    let pk = decode_point(&recipient_pk.0)?;
    let ephemeral = ephemeral_key(payload)?;

    let a1 = generators().g * disclosure.z - pk * disclosure.c;
    let a2 = ephemeral * disclosure.z - disclosure.shared * disclosure.c;

    if challenge(&pk, &ephemeral, &disclosure.shared, &a1, &a2) == disclosure.c {
        Ok(())
    } else {
        Err(CryptoError::InvalidProof)
    }
}

/// Open a payload with a checked disclosure instead of the secret key.
///
/// An invalid disclosure is `InvalidProof`; a payload that does not open is
/// `DecryptionFailure`.
pub fn open_disclosed(
    disclosure: &KeyDisclosure,
    payload: &EncryptedPayload,
    recipient_pk: &CompressedPoint,
) -> Result<Opening, CryptoError> {
    check_disclosure(disclosure, payload, recipient_pk)?;
    open_with_shared(payload, recipient_pk, &disclosure.shared)
}
