//! Non-interactive proof of knowledge of a commitment opening.
//!
//! Sigma protocol made non-interactive with Fiat-Shamir. The prover shows it
//! knows (v, r) with C = g^v · h^r:
//!
//! 1. Sample nonzero r1, r2 and send t = g^r1 · h^r2
//! 2. Challenge c = H(t ‖ C ‖ m) mod order
//! 3. Respond s1 = v·c + r1, s2 = r·c + r2
//!
//! The verifier accepts iff g^s1 · h^s2 == C^c · t.
//!
//! The message m binds the proof to an associated payload: a proof made for
//! one message fails against every other. Commit-time proofs bind the
//! auction id ([`commit_message`]); reveal-time proofs bind the auction id,
//! the bid id and the encrypted opening ([`reveal_message`]).

use jubjub::{Fr, SubgroupPoint};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use auction_types::{KnowledgeProofBytes, KNOWLEDGE_PROOF_LEN};

use crate::error::CryptoError;
use crate::primitives::{
    decode_point, encode_point, generators, random_nonzero_scalar, scalar_from_be_bytes,
    scalar_to_be_bytes, value_scalar,
};

/// Proof of knowledge of an opening: (t, s1, s2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KnowledgeProof {
    pub t: SubgroupPoint,
    pub s1: Fr,
    pub s2: Fr,
}

impl KnowledgeProof {
    /// Encode as t(32) ‖ s1(32, big-endian) ‖ s2(32, big-endian).
    pub fn to_bytes(&self) -> [u8; KNOWLEDGE_PROOF_LEN] {
        let mut out = [0u8; KNOWLEDGE_PROOF_LEN];
        out[..32].copy_from_slice(&encode_point(&self.t).0);
        out[32..64].copy_from_slice(&scalar_to_be_bytes(&self.s1));
        out[64..].copy_from_slice(&scalar_to_be_bytes(&self.s2));
        out
    }

    /// Decode a proof. Scalars are reduced modulo the group order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KNOWLEDGE_PROOF_LEN {
            return Err(CryptoError::InvalidEncoding);
        }
        let t = decode_point(&bytes[..32])?;

        let mut s1 = [0u8; 32];
        s1.copy_from_slice(&bytes[32..64]);
        let mut s2 = [0u8; 32];
        s2.copy_from_slice(&bytes[64..]);

        Ok(Self {
            t,
            s1: scalar_from_be_bytes(&s1),
            s2: scalar_from_be_bytes(&s2),
        })
    }

    pub fn to_record(&self) -> KnowledgeProofBytes {
        KnowledgeProofBytes(self.to_bytes())
    }

    pub fn from_record(record: &KnowledgeProofBytes) -> Result<Self, CryptoError> {
        Self::from_bytes(&record.0)
    }
}

const COMMIT_DOMAIN: &[u8] = b"SEALED_BID_COMMIT_V1";
const REVEAL_DOMAIN: &[u8] = b"SEALED_BID_REVEAL_V1";

fn put_field(out: &mut Vec<u8>, field: &[u8]) {
    out.extend_from_slice(&(field.len() as u32).to_le_bytes());
    out.extend_from_slice(field);
}

/// Message a commit-time proof is bound to.
pub fn commit_message(auction_id: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(COMMIT_DOMAIN.len() + 4 + auction_id.len());
    out.extend_from_slice(COMMIT_DOMAIN);
    put_field(&mut out, auction_id.as_bytes());
    out
}

/// Message a reveal-time proof is bound to.
pub fn reveal_message(auction_id: &str, bid_id: &str, payload: &[u8]) -> Vec<u8> {
    let len = REVEAL_DOMAIN.len() + 12 + auction_id.len() + bid_id.len() + payload.len();
    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(REVEAL_DOMAIN);
    put_field(&mut out, auction_id.as_bytes());
    put_field(&mut out, bid_id.as_bytes());
    put_field(&mut out, payload);
    out
}

/// Fiat-Shamir challenge over the full transcript.
fn challenge(t: &SubgroupPoint, commitment_bytes: &[u8], message: &[u8]) -> Fr {
    let mut hasher = Sha256::new();
    hasher.update(encode_point(t).0);
    hasher.update(commitment_bytes);
    hasher.update(message);
    let digest: [u8; 32] = hasher.finalize().into();
    scalar_from_be_bytes(&digest)
}

/// Prove knowledge of (value, randomness) opening `commitment_bytes`.
///
/// Nonces are drawn fresh on every call and never derived from the inputs.
pub fn prove_knowledge<R: RngCore + CryptoRng>(
    value: u32,
    randomness: &Fr,
    commitment_bytes: &[u8],
    message: &[u8],
    rng: &mut R,
) -> Result<KnowledgeProof, CryptoError> {
    let gens = generators();

    let r1 = random_nonzero_scalar(rng)?;
    let r2 = random_nonzero_scalar(rng)?;
    let t = gens.g * r1 + gens.h * r2;

    let c = challenge(&t, commitment_bytes, message);

    Ok(KnowledgeProof {
        t,
        s1: value_scalar(value) * c + r1,
        s2: randomness * c + r2,
    })
}

/// Check a proof against a commitment and message.
///
/// `InvalidPoint` if the commitment does not decode; `InvalidProof` if the
/// verification equation fails.
pub fn check_knowledge(
    proof: &KnowledgeProof,
    commitment_bytes: &[u8],
    message: &[u8],
) -> Result<(), CryptoError> {
    let commitment = decode_point(commitment_bytes)?;
    let gens = generators();

    let c = challenge(&proof.t, commitment_bytes, message);

    let lhs = gens.g * proof.s1 + gens.h * proof.s2;
    let rhs = commitment * c + proof.t;

    if lhs == rhs {
        Ok(())
    } else {
        Err(CryptoError::InvalidProof)
    }
}

/// Boolean form of [`check_knowledge`].
pub fn verify_knowledge(proof: &KnowledgeProof, commitment_bytes: &[u8], message: &[u8]) -> bool {
    check_knowledge(proof, commitment_bytes, message).is_ok()
}

/// Decode and verify an encoded proof; any malformed field rejects.
pub fn verify_knowledge_bytes(proof_bytes: &[u8], commitment_bytes: &[u8], message: &[u8]) -> bool {
    match KnowledgeProof::from_bytes(proof_bytes) {
        Ok(proof) => verify_knowledge(&proof, commitment_bytes, message),
        Err(_) => false,
    }
}
