//! Settlement proof verification.
//!
//! Verification is a Groth16 pairing check whose cost does not depend on the
//! circuit capacity beyond the linear combination of public inputs.

use bellman::groth16::{
    prepare_verifying_key, verify_proof, PreparedVerifyingKey, Proof, VerifyingKey,
};
use bls12_381::Bls12;

use auction_types::{sha256, SettlementProof};

use crate::error::CircuitError;
use crate::inputs::SettlementPublicInputs;

/// Length of the capacity header in front of serialized keys.
pub const KEY_HEADER_LEN: usize = 4;

/// Prefix serialized key material with the capacity it was generated for.
pub fn write_key_header(capacity: usize, out: &mut Vec<u8>) -> Result<(), CircuitError> {
    let capacity = u32::try_from(capacity)
        .map_err(|_| CircuitError::KeyMaterial(format!("capacity {} too large", capacity)))?;
    out.extend_from_slice(&capacity.to_le_bytes());
    Ok(())
}

/// Split a capacity header off serialized key material.
pub fn read_key_header(bytes: &[u8]) -> Result<(usize, &[u8]), CircuitError> {
    if bytes.len() < KEY_HEADER_LEN {
        return Err(CircuitError::KeyMaterial("missing capacity header".to_string()));
    }
    let mut header = [0u8; KEY_HEADER_LEN];
    header.copy_from_slice(&bytes[..KEY_HEADER_LEN]);
    let capacity = u32::from_le_bytes(header) as usize;
    if capacity == 0 {
        return Err(CircuitError::KeyMaterial("zero capacity".to_string()));
    }
    Ok((capacity, &bytes[KEY_HEADER_LEN..]))
}

/// Serialize a verifying key with its capacity header.
pub fn encode_verifying_key(
    capacity: usize,
    vk: &VerifyingKey<Bls12>,
) -> Result<Vec<u8>, CircuitError> {
    let mut out = Vec::new();
    write_key_header(capacity, &mut out)?;
    vk.write(&mut out)
        .map_err(|e| CircuitError::KeyMaterial(format!("failed to write verifying key: {}", e)))?;
    Ok(out)
}

/// Verifier for one settlement circuit capacity.
///
/// Immutable after construction; share it behind an `Arc`.
pub struct SettlementVerifier {
    capacity: usize,
    pvk: PreparedVerifyingKey<Bls12>,
    vkey_hash: [u8; 32],
}

impl SettlementVerifier {
    pub fn new(capacity: usize, vk: &VerifyingKey<Bls12>) -> Result<Self, CircuitError> {
        let encoded = encode_verifying_key(capacity, vk)?;
        Ok(Self {
            capacity,
            pvk: prepare_verifying_key(vk),
            vkey_hash: sha256(&encoded),
        })
    }

    /// Load a verifier from key bytes written by [`encode_verifying_key`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CircuitError> {
        let (capacity, mut body) = read_key_header(bytes)?;
        let vk = VerifyingKey::<Bls12>::read(&mut body).map_err(|e| {
            CircuitError::KeyMaterial(format!("failed to read verifying key: {}", e))
        })?;
        if !body.is_empty() {
            return Err(CircuitError::KeyMaterial(
                "trailing bytes after verifying key".to_string(),
            ));
        }
        // 2N + 2 public inputs plus the constant one.
        if vk.ic.len() != 2 * capacity + 3 {
            return Err(CircuitError::KeyMaterial(format!(
                "verifying key has {} inputs, capacity {} needs {}",
                vk.ic.len(),
                capacity,
                2 * capacity + 3
            )));
        }

        Ok(Self {
            capacity,
            pvk: prepare_verifying_key(&vk),
            vkey_hash: sha256(bytes),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// SHA-256 of the encoded verifying key.
    pub fn vkey_hash(&self) -> [u8; 32] {
        self.vkey_hash
    }

    /// Check a settlement proof against its public inputs.
    ///
    /// Fails closed: a proof for another key or capacity, malformed proof
    /// bytes, or a failed pairing check are all rejections.
    pub fn verify(
        &self,
        proof: &SettlementProof,
        inputs: &SettlementPublicInputs,
    ) -> Result<(), CircuitError> {
        if proof.vkey_hash != self.vkey_hash {
            return Err(CircuitError::KeyMaterial(
                "proof was produced for a different verifying key".to_string(),
            ));
        }
        if proof.capacity as usize != self.capacity || inputs.capacity != self.capacity {
            return Err(CircuitError::KeyMaterial(format!(
                "capacity mismatch: key {}, proof {}, inputs {}",
                self.capacity, proof.capacity, inputs.capacity
            )));
        }
        if inputs.commitments.len() > self.capacity {
            return Err(CircuitError::CapacityExceeded {
                bids: inputs.commitments.len(),
                capacity: self.capacity,
            });
        }
        if !inputs.commitments.contains(&inputs.winning_commitment) {
            return Err(CircuitError::WinnerNotIncluded);
        }

        let groth_proof = Proof::<Bls12>::read(&proof.proof_bytes[..])
            .map_err(|_| CircuitError::InvalidProof)?;

        verify_proof(&self.pvk, &groth_proof, &inputs.to_field_elements())
            .map_err(|_| CircuitError::InvalidProof)
    }
}

impl std::fmt::Debug for SettlementVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementVerifier")
            .field("capacity", &self.capacity)
            .field("vkey_hash", &hex::encode(self.vkey_hash))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_header() {
        let mut out = Vec::new();
        write_key_header(7, &mut out).unwrap();
        out.extend_from_slice(b"body");

        let (capacity, body) = read_key_header(&out).unwrap();
        assert_eq!(capacity, 7);
        assert_eq!(body, b"body");
    }

    #[test]
    fn test_key_header_rejections() {
        assert!(matches!(read_key_header(&[1, 0]), Err(CircuitError::KeyMaterial(_))));
        assert!(matches!(
            read_key_header(&[0, 0, 0, 0, 9]),
            Err(CircuitError::KeyMaterial(_))
        ));
    }

    #[test]
    fn test_garbage_verifying_key() {
        let mut bytes = Vec::new();
        write_key_header(2, &mut bytes).unwrap();
        bytes.extend_from_slice(&[0u8; 64]);
        assert!(matches!(
            SettlementVerifier::from_bytes(&bytes),
            Err(CircuitError::KeyMaterial(_))
        ));
    }
}
