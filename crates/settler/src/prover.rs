//! Groth16 proof generation for auction settlement.
//!
//! Proving is CPU-bound and long-running. [`prove`] is the synchronous core;
//! [`prove_with_timeout`] moves it to a blocking worker and bounds it by a
//! deadline. A timed-out or cancelled attempt leaves nothing behind: the next
//! attempt starts again from a fresh witness.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bellman::groth16::{create_random_proof, Parameters};
use bls12_381::Bls12;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info, warn};

use auction_circuit::{
    encode_verifying_key, SettlementCircuit, SettlementVerifier, SettlementWitness,
};
use auction_types::SettlementProof;

use crate::config::SettlerConfig;
use crate::error::SettlementError;
use crate::setup::decode_proving_key;

/// Proving and verifying key for one circuit capacity.
///
/// Read-only once built; share through `Arc`.
pub struct SettlementKeys {
    capacity: usize,
    params: Parameters<Bls12>,
    verifier: SettlementVerifier,
}

impl SettlementKeys {
    pub fn new(capacity: usize, params: Parameters<Bls12>) -> Result<Self, SettlementError> {
        let verifier = SettlementVerifier::new(capacity, &params.vk)?;
        if params.vk.ic.len() != 2 * capacity + 3 {
            return Err(SettlementError::KeyMaterial(format!(
                "parameters have {} public inputs, capacity {} needs {}",
                params.vk.ic.len(),
                capacity,
                2 * capacity + 3
            )));
        }
        Ok(Self {
            capacity,
            params,
            verifier,
        })
    }

    /// Load the key files written by setup.
    ///
    /// Both files must be for the configured capacity and the verifying key
    /// must be the one embedded in the proving key.
    pub fn load(config: &SettlerConfig) -> Result<Self, SettlementError> {
        let read = |path: std::path::PathBuf| {
            fs::read(&path).map_err(|e| {
                SettlementError::KeyMaterial(format!("failed to read {}: {}", path.display(), e))
            })
        };

        let pk_bytes = read(config.proving_key_path())?;
        let (capacity, params) = decode_proving_key(&pk_bytes, config.check_proving_key)?;
        if capacity != config.capacity {
            return Err(SettlementError::KeyMaterial(format!(
                "proving key is for capacity {}, configured {}",
                capacity, config.capacity
            )));
        }

        let vk_bytes = read(config.verifying_key_path())?;
        let verifier = SettlementVerifier::from_bytes(&vk_bytes)?;
        if verifier.capacity() != capacity
            || encode_verifying_key(capacity, &params.vk)? != vk_bytes
        {
            return Err(SettlementError::KeyMaterial(
                "verifying key does not belong to the proving key".to_string(),
            ));
        }

        info!(
            capacity,
            vkey_hash = %hex::encode(verifier.vkey_hash()),
            "loaded settlement keys"
        );
        Ok(Self {
            capacity,
            params,
            verifier,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn params(&self) -> &Parameters<Bls12> {
        &self.params
    }

    pub fn verifier(&self) -> &SettlementVerifier {
        &self.verifier
    }
}

/// Produce a settlement proof for an assembled witness.
///
/// The proof is checked against the verifying key before it is returned; a
/// proof that does not verify is an error, never output. There is no retry.
pub fn prove<R: RngCore>(
    keys: &SettlementKeys,
    witness: SettlementWitness,
    cancel: Option<Arc<AtomicBool>>,
    rng: &mut R,
) -> Result<SettlementProof, SettlementError> {
    if witness.capacity() != keys.capacity() {
        return Err(SettlementError::KeyMaterial(format!(
            "witness has {} lanes, keys are for capacity {}",
            witness.capacity(),
            keys.capacity()
        )));
    }

    let inputs = witness.public_inputs();
    let bids = witness.bid_count();

    let mut circuit = SettlementCircuit::with_witness(witness);
    if let Some(flag) = cancel {
        circuit = circuit.cancellable(flag);
    }

    let started = Instant::now();
    let proof = create_random_proof(circuit, keys.params(), rng)?;

    let mut proof_bytes = Vec::new();
    proof
        .write(&mut proof_bytes)
        .map_err(|e| SettlementError::KeyMaterial(format!("failed to write proof: {}", e)))?;

    let settlement = SettlementProof {
        proof_bytes,
        capacity: keys.capacity() as u32,
        vkey_hash: keys.verifier().vkey_hash(),
    };

    if let Err(e) = keys.verifier().verify(&settlement, &inputs) {
        warn!(error = %e, "generated settlement proof does not verify");
        return Err(SettlementError::InvalidProof);
    }

    debug!(
        bids,
        capacity = keys.capacity(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "settlement proof generated"
    );
    Ok(settlement)
}

/// Prove on a blocking worker, giving up after `timeout`.
///
/// On timeout the cancellation flag is raised and the caller gets
/// `Timeout` at once. The flag is only polled during synthesis: a worker
/// that has already reached bellman's multiexponentiation runs it to
/// completion on the blocking pool, and that proof is discarded.
pub async fn prove_with_timeout(
    keys: Arc<SettlementKeys>,
    witness: SettlementWitness,
    timeout: Duration,
) -> Result<SettlementProof, SettlementError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let worker = {
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || prove(&keys, witness, Some(cancel), &mut OsRng))
    };

    match tokio::time::timeout(timeout, worker).await {
        Ok(joined) => joined.map_err(|e| SettlementError::Worker(e.to_string()))?,
        Err(_) => {
            cancel.store(true, Ordering::Relaxed);
            warn!(timeout_secs = timeout.as_secs(), "settlement proving timed out");
            Err(SettlementError::Timeout(timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{lane, shared_keys};
    use auction_circuit::{CircuitError, SettlementPublicInputs};

    #[test]
    fn test_prove_and_verify() {
        let keys = shared_keys();
        let witness = SettlementWitness::assemble(2, vec![lane(10), lane(25)], 1).unwrap();
        let inputs = witness.public_inputs();

        let proof = prove(&keys, witness, None, &mut OsRng).unwrap();
        assert_eq!(proof.proof_bytes.len(), 192);
        assert!(keys.verifier().verify(&proof, &inputs).is_ok());
    }

    #[test]
    fn test_proof_rejected_for_other_commitments() {
        let keys = shared_keys();
        let witness = SettlementWitness::assemble(2, vec![lane(10), lane(25)], 1).unwrap();
        let proof = prove(&keys, witness, None, &mut OsRng).unwrap();

        let other = SettlementWitness::assemble(2, vec![lane(10), lane(25)], 1).unwrap();
        assert_eq!(
            keys.verifier().verify(&proof, &other.public_inputs()),
            Err(CircuitError::InvalidProof)
        );
    }

    #[test]
    fn test_proof_rejected_for_swapped_winner() {
        let keys = shared_keys();
        let low = lane(10);
        let high = lane(25);
        let witness =
            SettlementWitness::assemble(2, vec![low.clone(), high.clone()], 1).unwrap();
        let proof = prove(&keys, witness, None, &mut OsRng).unwrap();

        // Claiming the lower bid won is rejected.
        let forged = SettlementPublicInputs {
            capacity: 2,
            commitments: vec![low.commitment, high.commitment],
            winning_commitment: low.commitment,
        };
        assert_eq!(
            keys.verifier().verify(&proof, &forged),
            Err(CircuitError::InvalidProof)
        );
    }

    #[test]
    fn test_tampered_proof_bytes() {
        let keys = shared_keys();
        let witness = SettlementWitness::assemble(2, vec![lane(7)], 0).unwrap();
        let inputs = witness.public_inputs();
        let mut proof = prove(&keys, witness, None, &mut OsRng).unwrap();

        proof.proof_bytes[10] ^= 0x01;
        assert!(keys.verifier().verify(&proof, &inputs).is_err());

        proof.proof_bytes.truncate(100);
        assert_eq!(
            keys.verifier().verify(&proof, &inputs),
            Err(CircuitError::InvalidProof)
        );
    }

    #[test]
    fn test_capacity_mismatch() {
        let keys = shared_keys();
        let witness = SettlementWitness::assemble(3, vec![lane(7)], 0).unwrap();
        assert!(matches!(
            prove(&keys, witness, None, &mut OsRng),
            Err(SettlementError::KeyMaterial(_))
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let keys = shared_keys();
        let witness = SettlementWitness::assemble(2, vec![lane(7)], 0).unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        assert!(matches!(
            prove(&keys, witness, Some(flag), &mut OsRng),
            Err(SettlementError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_prove_with_timeout() {
        let keys = shared_keys();
        let witness = SettlementWitness::assemble(2, vec![lane(3), lane(4)], 1).unwrap();
        let inputs = witness.public_inputs();

        let proof = prove_with_timeout(keys.clone(), witness, Duration::from_secs(600))
            .await
            .unwrap();
        assert!(keys.verifier().verify(&proof, &inputs).is_ok());
    }

    #[tokio::test]
    async fn test_prove_times_out() {
        let keys = shared_keys();
        let witness = SettlementWitness::assemble(2, vec![lane(3), lane(4)], 1).unwrap();

        let result = prove_with_timeout(keys, witness, Duration::from_nanos(1)).await;
        assert!(matches!(result, Err(SettlementError::Timeout(_))));
    }
}
