//! One-time trusted setup for the settlement circuit.
//!
//! Parameter generation samples five secret scalars (τ, α, β, γ, δ). Anyone
//! holding them can forge settlement proofs, so they live only inside
//! [`ToxicWaste`], which is zeroized when dropped on every exit path.
//!
//! The setup persists three files into the configured key directory:
//! - `settlement.pk`: capacity header ‖ Groth16 parameters
//! - `settlement.vk`: capacity header ‖ verifying key
//! - `circuit.json`: descriptor of the circuit the keys belong to

use std::fs;

use bellman::groth16::{self, Parameters};
use bls12_381::{Bls12, G1Projective, G2Projective, Scalar};
use group::Group;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use auction_circuit::{encode_verifying_key, read_key_header, write_key_header, SettlementCircuit};
use auction_crypto::CryptoError;
use auction_types::sha256;

use crate::config::SettlerConfig;
use crate::error::SettlementError;
use crate::prover::SettlementKeys;

/// Secret randomness of parameter generation.
struct ToxicWaste {
    tau: Scalar,
    alpha: Scalar,
    beta: Scalar,
    gamma: Scalar,
    delta: Scalar,
}

impl ToxicWaste {
    fn sample<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, SettlementError> {
        Ok(Self {
            tau: nonzero_scalar(rng)?,
            alpha: nonzero_scalar(rng)?,
            beta: nonzero_scalar(rng)?,
            gamma: nonzero_scalar(rng)?,
            delta: nonzero_scalar(rng)?,
        })
    }
}

impl Zeroize for ToxicWaste {
    fn zeroize(&mut self) {
        self.tau.zeroize();
        self.alpha.zeroize();
        self.beta.zeroize();
        self.gamma.zeroize();
        self.delta.zeroize();
    }
}

impl Drop for ToxicWaste {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for ToxicWaste {}

fn nonzero_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Scalar, SettlementError> {
    loop {
        let mut wide = Zeroizing::new([0u8; 64]);
        rng.try_fill_bytes(&mut wide[..])
            .map_err(|_| CryptoError::RandomnessFailure)?;
        let scalar = Scalar::from_bytes_wide(&wide);
        if scalar != Scalar::zero() {
            return Ok(scalar);
        }
    }
}

/// Generate Groth16 parameters for a circuit of the given capacity.
pub fn generate_parameters<R: RngCore + CryptoRng>(
    capacity: usize,
    rng: &mut R,
) -> Result<Parameters<Bls12>, SettlementError> {
    let waste = ToxicWaste::sample(rng)?;
    debug!(capacity, "sampled setup randomness");

    let params = groth16::generate_parameters::<Bls12, _>(
        SettlementCircuit::blank(capacity),
        G1Projective::generator(),
        G2Projective::generator(),
        waste.alpha,
        waste.beta,
        waste.gamma,
        waste.delta,
        waste.tau,
    )?;

    drop(waste);
    Ok(params)
}

/// Describes the circuit a key pair was generated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitDescriptor {
    pub commitment_scheme: String,
    pub capacity: usize,
    /// Field elements of the public input (2N + 2)
    pub public_inputs: usize,
    /// Hex SHA-256 of the encoded verifying key
    pub vkey_hash: String,
}

impl CircuitDescriptor {
    pub fn new(capacity: usize, vkey_hash: [u8; 32]) -> Self {
        Self {
            commitment_scheme: "pedersen-jubjub".to_string(),
            capacity,
            public_inputs: 2 * capacity + 2,
            vkey_hash: hex::encode(vkey_hash),
        }
    }
}

/// Serialize Groth16 parameters with their capacity header.
pub fn encode_proving_key(
    capacity: usize,
    params: &Parameters<Bls12>,
) -> Result<Vec<u8>, SettlementError> {
    let mut out = Vec::new();
    write_key_header(capacity, &mut out)?;
    params
        .write(&mut out)
        .map_err(|e| SettlementError::KeyMaterial(format!("failed to write proving key: {}", e)))?;
    Ok(out)
}

/// Read Groth16 parameters written by [`encode_proving_key`].
pub fn decode_proving_key(
    bytes: &[u8],
    checked: bool,
) -> Result<(usize, Parameters<Bls12>), SettlementError> {
    let (capacity, mut body) = read_key_header(bytes)?;
    let params = Parameters::<Bls12>::read(&mut body, checked)
        .map_err(|e| SettlementError::KeyMaterial(format!("failed to read proving key: {}", e)))?;
    Ok((capacity, params))
}

/// Write the key files and descriptor for `keys` into the configured directory.
pub fn persist_keys(
    config: &SettlerConfig,
    keys: &SettlementKeys,
) -> Result<CircuitDescriptor, SettlementError> {
    let io_err = |what: &str, e: std::io::Error| {
        SettlementError::KeyMaterial(format!("failed to write {}: {}", what, e))
    };

    fs::create_dir_all(&config.key_dir).map_err(|e| io_err("key directory", e))?;

    let pk = encode_proving_key(keys.capacity(), keys.params())?;
    fs::write(config.proving_key_path(), &pk).map_err(|e| io_err("proving key", e))?;

    let vk = encode_verifying_key(keys.capacity(), &keys.params().vk)?;
    fs::write(config.verifying_key_path(), &vk).map_err(|e| io_err("verifying key", e))?;

    let descriptor = CircuitDescriptor::new(keys.capacity(), sha256(&vk));
    let json = serde_json::to_vec_pretty(&descriptor)
        .map_err(|e| SettlementError::KeyMaterial(format!("failed to encode descriptor: {}", e)))?;
    fs::write(config.descriptor_path(), json).map_err(|e| io_err("descriptor", e))?;

    info!(
        capacity = keys.capacity(),
        key_dir = %config.key_dir.display(),
        vkey_hash = %descriptor.vkey_hash,
        "persisted settlement keys"
    );
    Ok(descriptor)
}

/// Run the full setup: generate parameters and persist them.
///
/// The secret setup randomness is gone before this returns, whether it
/// succeeds or not.
pub fn run_setup<R: RngCore + CryptoRng>(
    config: &SettlerConfig,
    rng: &mut R,
) -> Result<(SettlementKeys, CircuitDescriptor), SettlementError> {
    config
        .validate()
        .map_err(|e| SettlementError::KeyMaterial(e.to_string()))?;

    info!(capacity = config.capacity, "generating settlement parameters");
    let params = generate_parameters(config.capacity, rng)?;
    let keys = SettlementKeys::new(config.capacity, params)?;
    let descriptor = persist_keys(config, &keys)?;
    Ok((keys, descriptor))
}
