//! The settlement circuit.
//!
//! Proves, for a fixed capacity N, that:
//! 1. Every public commitment i equals g^values[i] · h^randomness[i]
//! 2. Every values[i] ≤ winning_value
//! 3. The public winning commitment equals g^winning_value · h^winning_randomness
//!
//! # Public Inputs
//! - (u, v) of commitments[0..N]
//! - (u, v) of the winning commitment
//!
//! # Private Inputs
//! - values[N], randomness[N] (32 and 252 bits each)
//! - winning_value, winning_randomness

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bellman::gadgets::boolean::Boolean;
use bellman::{Circuit, ConstraintSystem, SynthesisError};
use bls12_381::Scalar;

use crate::gadgets::{
    alloc_bits, enforce_less_or_equal, fixed_base_mul, scalar_bits, u32_bits, EdwardsPoint,
    G_TABLE, H_TABLE, RANDOMNESS_BITS, VALUE_BITS,
};
use crate::witness::SettlementWitness;

/// Circuit capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 50;

/// Settlement circuit for a fixed number of lanes.
///
/// With `witness: None` the circuit only describes its shape, which is all
/// parameter generation needs.
#[derive(Clone)]
pub struct SettlementCircuit {
    pub capacity: usize,
    pub witness: Option<SettlementWitness>,
    /// Polled between lanes; a set flag aborts synthesis.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl SettlementCircuit {
    /// Shape-only circuit for parameter generation.
    pub fn blank(capacity: usize) -> Self {
        Self {
            capacity,
            witness: None,
            cancel: None,
        }
    }

    pub fn with_witness(witness: SettlementWitness) -> Self {
        Self {
            capacity: witness.capacity(),
            witness: Some(witness),
            cancel: None,
        }
    }

    pub fn cancellable(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn check_cancelled(&self) -> Result<(), SynthesisError> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(SynthesisError::IoError(
                io::Error::new(io::ErrorKind::Interrupted, "settlement proving cancelled"),
            )),
            _ => Ok(()),
        }
    }
}

/// Allocated opening: value bits plus the re-derived commitment point.
struct AllocatedOpening {
    value_bits: Vec<Boolean>,
    commitment: EdwardsPoint,
}

fn alloc_opening<CS: ConstraintSystem<Scalar>>(
    mut cs: CS,
    value: Option<u32>,
    randomness_bits: Option<Vec<bool>>,
) -> Result<AllocatedOpening, SynthesisError> {
    let value_bits = alloc_bits(
        cs.namespace(|| "value"),
        value.map(u32_bits).as_deref(),
        VALUE_BITS,
    )?;
    let randomness = alloc_bits(
        cs.namespace(|| "randomness"),
        randomness_bits.as_deref(),
        RANDOMNESS_BITS,
    )?;

    let gv = fixed_base_mul(cs.namespace(|| "g^value"), &value_bits, &G_TABLE)?;
    let hr = fixed_base_mul(cs.namespace(|| "h^randomness"), &randomness, &H_TABLE)?;
    let commitment = gv.add(cs.namespace(|| "commitment"), &hr)?;

    Ok(AllocatedOpening {
        value_bits,
        commitment,
    })
}

impl Circuit<Scalar> for SettlementCircuit {
    fn synthesize<CS: ConstraintSystem<Scalar>>(self, cs: &mut CS) -> Result<(), SynthesisError> {
        if let Some(witness) = &self.witness {
            if witness.lanes().len() != self.capacity {
                return Err(SynthesisError::Unsatisfiable);
            }
        }

        let public = self.witness.as_ref().map(|w| w.public_inputs());
        let lane_coords = public.as_ref().map(|p| p.lane_coordinates());

        let winner = self.witness.as_ref().map(|w| w.winner());
        let winning_value = winner.map(|w| w.opening.value);
        let allocated_winner = alloc_opening(
            cs.namespace(|| "winner"),
            winning_value,
            winner.map(|w| scalar_bits(&w.opening.randomness)),
        )?;

        for i in 0..self.capacity {
            self.check_cancelled()?;
            let mut cs = cs.namespace(|| format!("lane {}", i));

            let lane = self.witness.as_ref().map(|w| &w.lanes()[i]);
            let value = lane.map(|l| l.opening.value);
            let allocated = alloc_opening(
                cs.namespace(|| "opening"),
                value,
                lane.map(|l| scalar_bits(&l.opening.randomness)),
            )?;

            allocated.commitment.expose_as_input(
                cs.namespace(|| "commitment"),
                lane_coords.as_ref().map(|c| c[i]),
            )?;

            let difference = value
                .zip(winning_value)
                .map(|(v, w)| w.wrapping_sub(v));
            enforce_less_or_equal(
                cs.namespace(|| "value <= winning value"),
                &allocated.value_bits,
                &allocated_winner.value_bits,
                difference,
            )?;
        }

        self.check_cancelled()?;
        allocated_winner.commitment.expose_as_input(
            cs.namespace(|| "winning commitment"),
            public.as_ref().map(|p| p.winner_coordinates()),
        )?;

        Ok(())
    }
}
