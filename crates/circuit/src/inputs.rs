//! Public inputs of the settlement circuit.
//!
//! Field element layout, for capacity N:
//!
//! ```text
//! [u_0, v_0, u_1, v_1, ..., u_{N-1}, v_{N-1}, u_win, v_win]
//! ```
//!
//! where (u_i, v_i) are the affine coordinates of the i-th commitment and
//! lanes past the last bid hold the identity point (0, 1).

use bls12_381::Scalar;
use group::Group;
use jubjub::SubgroupPoint;

use auction_crypto::{primitives::affine_coordinates, Commitment};
use auction_types::circuit_io::{SettlementStatement, StatementError};

use crate::error::CircuitError;

/// Commitments a settlement proof speaks about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettlementPublicInputs {
    pub capacity: usize,
    /// Settled commitments in lane order, without padding
    pub commitments: Vec<Commitment>,
    pub winning_commitment: Commitment,
}

impl SettlementPublicInputs {
    /// Decode and check a statement for a circuit of the given capacity.
    pub fn from_statement(
        capacity: usize,
        statement: &SettlementStatement,
    ) -> Result<Self, CircuitError> {
        if statement.commitments.len() > capacity {
            return Err(CircuitError::CapacityExceeded {
                bids: statement.commitments.len(),
                capacity,
            });
        }
        statement.validate().map_err(|e| match e {
            StatementError::NoCommitments => CircuitError::NoBids,
            StatementError::WinnerNotIncluded => CircuitError::WinnerNotIncluded,
        })?;

        let commitments = statement
            .commitments
            .iter()
            .map(|c| Commitment::from_bytes(&c.0))
            .collect::<Result<Vec<_>, _>>()?;
        let winning_commitment = Commitment::from_bytes(&statement.winning_commitment.0)?;

        Ok(Self {
            capacity,
            commitments,
            winning_commitment,
        })
    }

    /// The byte-level statement.
    pub fn statement(&self) -> SettlementStatement {
        SettlementStatement {
            commitments: self.commitments.iter().map(Commitment::to_bytes).collect(),
            winning_commitment: self.winning_commitment.to_bytes(),
        }
    }

    /// Lane coordinates, padded to capacity, followed by the winner's.
    pub fn lane_coordinates(&self) -> Vec<(Scalar, Scalar)> {
        let padding = affine_coordinates(&SubgroupPoint::identity());
        let mut coords: Vec<_> = self
            .commitments
            .iter()
            .map(|c| affine_coordinates(c.point()))
            .collect();
        coords.resize(self.capacity, padding);
        coords
    }

    /// Coordinates of the winning commitment.
    pub fn winner_coordinates(&self) -> (Scalar, Scalar) {
        affine_coordinates(self.winning_commitment.point())
    }

    /// Flattened field elements in circuit order (2N + 2 elements).
    pub fn to_field_elements(&self) -> Vec<Scalar> {
        let mut out = Vec::with_capacity(2 * self.capacity + 2);
        for (u, v) in self.lane_coordinates() {
            out.push(u);
            out.push(v);
        }
        let (u, v) = self.winner_coordinates();
        out.push(u);
        out.push(v);
        out
    }
}
