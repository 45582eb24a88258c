//! Private input of the settlement circuit.

use jubjub::Fr;

use auction_crypto::{commit_with_randomness, pedersen::verify_opening, Commitment, Opening};

use crate::error::CircuitError;
use crate::inputs::SettlementPublicInputs;

/// One lane of the circuit: an opening and the commitment it must produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BidLane {
    pub opening: Opening,
    pub commitment: Commitment,
}

impl BidLane {
    /// Padding lane: value 0 under randomness 0, whose commitment is the
    /// identity point. Every party derives the same padding.
    pub fn padding() -> Self {
        let opening = Opening::new(0, Fr::zero());
        Self {
            commitment: commit_with_randomness(0, &Fr::zero()),
            opening,
        }
    }
}

/// Fully populated witness for a fixed-capacity settlement circuit.
///
/// Only constructible through [`SettlementWitness::assemble`], which checks
/// every lane, so a witness always satisfies the circuit it is built for.
#[derive(Clone, Debug)]
pub struct SettlementWitness {
    capacity: usize,
    bid_count: usize,
    lanes: Vec<BidLane>,
    winner_index: usize,
}

impl SettlementWitness {
    /// Assemble a witness from the settled bids, in lane order.
    ///
    /// Checks run in a fixed order: capacity, then non-emptiness, then the
    /// winner index, then every opening, then maximality of the winner.
    /// Unused lanes are padded up to `capacity`.
    pub fn assemble(
        capacity: usize,
        bids: Vec<BidLane>,
        winner_index: usize,
    ) -> Result<Self, CircuitError> {
        if bids.len() > capacity {
            return Err(CircuitError::CapacityExceeded {
                bids: bids.len(),
                capacity,
            });
        }
        if bids.is_empty() {
            return Err(CircuitError::NoBids);
        }
        if winner_index >= bids.len() {
            return Err(CircuitError::WinnerOutOfRange {
                index: winner_index,
                bids: bids.len(),
            });
        }

        for (lane, bid) in bids.iter().enumerate() {
            verify_opening(&bid.commitment, &bid.opening)
                .map_err(|_| CircuitError::InvalidOpening(lane))?;
        }

        let winning_value = bids[winner_index].opening.value;
        if let Some(lane) = bids.iter().position(|b| b.opening.value > winning_value) {
            return Err(CircuitError::WinnerNotMaximum(lane));
        }

        let bid_count = bids.len();
        let mut lanes = bids;
        lanes.resize(capacity, BidLane::padding());

        Ok(Self {
            capacity,
            bid_count,
            lanes,
            winner_index,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of real (non-padding) bids.
    pub fn bid_count(&self) -> usize {
        self.bid_count
    }

    /// All `capacity` lanes, padding included.
    pub fn lanes(&self) -> &[BidLane] {
        &self.lanes
    }

    pub fn winner_index(&self) -> usize {
        self.winner_index
    }

    pub fn winner(&self) -> &BidLane {
        &self.lanes[self.winner_index]
    }

    /// The public statement this witness proves.
    pub fn public_inputs(&self) -> SettlementPublicInputs {
        let commitments = self.lanes[..self.bid_count]
            .iter()
            .map(|lane| lane.commitment)
            .collect();
        SettlementPublicInputs {
            capacity: self.capacity,
            commitments,
            winning_commitment: self.winner().commitment,
        }
    }

    /// Test-only escape hatch producing a witness whose declared winner is
    /// not the maximum, to check the circuit itself rejects it.
    #[cfg(test)]
    pub(crate) fn unchecked(capacity: usize, bids: Vec<BidLane>, winner_index: usize) -> Self {
        let bid_count = bids.len();
        let mut lanes = bids;
        lanes.resize(capacity, BidLane::padding());
        Self {
            capacity,
            bid_count,
            lanes,
            winner_index,
        }
    }
}
