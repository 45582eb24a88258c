//! Groth16 settlement circuit for sealed-bid auctions.
//!
//! The circuit re-derives every Pedersen commitment from its opening with
//! in-circuit Jubjub arithmetic and checks each bid against the declared
//! winning value. A verifier only sees the commitments.
//!
//! # Public Inputs
//! - affine coordinates of each settled commitment, padded to capacity
//! - affine coordinates of the winning commitment
//!
//! # Private Inputs
//! - bid values and randomness for every lane
//! - winning value and randomness

pub mod error;
pub mod gadgets;
pub mod inputs;
pub mod settlement;
pub mod verifier;
pub mod witness;

pub use error::CircuitError;
pub use inputs::SettlementPublicInputs;
pub use settlement::{SettlementCircuit, DEFAULT_CAPACITY};
pub use verifier::{encode_verifying_key, read_key_header, write_key_header, SettlementVerifier};
pub use witness::{BidLane, SettlementWitness};
