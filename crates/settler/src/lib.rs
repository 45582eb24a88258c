//! Trusted setup and settlement proving for sealed-bid auctions.
//!
//! The auctioneer runs setup once per circuit capacity, then for every ended
//! auction:
//! 1. Opens the revealed bids with its secret key
//! 2. Selects the highest bid
//! 3. Generates a Groth16 proof that the winner holds the maximum value
//! 4. Hands the settlement record to the ledger for the winner declaration
//!
//! Proving runs on a blocking worker under a timeout and is never retried
//! automatically.

pub mod config;
pub mod error;
pub mod prover;
pub mod service;
pub mod setup;

pub use config::SettlerConfig;
pub use error::SettlementError;
pub use prover::{prove, prove_with_timeout, SettlementKeys};
pub use service::{DecryptedBid, OpenedBids, SettlementService};
pub use setup::{generate_parameters, persist_keys, run_setup, CircuitDescriptor};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use auction_circuit::BidLane;
    use auction_crypto::{commit, Opening};
    use once_cell::sync::Lazy;
    use rand::rngs::OsRng;

    use crate::prover::SettlementKeys;
    use crate::setup::generate_parameters;

    /// Parameter generation is slow; tests share one capacity-2 key pair.
    static KEYS: Lazy<Arc<SettlementKeys>> = Lazy::new(|| {
        let params = generate_parameters(2, &mut OsRng).expect("parameter generation");
        Arc::new(SettlementKeys::new(2, params).expect("settlement keys"))
    });

    pub(crate) fn shared_keys() -> Arc<SettlementKeys> {
        KEYS.clone()
    }

    pub(crate) fn lane(value: u32) -> BidLane {
        let (commitment, randomness) = commit(value, &mut OsRng).expect("commit");
        BidLane {
            opening: Opening::new(value, randomness),
            commitment,
        }
    }

    pub(crate) fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}
