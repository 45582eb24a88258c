//! Ledger collaborator.
//!
//! The module never owns state. It reads and writes auction records through
//! [`LedgerContext`], which a host ledger implements per transaction.
//! [`MemoryLedger`] is the in-process implementation: it serialises
//! transactions, buffers every write, and applies the buffer only when the
//! handler returns `Ok`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use auction_types::sha256;

use crate::error::{AuctionError, LedgerError};

/// Identity of the client submitting a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Opaque participant id
    pub id: String,
    /// Organization the participant belongs to
    pub org: String,
}

impl CallerIdentity {
    pub fn new(id: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            org: org.into(),
        }
    }
}

/// Per-transaction view of the ledger.
pub trait LedgerContext {
    /// Read a key, observing this transaction's own writes.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Buffer a write; applied only if the transaction succeeds.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Id of the current transaction.
    fn transaction_id(&self) -> &str;

    /// Identity of the submitting client.
    fn caller_identity(&self) -> &CallerIdentity;

    /// Require endorsement by `org` for future writes to `key`.
    fn set_endorsement_policy(&mut self, key: &str, org: &str) -> Result<(), LedgerError>;
}

#[derive(Debug, Default)]
struct WorldState {
    entries: BTreeMap<String, Vec<u8>>,
    policies: BTreeMap<String, String>,
    tx_count: u64,
}

/// In-memory ledger.
///
/// Cloning yields another handle to the same world state.
#[derive(Clone, Debug)]
pub struct MemoryLedger {
    state: Arc<Mutex<WorldState>>,
    endorsers: Arc<BTreeSet<String>>,
}

impl MemoryLedger {
    /// Ledger whose transactions are endorsed by peers of `endorsing_orgs`.
    pub fn new<I, S>(endorsing_orgs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            state: Arc::new(Mutex::new(WorldState::default())),
            endorsers: Arc::new(endorsing_orgs.into_iter().map(Into::into).collect()),
        }
    }

    /// Run `f` as one transaction submitted by `caller`.
    ///
    /// Writes are committed atomically when `f` returns `Ok`, and dropped
    /// otherwise. Returns the result together with the transaction id.
    pub fn submit<T, F>(&self, caller: &CallerIdentity, f: F) -> Result<(T, String), AuctionError>
    where
        F: FnOnce(&mut TxContext<'_>) -> Result<T, AuctionError>,
    {
        let mut state = self.state.lock();
        state.tx_count += 1;
        let tx_id = transaction_id(state.tx_count, caller);

        let mut tx = TxContext {
            world: &*state,
            caller,
            tx_id: &tx_id,
            writes: BTreeMap::new(),
            policies: BTreeMap::new(),
        };
        let output = f(&mut tx)?;
        let (writes, policies) = (tx.writes, tx.policies);

        for key in writes.keys() {
            if let Some(org) = state.policies.get(key) {
                if !self.endorsers.contains(org) {
                    return Err(LedgerError::EndorsementPolicyFailure {
                        key: key.clone(),
                        org: org.clone(),
                    }
                    .into());
                }
            }
        }

        debug!(
            tx_id = %tx_id,
            caller = %caller.id,
            writes = writes.len(),
            "committing transaction"
        );
        state.entries.extend(writes);
        state.policies.extend(policies);
        Ok((output, tx_id))
    }

    /// Run a read-only query; nothing `f` writes is kept.
    pub fn evaluate<T, F>(&self, caller: &CallerIdentity, f: F) -> Result<T, AuctionError>
    where
        F: FnOnce(&TxContext<'_>) -> Result<T, AuctionError>,
    {
        let state = self.state.lock();
        let tx = TxContext {
            world: &*state,
            caller,
            tx_id: "",
            writes: BTreeMap::new(),
            policies: BTreeMap::new(),
        };
        f(&tx)
    }

    /// Committed value of a key.
    pub fn committed(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().entries.get(key).cloned()
    }

    /// Org whose endorsement writes to `key` require.
    pub fn endorsement_policy(&self, key: &str) -> Option<String> {
        self.state.lock().policies.get(key).cloned()
    }
}

fn transaction_id(counter: u64, caller: &CallerIdentity) -> String {
    let mut preimage = counter.to_le_bytes().to_vec();
    preimage.extend_from_slice(caller.id.as_bytes());
    hex::encode(sha256(&preimage))
}

/// One transaction against a [`MemoryLedger`].
pub struct TxContext<'a> {
    world: &'a WorldState,
    caller: &'a CallerIdentity,
    tx_id: &'a str,
    writes: BTreeMap<String, Vec<u8>>,
    policies: BTreeMap<String, String>,
}

fn check_key(key: &str) -> Result<(), LedgerError> {
    if key.is_empty() {
        return Err(LedgerError::InvalidKey(key.to_string()));
    }
    Ok(())
}

impl LedgerContext for TxContext<'_> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        check_key(key)?;
        Ok(self
            .writes
            .get(key)
            .or_else(|| self.world.entries.get(key))
            .cloned())
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        check_key(key)?;
        self.writes.insert(key.to_string(), value);
        Ok(())
    }

    fn transaction_id(&self) -> &str {
        self.tx_id
    }

    fn caller_identity(&self) -> &CallerIdentity {
        self.caller
    }

    fn set_endorsement_policy(&mut self, key: &str, org: &str) -> Result<(), LedgerError> {
        check_key(key)?;
        self.policies.insert(key.to_string(), org.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> CallerIdentity {
        CallerIdentity::new("alice", "Org1MSP")
    }

    #[test]
    fn test_writes_committed_on_success() {
        let ledger = MemoryLedger::new(["Org1MSP"]);
        let (_, tx_id) = ledger
            .submit(&alice(), |tx| {
                tx.put_state("k", b"v".to_vec())?;
                assert_eq!(tx.get_state("k")?, Some(b"v".to_vec()));
                Ok(())
            })
            .unwrap();
        assert_eq!(tx_id.len(), 64);
        assert_eq!(ledger.committed("k"), Some(b"v".to_vec()));
    }

    #[test]
    fn test_writes_dropped_on_error() {
        let ledger = MemoryLedger::new(["Org1MSP"]);
        let result: Result<((), String), _> = ledger.submit(&alice(), |tx| {
            tx.put_state("k", b"v".to_vec())?;
            Err(AuctionError::NotAuthorized)
        });
        assert_eq!(result.unwrap_err(), AuctionError::NotAuthorized);
        assert_eq!(ledger.committed("k"), None);
    }

    #[test]
    fn test_transaction_ids_unique() {
        let ledger = MemoryLedger::new(["Org1MSP"]);
        let (_, a) = ledger.submit(&alice(), |_| Ok(())).unwrap();
        let (_, b) = ledger.submit(&alice(), |_| Ok(())).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_endorsement_policy_enforced() {
        let ledger = MemoryLedger::new(["Org1MSP"]);
        ledger
            .submit(&alice(), |tx| {
                tx.put_state("auction", vec![1])?;
                tx.set_endorsement_policy("auction", "Org2MSP")?;
                Ok(())
            })
            .unwrap();
        assert_eq!(ledger.endorsement_policy("auction"), Some("Org2MSP".to_string()));

        // Org2 peers do not endorse on this ledger.
        let result = ledger.submit(&alice(), |tx| {
            tx.put_state("auction", vec![2])?;
            Ok(())
        });
        assert!(matches!(
            result,
            Err(AuctionError::Ledger(LedgerError::EndorsementPolicyFailure { .. }))
        ));
        assert_eq!(ledger.committed("auction"), Some(vec![1]));
    }

    #[test]
    fn test_evaluate_discards_nothing_committed() {
        let ledger = MemoryLedger::new(["Org1MSP"]);
        let caller = ledger
            .evaluate(&alice(), |tx| Ok(tx.caller_identity().clone()))
            .unwrap();
        assert_eq!(caller, alice());
    }

    #[test]
    fn test_empty_key_rejected() {
        let ledger = MemoryLedger::new(["Org1MSP"]);
        let result = ledger.submit(&alice(), |tx| Ok(tx.put_state("", vec![])?));
        assert!(matches!(
            result,
            Err(AuctionError::Ledger(LedgerError::InvalidKey(_)))
        ));
    }
}
