//! Settler configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use auction_circuit::DEFAULT_CAPACITY;

/// File name of the serialized proving key inside `key_dir`.
pub const PROVING_KEY_FILE: &str = "settlement.pk";

/// File name of the serialized verifying key inside `key_dir`.
pub const VERIFYING_KEY_FILE: &str = "settlement.vk";

/// File name of the circuit descriptor inside `key_dir`.
pub const DESCRIPTOR_FILE: &str = "circuit.json";

/// Configuration for the settlement service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlerConfig {
    /// Number of lanes of the settlement circuit
    pub capacity: usize,
    /// Directory holding the key files produced by setup
    pub key_dir: PathBuf,
    /// Upper bound on one proving run, in seconds
    pub proving_timeout_secs: u64,
    /// Check curve points when loading the proving key
    pub check_proving_key: bool,
}

impl Default for SettlerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            key_dir: PathBuf::from("keys"),
            proving_timeout_secs: 600,
            check_proving_key: true,
        }
    }
}

impl SettlerConfig {
    /// Load a JSON configuration file; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading settler config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing settler config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.capacity > 0, "circuit capacity cannot be zero");
        ensure!(
            u32::try_from(self.capacity).is_ok(),
            "circuit capacity {} does not fit the key header",
            self.capacity
        );
        ensure!(self.proving_timeout_secs > 0, "proving timeout cannot be zero");
        Ok(())
    }

    pub fn proving_timeout(&self) -> Duration {
        Duration::from_secs(self.proving_timeout_secs)
    }

    pub fn proving_key_path(&self) -> PathBuf {
        self.key_dir.join(PROVING_KEY_FILE)
    }

    pub fn verifying_key_path(&self) -> PathBuf {
        self.key_dir.join(VERIFYING_KEY_FILE)
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.key_dir.join(DESCRIPTOR_FILE)
    }
}
