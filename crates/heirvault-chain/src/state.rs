//! Persistent ledger snapshots
//!
//! The whole ledger (accounts, vaults, head block, logs, receipts) is written
//! as one pretty-printed JSON document so a CLI invocation can pick up where
//! the previous one left off.

use heirvault_core::Address;
use heirvault_inherit::VaultError;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::ledger::Ledger;

/// Errors from state operations
#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot holds an invalid vault {vault}: {reason}")]
    InvalidVault { vault: Address, reason: VaultError },

    #[error("Snapshot balances overflow the total supply")]
    SupplyOverflow,
}

impl Ledger {
    /// Load a snapshot from disk. `Ok(None)` if no snapshot exists yet.
    ///
    /// A snapshot that parses but breaks a vault invariant or the supply cap
    /// is rejected.
    pub fn load(path: &Path) -> Result<Option<Self>, StateError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        let ledger: Ledger = serde_json::from_str(&contents)?;
        ledger.check_snapshot()?;
        log::debug!(
            "Loaded ledger at block {} from {}",
            ledger.head().number,
            path.display()
        );
        Ok(Some(ledger))
    }

    fn check_snapshot(&self) -> Result<(), StateError> {
        for address in self.vault_addresses() {
            if let Some(vault) = self.vault(address) {
                vault
                    .check_invariants()
                    .map_err(|reason| StateError::InvalidVault {
                        vault: address,
                        reason,
                    })?;
            }
        }
        if self.checked_supply().is_none() {
            return Err(StateError::SupplyOverflow);
        }
        Ok(())
    }

    /// Save a snapshot, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
