//! heirvault Chain
//!
//! The execution environment a vault is hosted in: account balances, a
//! strictly increasing block clock, fees, atomic commit/revert of each
//! transaction, receipts, and an event log.
//!
//! # Features
//!
//! - One transaction per block; block timestamps strictly increase
//! - Vault calls run against a copy that is swapped in only on success
//! - Flat per-transaction fee paid to a fee recipient, charged even on revert
//! - JSON snapshot persistence across restarts
//!
//! # Example
//!
//! ```ignore
//! use heirvault_chain::{Ledger, LedgerConfig};
//! use heirvault_core::{Timestamp, Wei};
//!
//! let mut ledger = Ledger::new(Timestamp::now(), LedgerConfig::default());
//! ledger.fund(owner, Wei::ether(10))?;
//!
//! let receipt = ledger.deploy_vault(owner, heir, Wei::ether(1))?;
//! let vault = receipt.contract_address.unwrap();
//!
//! ledger.increase_time(15 * SECONDS_PER_DAY)?;
//! ledger.withdraw(owner, vault, Wei::ZERO)?; // check in
//! ```

pub mod ledger;
pub mod receipt;
pub mod state;

pub use ledger::{Account, BlockHeader, Ledger, LedgerConfig, DEFAULT_FEE_RECIPIENT};
pub use receipt::{Call, LogEntry, TxReceipt, TxStatus};
pub use state::StateError;

use heirvault_core::{Address, Timestamp, Wei};
use heirvault_inherit::VaultError;
use thiserror::Error;

/// Errors from submitting transactions to the ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The vault rejected the call. A block was mined and the fee charged,
    /// but no vault state, value or event was committed.
    #[error("Transaction reverted: {0}")]
    Reverted(VaultError),

    #[error("Insufficient funds in {account}: need {needed}, have {available}")]
    InsufficientFunds {
        account: Address,
        needed: Wei,
        available: Wei,
    },

    #[error("No vault deployed at {0}")]
    UnknownVault(Address),

    #[error("Address already in use: {0}")]
    AddressInUse(Address),

    #[error("Block timestamp must increase: requested {requested}, latest {latest}")]
    TimestampNotIncreasing {
        requested: Timestamp,
        latest: Timestamp,
    },

    #[error("Balance overflow in {0}")]
    BalanceOverflow(Address),
}

impl ChainError {
    /// The vault error behind a revert, if any.
    pub fn vault_error(&self) -> Option<&VaultError> {
        match self {
            ChainError::Reverted(e) => Some(e),
            _ => None,
        }
    }
}
