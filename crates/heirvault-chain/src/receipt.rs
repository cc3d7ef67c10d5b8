//! Transaction receipts and the event log

use heirvault_core::{Address, Timestamp, Wei};
use heirvault_inherit::{VaultError, VaultEvent};
use serde::{Deserialize, Serialize};

/// What a transaction asked the target to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Call {
    /// Create a new vault naming `heir`
    Deploy { heir: Address },
    /// Bare value transfer (a deposit when the target is a vault)
    Transfer,
    SetHeir { new_heir: Address },
    Withdraw { amount: Wei },
    ClaimInheritance { new_heir: Address },
}

impl Call {
    /// Calls that run vault code against an existing vault.
    pub(crate) fn targets_vault(&self) -> bool {
        matches!(
            self,
            Call::SetHeir { .. } | Call::Withdraw { .. } | Call::ClaimInheritance { .. }
        )
    }
}

/// Outcome of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TxStatus {
    Success,
    Reverted { reason: VaultError },
}

/// Record of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub block_number: u64,
    pub timestamp: Timestamp,
    pub from: Address,
    /// Target account; for a deployment, the new vault's address
    pub to: Address,
    pub call: Call,
    pub value: Wei,
    pub fee: Wei,
    pub status: TxStatus,
    /// Events emitted, in order (empty on revert)
    pub events: Vec<VaultEvent>,
    /// Set when the transaction created a vault
    pub contract_address: Option<Address>,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        matches!(self.status, TxStatus::Success)
    }
}

/// A committed event, as seen by external log consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub block_number: u64,
    pub timestamp: Timestamp,
    /// Emitting vault
    pub address: Address,
    pub event: VaultEvent,
}
