//! Vault failure conditions
//!
//! Every variant aborts the whole call: no state change, no value transfer,
//! no event.

use heirvault_core::{Address, Timestamp, Wei};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultError {
    /// Supplied heir is the zero address or the (prospective) owner.
    #[error("Invalid heir: {0}")]
    InvalidHeir(Address),

    /// Owner-only operation called by someone else.
    #[error("Unauthorized account: {caller} is not the owner")]
    NotOwner { caller: Address },

    #[error("Not the heir: {caller} cannot claim this vault")]
    NotTheHeir { caller: Address },

    #[error("Inheritance period not reached: {remaining_secs}s remaining")]
    InheritancePeriodNotReached { remaining_secs: u64 },

    #[error("Invalid withdraw amount: requested {requested}, available {available}")]
    InvalidWithdrawAmount { requested: Wei, available: Wei },

    /// The host supplied a time earlier than the last recorded action.
    #[error("Stale timestamp: {now} is before last action at {last_action}")]
    StaleTimestamp { now: Timestamp, last_action: Timestamp },

    #[error("Vault balance overflow")]
    BalanceOverflow,
}

impl VaultError {
    /// Short, stable name of the condition (for logs and receipts).
    pub fn name(&self) -> &'static str {
        match self {
            VaultError::InvalidHeir(_) => "InvalidHeir",
            VaultError::NotOwner { .. } => "NotOwner",
            VaultError::NotTheHeir { .. } => "NotTheHeir",
            VaultError::InheritancePeriodNotReached { .. } => "InheritancePeriodNotReached",
            VaultError::InvalidWithdrawAmount { .. } => "InvalidWithdrawAmount",
            VaultError::StaleTimestamp { .. } => "StaleTimestamp",
            VaultError::BalanceOverflow => "BalanceOverflow",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_address;

    #[test]
    fn test_not_owner_carries_caller() {
        let caller = test_address(7);
        let err = VaultError::NotOwner { caller };
        assert!(err.to_string().contains(&caller.to_string()));
        assert_eq!(err.name(), "NotOwner");
    }

    #[test]
    fn test_withdraw_amount_message() {
        let err = VaultError::InvalidWithdrawAmount {
            requested: Wei::ether(2),
            available: Wei::ether(1),
        };
        assert_eq!(
            err.to_string(),
            "Invalid withdraw amount: requested 2 ETH, available 1 ETH"
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let err = VaultError::InheritancePeriodNotReached {
            remaining_secs: 86_400,
        };
        let json = serde_json::to_string(&err).unwrap();
        let restored: VaultError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, restored);
    }
}
