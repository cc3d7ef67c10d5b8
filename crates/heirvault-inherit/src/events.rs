//! Notifications emitted by the vault on successful calls

use heirvault_core::{Address, Wei};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Events emitted synchronously within the triggering call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum VaultEvent {
    /// A new heir was installed (construction, set_heir, or claim)
    HeirUpdated { new_heir: Address },

    /// The owner withdrew funds (zero for a check-in)
    Withdrawal { amount: Wei },

    /// The former heir took over ownership
    InheritanceClaimed { former_heir: Address },
}

impl VaultEvent {
    pub fn name(&self) -> &'static str {
        match self {
            VaultEvent::HeirUpdated { .. } => "HeirUpdated",
            VaultEvent::Withdrawal { .. } => "Withdrawal",
            VaultEvent::InheritanceClaimed { .. } => "InheritanceClaimed",
        }
    }

    /// Whether this event is an ownership change
    pub fn is_claim(&self) -> bool {
        matches!(self, VaultEvent::InheritanceClaimed { .. })
    }
}

impl fmt::Display for VaultEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultEvent::HeirUpdated { new_heir } => write!(f, "HeirUpdated({})", new_heir),
            VaultEvent::Withdrawal { amount } => write!(f, "Withdrawal({})", amount),
            VaultEvent::InheritanceClaimed { former_heir } => {
                write!(f, "InheritanceClaimed({})", former_heir)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_address;

    #[test]
    fn test_event_names() {
        let heir = test_address(2);
        assert_eq!(VaultEvent::HeirUpdated { new_heir: heir }.name(), "HeirUpdated");
        assert_eq!(
            VaultEvent::Withdrawal { amount: Wei::ZERO }.name(),
            "Withdrawal"
        );
        assert!(VaultEvent::InheritanceClaimed { former_heir: heir }.is_claim());
        assert!(!VaultEvent::Withdrawal { amount: Wei::ZERO }.is_claim());
    }

    #[test]
    fn test_tagged_json() {
        let event = VaultEvent::Withdrawal {
            amount: Wei::ether(1),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"event":"Withdrawal","amount":"1000000000000000000"}"#
        );
        let restored: VaultEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, event);
    }
}
