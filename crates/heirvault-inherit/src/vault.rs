//! The inheritance custody state machine
//!
//! Identity (owner, heir) and liveness (last action) live together in a
//! [`Control`] record that is always replaced as a whole, so a claim can never
//! be observed half-applied. Every guard runs before the first write.

use heirvault_core::{Address, Timestamp, Wei, INHERITANCE_PERIOD_SECS};
use serde::{Deserialize, Serialize};

use crate::context::CallContext;
use crate::error::VaultError;
use crate::events::VaultEvent;

/// Who controls the vault and when they last acted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub owner: Address,
    pub heir: Address,
    pub last_action: Timestamp,
}

/// Value leaving custody as part of a successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub to: Address,
    pub amount: Wei,
}

/// What the host must apply after a successful call: events to log and an
/// optional outgoing transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    pub events: Vec<VaultEvent>,
    pub payout: Option<Payout>,
}

impl Effects {
    fn none() -> Self {
        Self::default()
    }

    fn emit(events: Vec<VaultEvent>) -> Self {
        Self {
            events,
            payout: None,
        }
    }
}

/// A dead-man's-switch vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    control: Control,
    balance: Wei,
}

impl Vault {
    /// Construct a vault owned by the caller, naming `heir`.
    ///
    /// Any value attached to the call is taken into custody.
    pub fn deploy(ctx: &CallContext, heir: Address) -> Result<(Self, Effects), VaultError> {
        ensure_valid_heir(heir, ctx.caller)?;

        let vault = Self {
            control: Control {
                owner: ctx.caller,
                heir,
                last_action: ctx.now,
            },
            balance: ctx.value,
        };
        Ok((
            vault,
            Effects::emit(vec![VaultEvent::HeirUpdated { new_heir: heir }]),
        ))
    }

    /// Replace the heir. Owner only; does not reset the inactivity clock.
    pub fn set_heir(&mut self, ctx: &CallContext, new_heir: Address) -> Result<Effects, VaultError> {
        self.ensure_owner(ctx.caller)?;
        ensure_valid_heir(new_heir, self.control.owner)?;

        self.control = Control {
            heir: new_heir,
            ..self.control
        };
        Ok(Effects::emit(vec![VaultEvent::HeirUpdated { new_heir }]))
    }

    /// Bare value transfer into custody. Open to anyone, touches nothing else.
    pub fn receive(&mut self, ctx: &CallContext) -> Result<Effects, VaultError> {
        self.balance = self
            .balance
            .checked_add(ctx.value)
            .ok_or(VaultError::BalanceOverflow)?;
        Ok(Effects::none())
    }

    /// Pay `amount` out to the owner and reset the inactivity clock.
    ///
    /// A zero amount is a valid check-in: nothing moves but the clock resets.
    pub fn withdraw(&mut self, ctx: &CallContext, amount: Wei) -> Result<Effects, VaultError> {
        self.ensure_owner(ctx.caller)?;
        let remaining = self
            .balance
            .checked_sub(amount)
            .ok_or(VaultError::InvalidWithdrawAmount {
                requested: amount,
                available: self.balance,
            })?;
        self.ensure_not_stale(ctx.now)?;

        self.balance = remaining;
        self.control = Control {
            last_action: ctx.now,
            ..self.control
        };
        Ok(Effects {
            events: vec![VaultEvent::Withdrawal { amount }],
            payout: Some(Payout {
                to: self.control.owner,
                amount,
            }),
        })
    }

    /// Heir takes ownership after the owner's inactivity, naming a successor.
    ///
    /// The period must have strictly elapsed: a claim at exactly
    /// `last_action + period` fails.
    pub fn claim_inheritance(
        &mut self,
        ctx: &CallContext,
        new_heir: Address,
    ) -> Result<Effects, VaultError> {
        self.ensure_heir(ctx.caller)?;
        ensure_valid_heir(new_heir, ctx.caller)?;
        if !self.is_claimable(ctx.now) {
            return Err(VaultError::InheritancePeriodNotReached {
                remaining_secs: self.time_until_claimable(ctx.now),
            });
        }

        let former_heir = self.control.heir;
        self.control = Control {
            owner: former_heir,
            heir: new_heir,
            last_action: ctx.now,
        };
        Ok(Effects::emit(vec![
            VaultEvent::InheritanceClaimed { former_heir },
            VaultEvent::HeirUpdated { new_heir },
        ]))
    }

    /// Seconds until the heir may claim, saturating at zero.
    pub fn time_until_claimable(&self, now: Timestamp) -> u64 {
        INHERITANCE_PERIOD_SECS.saturating_sub(now.secs_since(self.control.last_action))
    }

    /// Whether a claim submitted at `now` would pass the inactivity check.
    pub fn is_claimable(&self, now: Timestamp) -> bool {
        now.secs_since(self.control.last_action) > INHERITANCE_PERIOD_SECS
    }

    pub fn owner(&self) -> Address {
        self.control.owner
    }

    pub fn heir(&self) -> Address {
        self.control.heir
    }

    pub fn last_action(&self) -> Timestamp {
        self.control.last_action
    }

    pub fn balance(&self) -> Wei {
        self.balance
    }

    pub fn control(&self) -> Control {
        self.control
    }

    /// Heir is set and distinct from the owner.
    ///
    /// Holds for every vault built through these operations; a deserialized
    /// vault has to be checked.
    pub fn check_invariants(&self) -> Result<(), VaultError> {
        ensure_valid_heir(self.control.heir, self.control.owner)
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), VaultError> {
        if caller != self.control.owner {
            return Err(VaultError::NotOwner { caller });
        }
        Ok(())
    }

    fn ensure_heir(&self, caller: Address) -> Result<(), VaultError> {
        if caller != self.control.heir {
            return Err(VaultError::NotTheHeir { caller });
        }
        Ok(())
    }

    fn ensure_not_stale(&self, now: Timestamp) -> Result<(), VaultError> {
        if now < self.control.last_action {
            return Err(VaultError::StaleTimestamp {
                now,
                last_action: self.control.last_action,
            });
        }
        Ok(())
    }
}

/// An heir must be non-zero and distinct from the account that will own the
/// vault alongside it.
fn ensure_valid_heir(heir: Address, owner: Address) -> Result<(), VaultError> {
    if heir.is_zero() || heir == owner {
        return Err(VaultError::InvalidHeir(heir));
    }
    Ok(())
}
