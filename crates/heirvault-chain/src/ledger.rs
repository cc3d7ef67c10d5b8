//! The host ledger
//!
//! Supplies what the vault itself never owns: caller identity, the block
//! clock, external account balances and atomic value transfer.

use heirvault_core::{Address, Timestamp, Wei};
use heirvault_inherit::{CallContext, Effects, Vault, VaultError, VaultEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::receipt::{Call, LogEntry, TxReceipt, TxStatus};
use crate::ChainError;

/// Ledger parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Flat fee charged to the sender of every mined transaction
    pub tx_fee: Wei,
    /// Account that collects fees (keeps total supply constant)
    pub fee_recipient: Address,
}

/// `0x000000000000000000000000000000000000fee5`
pub const DEFAULT_FEE_RECIPIENT: Address = {
    let mut bytes = [0u8; 20];
    bytes[18] = 0xfe;
    bytes[19] = 0xe5;
    Address::from_bytes(bytes)
};

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            tx_fee: Wei::gwei(21_000), // 21,000 gas at 1 gwei
            fee_recipient: DEFAULT_FEE_RECIPIENT,
        }
    }
}

/// An external (non-vault) account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: Wei,
    pub nonce: u64,
}

/// Head of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub timestamp: Timestamp,
}

/// A transaction waiting to be mined
#[derive(Debug, Clone, Copy)]
struct Transaction {
    from: Address,
    to: Option<Address>,
    value: Wei,
    call: Call,
}

/// In-memory ledger hosting any number of vaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    config: LedgerConfig,
    head: BlockHeader,
    /// Timestamp pinned for the next mined block
    next_timestamp: Option<Timestamp>,
    accounts: BTreeMap<Address, Account>,
    vaults: BTreeMap<Address, Vault>,
    logs: Vec<LogEntry>,
    receipts: Vec<TxReceipt>,
}

impl Ledger {
    /// Start a chain whose genesis block is at `genesis`.
    pub fn new(genesis: Timestamp, config: LedgerConfig) -> Self {
        Self {
            config,
            head: BlockHeader {
                number: 0,
                timestamp: genesis,
            },
            next_timestamp: None,
            accounts: BTreeMap::new(),
            vaults: BTreeMap::new(),
            logs: Vec::new(),
            receipts: Vec::new(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Credit an external account out of thin air (genesis allocation).
    pub fn fund(&mut self, account: Address, value: Wei) -> Result<(), ChainError> {
        if self.vaults.contains_key(&account) {
            return Err(ChainError::AddressInUse(account));
        }
        // Total supply stays representable, so no later credit can overflow
        if self
            .checked_supply()
            .and_then(|supply| supply.checked_add(value.as_wei()))
            .is_none()
        {
            return Err(ChainError::BalanceOverflow(account));
        }
        credit(&mut self.accounts, account, value)?;
        log::debug!("Funded {} with {}", account, value);
        Ok(())
    }

    /// Balance of an external account, or the custody balance of a vault.
    pub fn balance_of(&self, address: Address) -> Wei {
        match self.vaults.get(&address) {
            Some(vault) => vault.balance(),
            None => self
                .accounts
                .get(&address)
                .map(|a| a.balance)
                .unwrap_or_default(),
        }
    }

    pub fn nonce_of(&self, address: Address) -> u64 {
        self.accounts.get(&address).map(|a| a.nonce).unwrap_or(0)
    }

    /// Sum of every account balance and every vault's custody.
    ///
    /// Saturates at `u128::MAX`. `fund` refuses to mint past that cap and
    /// `load` rejects snapshots beyond it, so in practice the sum is exact.
    pub fn total_supply(&self) -> u128 {
        self.checked_supply().unwrap_or(u128::MAX)
    }

    /// Exact total supply, `None` if it does not fit in a `u128`.
    pub(crate) fn checked_supply(&self) -> Option<u128> {
        self.accounts
            .values()
            .map(|a| a.balance)
            .chain(self.vaults.values().map(|v| v.balance()))
            .try_fold(0u128, |total, balance| total.checked_add(balance.as_wei()))
    }

    // =========================================================================
    // Clock
    // =========================================================================

    pub fn head(&self) -> BlockHeader {
        self.head
    }

    /// Timestamp of the latest block; read-only calls are evaluated here.
    pub fn latest_timestamp(&self) -> Timestamp {
        self.head.timestamp
    }

    /// Mine an empty block `secs` after the latest one.
    pub fn increase_time(&mut self, secs: u64) -> Result<BlockHeader, ChainError> {
        let requested = self.head.timestamp.plus_secs(secs);
        if requested <= self.head.timestamp {
            return Err(ChainError::TimestampNotIncreasing {
                requested,
                latest: self.head.timestamp,
            });
        }
        self.next_timestamp = None;
        Ok(self.mine(requested))
    }

    /// Pin the timestamp of the next mined block.
    pub fn set_next_block_timestamp(&mut self, timestamp: Timestamp) -> Result<(), ChainError> {
        if timestamp <= self.head.timestamp {
            return Err(ChainError::TimestampNotIncreasing {
                requested: timestamp,
                latest: self.head.timestamp,
            });
        }
        self.next_timestamp = Some(timestamp);
        Ok(())
    }

    fn mine(&mut self, timestamp: Timestamp) -> BlockHeader {
        self.head = BlockHeader {
            number: self.head.number + 1,
            timestamp,
        };
        log::debug!("Mined block {} at {}", self.head.number, timestamp);
        self.head
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Deploy a vault owned by `from`, naming `heir`, funded with `value`.
    pub fn deploy_vault(
        &mut self,
        from: Address,
        heir: Address,
        value: Wei,
    ) -> Result<TxReceipt, ChainError> {
        self.submit(Transaction {
            from,
            to: None,
            value,
            call: Call::Deploy { heir },
        })
    }

    /// Bare value transfer. Into a vault this is a deposit.
    pub fn send_value(
        &mut self,
        from: Address,
        to: Address,
        value: Wei,
    ) -> Result<TxReceipt, ChainError> {
        self.submit(Transaction {
            from,
            to: Some(to),
            value,
            call: Call::Transfer,
        })
    }

    pub fn set_heir(
        &mut self,
        from: Address,
        vault: Address,
        new_heir: Address,
    ) -> Result<TxReceipt, ChainError> {
        self.submit(Transaction {
            from,
            to: Some(vault),
            value: Wei::ZERO,
            call: Call::SetHeir { new_heir },
        })
    }

    pub fn withdraw(
        &mut self,
        from: Address,
        vault: Address,
        amount: Wei,
    ) -> Result<TxReceipt, ChainError> {
        self.submit(Transaction {
            from,
            to: Some(vault),
            value: Wei::ZERO,
            call: Call::Withdraw { amount },
        })
    }

    pub fn claim_inheritance(
        &mut self,
        from: Address,
        vault: Address,
        new_heir: Address,
    ) -> Result<TxReceipt, ChainError> {
        self.submit(Transaction {
            from,
            to: Some(vault),
            value: Wei::ZERO,
            call: Call::ClaimInheritance { new_heir },
        })
    }

    /// Validate, mine, execute, then commit or revert.
    fn submit(&mut self, tx: Transaction) -> Result<TxReceipt, ChainError> {
        // Rejections before mining leave the ledger untouched
        let fee = self.config.tx_fee;
        let needed = tx
            .value
            .checked_add(fee)
            .ok_or(ChainError::BalanceOverflow(tx.from))?;
        let available = self.balance_of(tx.from);
        if self.vaults.contains_key(&tx.from) || available < needed {
            return Err(ChainError::InsufficientFunds {
                account: tx.from,
                needed,
                available: if self.vaults.contains_key(&tx.from) {
                    Wei::ZERO
                } else {
                    available
                },
            });
        }
        if let (Some(to), true) = (tx.to, tx.call.targets_vault()) {
            if !self.vaults.contains_key(&to) {
                return Err(ChainError::UnknownVault(to));
            }
        }

        let nonce = self.nonce_of(tx.from);
        let target = tx.to.unwrap_or_else(|| Address::contract(&tx.from, nonce));
        if tx.to.is_none()
            && (self.vaults.contains_key(&target) || self.accounts.contains_key(&target))
        {
            return Err(ChainError::AddressInUse(target));
        }

        // Fee and nonce are paid whatever the outcome; recipient credited first
        credit(&mut self.accounts, self.config.fee_recipient, fee)?;
        {
            let sender = self.accounts.entry(tx.from).or_default();
            sender.balance = sender.balance.saturating_sub(fee);
            sender.nonce += 1;
        }

        let timestamp = self
            .next_timestamp
            .take()
            .unwrap_or_else(|| self.head.timestamp.plus_secs(1));
        let block = self.mine(timestamp);

        let ctx = CallContext::new(tx.from, block.timestamp).with_value(tx.value);
        let outcome = self.execute(&tx, target, &ctx);

        let (status, events) = match outcome {
            Ok(Some((vault, effects))) => {
                self.commit(&tx, target, vault, &effects, block)?;
                (TxStatus::Success, effects.events)
            }
            Ok(None) => {
                self.transfer(tx.from, target, tx.value)?;
                (TxStatus::Success, Vec::new())
            }
            Err(reason) => (TxStatus::Reverted { reason }, Vec::new()),
        };

        let receipt = TxReceipt {
            block_number: block.number,
            timestamp: block.timestamp,
            from: tx.from,
            to: target,
            call: tx.call,
            value: tx.value,
            fee,
            contract_address: match (&status, tx.call) {
                (TxStatus::Success, Call::Deploy { .. }) => Some(target),
                _ => None,
            },
            status,
            events,
        };
        self.receipts.push(receipt.clone());

        match &receipt.status {
            TxStatus::Success => {
                log::info!(
                    "Block {}: {:?} from {} to {} ok ({} events)",
                    block.number,
                    tx.call,
                    tx.from.short(),
                    target.short(),
                    receipt.events.len()
                );
                Ok(receipt)
            }
            TxStatus::Reverted { reason } => {
                log::warn!(
                    "Block {}: {:?} from {} reverted: {}",
                    block.number,
                    tx.call,
                    tx.from.short(),
                    reason
                );
                Err(ChainError::Reverted(reason.clone()))
            }
        }
    }

    /// Run vault code against a copy. `Ok(None)` means a plain transfer
    /// between external accounts with no vault involved.
    fn execute(
        &self,
        tx: &Transaction,
        target: Address,
        ctx: &CallContext,
    ) -> Result<Option<(Vault, Effects)>, VaultError> {
        let mut vault = match (tx.call, self.vaults.get(&target)) {
            (Call::Deploy { heir }, _) => return Vault::deploy(ctx, heir).map(Some),
            (_, None) => return Ok(None),
            (_, Some(existing)) => existing.clone(),
        };
        let effects = match tx.call {
            Call::Transfer | Call::Deploy { .. } => vault.receive(ctx)?,
            Call::SetHeir { new_heir } => vault.set_heir(ctx, new_heir)?,
            Call::Withdraw { amount } => vault.withdraw(ctx, amount)?,
            Call::ClaimInheritance { new_heir } => vault.claim_inheritance(ctx, new_heir)?,
        };
        Ok(Some((vault, effects)))
    }

    /// Swap in the new vault state and apply value movements and logs.
    fn commit(
        &mut self,
        tx: &Transaction,
        target: Address,
        vault: Vault,
        effects: &Effects,
        block: BlockHeader,
    ) -> Result<(), ChainError> {
        if let Some(payout) = effects.payout {
            credit(&mut self.accounts, payout.to, payout.amount)?;
        }

        // Attached value already sits in the vault's custody
        let sender = self.accounts.entry(tx.from).or_default();
        sender.balance = sender.balance.saturating_sub(tx.value);

        self.vaults.insert(target, vault);
        self.logs.extend(effects.events.iter().map(|event| LogEntry {
            block_number: block.number,
            timestamp: block.timestamp,
            address: target,
            event: *event,
        }));
        Ok(())
    }

    fn transfer(&mut self, from: Address, to: Address, value: Wei) -> Result<(), ChainError> {
        credit(&mut self.accounts, to, value)?;
        let sender = self.accounts.entry(from).or_default();
        sender.balance = sender.balance.saturating_sub(value);
        Ok(())
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn vault(&self, address: Address) -> Option<&Vault> {
        self.vaults.get(&address)
    }

    pub fn vault_addresses(&self) -> Vec<Address> {
        self.vaults.keys().copied().collect()
    }

    /// `timeUntilClaimable()` evaluated at the latest block.
    pub fn time_until_claimable(&self, vault: Address) -> Result<u64, ChainError> {
        self.vaults
            .get(&vault)
            .map(|v| v.time_until_claimable(self.head.timestamp))
            .ok_or(ChainError::UnknownVault(vault))
    }

    /// Committed log entries emitted by `vault`, oldest first.
    pub fn logs(&self, vault: Address) -> Vec<&LogEntry> {
        self.logs.iter().filter(|l| l.address == vault).collect()
    }

    /// Committed events emitted by `vault`, oldest first.
    pub fn events(&self, vault: Address) -> Vec<VaultEvent> {
        self.logs(vault).into_iter().map(|l| l.event).collect()
    }

    pub fn receipts(&self) -> &[TxReceipt] {
        &self.receipts
    }

    pub fn last_receipt(&self) -> Option<&TxReceipt> {
        self.receipts.last()
    }
}

fn credit(
    accounts: &mut BTreeMap<Address, Account>,
    to: Address,
    value: Wei,
) -> Result<(), ChainError> {
    let account = accounts.entry(to).or_default();
    account.balance = account
        .balance
        .checked_add(value)
        .ok_or(ChainError::BalanceOverflow(to))?;
    Ok(())
}
