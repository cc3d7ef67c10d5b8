//! Operator commands against the persisted local ledger.
//!
//! Each invocation loads `ledger.json` from the data directory (creating a
//! fresh chain on first use), submits at most one transaction, saves the
//! snapshot and then mirrors new events into the SQLite log.

use anyhow::{Context, Result};
use heirvault_chain::{ChainError, Ledger, TxReceipt};
use heirvault_core::{format_duration, Address, Timestamp, Wei};
use heirvault_inherit::evaluate_heartbeat;
use rusqlite::Connection;

use crate::config::ServerConfig;
use crate::db;

/// A parsed CLI command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Deploy {
        from: Address,
        heir: Address,
        value: Wei,
    },
    Deposit {
        from: Address,
        value: Wei,
    },
    SetHeir {
        from: Address,
        heir: Address,
    },
    Withdraw {
        from: Address,
        amount: Wei,
    },
    Claim {
        from: Address,
        heir: Address,
    },
    Fund {
        to: Address,
        value: Wei,
    },
    Advance {
        secs: u64,
    },
    Status,
    Events,
    Watch,
    Check,
    Validate,
}

/// Ledger snapshot plus event log, opened from the configured data directory.
pub struct Workspace {
    config: ServerConfig,
    ledger: Ledger,
    db: Connection,
}

impl Workspace {
    pub fn open(config: ServerConfig) -> Result<Self> {
        let data_dir = &config.server.data_dir;
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data dir: {}", data_dir.display()))?;

        let ledger_path = config.ledger_path();
        let ledger = match Ledger::load(&ledger_path)
            .with_context(|| format!("Failed to load ledger from {}", ledger_path.display()))?
        {
            Some(ledger) => ledger,
            None => {
                let genesis = config.genesis_timestamp();
                log::info!("Creating new ledger with genesis at {}", genesis);
                Ledger::new(genesis, config.ledger_config())
            }
        };

        let db_path = config.db_path();
        let db = db::open_db(&db_path)
            .with_context(|| format!("Failed to open event log {}", db_path.display()))?;

        Ok(Self { config, ledger, db })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[cfg(test)]
    pub fn db(&self) -> &Connection {
        &self.db
    }

    /// The configured vault, else the one created by the most recent deploy.
    pub fn vault_address(&self) -> Result<Address> {
        if let Some(address) = self.config.vault.address {
            return Ok(address);
        }
        self.ledger
            .receipts()
            .iter()
            .rev()
            .find_map(|r| r.contract_address)
            .context("No vault configured and none deployed yet (set vault.address or run deploy)")
    }

    /// Save the snapshot and mirror new events.
    fn persist(&mut self) -> Result<()> {
        let path = self.config.ledger_path();
        self.ledger
            .save(&path)
            .with_context(|| format!("Failed to save ledger to {}", path.display()))?;
        db::sync_ledger(&mut self.db, &self.ledger).context("Failed to update event log")?;
        Ok(())
    }

    /// Persist whatever the transaction did (a revert still mined a block
    /// and charged a fee), then surface its outcome.
    fn finish(&mut self, result: Result<TxReceipt, ChainError>) -> Result<TxReceipt> {
        self.persist()?;
        result.map_err(anyhow::Error::from)
    }

    /// Run one command, returning the text to show the operator.
    pub fn execute(&mut self, command: &Command) -> Result<String> {
        match *command {
            Command::Deploy { from, heir, value } => {
                let result = self.ledger.deploy_vault(from, heir, value);
                let receipt = self.finish(result)?;
                let vault = receipt
                    .contract_address
                    .context("Deployment receipt carries no contract address")?;
                Ok(format!(
                    "Vault deployed at {}\n  owner: {}\n  heir:  {}\n  value: {}\n  block: {}",
                    vault,
                    from,
                    heir,
                    value,
                    receipt.block_number
                ))
            }
            Command::Deposit { from, value } => {
                let vault = self.vault_address()?;
                let result = self.ledger.send_value(from, vault, value);
                let receipt = self.finish(result)?;
                Ok(format!(
                    "Deposited {} into {} (block {}). Vault balance: {}",
                    value,
                    vault,
                    receipt.block_number,
                    self.ledger.balance_of(vault)
                ))
            }
            Command::SetHeir { from, heir } => {
                let vault = self.vault_address()?;
                let result = self.ledger.set_heir(from, vault, heir);
                let receipt = self.finish(result)?;
                Ok(format!(
                    "Heir of {} is now {} (block {})",
                    vault, heir, receipt.block_number
                ))
            }
            Command::Withdraw { from, amount } => {
                let vault = self.vault_address()?;
                let result = self.ledger.withdraw(from, vault, amount);
                let receipt = self.finish(result)?;
                let what = if amount.is_zero() {
                    "Checked in".to_string()
                } else {
                    format!("Withdrew {}", amount)
                };
                Ok(format!(
                    "{} at {} (block {}). Heir can claim in {}",
                    what,
                    receipt.timestamp,
                    receipt.block_number,
                    format_duration(self.ledger.time_until_claimable(vault)?)
                ))
            }
            Command::Claim { from, heir } => {
                let vault = self.vault_address()?;
                let result = self.ledger.claim_inheritance(from, vault, heir);
                let receipt = self.finish(result)?;
                Ok(format!(
                    "Inheritance claimed: {} now owns {} (new heir {}, block {})",
                    from, vault, heir, receipt.block_number
                ))
            }
            Command::Fund { to, value } => {
                self.ledger.fund(to, value)?;
                self.persist()?;
                Ok(format!(
                    "Funded {} with {}. Balance: {}",
                    to,
                    value,
                    self.ledger.balance_of(to)
                ))
            }
            Command::Advance { secs } => {
                let block = self.ledger.increase_time(secs)?;
                self.persist()?;
                Ok(format!(
                    "Advanced {} to block {} at {}",
                    format_duration(secs),
                    block.number,
                    block.timestamp
                ))
            }
            Command::Status => self.status(),
            Command::Events => self.events(),
            Command::Watch | Command::Check | Command::Validate => {
                anyhow::bail!("{:?} does not run against the workspace", command)
            }
        }
    }

    fn status(&self) -> Result<String> {
        let head = self.ledger.head();
        let mut out = format!("Block {} at {}\n", head.number, head.timestamp);

        let address = self.vault_address()?;
        let vault = self
            .ledger
            .vault(address)
            .ok_or(ChainError::UnknownVault(address))?;
        let status =
            evaluate_heartbeat(address, vault, head.timestamp, &self.config.heartbeat_config());
        let key = address.to_string();
        let last_checkin = db::checkin_last(&self.db, &key)?;
        let checkins = db::checkin_count(&self.db, &key)?;

        out.push_str(&format!("Vault {} ({})\n", address, self.config.vault.label));
        out.push_str(&format!("  owner:       {}\n", vault.owner()));
        out.push_str(&format!("  heir:        {}\n", vault.heir()));
        out.push_str(&format!("  balance:     {}\n", vault.balance()));
        out.push_str(&format!("  last action: {}\n", vault.last_action()));
        out.push_str(&format!(
            "  check-ins:   {} (last: {})\n",
            checkins,
            last_checkin
                .map(|ts| Timestamp::from_secs(ts).to_string())
                .unwrap_or_else(|| "never".to_string())
        ));
        out.push_str(&format!(
            "  claimable in: {} ({:.0}% of period elapsed)\n",
            format_duration(status.seconds_remaining),
            status.elapsed_fraction * 100.0
        ));
        out.push_str(&format!("  heartbeat:   {:?}", status.action));
        Ok(out)
    }

    fn events(&self) -> Result<String> {
        let vault = self.config.vault.address.map(|a| a.to_string());
        let rows = db::event_list(&self.db, vault.as_deref())?;
        if rows.is_empty() {
            return Ok("No events recorded.".to_string());
        }
        let lines: Vec<String> = rows
            .iter()
            .map(|row| {
                format!(
                    "#{:<5} {}  {}  {:<18} {}",
                    row.block_number,
                    Timestamp::from_secs(row.timestamp),
                    row.vault,
                    row.kind,
                    row.payload
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heirvault_core::INHERITANCE_PERIOD_SECS;
    use heirvault_inherit::VaultError;
    use tempfile::TempDir;

    fn addr(seed: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[0] = 0x01;
        bytes[19] = seed;
        Address::from_bytes(bytes)
    }

    fn test_config(dir: &TempDir) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.server.data_dir = dir.path().join("data");
        config.chain.genesis_timestamp = Some(1_700_000_000);
        config
    }

    fn open(dir: &TempDir) -> Workspace {
        Workspace::open(test_config(dir)).unwrap()
    }

    fn bootstrap(dir: &TempDir) -> Address {
        let mut ws = open(dir);
        ws.execute(&Command::Fund {
            to: addr(1),
            value: Wei::ether(10),
        })
        .unwrap();
        ws.execute(&Command::Fund {
            to: addr(2),
            value: Wei::ether(10),
        })
        .unwrap();
        ws.execute(&Command::Deploy {
            from: addr(1),
            heir: addr(2),
            value: Wei::ether(1),
        })
        .unwrap();
        ws.vault_address().unwrap()
    }

    #[test]
    fn test_fresh_workspace_uses_configured_genesis() {
        let dir = TempDir::new().unwrap();
        let ws = open(&dir);
        assert_eq!(
            ws.ledger().latest_timestamp(),
            Timestamp::from_secs(1_700_000_000)
        );
        assert!(ws.vault_address().is_err());
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let vault = bootstrap(&dir);

        let ws = open(&dir);
        assert_eq!(ws.vault_address().unwrap(), vault);
        assert_eq!(ws.ledger().balance_of(vault), Wei::ether(1));
        assert_eq!(db::event_list(ws.db(), None).unwrap().len(), 1);
    }

    #[test]
    fn test_configured_vault_address_wins() {
        let dir = TempDir::new().unwrap();
        bootstrap(&dir);

        let mut config = test_config(&dir);
        config.vault.address = Some(addr(9));
        let ws = Workspace::open(config).unwrap();
        assert_eq!(ws.vault_address().unwrap(), addr(9));
    }

    #[test]
    fn test_checkin_and_claim_flow() {
        let dir = TempDir::new().unwrap();
        let vault = bootstrap(&dir);
        let mut ws = open(&dir);

        let out = ws
            .execute(&Command::Withdraw {
                from: addr(1),
                amount: Wei::ZERO,
            })
            .unwrap();
        assert!(out.starts_with("Checked in"));
        assert_eq!(db::checkin_count(ws.db(), &vault.to_string()).unwrap(), 1);

        ws.execute(&Command::Advance {
            secs: INHERITANCE_PERIOD_SECS + 1,
        })
        .unwrap();
        ws.execute(&Command::Claim {
            from: addr(2),
            heir: addr(3),
        })
        .unwrap();

        let mut ws = open(&dir);
        let state = ws.ledger().vault(vault).unwrap();
        assert_eq!(state.owner(), addr(2));
        assert_eq!(state.heir(), addr(3));

        let status = ws.execute(&Command::Status).unwrap();
        assert!(status.contains(&format!("owner:       {}", addr(2))));
        assert!(status.contains("heartbeat:   Healthy"));
    }

    #[test]
    fn test_revert_is_persisted_and_reported() {
        let dir = TempDir::new().unwrap();
        let vault = bootstrap(&dir);
        let mut ws = open(&dir);
        let head = ws.ledger().head().number;

        let err = ws
            .execute(&Command::SetHeir {
                from: addr(2),
                heir: addr(3),
            })
            .unwrap_err();
        let chain_err = err.downcast_ref::<ChainError>().unwrap();
        assert_eq!(
            chain_err.vault_error(),
            Some(&VaultError::NotOwner { caller: addr(2) })
        );

        // The failed call still mined a block and charged its fee
        let ws = open(&dir);
        assert_eq!(ws.ledger().head().number, head + 1);
        assert_eq!(ws.ledger().vault(vault).unwrap().heir(), addr(2));
    }

    #[test]
    fn test_deposit_and_events_listing() {
        let dir = TempDir::new().unwrap();
        let vault = bootstrap(&dir);
        let mut ws = open(&dir);

        ws.execute(&Command::Deposit {
            from: addr(2),
            value: Wei::ether(2),
        })
        .unwrap();
        assert_eq!(ws.ledger().balance_of(vault), Wei::ether(3));

        let listing = ws.execute(&Command::Events).unwrap();
        assert!(listing.contains("HeirUpdated"));
        assert_eq!(listing.lines().count(), 1);
    }

    #[test]
    fn test_non_workspace_commands_rejected() {
        let dir = TempDir::new().unwrap();
        let mut ws = open(&dir);
        assert!(ws.execute(&Command::Check).is_err());
    }
}
