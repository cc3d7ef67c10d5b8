//! Server configuration, parsed from a TOML file plus environment variable overrides.
//!
//! Priority: environment variables > config file > defaults.

use anyhow::{Context, Result};
use heirvault_chain::{LedgerConfig, DEFAULT_FEE_RECIPIENT};
use heirvault_core::{Address, Timestamp, Wei};
use heirvault_inherit::HeartbeatConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// General server settings
    #[serde(default)]
    pub server: ServerSection,

    /// Local ledger parameters
    #[serde(default)]
    pub chain: ChainSection,

    /// The vault this operator manages
    #[serde(default)]
    pub vault: VaultSection,

    /// When the monitor starts nagging the owner
    #[serde(default)]
    pub heartbeat: HeartbeatSection,
}

/// General server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Data directory (ledger snapshot, SQLite event log)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Check interval in seconds (default: 1 hour)
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            check_interval_secs: default_check_interval(),
            log_level: default_log_level(),
        }
    }
}

/// Parameters used when a fresh ledger is created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSection {
    /// Genesis block time; wall-clock time when unset
    pub genesis_timestamp: Option<u64>,

    /// Flat fee per transaction, in wei (decimal string)
    #[serde(default = "default_tx_fee")]
    pub tx_fee_wei: Wei,

    /// Account collecting transaction fees
    #[serde(default = "default_fee_recipient")]
    pub fee_recipient: Address,
}

impl Default for ChainSection {
    fn default() -> Self {
        Self {
            genesis_timestamp: None,
            tx_fee_wei: default_tx_fee(),
            fee_recipient: default_fee_recipient(),
        }
    }
}

/// The vault this operator manages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSection {
    /// Vault address. Falls back to the most recent deployment when unset.
    pub address: Option<Address>,

    /// Human-readable label used in logs
    #[serde(default = "default_vault_label")]
    pub label: String,
}

impl Default for VaultSection {
    fn default() -> Self {
        Self {
            address: None,
            label: default_vault_label(),
        }
    }
}

/// Heartbeat thresholds, as fractions of the inheritance period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatSection {
    #[serde(default = "default_checkin_threshold")]
    pub checkin_threshold: f64,

    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
}

impl Default for HeartbeatSection {
    fn default() -> Self {
        Self {
            checkin_threshold: default_checkin_threshold(),
            critical_threshold: default_critical_threshold(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_data_dir() -> PathBuf {
    PathBuf::from("/data")
}

fn default_check_interval() -> u64 {
    3600 // 1 hour
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tx_fee() -> Wei {
    LedgerConfig::default().tx_fee
}

fn default_fee_recipient() -> Address {
    DEFAULT_FEE_RECIPIENT
}

fn default_vault_label() -> String {
    "vault".to_string()
}

fn default_checkin_threshold() -> f64 {
    HeartbeatConfig::default().checkin_threshold
}

fn default_critical_threshold() -> f64 {
    HeartbeatConfig::default().critical_threshold
}

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

// ============================================================================
// Loading & environment override
// ============================================================================

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ServerConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `HEIRVAULT_DATA_DIR`
    /// - `HEIRVAULT_CHECK_INTERVAL`
    /// - `HEIRVAULT_LOG_LEVEL`
    /// - `HEIRVAULT_VAULT_ADDRESS`
    /// - `HEIRVAULT_TX_FEE_WEI`
    ///
    /// An unparseable numeric or address value is an error, never a silent
    /// fallback to the file or default setting.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("HEIRVAULT_DATA_DIR") {
            self.server.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("HEIRVAULT_CHECK_INTERVAL") {
            self.server.check_interval_secs = v
                .parse::<u64>()
                .with_context(|| format!("Invalid HEIRVAULT_CHECK_INTERVAL: {}", v))?;
        }
        if let Ok(v) = std::env::var("HEIRVAULT_LOG_LEVEL") {
            self.server.log_level = v;
        }
        if let Ok(v) = std::env::var("HEIRVAULT_VAULT_ADDRESS") {
            let address = v
                .parse::<Address>()
                .with_context(|| format!("Invalid HEIRVAULT_VAULT_ADDRESS: {}", v))?;
            self.vault.address = Some(address);
        }
        if let Ok(v) = std::env::var("HEIRVAULT_TX_FEE_WEI") {
            self.chain.tx_fee_wei = v
                .parse::<Wei>()
                .with_context(|| format!("Invalid HEIRVAULT_TX_FEE_WEI: {}", v))?;
        }
        Ok(())
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        // Check interval must be at least 60 seconds
        anyhow::ensure!(
            self.server.check_interval_secs >= 60,
            "server.check_interval_secs must be >= 60"
        );

        anyhow::ensure!(
            LOG_LEVELS.contains(&self.server.log_level.to_ascii_lowercase().as_str()),
            "server.log_level must be one of {}",
            LOG_LEVELS.join("/")
        );

        if let Some(address) = self.vault.address {
            anyhow::ensure!(!address.is_zero(), "vault.address must not be the zero address");
        }

        anyhow::ensure!(
            !self.vault.label.trim().is_empty(),
            "vault.label must not be empty"
        );

        self.heartbeat_config()
            .validate()
            .context("Invalid [heartbeat] section")?;

        Ok(())
    }

    /// Parameters for a freshly created ledger.
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            tx_fee: self.chain.tx_fee_wei,
            fee_recipient: self.chain.fee_recipient,
        }
    }

    pub fn genesis_timestamp(&self) -> Timestamp {
        self.chain
            .genesis_timestamp
            .map(Timestamp::from_secs)
            .unwrap_or_else(Timestamp::now)
    }

    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig {
            checkin_threshold: self.heartbeat.checkin_threshold,
            critical_threshold: self.heartbeat.critical_threshold,
            poll_interval_secs: self.server.check_interval_secs,
        }
    }

    /// JSON ledger snapshot inside the data directory.
    pub fn ledger_path(&self) -> PathBuf {
        self.server.data_dir.join("ledger.json")
    }

    /// SQLite event log inside the data directory.
    pub fn db_path(&self) -> PathBuf {
        self.server.data_dir.join("events.sqlite")
    }
}

// ============================================================================
// Tests
// ============================================================================
