//! heirvault: operator CLI and heartbeat monitor for dead-man's-switch vaults
//!
//! Every command runs against a persisted local ledger in the configured
//! data directory. `watch` keeps running and reports when the owner should
//! check in.
//!
//! # Usage
//!
//! ```bash
//! heirvault fund --to 0xf39f… --value 10
//! heirvault deploy --from 0xf39f… --heir 0x7099… --value 1
//! heirvault withdraw --from 0xf39f… --amount 0     # check in
//! heirvault --config heirvault.toml watch
//! ```

mod commands;
mod config;
mod daemon;
mod db;

use anyhow::{Context, Result};
use commands::{Command, Workspace};
use heirvault_core::{Address, Wei};
use std::collections::HashMap;
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "heirvault.toml";

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let invocation = match parse_args(&args)? {
        Some(invocation) => invocation,
        None => return Ok(()),
    };

    // Load config; an explicit path must exist, the default one may not
    let mut server_config = match &invocation.config_path {
        Some(path) => config::ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => config::ServerConfig::from_file_or_default(&PathBuf::from(DEFAULT_CONFIG))?,
    };

    server_config
        .apply_env_overrides()
        .context("Invalid environment override")?;

    server_config
        .validate()
        .context("Configuration validation failed")?;

    // Init logger
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(server_config.server.log_level.as_str()),
    )
    .init();

    match invocation.command {
        Command::Validate => {
            print_config_summary(&server_config);
            Ok(())
        }
        Command::Check => {
            let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
            log::info!("Running single check cycle…");
            rt.block_on(daemon::run_check_cycle(&server_config))?;
            log::info!("Done.");
            Ok(())
        }
        Command::Watch => {
            let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
            // Ctrl-C stops the loop gracefully
            let shutdown = rt.block_on(async {
                tokio::select! {
                    result = daemon::run(server_config) => result,
                    _ = tokio::signal::ctrl_c() => {
                        log::info!("Received shutdown signal. Exiting…");
                        Ok(())
                    }
                }
            });

            if let Err(e) = shutdown {
                log::error!("Monitor error: {:#}", e);
                std::process::exit(1);
            }
            Ok(())
        }
        command => {
            let mut workspace = Workspace::open(server_config)?;
            let output = workspace.execute(&command)?;
            println!("{}", output);
            Ok(())
        }
    }
}

fn print_config_summary(config: &config::ServerConfig) {
    println!("✅ Configuration is valid.");
    println!("  Data dir:       {}", config.server.data_dir.display());
    println!(
        "  Check interval: {} secs",
        config.server.check_interval_secs
    );
    println!("  Log level:      {}", config.server.log_level);
    println!("  Tx fee:         {}", config.chain.tx_fee_wei);
    println!("  Fee recipient:  {}", config.chain.fee_recipient);
    match config.vault.address {
        Some(address) => println!("  Vault:          {} ({})", address, config.vault.label),
        None => println!("  Vault:          last deployed ({})", config.vault.label),
    }
    println!(
        "  Heartbeat:      check-in at {:.0}%, critical at {:.0}%",
        config.heartbeat.checkin_threshold * 100.0,
        config.heartbeat.critical_threshold * 100.0
    );
}

// ============================================================================
// Argument parsing
// ============================================================================

/// A fully parsed command line
#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    config_path: Option<PathBuf>,
    command: Command,
}

/// Parse CLI args (minimal, no clap). `Ok(None)` when help or version was printed.
fn parse_args(args: &[String]) -> Result<Option<Invocation>> {
    let mut config_path = None;
    let mut command_name: Option<&str> = None;
    let mut options: HashMap<&str, &str> = HashMap::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(PathBuf::from(&args[i]));
                } else {
                    anyhow::bail!("--config requires a path argument");
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            "--version" | "-V" => {
                println!("heirvault {}", env!("CARGO_PKG_VERSION"));
                return Ok(None);
            }
            flag if flag.starts_with("--") => {
                i += 1;
                match args.get(i) {
                    Some(value) => {
                        options.insert(&flag[2..], value.as_str());
                    }
                    None => anyhow::bail!("{} requires a value", flag),
                }
            }
            name if command_name.is_none() => command_name = Some(name),
            other => anyhow::bail!("Unknown argument: {}", other),
        }
        i += 1;
    }

    let Some(name) = command_name else {
        print_help();
        anyhow::bail!("No command given");
    };

    let mut opts = Options(options);
    let command = match name {
        "deploy" => Command::Deploy {
            from: opts.address("from")?,
            heir: opts.address("heir")?,
            value: opts.ether_or_zero("value")?,
        },
        "deposit" => Command::Deposit {
            from: opts.address("from")?,
            value: opts.ether("value")?,
        },
        "set-heir" => Command::SetHeir {
            from: opts.address("from")?,
            heir: opts.address("heir")?,
        },
        "withdraw" => Command::Withdraw {
            from: opts.address("from")?,
            amount: opts.ether("amount")?,
        },
        "claim" => Command::Claim {
            from: opts.address("from")?,
            heir: opts.address("heir")?,
        },
        "fund" => Command::Fund {
            to: opts.address("to")?,
            value: opts.ether("value")?,
        },
        "advance" => Command::Advance {
            secs: opts
                .take("secs")?
                .parse::<u64>()
                .context("--secs must be a whole number of seconds")?,
        },
        "status" => Command::Status,
        "events" => Command::Events,
        "watch" => Command::Watch,
        "check" => Command::Check,
        "validate" => Command::Validate,
        other => anyhow::bail!("Unknown command: {} (see --help)", other),
    };

    if let Some(unused) = opts.0.keys().next() {
        anyhow::bail!("Option --{} is not valid for {}", unused, name);
    }

    Ok(Some(Invocation {
        config_path,
        command,
    }))
}

/// Remaining `--name value` options of a command
struct Options<'a>(HashMap<&'a str, &'a str>);

impl<'a> Options<'a> {
    fn take(&mut self, name: &str) -> Result<&'a str> {
        self.0
            .remove(name)
            .with_context(|| format!("Missing required option --{}", name))
    }

    fn address(&mut self, name: &str) -> Result<Address> {
        let raw = self.take(name)?;
        raw.parse::<Address>()
            .with_context(|| format!("--{} is not a valid address: {}", name, raw))
    }

    /// Amount given in ether, e.g. `1.5`
    fn ether(&mut self, name: &str) -> Result<Wei> {
        let raw = self.take(name)?;
        Wei::parse_ether(raw).with_context(|| format!("--{} is not a valid ether amount", name))
    }

    fn ether_or_zero(&mut self, name: &str) -> Result<Wei> {
        if self.0.contains_key(name) {
            self.ether(name)
        } else {
            Ok(Wei::ZERO)
        }
    }
}

fn print_help() {
    println!(
        r#"heirvault: dead-man's-switch inheritance vault operator

USAGE:
    heirvault [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
    deploy   --from <ADDR> --heir <ADDR> [--value <ETH>]   Deploy a vault naming an heir
    deposit  --from <ADDR> --value <ETH>                   Send funds into the vault
    set-heir --from <ADDR> --heir <ADDR>                   Replace the heir (owner only)
    withdraw --from <ADDR> --amount <ETH>                  Withdraw to the owner; 0 is a check-in
    claim    --from <ADDR> --heir <ADDR>                   Heir takes over after 30 days, naming a successor
    fund     --to <ADDR> --value <ETH>                     Credit an account on the local ledger
    advance  --secs <N>                                    Mine an empty block N seconds later
    status                                                 Show vault state and heartbeat
    events                                                 List recorded vault events
    watch                                                  Run the heartbeat monitor
    check                                                  Run a single heartbeat check and exit
    validate                                               Validate configuration and exit

OPTIONS:
    -c, --config <PATH>   Config file path (default: ./heirvault.toml if present)
    -h, --help            Show this help message
    -V, --version         Show version

ENVIRONMENT VARIABLES (override config file):
    HEIRVAULT_DATA_DIR         Data directory path
    HEIRVAULT_CHECK_INTERVAL   Check interval in seconds
    HEIRVAULT_LOG_LEVEL        Log level (error/warn/info/debug/trace)
    HEIRVAULT_VAULT_ADDRESS    Vault to operate on
    HEIRVAULT_TX_FEE_WEI       Fee per transaction for a new ledger, in wei

EXAMPLES:
    # Owner checks in
    heirvault withdraw --from 0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266 --amount 0

    # Single heartbeat check (useful for cron jobs)
    heirvault --config heirvault.toml check
"#
    );
}
