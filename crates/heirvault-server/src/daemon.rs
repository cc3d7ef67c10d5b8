//! The daemon loop: periodically re-reads the ledger and reports vault heartbeats.

use crate::config::ServerConfig;
use crate::db;
use anyhow::{Context, Result};
use heirvault_chain::Ledger;
use heirvault_core::format_duration;
use heirvault_inherit::{evaluate_batch, HeartbeatAction, HeartbeatStatus};
use std::time::Duration;

/// Run the daemon loop. Blocks forever (until shutdown signal).
pub async fn run(config: ServerConfig) -> Result<()> {
    log::info!("heirvault monitor starting…");
    log::info!(
        "  Interval:   {} seconds ({:.1} hours)",
        config.server.check_interval_secs,
        config.server.check_interval_secs as f64 / 3600.0
    );
    log::info!("  Data dir:   {}", config.server.data_dir.display());
    match config.vault.address {
        Some(address) => log::info!("  Vault:      {} ({})", address, config.vault.label),
        None => log::info!("  Vault:      all hosted vaults"),
    }

    std::fs::create_dir_all(&config.server.data_dir).with_context(|| {
        format!(
            "Failed to create data dir: {}",
            config.server.data_dir.display()
        )
    })?;

    let interval = Duration::from_secs(config.server.check_interval_secs);

    // Run first check immediately, then loop
    let mut first = true;
    loop {
        if !first {
            log::info!(
                "Sleeping {} seconds until next check…",
                config.server.check_interval_secs
            );
            tokio::time::sleep(interval).await;
        }
        first = false;

        match run_check_cycle(&config).await {
            Ok(statuses) => log::info!(
                "Check cycle completed successfully ({} vaults).",
                statuses.len()
            ),
            Err(e) => log::error!("Check cycle failed: {:#}", e),
        }
    }
}

/// Execute a single check cycle: reload the ledger, mirror new events and
/// evaluate every monitored vault at the latest block time.
///
/// Returns the statuses, most urgent first.
pub async fn run_check_cycle(config: &ServerConfig) -> Result<Vec<HeartbeatStatus>> {
    log::info!("Starting check cycle…");

    let ledger_path = config.ledger_path();
    let Some(ledger) = Ledger::load(&ledger_path)
        .with_context(|| format!("Failed to load ledger from {}", ledger_path.display()))?
    else {
        log::info!(
            "No ledger at {} yet. Nothing to monitor.",
            ledger_path.display()
        );
        return Ok(Vec::new());
    };

    let mut conn = db::open_db(&config.db_path()).context("Failed to open event log")?;
    let mirrored = db::sync_ledger(&mut conn, &ledger).context("Failed to update event log")?;

    let now = ledger.latest_timestamp();
    log::info!(
        "Block {} at {}  |  New events: {}",
        ledger.head().number,
        now,
        mirrored
    );

    let addresses = match config.vault.address {
        Some(address) => vec![address],
        None => ledger.vault_addresses(),
    };
    let mut monitored = Vec::with_capacity(addresses.len());
    for address in addresses {
        match ledger.vault(address) {
            Some(vault) => monitored.push((address, vault)),
            None => log::warn!("Configured vault {} is not deployed on this ledger", address),
        }
    }

    let statuses = evaluate_batch(&monitored, now, &config.heartbeat_config());
    for status in &statuses {
        report(status);
    }
    if statuses.is_empty() {
        log::info!("No vaults deployed. Nothing to monitor.");
    }

    Ok(statuses)
}

/// Log a status at a level matching its urgency.
fn report(status: &HeartbeatStatus) {
    let remaining = format_duration(status.seconds_remaining);
    let percent = status.elapsed_fraction * 100.0;
    match status.action {
        HeartbeatAction::Healthy => log::info!(
            "[{}] Healthy: {:.0}% of period elapsed, heir can claim in {}",
            status.vault_address.short(),
            percent,
            remaining
        ),
        HeartbeatAction::CheckinRecommended => log::warn!(
            "[{}] Check-in recommended: {:.0}% elapsed, {} left. Owner {} should run `heirvault withdraw --from {} --amount 0`",
            status.vault_address.short(),
            percent,
            remaining,
            status.owner.short(),
            status.owner
        ),
        HeartbeatAction::CheckinRequired => log::error!(
            "[{}] CHECK-IN REQUIRED: only {} left before {} can claim. Run `heirvault withdraw --from {} --amount 0`",
            status.vault_address.short(),
            remaining,
            status.heir,
            status.owner
        ),
        HeartbeatAction::Claimable => log::error!(
            "[{}] Inactivity period elapsed: heir {} can claim now. The owner can still check in first",
            status.vault_address.short(),
            status.heir
        ),
    }
}
