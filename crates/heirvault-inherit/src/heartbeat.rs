//! Deadman heartbeat evaluation for inheritance vaults.
//!
//! Pure logic with no I/O and no clock of its own. Takes a vault and the current
//! time, returns a recommendation. The caller (CLI, daemon) decides whether
//! to act on it.
//!
//! # How It Works
//!
//! Every withdrawal (including a zero-amount check-in) resets the vault's
//! inactivity clock. The heartbeat module evaluates how much of the
//! inheritance period has elapsed and recommends action:
//!
//! ```text
//! |--- Healthy ---|--- CheckinRecommended ---|--- CheckinRequired ---|--- Claimable
//! 0%             50%                        90%                    100%
//! ```
//!
//! Thresholds are configurable.

use heirvault_core::{Address, Timestamp, INHERITANCE_PERIOD_SECS};
use serde::{Deserialize, Serialize};

use crate::vault::Vault;

/// When to recommend a check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Fraction of the period elapsed before recommending check-in (0.0–1.0).
    /// Default: 0.5 (halfway point).
    pub checkin_threshold: f64,

    /// Fraction of the period elapsed before check-in is critical (0.0–1.0).
    /// Default: 0.9.
    pub critical_threshold: f64,

    /// How often the caller should re-evaluate (seconds).
    /// Advisory only; nothing here polls.
    /// Default: 3600 (1 hour).
    pub poll_interval_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            checkin_threshold: 0.5,
            critical_threshold: 0.9,
            poll_interval_secs: 3600,
        }
    }
}

impl HeartbeatConfig {
    /// Validate that thresholds are sensible.
    pub fn validate(&self) -> Result<(), HeartbeatError> {
        if self.checkin_threshold <= 0.0 || self.checkin_threshold >= 1.0 {
            return Err(HeartbeatError::InvalidThreshold(
                "checkin_threshold must be between 0.0 and 1.0 exclusive".into(),
            ));
        }
        if self.critical_threshold <= self.checkin_threshold || self.critical_threshold >= 1.0 {
            return Err(HeartbeatError::InvalidThreshold(
                "critical_threshold must be between checkin_threshold and 1.0 exclusive".into(),
            ));
        }
        Ok(())
    }
}

/// What the heartbeat recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeartbeatAction {
    /// Far from the deadline. No action needed.
    Healthy,
    /// Passed the check-in threshold. Owner should check in soon.
    CheckinRecommended,
    /// Passed the critical threshold. Owner must check in now.
    CheckinRequired,
    /// Period strictly elapsed. The heir can claim right now; a check-in
    /// still wins if it lands first.
    Claimable,
}

impl HeartbeatAction {
    /// Lower is more urgent.
    fn priority(self) -> u8 {
        match self {
            HeartbeatAction::Claimable => 0,
            HeartbeatAction::CheckinRequired => 1,
            HeartbeatAction::CheckinRecommended => 2,
            HeartbeatAction::Healthy => 3,
        }
    }
}

/// Full heartbeat status for a vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatStatus {
    pub vault_address: Address,
    pub owner: Address,
    pub heir: Address,
    /// Seconds until the heir may claim (0 once the period has run out).
    pub seconds_remaining: u64,
    /// Fraction of the period elapsed (0.0–1.0+).
    pub elapsed_fraction: f64,
    /// Recommended action.
    pub action: HeartbeatAction,
}

/// Errors from heartbeat evaluation.
#[derive(Debug, thiserror::Error)]
pub enum HeartbeatError {
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
}

/// Evaluate the heartbeat status of a vault at `now`.
pub fn evaluate_heartbeat(
    vault_address: Address,
    vault: &Vault,
    now: Timestamp,
    config: &HeartbeatConfig,
) -> HeartbeatStatus {
    let elapsed = now.secs_since(vault.last_action());
    let elapsed_fraction = elapsed as f64 / INHERITANCE_PERIOD_SECS as f64;

    let action = if vault.is_claimable(now) {
        HeartbeatAction::Claimable
    } else if elapsed_fraction >= config.critical_threshold {
        HeartbeatAction::CheckinRequired
    } else if elapsed_fraction >= config.checkin_threshold {
        HeartbeatAction::CheckinRecommended
    } else {
        HeartbeatAction::Healthy
    };

    HeartbeatStatus {
        vault_address,
        owner: vault.owner(),
        heir: vault.heir(),
        seconds_remaining: vault.time_until_claimable(now),
        elapsed_fraction,
        action,
    }
}

/// Batch evaluate heartbeat for multiple vaults.
///
/// Returns statuses sorted by urgency (most urgent first).
pub fn evaluate_batch(
    vaults: &[(Address, &Vault)],
    now: Timestamp,
    config: &HeartbeatConfig,
) -> Vec<HeartbeatStatus> {
    let mut statuses: Vec<HeartbeatStatus> = vaults
        .iter()
        .map(|(address, vault)| evaluate_heartbeat(*address, vault, now, config))
        .collect();

    statuses.sort_by(|a, b| {
        a.action.priority().cmp(&b.action.priority()).then(
            a.elapsed_fraction
                .partial_cmp(&b.elapsed_fraction)
                .unwrap_or(std::cmp::Ordering::Equal)
                .reverse(),
        )
    });

    statuses
}
