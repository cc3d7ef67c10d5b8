//! Timestamps and the fixed inactivity period

use serde::{Deserialize, Serialize};
use std::fmt;

pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Inactivity period after which the heir may claim (30 days).
pub const INHERITANCE_PERIOD_SECS: u64 = 30 * SECONDS_PER_DAY;

/// Seconds since the unix epoch, as supplied by the host for each transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Current wall-clock time. Only used to seed a fresh local ledger.
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp().max(0) as u64)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds from `earlier` to `self`, zero if `earlier` is later.
    pub fn secs_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match i64::try_from(self.0)
            .ok()
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S UTC")),
            None => write!(f, "@{}", self.0),
        }
    }
}

/// Human-readable span, e.g. `15d 3h 20m`.
pub fn format_duration(secs: u64) -> String {
    let days = secs / SECONDS_PER_DAY;
    let hours = (secs % SECONDS_PER_DAY) / 3600;
    let minutes = (secs % 3600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_constant() {
        assert_eq!(INHERITANCE_PERIOD_SECS, 2_592_000);
    }

    #[test]
    fn test_secs_since_saturates() {
        let t0 = Timestamp::from_secs(1_700_000_000);
        let t1 = t0.plus_secs(15 * SECONDS_PER_DAY);
        assert_eq!(t1.secs_since(t0), 1_296_000);
        assert_eq!(t0.secs_since(t1), 0);
    }

    #[test]
    fn test_display() {
        let t = Timestamp::from_secs(1_700_000_000);
        assert_eq!(t.to_string(), "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(INHERITANCE_PERIOD_SECS), "30d 0h 0m");
        assert_eq!(format_duration(3 * 3600 + 120), "3h 2m");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(0), "0s");
    }

    #[test]
    fn test_serde_transparent() {
        let t = Timestamp::from_secs(42);
        assert_eq!(serde_json::to_string(&t).unwrap(), "42");
    }
}
