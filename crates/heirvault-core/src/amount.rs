//! Native-currency amounts
//!
//! Amounts are held as whole wei in a `u128`. Serialized as a decimal string
//! so that TOML and JSON consumers never lose precision.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Wei per ether (10^18).
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Wei per gwei (10^9).
pub const WEI_PER_GWEI: u128 = 1_000_000_000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AmountError {
    #[error("Invalid amount: {0}")]
    Invalid(String),

    #[error("Too many decimal places (max 18): {0}")]
    TooPrecise(String),

    #[error("Amount overflows 128 bits: {0}")]
    Overflow(String),
}

/// An amount of native currency, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Wei(u128);

impl Wei {
    pub const ZERO: Wei = Wei(0);

    pub const fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    /// Whole ether.
    pub const fn ether(ether: u64) -> Self {
        Self(ether as u128 * WEI_PER_ETHER)
    }

    pub const fn gwei(gwei: u64) -> Self {
        Self(gwei as u128 * WEI_PER_GWEI)
    }

    /// Parse a decimal ether string such as `"1"`, `"0.5"` or `"0.01"`.
    pub fn parse_ether(s: &str) -> Result<Self, AmountError> {
        let s = s.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountError::Invalid(s.to_string()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(AmountError::Invalid(s.to_string()));
        }
        if frac.len() > 18 {
            return Err(AmountError::TooPrecise(s.to_string()));
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| AmountError::Overflow(s.to_string()))?
        };
        let frac_wei: u128 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<18}", frac);
            padded
                .parse()
                .map_err(|_| AmountError::Invalid(s.to_string()))?
        };

        whole
            .checked_mul(WEI_PER_ETHER)
            .and_then(|w| w.checked_add(frac_wei))
            .map(Self)
            .ok_or_else(|| AmountError::Overflow(s.to_string()))
    }

    pub fn as_wei(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Wei) -> Option<Wei> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Wei) -> Option<Wei> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn saturating_sub(self, rhs: Wei) -> Wei {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Render as an ether decimal without trailing zeros, e.g. `"0.5"`.
    pub fn to_ether_string(&self) -> String {
        let whole = self.0 / WEI_PER_ETHER;
        let frac = self.0 % WEI_PER_ETHER;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{:018}", frac);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ETH", self.to_ether_string())
    }
}

/// Parses a plain decimal wei count (no units).
impl FromStr for Wei {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u128>()
            .map(Self)
            .map_err(|_| AmountError::Invalid(s.to_string()))
    }
}

impl Serialize for Wei {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Wei::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ether() {
        assert_eq!(Wei::parse_ether("1").unwrap(), Wei::ether(1));
        assert_eq!(
            Wei::parse_ether("0.5").unwrap().as_wei(),
            500_000_000_000_000_000
        );
        assert_eq!(
            Wei::parse_ether("0.01").unwrap().as_wei(),
            10_000_000_000_000_000
        );
        assert_eq!(Wei::parse_ether(".25").unwrap().as_wei(), WEI_PER_ETHER / 4);
        assert_eq!(
            Wei::parse_ether("0.000000000000000001").unwrap(),
            Wei::from_wei(1)
        );
    }

    #[test]
    fn test_parse_ether_rejects_garbage() {
        assert!(matches!(Wei::parse_ether(""), Err(AmountError::Invalid(_))));
        assert!(matches!(Wei::parse_ether("."), Err(AmountError::Invalid(_))));
        assert!(matches!(Wei::parse_ether("-1"), Err(AmountError::Invalid(_))));
        assert!(matches!(Wei::parse_ether("1e18"), Err(AmountError::Invalid(_))));
        assert!(matches!(
            Wei::parse_ether("0.0000000000000000001"),
            Err(AmountError::TooPrecise(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Wei::ether(2).to_string(), "2 ETH");
        assert_eq!(Wei::parse_ether("1.5").unwrap().to_string(), "1.5 ETH");
        assert_eq!(Wei::ZERO.to_string(), "0 ETH");
        assert_eq!(Wei::gwei(1).to_ether_string(), "0.000000001");
    }

    #[test]
    fn test_checked_arithmetic() {
        let one = Wei::ether(1);
        let half = Wei::parse_ether("0.5").unwrap();
        assert_eq!(one.checked_sub(half), Some(half));
        assert_eq!(half.checked_sub(one), None);
        assert_eq!(Wei::from_wei(u128::MAX).checked_add(Wei::from_wei(1)), None);
        assert_eq!(half.saturating_sub(one), Wei::ZERO);
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let amount = Wei::parse_ether("0.5").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"500000000000000000\"");

        let restored: Wei = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, amount);
    }
}
