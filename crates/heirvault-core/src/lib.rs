//! heirvault Core
//!
//! Shared primitive types for the heirvault workspace.
//!
//! # Types
//!
//! - [`Address`]: 20-byte account identifier (`0x`-prefixed hex)
//! - [`Wei`]: native-currency amount in the smallest unit (1 ETH = 10^18 wei)
//! - [`Timestamp`]: unix seconds, as supplied by the host per transaction

pub mod address;
pub mod amount;
pub mod time;

pub use address::{Address, AddressError};
pub use amount::{AmountError, Wei};
pub use time::{format_duration, Timestamp, INHERITANCE_PERIOD_SECS, SECONDS_PER_DAY};
