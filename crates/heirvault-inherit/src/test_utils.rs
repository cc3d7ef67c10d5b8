//! Shared test utilities for heirvault-inherit tests.
//!
//! Deterministic addresses and a freshly deployed vault.

use heirvault_core::{Address, Timestamp, Wei};

use crate::context::CallContext;
use crate::vault::Vault;

/// Genesis time used across tests.
pub const T0: Timestamp = Timestamp::from_secs(1_700_000_000);

/// Generate a deterministic address from a seed byte.
///
/// The address is `[0x01, 0x00, ..., 0x00, seed]`; different seeds give
/// different addresses and none of them is zero.
pub fn test_address(seed: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0x01;
    bytes[19] = seed;
    Address::from_bytes(bytes)
}

pub fn owner() -> Address {
    test_address(1)
}

pub fn heir() -> Address {
    test_address(2)
}

pub fn ctx(caller: Address, now: Timestamp) -> CallContext {
    CallContext::new(caller, now)
}

/// Vault deployed at `T0` by `owner()` naming `heir()`, holding `funding`.
pub fn make_test_vault(funding: Wei) -> Vault {
    let (vault, _) = Vault::deploy(&ctx(owner(), T0).with_value(funding), heir()).unwrap();
    vault
}
