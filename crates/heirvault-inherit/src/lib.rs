//! heirvault Inheritance Module
//!
//! Dead-man's-switch custody: an owner holds funds in a vault, and a single
//! designated heir may take over ownership once the owner has been inactive
//! for longer than the inheritance period (30 days).
//!
//! # Concepts
//!
//! - **Owner**: may withdraw and reassign the heir at any time
//! - **Heir**: may claim ownership after the period strictly elapses
//! - **Check-in**: a withdrawal (even of zero) resets the inactivity clock
//!
//! ```text
//! deploy ──► (owner=A, heir=B, clock=t0)
//!              │  withdraw (A)      ──► clock reset
//!              │  set_heir (A)      ──► heir changes, clock untouched
//!              │  claim (B, t > t0 + 30d)
//!              ▼
//!            (owner=B, heir=C, clock=t) ──► ...
//! ```
//!
//! The vault never reads a clock or an account store of its own: the host
//! passes caller, time and attached value in a [`CallContext`] for every call
//! and applies the returned [`Effects`] atomically.

pub mod context;
pub mod error;
pub mod events;
pub mod heartbeat;
pub mod vault;

#[cfg(test)]
mod test_utils;

pub use context::CallContext;
pub use error::VaultError;
pub use events::VaultEvent;
pub use heartbeat::{
    evaluate_batch, evaluate_heartbeat, HeartbeatAction, HeartbeatConfig, HeartbeatError,
    HeartbeatStatus,
};
pub use vault::{Effects, Payout, Vault};
