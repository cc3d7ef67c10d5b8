//! Per-call context supplied by the host environment

use heirvault_core::{Address, Timestamp, Wei};

/// Who is calling, when, and with how much attached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub now: Timestamp,
    pub value: Wei,
}

impl CallContext {
    /// A call with no attached value.
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self {
            caller,
            now,
            value: Wei::ZERO,
        }
    }

    pub fn with_value(mut self, value: Wei) -> Self {
        self.value = value;
        self
    }
}
