#![no_main]

use heirvault_core::Address;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Address parsing must never panic on arbitrary input
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(address) = s.parse::<Address>() {
            // Display is canonical: reparsing gives the same address
            let canonical = address.to_string();
            assert_eq!(canonical.parse::<Address>().ok(), Some(address));
            let _ = address.short();
        }
    }
});
