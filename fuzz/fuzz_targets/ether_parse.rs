#![no_main]

use heirvault_core::Wei;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Neither decimal-ether nor raw-wei parsing may panic
        let _ = s.parse::<Wei>();

        if let Ok(amount) = Wei::parse_ether(s) {
            let rendered = amount.to_ether_string();
            assert_eq!(Wei::parse_ether(&rendered).ok(), Some(amount));
        }
    }
});
