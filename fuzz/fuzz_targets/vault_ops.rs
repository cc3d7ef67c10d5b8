#![no_main]

use heirvault_chain::{Ledger, LedgerConfig};
use heirvault_core::{Address, Timestamp, Wei};
use libfuzzer_sys::fuzz_target;

fn account(seed: u8) -> Address {
    // Every fifth seed is the zero address, exercising heir validation
    if seed % 5 == 0 {
        return Address::ZERO;
    }
    let mut bytes = [0u8; 20];
    bytes[0] = 0x01;
    bytes[19] = seed % 5;
    Address::from_bytes(bytes)
}

fuzz_target!(|data: &[u8]| {
    let mut ledger = Ledger::new(Timestamp::from_secs(1_700_000_000), LedgerConfig::default());
    for seed in 1..5 {
        let _ = ledger.fund(account(seed), Wei::ether(1_000));
    }
    let supply = ledger.total_supply();

    let Ok(receipt) = ledger.deploy_vault(account(1), account(2), Wei::ether(10)) else {
        return;
    };
    let Some(vault) = receipt.contract_address else {
        return;
    };

    // Each 4-byte chunk is one operation: kind, caller, argument, amount/time
    for op in data.chunks_exact(4) {
        let caller = account(op[1]);
        let target = account(op[2]);
        let before = ledger.vault(vault).map(|v| v.last_action());
        match op[0] % 5 {
            0 => drop(ledger.set_heir(caller, vault, target)),
            1 => drop(ledger.withdraw(caller, vault, Wei::gwei(op[3] as u64 * 1_000_000))),
            2 => drop(ledger.claim_inheritance(caller, vault, target)),
            3 => drop(ledger.send_value(caller, vault, Wei::gwei(op[3] as u64))),
            _ => drop(ledger.increase_time(op[3] as u64 * 86_400 + 1)),
        }

        let state = ledger.vault(vault).expect("vault never disappears");
        assert_eq!(state.check_invariants(), Ok(()));
        assert!(Some(state.last_action()) >= before);
        assert_eq!(ledger.total_supply(), supply);
    }
});
