//! End-to-end lifecycle of a vault hosted on the ledger.
//!
//! Walks the owner through deployment, deposits, check-ins and withdrawals,
//! then lets the heir take over and name a successor:
//!
//! 1. Deploy a vault naming an heir
//! 2. Fund it from arbitrary accounts
//! 3. Owner withdraws / checks in, resetting the inactivity clock
//! 4. Heir claims once the period has strictly elapsed

use heirvault_chain::{Call, ChainError, Ledger, LedgerConfig, TxStatus};
use heirvault_core::{Address, Timestamp, Wei, INHERITANCE_PERIOD_SECS, SECONDS_PER_DAY};
use heirvault_inherit::{VaultError, VaultEvent};

const GENESIS: Timestamp = Timestamp::from_secs(1_700_000_000);

fn test_address(seed: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0x01;
    bytes[19] = seed;
    Address::from_bytes(bytes)
}

fn owner() -> Address {
    test_address(1)
}

fn heir() -> Address {
    test_address(2)
}

fn successor() -> Address {
    test_address(3)
}

fn stranger() -> Address {
    test_address(4)
}

fn fee() -> Wei {
    LedgerConfig::default().tx_fee
}

fn half_ether() -> Wei {
    Wei::parse_ether("0.5").unwrap()
}

/// Ledger with every test account funded with 100 ETH.
fn setup() -> Ledger {
    let mut ledger = Ledger::new(GENESIS, LedgerConfig::default());
    for account in [owner(), heir(), successor(), stranger()] {
        ledger.fund(account, Wei::ether(100)).unwrap();
    }
    ledger
}

fn deploy(ledger: &mut Ledger, value: Wei) -> Address {
    ledger
        .deploy_vault(owner(), heir(), value)
        .unwrap()
        .contract_address
        .unwrap()
}

// =============================================================================
// Reference scenarios
// =============================================================================

#[test]
fn test_deploy_sets_roles_and_full_period() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ZERO);

    let state = ledger.vault(vault).unwrap();
    assert_eq!(state.owner(), owner());
    assert_eq!(state.heir(), heir());
    assert_eq!(ledger.time_until_claimable(vault).unwrap(), 2_592_000);
}

#[test]
fn test_time_until_claimable_after_fifteen_days() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ZERO);

    ledger.increase_time(15 * SECONDS_PER_DAY).unwrap();

    assert_eq!(ledger.time_until_claimable(vault).unwrap(), 1_296_000);
}

#[test]
fn test_heir_claims_after_thirty_one_days() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ZERO);

    ledger.increase_time(15 * SECONDS_PER_DAY).unwrap();
    ledger.increase_time(16 * SECONDS_PER_DAY).unwrap();
    let receipt = ledger.claim_inheritance(heir(), vault, successor()).unwrap();

    let state = ledger.vault(vault).unwrap();
    assert_eq!(state.owner(), heir());
    assert_eq!(state.heir(), successor());
    assert_eq!(state.last_action(), receipt.timestamp);
    assert_eq!(
        receipt.events,
        vec![
            VaultEvent::InheritanceClaimed { former_heir: heir() },
            VaultEvent::HeirUpdated { new_heir: successor() },
        ]
    );
    assert_eq!(
        ledger.time_until_claimable(vault).unwrap(),
        INHERITANCE_PERIOD_SECS
    );
}

#[test]
fn test_deposit_then_partial_withdraw() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ZERO);

    ledger.send_value(stranger(), vault, Wei::ether(1)).unwrap();
    assert_eq!(ledger.balance_of(vault), Wei::ether(1));

    let owner_before = ledger.balance_of(owner());
    let receipt = ledger.withdraw(owner(), vault, half_ether()).unwrap();

    assert_eq!(ledger.balance_of(vault), half_ether());
    assert_eq!(
        ledger.balance_of(owner()),
        owner_before
            .checked_add(half_ether())
            .and_then(|b| b.checked_sub(fee()))
            .unwrap()
    );
    assert_eq!(ledger.vault(vault).unwrap().last_action(), receipt.timestamp);
    assert_eq!(
        receipt.events,
        vec![VaultEvent::Withdrawal { amount: half_ether() }]
    );
}

#[test]
fn test_overdraw_reverts_without_state_change() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ether(1));
    let before = ledger.vault(vault).unwrap().clone();
    let too_much = Wei::ether(1).checked_add(Wei::from_wei(1)).unwrap();

    let err = ledger.withdraw(owner(), vault, too_much).unwrap_err();

    assert_eq!(
        err,
        ChainError::Reverted(VaultError::InvalidWithdrawAmount {
            requested: too_much,
            available: Wei::ether(1),
        })
    );
    assert_eq!(ledger.vault(vault).unwrap(), &before);
    assert_eq!(ledger.balance_of(vault), Wei::ether(1));
}

#[test]
fn test_non_owner_set_heir_rejected() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ZERO);

    let err = ledger.set_heir(stranger(), vault, stranger()).unwrap_err();

    assert_eq!(
        err,
        ChainError::Reverted(VaultError::NotOwner { caller: stranger() })
    );
    assert_eq!(ledger.vault(vault).unwrap().heir(), heir());

    let receipt = ledger.last_receipt().unwrap();
    assert_eq!(receipt.call, Call::SetHeir { new_heir: stranger() });
    assert!(matches!(receipt.status, TxStatus::Reverted { .. }));
    assert!(receipt.events.is_empty());
}

// =============================================================================
// Boundary and access control
// =============================================================================

#[test]
fn test_claim_boundary_is_strict() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ZERO);
    let deployed_at = ledger.vault(vault).unwrap().last_action();

    ledger
        .set_next_block_timestamp(deployed_at.plus_secs(INHERITANCE_PERIOD_SECS))
        .unwrap();
    let err = ledger.claim_inheritance(heir(), vault, successor()).unwrap_err();
    assert_eq!(
        err,
        ChainError::Reverted(VaultError::InheritancePeriodNotReached { remaining_secs: 0 })
    );
    assert_eq!(ledger.vault(vault).unwrap().owner(), owner());

    // The failed claim mined a block one second past the period
    ledger.claim_inheritance(heir(), vault, successor()).unwrap();
    assert_eq!(ledger.vault(vault).unwrap().owner(), heir());
}

#[test]
fn test_only_heir_can_claim() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ZERO);
    ledger.increase_time(INHERITANCE_PERIOD_SECS + 1).unwrap();

    for caller in [owner(), successor(), stranger()] {
        let err = ledger.claim_inheritance(caller, vault, stranger()).unwrap_err();
        assert_eq!(err, ChainError::Reverted(VaultError::NotTheHeir { caller }));
    }
    assert_eq!(ledger.vault(vault).unwrap().owner(), owner());
}

#[test]
fn test_only_owner_can_withdraw() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ether(2));

    for caller in [heir(), successor(), stranger()] {
        let err = ledger.withdraw(caller, vault, Wei::ZERO).unwrap_err();
        assert_eq!(err, ChainError::Reverted(VaultError::NotOwner { caller }));
    }
    assert_eq!(ledger.balance_of(vault), Wei::ether(2));
}

#[test]
fn test_claim_cannot_name_self_or_zero() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ZERO);
    ledger.increase_time(INHERITANCE_PERIOD_SECS + 1).unwrap();

    let err = ledger.claim_inheritance(heir(), vault, heir()).unwrap_err();
    assert_eq!(err, ChainError::Reverted(VaultError::InvalidHeir(heir())));

    let err = ledger.claim_inheritance(heir(), vault, Address::ZERO).unwrap_err();
    assert_eq!(err, ChainError::Reverted(VaultError::InvalidHeir(Address::ZERO)));
}

#[test]
fn test_invalid_successor_rejected_while_owner_active() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ZERO);

    let err = ledger.claim_inheritance(heir(), vault, Address::ZERO).unwrap_err();
    assert_eq!(err, ChainError::Reverted(VaultError::InvalidHeir(Address::ZERO)));

    let err = ledger.claim_inheritance(heir(), vault, heir()).unwrap_err();
    assert_eq!(err, ChainError::Reverted(VaultError::InvalidHeir(heir())));

    assert_eq!(ledger.vault(vault).unwrap().owner(), owner());
    assert_eq!(ledger.vault(vault).unwrap().heir(), heir());
}

#[test]
fn test_set_heir_rejects_owner_and_zero() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ZERO);

    assert!(ledger.set_heir(owner(), vault, owner()).is_err());
    assert!(ledger.set_heir(owner(), vault, Address::ZERO).is_err());
    assert_eq!(ledger.vault(vault).unwrap().heir(), heir());
}

// =============================================================================
// Deposits and withdrawals
// =============================================================================

#[test]
fn test_deposits_accumulate_from_any_sender() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ZERO);
    let last_action = ledger.vault(vault).unwrap().last_action();

    ledger.send_value(owner(), vault, Wei::ether(1)).unwrap();
    ledger.send_value(heir(), vault, Wei::ether(2)).unwrap();
    ledger.send_value(stranger(), vault, Wei::ether(3)).unwrap();

    assert_eq!(ledger.balance_of(vault), Wei::ether(6));
    // Deposits neither emit events nor reset the clock
    assert_eq!(ledger.events(vault).len(), 1);
    assert_eq!(ledger.vault(vault).unwrap().last_action(), last_action);
}

#[test]
fn test_value_at_deploy_lands_in_custody() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ether(5));

    assert_eq!(ledger.balance_of(vault), Wei::ether(5));
    assert_eq!(
        ledger.balance_of(owner()),
        Wei::ether(95).checked_sub(fee()).unwrap()
    );
}

#[test]
fn test_full_withdrawal_empties_vault() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ether(5));

    ledger.withdraw(owner(), vault, Wei::ether(5)).unwrap();

    assert_eq!(ledger.balance_of(vault), Wei::ZERO);
    assert_eq!(
        ledger.balance_of(owner()),
        Wei::ether(100)
            .checked_sub(fee())
            .and_then(|b| b.checked_sub(fee()))
            .unwrap()
    );
}

#[test]
fn test_owner_can_check_in_after_period_elapsed() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ether(1));
    ledger.increase_time(40 * SECONDS_PER_DAY).unwrap();

    // Owner still controls the vault until a claim actually lands
    ledger.withdraw(owner(), vault, Wei::ZERO).unwrap();

    let err = ledger.claim_inheritance(heir(), vault, successor()).unwrap_err();
    assert!(matches!(
        err.vault_error(),
        Some(VaultError::InheritancePeriodNotReached { .. })
    ));
}

#[test]
fn test_new_owner_can_withdraw_after_claim() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ether(3));
    ledger.increase_time(INHERITANCE_PERIOD_SECS + 1).unwrap();
    ledger.claim_inheritance(heir(), vault, successor()).unwrap();

    let err = ledger.withdraw(owner(), vault, Wei::ether(1)).unwrap_err();
    assert_eq!(err, ChainError::Reverted(VaultError::NotOwner { caller: owner() }));

    let before = ledger.balance_of(heir());
    ledger.withdraw(heir(), vault, Wei::ether(3)).unwrap();
    assert_eq!(
        ledger.balance_of(heir()),
        before
            .checked_add(Wei::ether(3))
            .and_then(|b| b.checked_sub(fee()))
            .unwrap()
    );
}

#[test]
fn test_chained_heir_waits_fresh_period() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ZERO);
    ledger.increase_time(INHERITANCE_PERIOD_SECS + 1).unwrap();
    ledger.claim_inheritance(heir(), vault, successor()).unwrap();

    ledger.increase_time(INHERITANCE_PERIOD_SECS - 10).unwrap();
    assert!(ledger.claim_inheritance(successor(), vault, stranger()).is_err());

    ledger.increase_time(SECONDS_PER_DAY).unwrap();
    ledger.claim_inheritance(successor(), vault, stranger()).unwrap();

    let state = ledger.vault(vault).unwrap();
    assert_eq!(state.owner(), successor());
    assert_eq!(state.heir(), stranger());
}

// =============================================================================
// Ledger-wide properties
// =============================================================================

#[test]
fn test_set_heir_keeps_clock_and_emits_event() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ZERO);
    let last_action = ledger.vault(vault).unwrap().last_action();
    ledger.increase_time(SECONDS_PER_DAY).unwrap();

    let receipt = ledger.set_heir(owner(), vault, successor()).unwrap();

    assert_eq!(receipt.events, vec![VaultEvent::HeirUpdated { new_heir: successor() }]);
    assert_eq!(ledger.vault(vault).unwrap().last_action(), last_action);
    assert_eq!(ledger.vault(vault).unwrap().heir(), successor());
}

#[test]
fn test_heir_and_owner_never_coincide() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ether(1));
    let candidates = [Address::ZERO, owner(), heir(), successor(), stranger()];

    for (i, candidate) in candidates.iter().cycle().take(20).enumerate() {
        let caller = candidates[i % 4 + 1];
        let _ = ledger.set_heir(caller, vault, *candidate);
        if i % 7 == 0 {
            ledger.increase_time(INHERITANCE_PERIOD_SECS + 1).unwrap();
            let current_heir = ledger.vault(vault).unwrap().heir();
            let _ = ledger.claim_inheritance(current_heir, vault, *candidate);
        }
        let state = ledger.vault(vault).unwrap();
        assert!(!state.heir().is_zero());
        assert_ne!(state.heir(), state.owner());
    }
}

#[test]
fn test_last_action_never_decreases() {
    let mut ledger = setup();
    let vault = deploy(&mut ledger, Wei::ether(1));
    let mut previous = ledger.vault(vault).unwrap().last_action();

    for step in 0..12u64 {
        ledger.increase_time(step * SECONDS_PER_DAY + 1).unwrap();
        match step % 4 {
            0 => drop(ledger.withdraw(owner(), vault, Wei::ZERO)),
            1 => drop(ledger.send_value(stranger(), vault, Wei::from_wei(7))),
            2 => drop(ledger.set_heir(owner(), vault, successor())),
            _ => drop(ledger.claim_inheritance(heir(), vault, stranger())),
        }
        let current = ledger.vault(vault).unwrap().last_action();
        assert!(current >= previous);
        previous = current;
    }
}

#[test]
fn test_vault_balance_matches_deposits_minus_withdrawals() {
    let mut ledger = setup();
    let supply = ledger.total_supply();
    let vault = deploy(&mut ledger, Wei::ether(2));

    ledger.send_value(stranger(), vault, Wei::ether(4)).unwrap();
    ledger.withdraw(owner(), vault, Wei::ether(1)).unwrap();
    let _ = ledger.withdraw(owner(), vault, Wei::ether(10));
    ledger.send_value(heir(), vault, Wei::ether(1)).unwrap();
    ledger.withdraw(owner(), vault, Wei::ether(3)).unwrap();

    // 2 + 4 - 1 + 1 - 3
    assert_eq!(ledger.balance_of(vault), Wei::ether(3));
    assert_eq!(ledger.total_supply(), supply);
}

#[test]
fn test_independent_vaults() {
    let mut ledger = setup();
    let first = deploy(&mut ledger, Wei::ether(1));
    let second = ledger
        .deploy_vault(stranger(), successor(), Wei::ether(2))
        .unwrap()
        .contract_address
        .unwrap();
    assert_ne!(first, second);

    ledger.increase_time(INHERITANCE_PERIOD_SECS + 1).unwrap();
    ledger.withdraw(stranger(), second, Wei::ZERO).unwrap();
    ledger.claim_inheritance(heir(), first, stranger()).unwrap();

    assert!(ledger.claim_inheritance(successor(), second, heir()).is_err());
    assert_eq!(ledger.vault(first).unwrap().owner(), heir());
    assert_eq!(ledger.vault(second).unwrap().owner(), stranger());
    assert_eq!(ledger.vault_addresses().len(), 2);
}
