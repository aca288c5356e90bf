//! In-memory fungible asset ledger.
//!
//! Tracks per-account balances and per-(owner, spender) allowances. Every
//! mutation is atomic: either the full transfer succeeds or nothing changes
//! and the call reports `false`.

use std::collections::HashMap;

use duelbook_types::{AccountId, Amount, AssetLedger};

/// Reference [`AssetLedger`] backed by hash maps.
///
/// Used by tests and simulations; production deployments plug in their
/// own custody backend through the same trait.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    /// Per-account balances.
    balances: HashMap<AccountId, Amount>,
    /// Remaining allowance per (owner, spender).
    allowances: HashMap<(AccountId, AccountId), Amount>,
    /// Total units ever minted.
    total_supply: Amount,
    /// When set, every transfer is refused (custody outage simulation).
    fail_transfers: bool,
}

impl InMemoryLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create units out of thin air for `account`.
    pub fn mint(&mut self, account: AccountId, amount: Amount) {
        *self.balances.entry(account).or_default() += amount;
        self.total_supply += amount;
    }

    /// Refuse (or resume accepting) all transfers.
    pub fn set_fail_transfers(&mut self, fail: bool) {
        self.fail_transfers = fail;
    }

    #[must_use]
    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> Amount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Sum of all balances. Equals [`Self::total_supply`] unless the ledger
    /// itself is broken.
    #[must_use]
    pub fn circulating(&self) -> Amount {
        self.balances.values().sum()
    }

    fn move_funds(&mut self, from: AccountId, to: AccountId, amount: Amount) -> bool {
        if self.fail_transfers {
            tracing::warn!(from = %from.short(), to = %to.short(), amount, "Ledger transfer refused");
            return false;
        }
        let available = self.balance_of(from);
        if available < amount {
            tracing::warn!(
                from = %from.short(),
                needed = amount,
                available,
                "Ledger transfer exceeds balance"
            );
            return false;
        }
        if amount == 0 || from == to {
            return true;
        }
        *self.balances.entry(from).or_default() -= amount;
        *self.balances.entry(to).or_default() += amount;
        true
    }
}

impl AssetLedger for InMemoryLedger {
    fn transfer(&mut self, from: AccountId, to: AccountId, amount: Amount) -> bool {
        self.move_funds(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> bool {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            tracing::warn!(
                owner = %from.short(),
                spender = %spender.short(),
                needed = amount,
                allowed,
                "Ledger allowance exceeded"
            );
            return false;
        }
        if !self.move_funds(from, to, amount) {
            return false;
        }
        self.allowances.insert((from, spender), allowed - amount);
        true
    }

    fn balance_of(&self, holder: AccountId) -> Amount {
        self.balances.get(&holder).copied().unwrap_or_default()
    }

    fn approve(&mut self, owner: AccountId, spender: AccountId, amount: Amount) -> bool {
        self.allowances.insert((owner, spender), amount);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_and_transfer() {
        let mut ledger = InMemoryLedger::new();
        let alice = AccountId::new();
        let bob = AccountId::new();
        ledger.mint(alice, 1_000);

        assert!(ledger.transfer(alice, bob, 400));
        assert_eq!(ledger.balance_of(alice), 600);
        assert_eq!(ledger.balance_of(bob), 400);
        assert_eq!(ledger.circulating(), ledger.total_supply());
    }

    #[test]
    fn transfer_exceeding_balance_fails_without_change() {
        let mut ledger = InMemoryLedger::new();
        let alice = AccountId::new();
        let bob = AccountId::new();
        ledger.mint(alice, 100);

        assert!(!ledger.transfer(alice, bob, 200));
        assert_eq!(ledger.balance_of(alice), 100);
        assert_eq!(ledger.balance_of(bob), 0);
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let mut ledger = InMemoryLedger::new();
        let owner = AccountId::new();
        let spender = AccountId::new();
        let vault = AccountId::new();
        ledger.mint(owner, 500);

        assert!(!ledger.transfer_from(spender, owner, vault, 100));
        assert!(ledger.approve(owner, spender, 300));
        assert!(ledger.transfer_from(spender, owner, vault, 100));
        assert_eq!(ledger.allowance(owner, spender), 200);
        assert_eq!(ledger.balance_of(vault), 100);

        assert!(!ledger.transfer_from(spender, owner, vault, 250));
        assert_eq!(ledger.allowance(owner, spender), 200);
    }

    #[test]
    fn failing_ledger_refuses_everything() {
        let mut ledger = InMemoryLedger::new();
        let alice = AccountId::new();
        ledger.mint(alice, 100);
        ledger.set_fail_transfers(true);
        assert!(!ledger.transfer(alice, AccountId::new(), 1));
        ledger.set_fail_transfers(false);
        assert!(ledger.transfer(alice, AccountId::new(), 1));
    }
}
