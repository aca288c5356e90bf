//! Collaborator contracts consumed by the engine core.
//!
//! The core never owns assets, time or identity policy directly:
//! - [`AssetLedger`]: fungible asset custody with transfer/transfer-from semantics
//! - [`Clock`]: externally supplied monotonic time
//! - [`Authority`]: capability check for administrator-gated operations
//!
//! Reference implementations ([`SystemClock`], [`ManualClock`], [`AdminSet`])
//! live here; the in-memory ledger lives in `duelbook-escrow`.

use std::{
    collections::BTreeSet,
    sync::{Arc, PoisonError, RwLock},
};

use chrono::{DateTime, Duration, Utc};

use crate::{AccountId, Amount, DuelbookError, Result};

// ---------------------------------------------------------------------------
// AssetLedger
// ---------------------------------------------------------------------------

/// A generic fungible-asset ledger.
///
/// Every mutating call reports `success`; the core treats `false` as a hard
/// failure that aborts the triggering operation.
pub trait AssetLedger {
    /// Move `amount` from `from` to `to`.
    fn transfer(&mut self, from: AccountId, to: AccountId, amount: Amount) -> bool;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// the allowance `from` granted to `spender`.
    fn transfer_from(
        &mut self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> bool;

    fn balance_of(&self, holder: AccountId) -> Amount;

    /// Allow `spender` to move up to `amount` of `owner`'s funds.
    fn approve(&mut self, owner: AccountId, spender: AccountId, amount: Amount) -> bool;
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Externally supplied time source. Reads may fail; a failed read aborts
/// the operation that needed it.
pub trait Clock {
    fn now(&self) -> Result<DateTime<Utc>>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<DateTime<Utc>> {
        Ok(Utc::now())
    }
}

/// A settable clock shared between the engine and its driver.
///
/// Cloning yields a handle onto the **same** instant, so a test can keep
/// one handle and advance time after handing the other to the engine.
#[derive(Debug, Clone)]
pub struct ManualClock {
    instant: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(RwLock::new(start)),
        }
    }

    /// Jump to `instant`. Going backwards is ignored: the clock is monotonic.
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut guard = self.instant.write().unwrap_or_else(PoisonError::into_inner);
        if instant > *guard {
            *guard = instant;
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.instant.write().unwrap_or_else(PoisonError::into_inner);
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Result<DateTime<Utc>> {
        self.instant
            .read()
            .map(|instant| *instant)
            .map_err(|err| DuelbookError::ClockUnavailable(err.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Authority
// ---------------------------------------------------------------------------

/// Capability predicate for administrator-gated operations.
pub trait Authority {
    fn is_authorized(&self, caller: &AccountId) -> bool;
}

/// A fixed set of administrator accounts.
#[derive(Debug, Clone, Default)]
pub struct AdminSet {
    admins: BTreeSet<AccountId>,
}

impl AdminSet {
    #[must_use]
    pub fn new(admins: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn single(admin: AccountId) -> Self {
        Self::new([admin])
    }

    pub fn grant(&mut self, account: AccountId) {
        self.admins.insert(account);
    }

    pub fn revoke(&mut self, account: &AccountId) -> bool {
        self.admins.remove(account)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

impl Authority for AdminSet {
    fn is_authorized(&self, caller: &AccountId) -> bool {
        self.admins.contains(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn manual_clock_handles_share_time() {
        let clock = ManualClock::new(t0());
        let handle = clock.clone();
        handle.advance(Duration::minutes(5));
        assert_eq!(clock.now().unwrap(), t0() + Duration::minutes(5));
    }

    #[test]
    fn manual_clock_is_monotonic() {
        let clock = ManualClock::new(t0());
        clock.set(t0() - Duration::hours(1));
        assert_eq!(clock.now().unwrap(), t0());
        clock.set(t0() + Duration::hours(1));
        assert_eq!(clock.now().unwrap(), t0() + Duration::hours(1));
    }

    #[test]
    fn system_clock_reads() {
        assert!(SystemClock.now().is_ok());
    }

    #[test]
    fn admin_set_membership() {
        let admin = AccountId::new();
        let other = AccountId::new();
        let mut set = AdminSet::single(admin);
        assert!(set.is_authorized(&admin));
        assert!(!set.is_authorized(&other));

        set.grant(other);
        assert!(set.is_authorized(&other));
        assert_eq!(set.len(), 2);

        assert!(set.revoke(&other));
        assert!(!set.is_authorized(&other));
    }
}
