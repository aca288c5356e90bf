//! Custody conservation checks.
//!
//! Invariants per vault, checked against the asset ledger:
//! ```text
//! ledger.balance_of(vault) == total_amount − total_paid_out
//! Σ buckets(stakes)        == total_amount
//! total_matched_amount     ≤ total_amount
//! ```
//!
//! A failure means vault accounting and actual custody disagree. Nothing
//! should be paid out of that event until an operator has looked at it.

use duelbook_escrow::Vault;
use duelbook_types::{Amount, AssetLedger, DuelbookError, Result, Side, StakeBuckets};
use serde::Serialize;

/// Result of a successful custody check for one vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CustodyReport {
    pub side: Side,
    /// `total_amount - total_paid_out`.
    pub expected_balance: Amount,
    /// What the ledger actually holds for the vault account.
    pub ledger_balance: Amount,
    pub buckets: StakeBuckets,
}

/// Check one vault against `ledger`.
///
/// # Errors
/// `CustodyInvariantViolation` describing the first broken invariant.
pub fn verify_vault<L: AssetLedger + ?Sized>(vault: &Vault, ledger: &L) -> Result<CustodyReport> {
    let violation = |reason: String| {
        tracing::error!(
            event = %vault.event_id(),
            side = %vault.side(),
            %reason,
            "Custody invariant violated"
        );
        DuelbookError::CustodyInvariantViolation { reason }
    };

    if vault.total_matched_amount() > vault.total_amount() {
        return Err(violation(format!(
            "{} vault of {}: matched {} exceeds total {}",
            vault.side(),
            vault.event_id(),
            vault.total_matched_amount(),
            vault.total_amount()
        )));
    }

    let buckets = vault.bucket_totals();
    if buckets.total() != vault.total_amount() {
        return Err(violation(format!(
            "{} vault of {}: stake buckets sum to {} but deposits total {}",
            vault.side(),
            vault.event_id(),
            buckets.total(),
            vault.total_amount()
        )));
    }

    let expected_balance = vault
        .total_amount()
        .checked_sub(vault.total_paid_out())
        .ok_or_else(|| {
            violation(format!(
                "{} vault of {}: paid out {} exceeds deposits {}",
                vault.side(),
                vault.event_id(),
                vault.total_paid_out(),
                vault.total_amount()
            ))
        })?;
    let ledger_balance = ledger.balance_of(vault.account());
    if ledger_balance != expected_balance {
        return Err(violation(format!(
            "{} vault of {}: ledger holds {ledger_balance}, accounting expects {expected_balance}",
            vault.side(),
            vault.event_id(),
        )));
    }

    Ok(CustodyReport {
        side: vault.side(),
        expected_balance,
        ledger_balance,
        buckets,
    })
}

#[cfg(test)]
mod tests {
    use duelbook_escrow::InMemoryLedger;
    use duelbook_types::{AccountId, EventId, OddsSnapshot};

    use super::*;

    fn funded() -> (Vault, InMemoryLedger, AccountId) {
        let mut vault = Vault::new(EventId(1), Side::A);
        let mut ledger = InMemoryLedger::new();
        let bettor = AccountId::new();
        vault
            .record_stake(bettor, 100, OddsSnapshot::new(100, 100))
            .unwrap();
        ledger.mint(vault.account(), 100);
        (vault, ledger, bettor)
    }

    #[test]
    fn balanced_vault_passes() {
        let (mut vault, mut ledger, bettor) = funded();
        vault.sweep_match(40).unwrap();
        vault.claim_unmatched(bettor, &mut ledger).unwrap();

        let report = verify_vault(&vault, &ledger).unwrap();
        assert_eq!(report.expected_balance, 40);
        assert_eq!(report.ledger_balance, 40);
        assert_eq!(report.buckets.total(), 100);
    }

    #[test]
    fn ledger_drift_is_detected() {
        let (vault, mut ledger, _) = funded();
        ledger.mint(vault.account(), 1);
        let err = verify_vault(&vault, &ledger).unwrap_err();
        assert!(matches!(err, DuelbookError::CustodyInvariantViolation { .. }));
    }

    #[test]
    fn missing_custody_is_detected() {
        let (vault, _, _) = funded();
        let empty = InMemoryLedger::new();
        assert!(verify_vault(&vault, &empty).is_err());
    }
}
