//! Journaled custody: all-or-nothing execution of multi-transfer operations.
//!
//! A claim may move funds out of two vaults (principal, winnings, fee). The
//! [`JournaledLedger`] records every transfer that went through so that, if a
//! later step fails, the earlier ones can be reversed and no partial payout
//! survives the failed operation.

use duelbook_types::{AccountId, Amount, AssetLedger, DuelbookError, Result};

/// One successful ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerTransfer {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}

/// Forwarding [`AssetLedger`] that journals successful movements.
pub struct JournaledLedger<'a, L: AssetLedger + ?Sized> {
    inner: &'a mut L,
    journal: Vec<LedgerTransfer>,
}

impl<'a, L: AssetLedger + ?Sized> JournaledLedger<'a, L> {
    #[must_use]
    pub fn new(inner: &'a mut L) -> Self {
        Self {
            inner,
            journal: Vec::new(),
        }
    }

    /// Transfers executed so far, oldest first.
    #[must_use]
    pub fn transfers(&self) -> &[LedgerTransfer] {
        &self.journal
    }

    /// Keep every journaled transfer. Returns how many there were.
    pub fn commit(self) -> usize {
        self.journal.len()
    }

    /// Undo every journaled transfer, newest first.
    ///
    /// Allowances consumed by `transfer_from` are not re-granted; only
    /// balances are restored.
    ///
    /// # Errors
    /// `CustodyInvariantViolation` if a compensating transfer is refused.
    /// Custody is then out of sync with vault accounting and needs an
    /// operator.
    pub fn rollback(mut self) -> Result<()> {
        for transfer in self.journal.iter().rev() {
            if !self
                .inner
                .transfer(transfer.to, transfer.from, transfer.amount)
            {
                tracing::error!(
                    from = %transfer.from.short(),
                    to = %transfer.to.short(),
                    amount = transfer.amount,
                    "Compensating transfer refused during rollback"
                );
                return Err(DuelbookError::CustodyInvariantViolation {
                    reason: format!(
                        "rollback of {} from {} to {} refused",
                        transfer.amount, transfer.from, transfer.to
                    ),
                });
            }
        }
        tracing::debug!(reversed = self.journal.len(), "Custody journal rolled back");
        Ok(())
    }
}

impl<L: AssetLedger + ?Sized> AssetLedger for JournaledLedger<'_, L> {
    fn transfer(&mut self, from: AccountId, to: AccountId, amount: Amount) -> bool {
        let ok = self.inner.transfer(from, to, amount);
        if ok {
            self.journal.push(LedgerTransfer { from, to, amount });
        }
        ok
    }

    fn transfer_from(
        &mut self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> bool {
        let ok = self.inner.transfer_from(spender, from, to, amount);
        if ok {
            self.journal.push(LedgerTransfer { from, to, amount });
        }
        ok
    }

    fn balance_of(&self, holder: AccountId) -> Amount {
        self.inner.balance_of(holder)
    }

    fn approve(&mut self, owner: AccountId, spender: AccountId, amount: Amount) -> bool {
        self.inner.approve(owner, spender, amount)
    }
}
