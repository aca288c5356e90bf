//! Escrow vault: per-(event, side) stake custody and the FIFO matching sweep.
//!
//! A vault owns an append-only arena of [`Stake`] records in arrival order
//! plus a monotonic `unmatched_cursor` pointing at the earliest stake that
//! may still hold unmatched principal. Sweeps only move the cursor forward:
//! once position *i* is fully matched or claimed, no later sweep needs it.
//!
//! Partial matches split a stake: the original record keeps the unmatched
//! remainder and a new, fully matched record is appended for the matched
//! part. Claims flip `claimed` **before** paying out and restore the flags if
//! the ledger refuses the payout.
//!
//! ## Checkpoints
//!
//! [`Vault::checkpoint`] opens an undo log. Until [`Vault::commit`] or
//! [`Vault::rollback`], every stake a sweep or claim rewrites is logged with
//! its prior value; appended records are dropped by truncation. Restoring
//! costs the number of stakes touched, not the size of the arena.

use std::collections::BTreeSet;

use duelbook_types::{
    AccountId, Amount, AssetLedger, DuelbookError, EventId, OddsSnapshot, Result, Side, Stake,
    StakeBuckets,
};
use serde::Serialize;

/// Escrow pool for one side of one event.
#[derive(Debug, Clone, Serialize)]
pub struct Vault {
    /// The event this vault belongs to.
    event_id: EventId,
    /// The side whose stakes this vault holds.
    side: Side,
    /// Ledger account holding this vault's custody.
    account: AccountId,
    /// All stakes in arrival order (append-only apart from split reductions).
    stakes: Vec<Stake>,
    /// Cumulative deposits.
    total_amount: Amount,
    /// Principal marked matched by sweeps.
    total_matched_amount: Amount,
    /// Unmatched principal already refunded.
    total_refunded: Amount,
    /// Every unit transferred out of custody.
    total_paid_out: Amount,
    /// Earliest stake that may still hold unmatched principal.
    unmatched_cursor: usize,
    /// Odds frozen at the first stake.
    odds: Option<OddsSnapshot>,
    /// Prior values of stakes rewritten since the open checkpoint.
    #[serde(skip)]
    undo: Option<Vec<(usize, Stake)>>,
}

/// Scalar state captured by [`Vault::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultCheckpoint {
    stakes_len: usize,
    total_amount: Amount,
    total_matched_amount: Amount,
    total_refunded: Amount,
    total_paid_out: Amount,
    unmatched_cursor: usize,
    odds: Option<OddsSnapshot>,
}

impl Vault {
    /// Create an empty vault with its deterministic custody account.
    #[must_use]
    pub fn new(event_id: EventId, side: Side) -> Self {
        Self {
            event_id,
            side,
            account: AccountId::vault(event_id, side),
            stakes: Vec::new(),
            total_amount: 0,
            total_matched_amount: 0,
            total_refunded: 0,
            total_paid_out: 0,
            unmatched_cursor: 0,
            odds: None,
            undo: None,
        }
    }

    // ───────────────────────── Checkpoints ─────────────────────────

    /// Open an undo log and capture the current totals.
    ///
    /// # Errors
    /// `Internal` if a checkpoint is already open; they do not nest.
    pub fn checkpoint(&mut self) -> Result<VaultCheckpoint> {
        if self.undo.is_some() {
            return Err(DuelbookError::Internal(format!(
                "checkpoint already open on {} vault of {}",
                self.side, self.event_id
            )));
        }
        self.undo = Some(Vec::new());
        Ok(VaultCheckpoint {
            stakes_len: self.stakes.len(),
            total_amount: self.total_amount,
            total_matched_amount: self.total_matched_amount,
            total_refunded: self.total_refunded,
            total_paid_out: self.total_paid_out,
            unmatched_cursor: self.unmatched_cursor,
            odds: self.odds,
        })
    }

    /// Keep every change since the checkpoint.
    pub fn commit(&mut self) {
        self.undo = None;
    }

    /// Put the vault back in the state captured by `checkpoint`.
    pub fn rollback(&mut self, checkpoint: VaultCheckpoint) {
        let restored = self.undo.take().map_or(0, |log| {
            let touched = log.len();
            for (index, stake) in log.into_iter().rev() {
                if let Some(slot) = self.stakes.get_mut(index) {
                    *slot = stake;
                }
            }
            touched
        });
        let appended = self.stakes.len().saturating_sub(checkpoint.stakes_len);
        self.stakes.truncate(checkpoint.stakes_len);
        self.total_amount = checkpoint.total_amount;
        self.total_matched_amount = checkpoint.total_matched_amount;
        self.total_refunded = checkpoint.total_refunded;
        self.total_paid_out = checkpoint.total_paid_out;
        self.unmatched_cursor = checkpoint.unmatched_cursor;
        self.odds = checkpoint.odds;
        tracing::debug!(
            event = %self.event_id,
            side = %self.side,
            restored,
            appended,
            "Vault rolled back to checkpoint"
        );
    }

    /// Number of stake rewrites logged since the open checkpoint.
    #[must_use]
    pub fn pending_undo(&self) -> usize {
        self.undo.as_ref().map_or(0, Vec::len)
    }

    // ───────────────────────── Deposits ─────────────────────────

    /// Append a new unmatched stake and return its index.
    ///
    /// The first stake snapshots `odds`; later calls ignore the argument so
    /// the matching ratio is fixed for the vault's lifetime.
    ///
    /// # Errors
    /// - `ZeroAmount` if `amount == 0`
    /// - `ArithmeticOverflow` if the vault total would overflow
    pub fn record_stake(
        &mut self,
        bettor: AccountId,
        amount: Amount,
        odds: OddsSnapshot,
    ) -> Result<usize> {
        if amount == 0 {
            return Err(DuelbookError::ZeroAmount);
        }
        let total = self
            .total_amount
            .checked_add(amount)
            .ok_or(DuelbookError::ArithmeticOverflow {
                context: "vault_total_amount",
            })?;

        let snapshot = *self.odds.get_or_insert(odds);
        self.total_amount = total;
        self.stakes.push(Stake::new(bettor, amount));
        let index = self.stakes.len() - 1;

        tracing::debug!(
            event = %self.event_id,
            side = %self.side,
            bettor = %bettor.short(),
            index,
            amount,
            own_odds = snapshot.own,
            opposing_odds = snapshot.opposing,
            "Stake recorded"
        );
        Ok(index)
    }

    // ───────────────────────── Matching ─────────────────────────

    /// Mark `amount` of unmatched principal as matched, oldest stakes first.
    ///
    /// Returns the amount actually matched. It is below `amount` only if the
    /// stake sequence runs out, which callers prevent by checking supply.
    ///
    /// # Errors
    /// `InvalidMatchAmount` unless `0 < amount <= unmatched_amount()`.
    pub fn sweep_match(&mut self, amount: Amount) -> Result<Amount> {
        let available = self.unmatched_amount();
        if amount == 0 || amount > available {
            return Err(DuelbookError::InvalidMatchAmount {
                requested: amount,
                available,
            });
        }

        let mut remaining = amount;
        while remaining > 0 && self.unmatched_cursor < self.stakes.len() {
            let cursor = self.unmatched_cursor;
            let stake = &mut self.stakes[cursor];

            // Fully consumed by an earlier sweep or already claimed.
            if !stake.is_open() {
                self.unmatched_cursor += 1;
                continue;
            }
            log_prior(self.undo.as_mut(), cursor, stake);

            if stake.amount <= remaining {
                stake.matched = true;
                remaining -= stake.amount;
                self.unmatched_cursor += 1;
            } else {
                // Split: the original keeps the remainder, a new record
                // carries the matched part. The cursor stays put.
                stake.amount -= remaining;
                let bettor = stake.bettor;
                self.stakes.push(Stake {
                    bettor,
                    amount: remaining,
                    matched: true,
                    claimed: false,
                });
                tracing::debug!(
                    event = %self.event_id,
                    side = %self.side,
                    split_index = cursor,
                    matched_index = self.stakes.len() - 1,
                    matched = remaining,
                    "Stake split on partial match"
                );
                remaining = 0;
            }
        }

        let matched = amount - remaining;
        self.total_matched_amount += matched;

        if remaining > 0 {
            tracing::warn!(
                event = %self.event_id,
                side = %self.side,
                requested = amount,
                matched,
                "Sweep exhausted stake sequence before requested amount"
            );
        }
        tracing::debug!(
            event = %self.event_id,
            side = %self.side,
            matched,
            cursor = self.unmatched_cursor,
            total_matched = self.total_matched_amount,
            "Matching sweep complete"
        );
        Ok(matched)
    }

    // ───────────────────────── Claims & Payouts ─────────────────────────

    /// Refund every unmatched, unclaimed stake of `bettor`.
    ///
    /// Returns the refunded sum, or `0` when there is nothing to refund.
    ///
    /// # Errors
    /// `CustodyFailure` if the ledger refuses the payout; flags and totals
    /// are restored before returning.
    pub fn claim_unmatched<L: AssetLedger + ?Sized>(
        &mut self,
        bettor: AccountId,
        ledger: &mut L,
    ) -> Result<Amount> {
        self.claim_where(bettor, false, ledger)
    }

    /// Release every matched, unclaimed stake of `bettor`.
    ///
    /// # Errors
    /// Same as [`Self::claim_unmatched`].
    pub fn claim_matched<L: AssetLedger + ?Sized>(
        &mut self,
        bettor: AccountId,
        ledger: &mut L,
    ) -> Result<Amount> {
        self.claim_where(bettor, true, ledger)
    }

    /// Pay `amount` out of custody to `recipient` unconditionally.
    ///
    /// Settlement uses this for cross-pool winnings and platform fees.
    ///
    /// # Errors
    /// - `ZeroAmount` if `amount == 0`
    /// - `CustodyFailure` if the ledger refuses
    pub fn transfer_winnings<L: AssetLedger + ?Sized>(
        &mut self,
        recipient: AccountId,
        amount: Amount,
        ledger: &mut L,
    ) -> Result<()> {
        if amount == 0 {
            return Err(DuelbookError::ZeroAmount);
        }
        self.pay_out(recipient, amount, ledger)
    }

    fn claim_where<L: AssetLedger + ?Sized>(
        &mut self,
        bettor: AccountId,
        matched: bool,
        ledger: &mut L,
    ) -> Result<Amount> {
        let mut flipped = Vec::new();
        let mut total: Amount = 0;
        for (index, stake) in self.stakes.iter_mut().enumerate() {
            if stake.bettor == bettor && stake.matched == matched && !stake.claimed {
                log_prior(self.undo.as_mut(), index, stake);
                stake.claimed = true;
                total += stake.amount;
                flipped.push(index);
            }
        }
        if total == 0 {
            return Ok(0);
        }
        if !matched {
            self.total_refunded += total;
        }

        if let Err(err) = self.pay_out(bettor, total, ledger) {
            for index in flipped {
                self.stakes[index].claimed = false;
            }
            if !matched {
                self.total_refunded -= total;
            }
            return Err(err);
        }

        tracing::debug!(
            event = %self.event_id,
            side = %self.side,
            bettor = %bettor.short(),
            matched,
            stakes = flipped.len(),
            amount = total,
            "Stakes claimed"
        );
        Ok(total)
    }

    fn pay_out<L: AssetLedger + ?Sized>(
        &mut self,
        recipient: AccountId,
        amount: Amount,
        ledger: &mut L,
    ) -> Result<()> {
        if !ledger.transfer(self.account, recipient, amount) {
            tracing::warn!(
                event = %self.event_id,
                side = %self.side,
                recipient = %recipient.short(),
                amount,
                "Vault payout refused by ledger"
            );
            return Err(DuelbookError::CustodyFailure {
                reason: format!(
                    "transfer of {amount} from {} vault of {} to {recipient} refused",
                    self.side, self.event_id
                ),
            });
        }
        self.total_paid_out += amount;
        Ok(())
    }

    // ───────────────────────── Accessors ─────────────────────────

    #[must_use]
    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub fn account(&self) -> AccountId {
        self.account
    }

    #[must_use]
    pub fn odds(&self) -> Option<OddsSnapshot> {
        self.odds
    }

    /// Principal neither matched nor refunded.
    #[must_use]
    pub fn unmatched_amount(&self) -> Amount {
        self.total_amount - self.total_matched_amount - self.total_refunded
    }

    /// Opposing amount needed to fully match [`Self::unmatched_amount`].
    /// Zero before the first stake.
    pub fn required_opposing(&self) -> Result<Amount> {
        match self.odds {
            Some(odds) => odds.required_opposing(self.unmatched_amount()),
            None => Ok(0),
        }
    }

    #[must_use]
    pub fn total_amount(&self) -> Amount {
        self.total_amount
    }

    #[must_use]
    pub fn total_matched_amount(&self) -> Amount {
        self.total_matched_amount
    }

    #[must_use]
    pub fn total_refunded(&self) -> Amount {
        self.total_refunded
    }

    #[must_use]
    pub fn total_paid_out(&self) -> Amount {
        self.total_paid_out
    }

    #[must_use]
    pub fn unmatched_cursor(&self) -> usize {
        self.unmatched_cursor
    }

    /// Full stake dump in arena order.
    #[must_use]
    pub fn stakes(&self) -> &[Stake] {
        &self.stakes
    }

    #[must_use]
    pub fn has_stakes(&self) -> bool {
        !self.stakes.is_empty()
    }

    /// Conservation buckets over every stake.
    #[must_use]
    pub fn bucket_totals(&self) -> StakeBuckets {
        StakeBuckets::tally(&self.stakes)
    }

    /// Conservation buckets over `bettor`'s stakes.
    #[must_use]
    pub fn bettor_buckets(&self, bettor: AccountId) -> StakeBuckets {
        StakeBuckets::tally(self.stakes.iter().filter(|s| s.bettor == bettor))
    }

    /// Number of distinct bettors with at least one stake.
    #[must_use]
    pub fn bettor_count(&self) -> usize {
        self.stakes
            .iter()
            .map(|s| s.bettor)
            .collect::<BTreeSet<AccountId>>()
            .len()
    }
}

fn log_prior(undo: Option<&mut Vec<(usize, Stake)>>, index: usize, stake: &Stake) {
    if let Some(log) = undo {
        log.push((index, *stake));
    }
}
