//! Read-only views over events, vaults and positions.

use chrono::{DateTime, Utc};
use duelbook_escrow::Vault;
use duelbook_types::{
    AccountId, Amount, AssetLedger, Authority, Clock, Event, EventId, EventPhase, Outcome, Result,
    Side, Stake, StakeBuckets,
};
use serde::Serialize;

use crate::{BettingEngine, CustodyReport, conservation::verify_vault};

/// One bettor's stake on one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SidePosition {
    pub total: Amount,
    pub matched: Amount,
    pub unmatched: Amount,
    pub matched_unclaimed: Amount,
    pub unmatched_unclaimed: Amount,
}

impl From<StakeBuckets> for SidePosition {
    fn from(buckets: StakeBuckets) -> Self {
        Self {
            total: buckets.total(),
            matched: buckets.matched(),
            unmatched: buckets.unmatched(),
            matched_unclaimed: buckets.matched_unclaimed,
            unmatched_unclaimed: buckets.unmatched_unclaimed,
        }
    }
}

/// A bettor's aggregate position on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BettorPosition {
    pub event: EventId,
    pub bettor: AccountId,
    pub side_a: SidePosition,
    pub side_b: SidePosition,
}

impl BettorPosition {
    #[must_use]
    pub fn side(&self, side: Side) -> &SidePosition {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }
}

/// Aggregate figures for one vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SideStats {
    pub total_amount: Amount,
    pub matched: Amount,
    pub unmatched: Amount,
    pub refunded: Amount,
    pub paid_out: Amount,
    pub stake_count: usize,
    pub bettor_count: usize,
}

impl SideStats {
    fn of(vault: &Vault) -> Self {
        Self {
            total_amount: vault.total_amount(),
            matched: vault.total_matched_amount(),
            unmatched: vault.unmatched_amount(),
            refunded: vault.total_refunded(),
            paid_out: vault.total_paid_out(),
            stake_count: vault.stakes().len(),
            bettor_count: vault.bettor_count(),
        }
    }
}

/// Aggregate figures for an event at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventStats {
    pub event: EventId,
    pub phase: EventPhase,
    pub outcome: Outcome,
    pub side_a: SideStats,
    pub side_b: SideStats,
}

impl<L: AssetLedger, C: Clock, A: Authority> BettingEngine<L, C, A> {
    pub fn event(&self, event_id: EventId) -> Result<&Event> {
        Ok(&self.registry.get(event_id)?.event)
    }

    pub fn bettor_position(&self, event_id: EventId, bettor: AccountId) -> Result<BettorPosition> {
        let book = self.registry.get(event_id)?;
        Ok(BettorPosition {
            event: event_id,
            bettor,
            side_a: book.vault_a.bettor_buckets(bettor).into(),
            side_b: book.vault_b.bettor_buckets(bettor).into(),
        })
    }

    /// Stats with the phase evaluated at the clock's current time.
    pub fn event_stats(&self, event_id: EventId) -> Result<EventStats> {
        let now = self.clock.now()?;
        let book = self.registry.get(event_id)?;
        Ok(EventStats {
            event: event_id,
            phase: book.event.phase(now),
            outcome: book.event.outcome,
            side_a: SideStats::of(&book.vault_a),
            side_b: SideStats::of(&book.vault_b),
        })
    }

    /// Every stake record on `side`, in arena order.
    pub fn stakes(&self, event_id: EventId, side: Side) -> Result<&[Stake]> {
        Ok(self.registry.get(event_id)?.vault(side).stakes())
    }

    /// The vault itself, for callers that need more than the summaries.
    pub fn vault(&self, event_id: EventId, side: Side) -> Result<&Vault> {
        Ok(self.registry.get(event_id)?.vault(side))
    }

    /// Events created and not yet given an outcome.
    #[must_use]
    pub fn active_event_count(&self) -> usize {
        self.registry.active_count()
    }

    #[must_use]
    pub fn active_events(&self) -> Vec<EventId> {
        self.registry.active_ids().collect()
    }

    /// Total events ever created.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.registry.len()
    }

    pub fn current_time(&self) -> Result<DateTime<Utc>> {
        self.clock.now()
    }

    /// Check both of `event_id`'s vaults against the ledger.
    ///
    /// # Errors
    /// `CustodyInvariantViolation` if vault accounting and custody disagree.
    pub fn verify_custody(&self, event_id: EventId) -> Result<[CustodyReport; 2]> {
        let book = self.registry.get(event_id)?;
        Ok([
            verify_vault(&book.vault_a, &self.ledger)?,
            verify_vault(&book.vault_b, &self.ledger)?,
        ])
    }

    /// Hex digest over every notice emitted so far.
    pub fn journal_root_hex(&self) -> Result<String> {
        self.notices.journal_root_hex()
    }
}
