//! Stake model: one deposit by one bettor into one vault.
//!
//! ## Flags
//!
//! ```text
//!   matched:  false ──sweep──▶ true      (never reverts)
//!   claimed:  false ──claim──▶ true      (terminal: funds left the vault)
//! ```
//!
//! A partially matched stake is split: the original record keeps the
//! unmatched remainder and a **new** record carries the matched part, so
//! the sum of amounts per flag state always equals claimable principal.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, Odds, Result, math};

/// A single stake record inside a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub bettor: AccountId,
    pub amount: Amount,
    pub matched: bool,
    pub claimed: bool,
}

impl Stake {
    /// A fresh, unmatched and unclaimed stake.
    #[must_use]
    pub fn new(bettor: AccountId, amount: Amount) -> Self {
        Self {
            bettor,
            amount,
            matched: false,
            claimed: false,
        }
    }

    /// Still waiting for an opposing counterpart.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.matched && !self.claimed
    }

    /// Which conservation bucket this stake's amount belongs to.
    #[must_use]
    pub fn bucket(&self) -> StakeBucket {
        match (self.matched, self.claimed) {
            (true, true) => StakeBucket::MatchedClaimed,
            (true, false) => StakeBucket::MatchedUnclaimed,
            (false, true) => StakeBucket::UnmatchedClaimed,
            (false, false) => StakeBucket::UnmatchedUnclaimed,
        }
    }
}

/// The four flag states a stake's amount can sit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StakeBucket {
    MatchedClaimed,
    MatchedUnclaimed,
    UnmatchedClaimed,
    UnmatchedUnclaimed,
}

/// Amount totals per [`StakeBucket`] for a set of stakes.
///
/// Conservation law: [`StakeBuckets::total`] equals cumulative deposits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeBuckets {
    pub matched_claimed: Amount,
    pub matched_unclaimed: Amount,
    pub unmatched_claimed: Amount,
    pub unmatched_unclaimed: Amount,
}

impl StakeBuckets {
    /// Tally `stakes` into buckets.
    pub fn tally<'a>(stakes: impl IntoIterator<Item = &'a Stake>) -> Self {
        let mut buckets = Self::default();
        for stake in stakes {
            let slot = match stake.bucket() {
                StakeBucket::MatchedClaimed => &mut buckets.matched_claimed,
                StakeBucket::MatchedUnclaimed => &mut buckets.matched_unclaimed,
                StakeBucket::UnmatchedClaimed => &mut buckets.unmatched_claimed,
                StakeBucket::UnmatchedUnclaimed => &mut buckets.unmatched_unclaimed,
            };
            *slot += stake.amount;
        }
        buckets
    }

    #[must_use]
    pub fn matched(&self) -> Amount {
        self.matched_claimed + self.matched_unclaimed
    }

    #[must_use]
    pub fn unmatched(&self) -> Amount {
        self.unmatched_claimed + self.unmatched_unclaimed
    }

    #[must_use]
    pub fn total(&self) -> Amount {
        self.matched() + self.unmatched()
    }
}

/// Odds frozen into a vault at its first stake.
///
/// `own` is the odds of the vault's side, `opposing` the other side's.
/// Matched volume keeps `matched_own / own ≈ matched_opposing / opposing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OddsSnapshot {
    pub own: Odds,
    pub opposing: Odds,
}

impl OddsSnapshot {
    #[must_use]
    pub fn new(own: Odds, opposing: Odds) -> Self {
        Self { own, opposing }
    }

    /// Opposing amount needed to fully match `amount` of this side,
    /// rounded down.
    pub fn required_opposing(&self, amount: Amount) -> Result<Amount> {
        math::mul_div(
            amount,
            Amount::from(self.opposing),
            Amount::from(self.own),
            "required_opposing",
        )
    }
}
