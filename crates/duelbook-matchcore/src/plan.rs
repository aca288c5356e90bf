//! Pure match planning over the unmatched supply of both sides.
//!
//! Given each side's unmatched amount and odds snapshot, decide how much of
//! each side to mark matched this round. No vault is touched here; the plan
//! is applied by [`crate::try_match`].
//!
//! ## Decision table (first rule that yields a valid plan wins)
//!
//! ```text
//!   1. unmatched_a == 0 || unmatched_b == 0          → no match
//!   2. required_b = ua·odds_b/odds_a ≤ ub            → FullA  (ua, required_b)
//!   3. required_a = ub·odds_a/odds_b ≤ ua            → FullB  (required_a, ub)
//!   4. max_a = ub·odds_a/odds_b within ua            → Proportional (max_a, ub)
//!      else max_b = ua·odds_b/odds_a within ub       → Proportional (ua, max_b)
//!      else                                          → no match (wait for supply)
//! ```
//!
//! Every division truncates. A plan is only valid if **both** legs are
//! strictly positive and within their side's unmatched supply, so dust that
//! rounds to zero on the opposing side never produces a one-legged match.

use duelbook_types::{Amount, OddsSnapshot, Result};
use serde::Serialize;

/// One side's matchable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideBook {
    /// Unmatched, unclaimed principal.
    pub unmatched: Amount,
    /// The side's odds snapshot (`own` is this side's odds).
    pub odds: OddsSnapshot,
}

impl SideBook {
    #[must_use]
    pub fn new(unmatched: Amount, odds: OddsSnapshot) -> Self {
        Self { unmatched, odds }
    }

    /// Opposing amount needed to fully match this side.
    pub fn required_opposing(&self) -> Result<Amount> {
        self.odds.required_opposing(self.unmatched)
    }
}

/// Which rule of the decision table produced a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchRule {
    /// All of A's unmatched stake is matched.
    FullA,
    /// All of B's unmatched stake is matched.
    FullB,
    /// Neither side could be fully satisfied; matched up to capacity.
    Proportional,
}

/// Amounts to sweep on each side for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchPlan {
    pub amount_a: Amount,
    pub amount_b: Amount,
    pub rule: MatchRule,
}

impl MatchPlan {
    fn checked(
        amount_a: Amount,
        amount_b: Amount,
        rule: MatchRule,
        a: &SideBook,
        b: &SideBook,
    ) -> Option<Self> {
        let valid = amount_a > 0
            && amount_b > 0
            && amount_a <= a.unmatched
            && amount_b <= b.unmatched;
        valid.then_some(Self {
            amount_a,
            amount_b,
            rule,
        })
    }
}

/// Run the decision table.
///
/// Returns `Ok(None)` when no valid match exists this round.
///
/// # Errors
/// `ArithmeticOverflow` if a required opposing amount does not fit in an
/// `Amount`.
pub fn plan_match(a: &SideBook, b: &SideBook) -> Result<Option<MatchPlan>> {
    // 1. Nothing to pair.
    if a.unmatched == 0 || b.unmatched == 0 {
        return Ok(None);
    }

    // 2. B covers A completely.
    let required_b = a.required_opposing()?;
    if required_b <= b.unmatched {
        if let Some(plan) = MatchPlan::checked(a.unmatched, required_b, MatchRule::FullA, a, b) {
            return Ok(Some(plan));
        }
    }

    // 3. A covers B completely.
    let required_a = b.required_opposing()?;
    if required_a <= a.unmatched {
        if let Some(plan) = MatchPlan::checked(required_a, b.unmatched, MatchRule::FullB, a, b) {
            return Ok(Some(plan));
        }
    }

    // 4. Proportional capacity on the smaller side.
    let max_a = b.odds.required_opposing(b.unmatched)?;
    if let Some(plan) = MatchPlan::checked(max_a, b.unmatched, MatchRule::Proportional, a, b) {
        return Ok(Some(plan));
    }
    let max_b = a.odds.required_opposing(a.unmatched)?;
    Ok(MatchPlan::checked(
        a.unmatched,
        max_b,
        MatchRule::Proportional,
        a,
        b,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books(ua: Amount, ub: Amount, odds_a: u64, odds_b: u64) -> (SideBook, SideBook) {
        (
            SideBook::new(ua, OddsSnapshot::new(odds_a, odds_b)),
            SideBook::new(ub, OddsSnapshot::new(odds_b, odds_a)),
        )
    }

    #[test]
    fn empty_side_never_matches() {
        let (a, b) = books(0, 100, 100, 100);
        assert_eq!(plan_match(&a, &b).unwrap(), None);
        let (a, b) = books(100, 0, 100, 100);
        assert_eq!(plan_match(&a, &b).unwrap(), None);
    }

    #[test]
    fn even_odds_match_the_smaller_side() {
        let (a, b) = books(100, 60, 100, 100);
        let plan = plan_match(&a, &b).unwrap().unwrap();
        assert_eq!(plan, MatchPlan { amount_a: 60, amount_b: 60, rule: MatchRule::FullB });

        let (a, b) = books(40, 60, 100, 100);
        let plan = plan_match(&a, &b).unwrap().unwrap();
        assert_eq!(plan, MatchPlan { amount_a: 40, amount_b: 40, rule: MatchRule::FullA });
    }

    #[test]
    fn uneven_odds_scale_the_opposing_leg() {
        // A at 200 vs B at 100: 100 on A needs 50 on B.
        let (a, b) = books(100, 100, 200, 100);
        let plan = plan_match(&a, &b).unwrap().unwrap();
        assert_eq!(plan, MatchPlan { amount_a: 100, amount_b: 50, rule: MatchRule::FullA });

        // Only 30 on B: it is fully matched against 60 of A.
        let (a, b) = books(100, 30, 200, 100);
        let plan = plan_match(&a, &b).unwrap().unwrap();
        assert_eq!(plan, MatchPlan { amount_a: 60, amount_b: 30, rule: MatchRule::FullB });
    }

    #[test]
    fn dust_that_rounds_to_zero_waits() {
        // 1 unit on A at 3:1 needs 0 of B; 1 unit on B needs 3 of A.
        let (a, b) = books(1, 1, 3, 1);
        assert_eq!(plan_match(&a, &b).unwrap(), None);
    }

    #[test]
    fn truncation_rounds_the_opposing_leg_down() {
        let (a, b) = books(10, 100, 3, 1);
        let plan = plan_match(&a, &b).unwrap().unwrap();
        assert_eq!(plan.amount_a, 10);
        assert_eq!(plan.amount_b, 3);
    }

    #[test]
    fn overflow_is_reported() {
        let (a, b) = books(Amount::MAX, 1, 1, u64::MAX);
        assert!(plan_match(&a, &b).is_err());
    }
}
