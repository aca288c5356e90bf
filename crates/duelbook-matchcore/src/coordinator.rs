//! Matching coordinator: applies a [`MatchPlan`] onto the two vaults of an
//! event.
//!
//! ```text
//! try_match(&mut vault_a, &mut vault_b) -> Option<MatchPlan>
//! ```
//!
//! Stateless: everything it needs is read from the vaults, so repeated calls
//! without new unmatched supply are no-ops. Invoked after every stake.

use duelbook_escrow::Vault;
use duelbook_types::{DuelbookError, Result, Side};

use crate::plan::{MatchPlan, SideBook, plan_match};

/// Matchable view of a vault; `None` until the vault has its odds snapshot.
#[must_use]
pub fn side_book(vault: &Vault) -> Option<SideBook> {
    vault
        .odds()
        .map(|odds| SideBook::new(vault.unmatched_amount(), odds))
}

/// Plan one matching round and sweep both vaults accordingly.
///
/// Returns the applied plan, or `None` if nothing could be matched.
///
/// ## Algorithm
///
/// 1. Read both sides' unmatched supply and odds snapshots
/// 2. Run the decision table in [`plan_match`]
/// 3. Sweep `amount_a` on A's vault, then `amount_b` on B's vault
///
/// # Errors
/// - `Internal` if the vaults are passed in the wrong order
/// - `ArithmeticOverflow` from planning
/// - `InvalidMatchAmount` from a sweep. Plans are bounded by supply, so this
///   only surfaces if vault state changed underneath the plan; callers
///   snapshot vaults and restore them on error.
pub fn try_match(vault_a: &mut Vault, vault_b: &mut Vault) -> Result<Option<MatchPlan>> {
    if vault_a.side() != Side::A || vault_b.side() != Side::B {
        return Err(DuelbookError::Internal(format!(
            "try_match expects (SIDE_A, SIDE_B) vaults, got ({}, {})",
            vault_a.side(),
            vault_b.side()
        )));
    }

    let (Some(book_a), Some(book_b)) = (side_book(vault_a), side_book(vault_b)) else {
        return Ok(None);
    };
    let Some(plan) = plan_match(&book_a, &book_b)? else {
        tracing::debug!(
            event = %vault_a.event_id(),
            unmatched_a = book_a.unmatched,
            unmatched_b = book_b.unmatched,
            "No match this round"
        );
        return Ok(None);
    };

    vault_a.sweep_match(plan.amount_a)?;
    vault_b.sweep_match(plan.amount_b)?;

    tracing::debug!(
        event = %vault_a.event_id(),
        rule = ?plan.rule,
        matched_a = plan.amount_a,
        matched_b = plan.amount_b,
        remaining_a = vault_a.unmatched_amount(),
        remaining_b = vault_b.unmatched_amount(),
        "Matching round applied"
    );
    Ok(Some(plan))
}
