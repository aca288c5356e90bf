//! Claims: matched-stake settlement and unmatched-stake refunds.
//!
//! ## Winnings by outcome
//!
//! | Outcome          | Paid to bettor                                          |
//! |------------------|---------------------------------------------------------|
//! | Cancelled / Draw | matched principal from both vaults, no fee              |
//! | Side X won       | X matched principal + share of Y's matched pool − fee   |
//!
//! Both claims run under the per-event claim guard and inside a journaled
//! transaction: stake flags flip before each payout, and any refused
//! transfer restores the vaults and reverses the payouts already made.

use duelbook_escrow::{JournaledLedger, Vault};
use duelbook_types::{
    AccountId, Amount, AssetLedger, Authority, Clock, DuelbookError, EventId, Notice, Outcome,
    Result, Side,
};

use crate::{BettingEngine, payout::quote_winnings, registry::EventBook};

/// What a successful winnings claim paid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ClaimPayout {
    total: Amount,
    fee: Amount,
}

impl<L: AssetLedger, C: Clock, A: Authority> BettingEngine<L, C, A> {
    /// Settle `bettor`'s matched stakes on a concluded or cancelled event.
    ///
    /// Returns the total paid to the bettor (principal plus net winnings).
    /// The fee percentage is read now, not when the bet was placed.
    ///
    /// # Errors
    /// - `EventNotFound`, `OutcomeNotDeclared`
    /// - `NoWinnings` if nothing is due (including a second claim)
    /// - `ClaimInProgress` if a claim on this event is executing
    /// - `CustodyFailure` if the ledger refuses any payout; nothing is paid
    pub fn claim_winnings(&mut self, event_id: EventId, bettor: AccountId) -> Result<Amount> {
        self.with_claim_guard(event_id, |engine| {
            let book = engine.registry.get(event_id)?;
            if !book.event.is_settled() {
                return Err(DuelbookError::OutcomeNotDeclared(event_id));
            }
            let outcome = book.event.outcome;
            let fee_pct = engine.config.platform_fee_percentage;
            let collector = engine.config.fee_collector;

            let payout = engine.transact(event_id, |book, ledger| {
                pay_winnings(book, bettor, outcome, fee_pct, collector, ledger)
            })?;

            engine.notices.push(Notice::WinningsClaimed {
                event: event_id,
                bettor,
                amount: payout.total,
            });
            if payout.fee > 0 {
                engine.notices.push(Notice::FeeCollected {
                    event: event_id,
                    collector,
                    amount: payout.fee,
                });
            }
            tracing::info!(
                event = %event_id,
                bettor = %bettor.short(),
                %outcome,
                amount = payout.total,
                fee = payout.fee,
                fee_pct,
                "Winnings claimed"
            );
            Ok(payout.total)
        })
    }

    /// Refund `bettor`'s unmatched stakes on both sides.
    ///
    /// Allowed once the closing time has passed or the event is cancelled,
    /// whether or not an outcome has been declared.
    ///
    /// # Errors
    /// - `EventNotFound`, `ClosingTimeNotReached`
    /// - `NothingToClaim` if no unmatched stake is refundable
    /// - `ClaimInProgress`, `CustodyFailure` as for [`Self::claim_winnings`]
    pub fn claim_unmatched_bets(&mut self, event_id: EventId, bettor: AccountId) -> Result<Amount> {
        self.with_claim_guard(event_id, |engine| {
            let now = engine.clock.now()?;
            let book = engine.registry.get(event_id)?;
            if !book.event.cancelled && now < book.event.closing_time {
                return Err(DuelbookError::ClosingTimeNotReached(event_id));
            }

            let refunded = engine.transact(event_id, |book, ledger| {
                let mut total: Amount = 0;
                for side in Side::BOTH {
                    total += book.vault_mut(side).claim_unmatched(bettor, ledger)?;
                }
                if total == 0 {
                    return Err(DuelbookError::NothingToClaim);
                }
                Ok(total)
            })?;

            engine.notices.push(Notice::UnmatchedRefunded {
                event: event_id,
                bettor,
                amount: refunded,
            });
            tracing::info!(
                event = %event_id,
                bettor = %bettor.short(),
                amount = refunded,
                "Unmatched stakes refunded"
            );
            Ok(refunded)
        })
    }
}

fn pay_winnings<L: AssetLedger>(
    book: &mut EventBook,
    bettor: AccountId,
    outcome: Outcome,
    fee_pct: u8,
    collector: AccountId,
    ledger: &mut JournaledLedger<'_, L>,
) -> Result<ClaimPayout> {
    let payout = match outcome.winner() {
        None => refund_matched(book, bettor, ledger)?,
        Some(winner) => {
            let (winning, losing) = match winner {
                Side::A => (&mut book.vault_a, &mut book.vault_b),
                Side::B => (&mut book.vault_b, &mut book.vault_a),
            };
            pay_cross_pool(winning, losing, bettor, fee_pct, collector, ledger)?
        }
    };
    if payout.total == 0 {
        return Err(DuelbookError::NoWinnings);
    }
    Ok(payout)
}

/// Draw or cancellation: matched principal comes back from both sides.
fn refund_matched<L: AssetLedger>(
    book: &mut EventBook,
    bettor: AccountId,
    ledger: &mut JournaledLedger<'_, L>,
) -> Result<ClaimPayout> {
    let mut total: Amount = 0;
    for side in Side::BOTH {
        total += book.vault_mut(side).claim_matched(bettor, ledger)?;
    }
    Ok(ClaimPayout { total, fee: 0 })
}

fn pay_cross_pool<L: AssetLedger>(
    winning: &mut Vault,
    losing: &mut Vault,
    bettor: AccountId,
    fee_pct: u8,
    collector: AccountId,
    ledger: &mut JournaledLedger<'_, L>,
) -> Result<ClaimPayout> {
    let original_bet = winning.claim_matched(bettor, ledger)?;
    let quote = quote_winnings(
        original_bet,
        winning.total_matched_amount(),
        losing.total_matched_amount(),
        fee_pct,
    )?;
    if quote.net_winnings > 0 {
        losing.transfer_winnings(bettor, quote.net_winnings, ledger)?;
    }
    if quote.fee > 0 {
        losing.transfer_winnings(collector, quote.fee, ledger)?;
    }
    tracing::debug!(
        event = %winning.event_id(),
        bettor = %bettor.short(),
        original_bet,
        raw_winnings = quote.raw_winnings,
        fee = quote.fee,
        "Cross-pool winnings computed"
    );
    Ok(ClaimPayout {
        total: quote.total()?,
        fee: quote.fee,
    })
}
