//! Proportional winnings math.
//!
//! ```text
//! proportion   = original_bet · 1e18 / winning_matched_total
//! raw_winnings = proportion · losing_matched_total / 1e18
//! fee          = raw_winnings · fee_pct / 100
//! net_winnings = raw_winnings − fee
//! ```
//!
//! Every step truncates, so the sum of all winners' raw winnings never
//! exceeds the losing side's matched pool.

use duelbook_types::{Amount, DuelbookError, Result, math};
use serde::Serialize;

/// Breakdown of one winner's claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WinningsQuote {
    /// Matched principal on the winning side, returned from its own vault.
    pub original_bet: Amount,
    /// Share of the winning side's matched pool, scaled by 1e18.
    pub proportion: Amount,
    /// Share of the losing side's matched pool before fees.
    pub raw_winnings: Amount,
    /// Platform fee taken from `raw_winnings`.
    pub fee: Amount,
    /// `raw_winnings - fee`, paid from the losing side's vault.
    pub net_winnings: Amount,
}

impl WinningsQuote {
    /// What the bettor receives in total.
    pub fn total(&self) -> Result<Amount> {
        self.original_bet
            .checked_add(self.net_winnings)
            .ok_or(DuelbookError::ArithmeticOverflow {
                context: "winnings_total",
            })
    }
}

/// Quote a winner's payout.
///
/// Returns a quote with only `original_bet` set when the bettor or the
/// winning pool has no matched principal.
pub fn quote_winnings(
    original_bet: Amount,
    winning_matched_total: Amount,
    losing_matched_total: Amount,
    fee_pct: u8,
) -> Result<WinningsQuote> {
    if original_bet == 0 || winning_matched_total == 0 {
        return Ok(WinningsQuote {
            original_bet,
            ..WinningsQuote::default()
        });
    }
    let proportion = math::scaled_proportion(original_bet, winning_matched_total)?;
    let raw_winnings = math::apply_proportion(proportion, losing_matched_total)?;
    let fee = math::percent_of(raw_winnings, fee_pct)?;
    Ok(WinningsQuote {
        original_bet,
        proportion,
        raw_winnings,
        fee,
        net_winnings: raw_winnings - fee,
    })
}
