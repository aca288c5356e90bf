//! # duelbook-matchcore
//!
//! **Matching coordinator for Duelbook.**
//!
//! Pairs the unmatched stake of an event's two vaults at the odds ratio
//! frozen into them. It has:
//!
//! - **No state of its own**: every round is derived from the vaults
//! - **Odds-ratio preservation**: `matched_a / odds_a ≈ matched_b / odds_b`
//!   within one unit of truncation per round
//! - **No over-commitment**: a plan never exceeds either side's unmatched supply
//! - **FIFO fairness**: vault sweeps match the oldest stakes first

pub mod coordinator;
pub mod plan;

pub use coordinator::{side_book, try_match};
pub use plan::{MatchPlan, MatchRule, SideBook, plan_match};
