//! # duelbook-settlement
//!
//! **Event lifecycle and settlement**: the [`BettingEngine`] façade that
//! schedules events, admits stakes, declares outcomes and pays out claims.
//!
//! ## Architecture
//!
//! The engine owns an [`EventRegistry`] of events, each with two escrow
//! vaults, and drives them through:
//! 1. Admission: schedule and cancellation checks before any mutation
//! 2. Matching: `duelbook-matchcore` pairs stakes after every placement
//! 3. Declaration: an administrator fixes the outcome exactly once
//! 4. Claims: guarded, journaled payouts (principal, winnings, fee)
//! 5. Conservation: vault accounting can be checked against the ledger
//!
//! ## Guarantees
//!
//! - **No double payment**: claimed stakes are terminal, claims are guarded per event
//! - **No partial commits**: a refused transfer rolls back the whole operation
//! - **No insolvency**: payouts round down and never exceed the paying pool

pub mod claim_guard;
pub mod claims;
pub mod conservation;
pub mod engine;
pub mod payout;
pub mod registry;
pub mod reporting;

pub use claim_guard::ClaimGuard;
pub use conservation::{CustodyReport, verify_vault};
pub use engine::BettingEngine;
pub use payout::{WinningsQuote, quote_winnings};
pub use registry::{EventBook, EventRegistry};
pub use reporting::{BettorPosition, EventStats, SidePosition, SideStats};
