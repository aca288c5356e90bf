//! # duelbook-escrow
//!
//! **Custody plane**: per-side escrow vaults, the FIFO matching sweep,
//! claim payouts, and the ledger plumbing they run on.
//!
//! ## Architecture
//!
//! 1. **Vault**: one per (event, side); owns the stake arena, aggregate
//!    totals, the monotonic unmatched cursor and the odds snapshot
//! 2. **InMemoryLedger**: reference fungible-asset ledger (balances + allowances)
//! 3. **JournaledLedger**: records transfers of a multi-step operation so the
//!    whole operation can be rolled back
//!
//! ## Stake Flow
//!
//! ```text
//! place_bet → Vault.record_stake() → Vault.sweep_match() (via matchcore)
//!     → Vault.claim_matched() / claim_unmatched() / transfer_winnings() → ledger
//! ```
//!
//! Vault state is mutated **before** any payout; a refused payout restores it.
//! Multi-step callers wrap a vault in a checkpoint and roll it back on error.

pub mod custody;
pub mod ledger;
pub mod vault;

pub use custody::{JournaledLedger, LedgerTransfer};
pub use ledger::InMemoryLedger;
pub use vault::{Vault, VaultCheckpoint};
