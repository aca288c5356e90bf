//! # duelbook-types
//!
//! Shared types, errors, and configuration for the **Duelbook** betting engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`EventId`], [`AccountId`]
//! - **Event model**: [`Event`], [`EventDraft`], [`Side`], [`Outcome`], [`EventPhase`]
//! - **Stake model**: [`Stake`], [`StakeBuckets`], [`OddsSnapshot`]
//! - **Notices**: [`Notice`], [`NoticeLog`]
//! - **Collaborators**: [`AssetLedger`], [`Clock`], [`Authority`] plus reference impls
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`DuelbookError`] with `DB_ERR_` prefix codes
//! - **Math**: fixed-point helpers in [`math`]
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod math;
pub mod notice;
pub mod ports;
pub mod stake;

// Re-export all primary types at crate root for ergonomic imports:
//   use duelbook_types::{Event, Side, Stake, Outcome, ...};

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use notice::*;
pub use ports::*;
pub use stake::*;

/// Asset base units. All arithmetic on amounts is integer and truncating.
pub type Amount = u128;

/// Odds weight for one side of an event. Always strictly positive.
pub type Odds = u64;

// Constants are accessed via `duelbook_types::constants::FOO` and math via
// `duelbook_types::math::mul_div` (not re-exported to avoid name collisions).
