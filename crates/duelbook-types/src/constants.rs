//! System-wide constants for the Duelbook betting engine.

use crate::Amount;

/// Fixed-point scale used for proportional settlement (1e18).
pub const PRECISION_SCALE: Amount = 1_000_000_000_000_000_000;

/// Denominator for percentage-based fees.
pub const PERCENT_DENOMINATOR: Amount = 100;

/// Highest platform fee an administrator may configure, in percent.
pub const MAX_PLATFORM_FEE_PERCENTAGE: u8 = 10;

/// Platform fee applied when no configuration overrides it, in percent.
pub const DEFAULT_PLATFORM_FEE_PERCENTAGE: u8 = 5;

/// Raw outcome code for a declared cancellation.
pub const OUTCOME_CODE_CANCELLED: u8 = 4;

/// Domain separator for deterministic vault custody accounts.
pub const VAULT_ACCOUNT_DOMAIN: &[u8] = b"duelbook:vault_account:v1:";

/// Domain separator for the notice journal digest.
pub const NOTICE_JOURNAL_DOMAIN: &[u8] = b"duelbook:notice_journal:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Duelbook";
