//! Error types for the Duelbook betting engine.
//!
//! All errors use the `DB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by failure class:
//! - 1xx: Validation errors (bad input, rejected before any mutation)
//! - 2xx: State errors (wrong lifecycle phase, wait for a state change)
//! - 3xx: Insufficiency (nothing is due to the caller)
//! - 4xx: Custody errors (asset transfer failed, operation rolled back)
//! - 5xx: Authorization errors
//! - 9xx: General / internal errors

use std::fmt;

use thiserror::Error;

use crate::{AccountId, Amount, EventId, EventPhase};

/// Coarse failure class of a [`DuelbookError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rejected before any state mutation; retry with corrected input.
    Validation,
    /// Not admissible in the current lifecycle state.
    State,
    /// Nothing is due to the caller.
    Insufficiency,
    /// Underlying asset transfer failed; the operation was discarded.
    Custody,
    /// Caller lacks the administrator capability.
    Authorization,
    /// Arithmetic, clock, configuration or other internal failure.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::State => write!(f, "STATE"),
            Self::Insufficiency => write!(f, "INSUFFICIENCY"),
            Self::Custody => write!(f, "CUSTODY"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Central error enum for all Duelbook operations.
#[derive(Debug, Error)]
pub enum DuelbookError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// Opening/closing times are not strictly ordered after creation time.
    #[error("DB_ERR_100: Invalid schedule: {reason}")]
    InvalidSchedule { reason: String },

    /// Both odds must be strictly positive.
    #[error("DB_ERR_101: Invalid odds: side A {odds_a}, side B {odds_b}")]
    InvalidOdds { odds_a: u64, odds_b: u64 },

    /// Stakes and payouts must move a non-zero amount.
    #[error("DB_ERR_102: Amount must be greater than zero")]
    ZeroAmount,

    /// No event is registered under this identifier.
    #[error("DB_ERR_103: Event not found: {0}")]
    EventNotFound(EventId),

    /// The outcome code is outside the declarable set.
    #[error("DB_ERR_104: Invalid outcome code: {0}")]
    InvalidOutcomeCode(u8),

    /// The platform fee is above the configured maximum.
    #[error("DB_ERR_105: Invalid fee percentage {pct}: maximum is {max}")]
    InvalidFeePercentage { pct: u8, max: u8 },

    /// A matching sweep asked for zero or more than the unmatched supply.
    #[error("DB_ERR_106: Invalid match amount: requested {requested}, unmatched {available}")]
    InvalidMatchAmount { requested: Amount, available: Amount },

    // =================================================================
    // State Errors (2xx)
    // =================================================================
    /// Bets are only accepted in `[opening_time, closing_time)`.
    #[error("DB_ERR_200: Betting is not open for {event} (phase {phase})")]
    BettingNotOpen { event: EventId, phase: EventPhase },

    /// The outcome has already been declared.
    #[error("DB_ERR_201: Event already settled: {0}")]
    EventAlreadySettled(EventId),

    /// Claims require a declared outcome.
    #[error("DB_ERR_202: Outcome not yet declared for {0}")]
    OutcomeNotDeclared(EventId),

    /// The operation is gated on the closing time.
    #[error("DB_ERR_203: Closing time not reached for {0}")]
    ClosingTimeNotReached(EventId),

    /// The event was cancelled.
    #[error("DB_ERR_204: Event cancelled: {0}")]
    EventCancelled(EventId),

    /// Odds cannot change once either side holds a stake.
    #[error("DB_ERR_205: Odds locked for {0}: stakes already recorded")]
    OddsLocked(EventId),

    /// A claim for this event is already executing.
    #[error("DB_ERR_206: Claim already in progress for {0}")]
    ClaimInProgress(EventId),

    // =================================================================
    // Insufficiency (3xx)
    // =================================================================
    /// No unmatched stake is refundable for this bettor.
    #[error("DB_ERR_300: Nothing to claim")]
    NothingToClaim,

    /// No matched stake on the relevant side(s) for this bettor.
    #[error("DB_ERR_301: No winnings")]
    NoWinnings,

    // =================================================================
    // Custody Errors (4xx)
    // =================================================================
    /// The asset ledger refused a transfer.
    #[error("DB_ERR_400: Custody failure: {reason}")]
    CustodyFailure { reason: String },

    /// Vault accounting disagrees with ledger custody. Critical safety alert.
    #[error("DB_ERR_401: Custody invariant violation: {reason}")]
    CustodyInvariantViolation { reason: String },

    // =================================================================
    // Authorization Errors (5xx)
    // =================================================================
    /// The caller is not an administrator.
    #[error("DB_ERR_500: Unauthorized caller: {0}")]
    Unauthorized(AccountId),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Checked arithmetic overflowed.
    #[error("DB_ERR_900: Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },

    /// The external clock could not be read.
    #[error("DB_ERR_901: Clock unavailable: {0}")]
    ClockUnavailable(String),

    /// Configuration error (invalid config file, bad values, etc.).
    #[error("DB_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("DB_ERR_903: Serialization error: {0}")]
    Serialization(String),

    /// Unrecoverable internal error.
    #[error("DB_ERR_999: Internal error: {0}")]
    Internal(String),
}

impl DuelbookError {
    /// Failure class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSchedule { .. }
            | Self::InvalidOdds { .. }
            | Self::ZeroAmount
            | Self::EventNotFound(_)
            | Self::InvalidOutcomeCode(_)
            | Self::InvalidFeePercentage { .. }
            | Self::InvalidMatchAmount { .. } => ErrorKind::Validation,
            Self::BettingNotOpen { .. }
            | Self::EventAlreadySettled(_)
            | Self::OutcomeNotDeclared(_)
            | Self::ClosingTimeNotReached(_)
            | Self::EventCancelled(_)
            | Self::OddsLocked(_)
            | Self::ClaimInProgress(_) => ErrorKind::State,
            Self::NothingToClaim | Self::NoWinnings => ErrorKind::Insufficiency,
            Self::CustodyFailure { .. } | Self::CustodyInvariantViolation { .. } => {
                ErrorKind::Custody
            }
            Self::Unauthorized(_) => ErrorKind::Authorization,
            Self::ArithmeticOverflow { .. }
            | Self::ClockUnavailable(_)
            | Self::Configuration(_)
            | Self::Serialization(_)
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, DuelbookError>;

impl From<serde_json::Error> for DuelbookError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = DuelbookError::EventNotFound(EventId(9));
        let msg = format!("{err}");
        assert!(msg.starts_with("DB_ERR_103"), "Got: {msg}");
        assert!(msg.contains("event:9"));
    }

    #[test]
    fn invalid_match_amount_display() {
        let err = DuelbookError::InvalidMatchAmount {
            requested: 150,
            available: 100,
        };
        let msg = format!("{err}");
        assert!(msg.contains("DB_ERR_106"));
        assert!(msg.contains("150"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn betting_not_open_display() {
        let err = DuelbookError::BettingNotOpen {
            event: EventId(1),
            phase: EventPhase::Closed,
        };
        let msg = format!("{err}");
        assert!(msg.contains("DB_ERR_200"));
        assert!(msg.contains("CLOSED"));
    }

    #[test]
    fn kinds_follow_code_groups() {
        assert_eq!(DuelbookError::ZeroAmount.kind(), ErrorKind::Validation);
        assert_eq!(
            DuelbookError::OutcomeNotDeclared(EventId(1)).kind(),
            ErrorKind::State
        );
        assert_eq!(DuelbookError::NoWinnings.kind(), ErrorKind::Insufficiency);
        assert_eq!(
            DuelbookError::CustodyFailure { reason: "x".into() }.kind(),
            ErrorKind::Custody
        );
        assert_eq!(
            DuelbookError::Unauthorized(AccountId::new()).kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            DuelbookError::ArithmeticOverflow { context: "t" }.kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn all_errors_have_db_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(DuelbookError::NothingToClaim),
            Box::new(DuelbookError::ClaimInProgress(EventId(1))),
            Box::new(DuelbookError::InvalidOutcomeCode(7)),
            Box::new(DuelbookError::Internal("test".into())),
            Box::new(DuelbookError::InvalidOdds { odds_a: 0, odds_b: 1 }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("DB_ERR_"),
                "Error missing DB_ERR_ prefix: {msg}"
            );
        }
    }
}
