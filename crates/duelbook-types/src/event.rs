//! Event model: the scheduled two-sided contest bettors stake on.
//!
//! ## Lifecycle
//!
//! ```text
//!   ┌───────────┐ opening ┌──────┐ closing ┌────────┐ set_outcome ┌──────────────────┐
//!   │ SCHEDULED ├────────▶│ OPEN ├────────▶│ CLOSED ├────────────▶│ CONCLUDED(outcome)│
//!   └───────────┘         └──────┘         └───┬────┘             └──────────────────┘
//!                                              │ set_outcome(4)
//!                                              ▼
//!                                         ┌───────────┐
//!                                         │ CANCELLED │
//!                                         └───────────┘
//! ```
//!
//! Time-driven phases are derived from the external clock; the terminal
//! phases are stored flags. An outcome is declared exactly once.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DuelbookError, EventId, Odds, OddsSnapshot, Result, constants};

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// One of the two competing outcomes of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Both sides, in vault order.
    pub const BOTH: [Self; 2] = [Self::A, Self::B];

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Stable index: A = 0, B = 1.
    #[must_use]
    pub fn index(self) -> u8 {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "SIDE_A"),
            Self::B => write!(f, "SIDE_B"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Declared result of an event.
///
/// Transitions exactly once: `Pending → {SideAWon, SideBWon, Draw, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Pending,
    SideAWon,
    SideBWon,
    Draw,
    Cancelled,
}

impl Outcome {
    /// Decode an administrator-supplied outcome code.
    ///
    /// Only the declarable codes `1..=4` are accepted; `0` (pending) and
    /// anything above `4` are rejected.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Self::SideAWon),
            2 => Ok(Self::SideBWon),
            3 => Ok(Self::Draw),
            constants::OUTCOME_CODE_CANCELLED => Ok(Self::Cancelled),
            other => Err(DuelbookError::InvalidOutcomeCode(other)),
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::SideAWon => 1,
            Self::SideBWon => 2,
            Self::Draw => 3,
            Self::Cancelled => constants::OUTCOME_CODE_CANCELLED,
        }
    }

    /// The winning side, if the outcome names one.
    #[must_use]
    pub fn winner(self) -> Option<Side> {
        match self {
            Self::SideAWon => Some(Side::A),
            Self::SideBWon => Some(Side::B),
            _ => None,
        }
    }

    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        self == Self::Pending && target != Self::Pending
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::SideAWon => write!(f, "SIDE_A_WON"),
            Self::SideBWon => write!(f, "SIDE_B_WON"),
            Self::Draw => write!(f, "DRAW"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ---------------------------------------------------------------------------
// EventPhase
// ---------------------------------------------------------------------------

/// Where an event sits in its lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventPhase {
    /// Created, opening time not reached.
    Scheduled,
    /// Accepting bets: `opening_time <= now < closing_time`.
    Open,
    /// Closing time passed, outcome not yet declared.
    Closed,
    /// Outcome declared (win or draw).
    Concluded,
    /// Declared cancelled.
    Cancelled,
}

impl fmt::Display for EventPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "SCHEDULED"),
            Self::Open => write!(f, "OPEN"),
            Self::Closed => write!(f, "CLOSED"),
            Self::Concluded => write!(f, "CONCLUDED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ---------------------------------------------------------------------------
// EventDraft: administrator input
// ---------------------------------------------------------------------------

/// Administrator-supplied parameters for a new event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub name: String,
    pub side_a_label: String,
    pub side_b_label: String,
    pub opening_time: DateTime<Utc>,
    pub closing_time: DateTime<Utc>,
    pub odds_a: Odds,
    pub odds_b: Odds,
}

impl EventDraft {
    /// Check the draft against the creation instant `now`.
    ///
    /// # Errors
    /// - `InvalidSchedule` unless `closing > opening > now`
    /// - `InvalidOdds` if either odds is zero
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        if self.opening_time <= now {
            return Err(DuelbookError::InvalidSchedule {
                reason: format!(
                    "opening time {} is not after creation time {now}",
                    self.opening_time
                ),
            });
        }
        if self.closing_time <= self.opening_time {
            return Err(DuelbookError::InvalidSchedule {
                reason: format!(
                    "closing time {} is not after opening time {}",
                    self.closing_time, self.opening_time
                ),
            });
        }
        validate_odds(self.odds_a, self.odds_b)
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl EventDraft {
    pub fn dummy(opening_time: DateTime<Utc>, closing_time: DateTime<Utc>) -> Self {
        Self {
            name: "Final".to_string(),
            side_a_label: "Home".to_string(),
            side_b_label: "Away".to_string(),
            opening_time,
            closing_time,
            odds_a: 100,
            odds_b: 100,
        }
    }

    #[must_use]
    pub fn with_odds(mut self, odds_a: Odds, odds_b: Odds) -> Self {
        self.odds_a = odds_a;
        self.odds_b = odds_b;
        self
    }
}

/// Both odds must be strictly positive.
pub fn validate_odds(odds_a: Odds, odds_b: Odds) -> Result<()> {
    if odds_a == 0 || odds_b == 0 {
        return Err(DuelbookError::InvalidOdds { odds_a, odds_b });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// One scheduled contest. Never deleted; mutated only by outcome
/// declaration (and odds edits before any stake exists).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub side_a_label: String,
    pub side_b_label: String,
    pub opening_time: DateTime<Utc>,
    pub closing_time: DateTime<Utc>,
    pub odds_a: Odds,
    pub odds_b: Odds,
    pub created_at: DateTime<Utc>,
    pub concluded: bool,
    pub cancelled: bool,
    pub outcome: Outcome,
}

impl Event {
    /// Validate `draft` at `now` and build the event.
    pub fn from_draft(id: EventId, draft: EventDraft, now: DateTime<Utc>) -> Result<Self> {
        draft.validate(now)?;
        Ok(Self {
            id,
            name: draft.name,
            side_a_label: draft.side_a_label,
            side_b_label: draft.side_b_label,
            opening_time: draft.opening_time,
            closing_time: draft.closing_time,
            odds_a: draft.odds_a,
            odds_b: draft.odds_b,
            created_at: now,
            concluded: false,
            cancelled: false,
            outcome: Outcome::Pending,
        })
    }

    #[must_use]
    pub fn phase(&self, now: DateTime<Utc>) -> EventPhase {
        if self.cancelled {
            EventPhase::Cancelled
        } else if self.concluded {
            EventPhase::Concluded
        } else if now < self.opening_time {
            EventPhase::Scheduled
        } else if now < self.closing_time {
            EventPhase::Open
        } else {
            EventPhase::Closed
        }
    }

    /// Concluded or cancelled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.concluded || self.cancelled
    }

    #[must_use]
    pub fn label(&self, side: Side) -> &str {
        match side {
            Side::A => &self.side_a_label,
            Side::B => &self.side_b_label,
        }
    }

    /// Odds as seen from `side`'s vault.
    #[must_use]
    pub fn odds_for(&self, side: Side) -> OddsSnapshot {
        match side {
            Side::A => OddsSnapshot::new(self.odds_a, self.odds_b),
            Side::B => OddsSnapshot::new(self.odds_b, self.odds_a),
        }
    }

    /// Bets are admissible only in the half-open window `[opening, closing)`.
    pub fn ensure_betting_open(&self, now: DateTime<Utc>) -> Result<()> {
        if self.cancelled {
            return Err(DuelbookError::EventCancelled(self.id));
        }
        match self.phase(now) {
            EventPhase::Open => Ok(()),
            phase => Err(DuelbookError::BettingNotOpen {
                event: self.id,
                phase,
            }),
        }
    }

    /// Record the declared outcome. `Cancelled` sets `cancelled`, every other
    /// declarable outcome sets `concluded`; the two are mutually exclusive.
    ///
    /// # Errors
    /// - `EventAlreadySettled` if an outcome was already declared
    /// - `ClosingTimeNotReached` before `closing_time`
    /// - `InvalidOutcomeCode` when asked to declare `Pending`
    pub fn declare(&mut self, outcome: Outcome, now: DateTime<Utc>) -> Result<()> {
        if self.is_settled() {
            return Err(DuelbookError::EventAlreadySettled(self.id));
        }
        if now < self.closing_time {
            return Err(DuelbookError::ClosingTimeNotReached(self.id));
        }
        if !self.outcome.can_transition_to(outcome) {
            return Err(DuelbookError::InvalidOutcomeCode(outcome.code()));
        }
        self.outcome = outcome;
        if outcome == Outcome::Cancelled {
            self.cancelled = true;
        } else {
            self.concluded = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn make_event() -> Event {
        let draft = EventDraft::dummy(t0() + Duration::hours(1), t0() + Duration::hours(3));
        Event::from_draft(EventId(1), draft, t0()).unwrap()
    }

    #[test]
    fn side_opposite_and_index() {
        assert_eq!(Side::A.opposite(), Side::B);
        assert_eq!(Side::B.opposite(), Side::A);
        assert_eq!(Side::A.index(), 0);
        assert_eq!(Side::B.index(), 1);
    }

    #[test]
    fn outcome_codes() {
        assert_eq!(Outcome::from_code(1).unwrap(), Outcome::SideAWon);
        assert_eq!(Outcome::from_code(2).unwrap(), Outcome::SideBWon);
        assert_eq!(Outcome::from_code(3).unwrap(), Outcome::Draw);
        assert_eq!(Outcome::from_code(4).unwrap(), Outcome::Cancelled);
        assert!(matches!(
            Outcome::from_code(0),
            Err(DuelbookError::InvalidOutcomeCode(0))
        ));
        assert!(matches!(
            Outcome::from_code(5),
            Err(DuelbookError::InvalidOutcomeCode(5))
        ));
        assert_eq!(Outcome::Cancelled.code(), 4);
    }

    #[test]
    fn outcome_transitions_once() {
        assert!(Outcome::Pending.can_transition_to(Outcome::Draw));
        assert!(!Outcome::Pending.can_transition_to(Outcome::Pending));
        assert!(!Outcome::Draw.can_transition_to(Outcome::SideAWon));
    }

    #[test]
    fn draft_rejects_opening_in_past() {
        let draft = EventDraft::dummy(t0(), t0() + Duration::hours(1));
        let err = draft.validate(t0()).unwrap_err();
        assert!(matches!(err, DuelbookError::InvalidSchedule { .. }));
    }

    #[test]
    fn draft_rejects_closing_before_opening() {
        let draft = EventDraft::dummy(t0() + Duration::hours(2), t0() + Duration::hours(2));
        let err = draft.validate(t0()).unwrap_err();
        assert!(matches!(err, DuelbookError::InvalidSchedule { .. }));
    }

    #[test]
    fn draft_rejects_zero_odds() {
        let draft = EventDraft::dummy(t0() + Duration::hours(1), t0() + Duration::hours(2))
            .with_odds(0, 100);
        let err = draft.validate(t0()).unwrap_err();
        assert!(matches!(err, DuelbookError::InvalidOdds { odds_a: 0, .. }));
    }

    #[test]
    fn phases_follow_clock() {
        let event = make_event();
        assert_eq!(event.phase(t0()), EventPhase::Scheduled);
        assert_eq!(event.phase(t0() + Duration::hours(1)), EventPhase::Open);
        assert_eq!(event.phase(t0() + Duration::hours(3)), EventPhase::Closed);
    }

    #[test]
    fn betting_window_is_half_open() {
        let event = make_event();
        assert!(event.ensure_betting_open(event.opening_time).is_ok());
        assert!(
            event
                .ensure_betting_open(event.closing_time - Duration::seconds(1))
                .is_ok()
        );
        let err = event.ensure_betting_open(event.closing_time).unwrap_err();
        assert!(matches!(
            err,
            DuelbookError::BettingNotOpen {
                phase: EventPhase::Closed,
                ..
            }
        ));
    }

    #[test]
    fn declare_requires_closing_time() {
        let mut event = make_event();
        let err = event
            .declare(Outcome::SideAWon, t0() + Duration::hours(2))
            .unwrap_err();
        assert!(matches!(err, DuelbookError::ClosingTimeNotReached(_)));
        assert_eq!(event.outcome, Outcome::Pending);
    }

    #[test]
    fn declare_cancelled_sets_cancelled_only() {
        let mut event = make_event();
        event
            .declare(Outcome::Cancelled, event.closing_time)
            .unwrap();
        assert!(event.cancelled);
        assert!(!event.concluded);
        assert_eq!(event.phase(event.closing_time), EventPhase::Cancelled);
        let err = event.ensure_betting_open(event.opening_time).unwrap_err();
        assert!(matches!(err, DuelbookError::EventCancelled(_)));
    }

    #[test]
    fn declare_is_terminal() {
        let mut event = make_event();
        event.declare(Outcome::Draw, event.closing_time).unwrap();
        assert!(event.concluded);
        let err = event
            .declare(Outcome::SideBWon, event.closing_time)
            .unwrap_err();
        assert!(matches!(err, DuelbookError::EventAlreadySettled(_)));
        assert_eq!(event.outcome, Outcome::Draw);
    }

    #[test]
    fn odds_for_orients_by_side() {
        let draft = EventDraft::dummy(t0() + Duration::hours(1), t0() + Duration::hours(2))
            .with_odds(200, 100);
        let event = Event::from_draft(EventId(1), draft, t0()).unwrap();
        assert_eq!(event.odds_for(Side::A), OddsSnapshot::new(200, 100));
        assert_eq!(event.odds_for(Side::B), OddsSnapshot::new(100, 200));
    }
}
