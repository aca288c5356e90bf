//! Per-event reentrancy guard for claim execution.
//!
//! A claim reads vault flags and then pays out through the ledger. Two claims
//! on the same event must never interleave between those steps, or both
//! could observe the same unclaimed stake and pay it twice.
//!
//! ```text
//!   enter(e) ──▶ [e in flight] ──▶ exit(e)
//!        └── enter(e) again ──▶ ClaimInProgress
//! ```
//!
//! Claims on different events do not contend.
//!
//! Every claim entry point takes `&mut BettingEngine`, so the borrow checker
//! already serializes claims on one engine. The guard can only trip on a
//! nested claim issued from inside a running one. It is not a lock: sharing
//! an engine across threads still needs external synchronization.

use std::collections::HashSet;

use duelbook_types::{DuelbookError, EventId, Result};

/// Tracks which events currently have a claim executing.
#[derive(Debug, Default)]
pub struct ClaimGuard {
    in_flight: HashSet<EventId>,
}

impl ClaimGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a claim on `event` as started.
    ///
    /// # Errors
    /// `ClaimInProgress` if a claim on `event` has not exited yet.
    pub fn enter(&mut self, event: EventId) -> Result<()> {
        if !self.in_flight.insert(event) {
            tracing::warn!(%event, "Claim rejected: another claim is in flight");
            return Err(DuelbookError::ClaimInProgress(event));
        }
        Ok(())
    }

    /// Release `event`. Releasing an event that is not held is a no-op.
    pub fn exit(&mut self, event: EventId) {
        self.in_flight.remove(&event);
    }

    #[must_use]
    pub fn is_held(&self, event: EventId) -> bool {
        self.in_flight.contains(&event)
    }

    /// Number of events with a claim in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_enter_is_rejected() {
        let mut guard = ClaimGuard::new();
        guard.enter(EventId(1)).unwrap();
        let err = guard.enter(EventId(1)).unwrap_err();
        assert!(
            matches!(err, DuelbookError::ClaimInProgress(EventId(1))),
            "Expected ClaimInProgress, got: {err:?}"
        );
    }

    #[test]
    fn events_are_independent() {
        let mut guard = ClaimGuard::new();
        guard.enter(EventId(1)).unwrap();
        guard.enter(EventId(2)).unwrap();
        assert_eq!(guard.len(), 2);
        assert!(guard.is_held(EventId(2)));
    }

    #[test]
    fn exit_releases() {
        let mut guard = ClaimGuard::new();
        guard.enter(EventId(1)).unwrap();
        guard.exit(EventId(1));
        assert!(guard.is_empty());
        assert!(guard.enter(EventId(1)).is_ok());

        // Releasing something never held does nothing.
        guard.exit(EventId(9));
        assert_eq!(guard.len(), 1);
    }
}
