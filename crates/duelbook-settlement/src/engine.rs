//! The betting engine: event lifecycle and stake placement.
//!
//! ```text
//!   create_event ──▶ place_bet* ──▶ (closing) ──▶ set_outcome ──▶ claim_*
//!                        │
//!                        └─ transfer_from → record_stake → try_match
//! ```
//!
//! Every state-changing call takes `&mut self`, so calls are serialized.
//! Each one validates first and mutates second. Calls that touch custody run
//! inside a vault checkpoint and a journaled ledger; on error the vaults are
//! rolled back and journaled transfers reversed.

use duelbook_escrow::JournaledLedger;
use duelbook_types::{
    AccountId, AdminSet, Amount, AssetLedger, Authority, Clock, DuelbookError, EngineConfig,
    EventDraft, EventId, Notice, NoticeLog, Odds, Outcome, Result, Side, constants,
    validate_fee_percentage, validate_odds,
};

use crate::{ClaimGuard, EventRegistry, registry::EventBook};

/// Two-sided betting engine over an asset ledger `L`, a clock `C` and an
/// administrator check `A`.
pub struct BettingEngine<L, C, A> {
    pub(crate) config: EngineConfig,
    pub(crate) ledger: L,
    pub(crate) clock: C,
    pub(crate) authority: A,
    pub(crate) registry: EventRegistry,
    pub(crate) notices: NoticeLog,
    pub(crate) claim_guard: ClaimGuard,
}

impl<L: AssetLedger, C: Clock> BettingEngine<L, C, AdminSet> {
    /// Engine whose administrators are the ones listed in `config`.
    pub fn from_config(config: EngineConfig, ledger: L, clock: C) -> Result<Self> {
        config.validate()?;
        let authority = config.authority();
        Self::new(config, ledger, clock, authority)
    }
}

impl<L: AssetLedger, C: Clock, A: Authority> BettingEngine<L, C, A> {
    /// # Errors
    /// `InvalidFeePercentage` if the configured fee is above the maximum.
    pub fn new(config: EngineConfig, ledger: L, clock: C, authority: A) -> Result<Self> {
        validate_fee_percentage(config.platform_fee_percentage)?;
        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            fee_pct = config.platform_fee_percentage,
            operator = %config.operator.short(),
            "Betting engine initialized"
        );
        Ok(Self {
            config,
            ledger,
            clock,
            authority,
            registry: EventRegistry::new(),
            notices: NoticeLog::new(),
            claim_guard: ClaimGuard::new(),
        })
    }

    // ───────────────────────── Administration ─────────────────────────

    /// Schedule a new event and return its id.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` is an administrator
    /// - `InvalidSchedule` unless `closing > opening > now`
    /// - `InvalidOdds` if either odds is zero
    pub fn create_event(&mut self, caller: AccountId, draft: EventDraft) -> Result<EventId> {
        self.authorize(caller)?;
        let now = self.clock.now()?;
        let event = duelbook_types::Event::from_draft(self.registry.next_id(), draft, now)?;

        let notice = Notice::EventCreated {
            event: event.id,
            name: event.name.clone(),
            opening_time: event.opening_time,
            closing_time: event.closing_time,
            odds_a: event.odds_a,
            odds_b: event.odds_b,
        };
        let id = self.registry.register(event)?;
        self.notices.push(notice);

        tracing::info!(event = %id, active = self.registry.active_count(), "Event created");
        Ok(id)
    }

    /// Replace an event's odds. Only allowed before either side has a stake,
    /// so both vault snapshots always agree.
    ///
    /// # Errors
    /// `Unauthorized`, `InvalidOdds`, `EventNotFound`, `EventAlreadySettled`,
    /// or `OddsLocked` once a stake exists.
    pub fn update_odds(
        &mut self,
        caller: AccountId,
        event_id: EventId,
        odds_a: Odds,
        odds_b: Odds,
    ) -> Result<()> {
        self.authorize(caller)?;
        validate_odds(odds_a, odds_b)?;
        let book = self.registry.get_mut(event_id)?;
        if book.event.is_settled() {
            return Err(DuelbookError::EventAlreadySettled(event_id));
        }
        if book.has_stakes() {
            return Err(DuelbookError::OddsLocked(event_id));
        }
        book.event.odds_a = odds_a;
        book.event.odds_b = odds_b;
        self.notices.push(Notice::OddsUpdated {
            event: event_id,
            odds_a,
            odds_b,
        });
        tracing::info!(event = %event_id, odds_a, odds_b, "Odds updated");
        Ok(())
    }

    /// Declare the outcome of a closed event. Code `4` cancels it.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` is an administrator
    /// - `InvalidOutcomeCode` unless `code` is in `1..=4`
    /// - `EventNotFound`
    /// - `EventAlreadySettled` if an outcome was already declared
    /// - `ClosingTimeNotReached` before the closing time
    pub fn set_outcome(&mut self, caller: AccountId, event_id: EventId, code: u8) -> Result<()> {
        self.authorize(caller)?;
        let outcome = Outcome::from_code(code)?;
        let now = self.clock.now()?;
        let book = self.registry.get_mut(event_id)?;
        book.event.declare(outcome, now)?;
        self.registry.deactivate(event_id);
        self.notices.push(Notice::OutcomeDeclared {
            event: event_id,
            outcome,
        });

        tracing::info!(
            event = %event_id,
            %outcome,
            active = self.registry.active_count(),
            "Outcome declared"
        );
        Ok(())
    }

    /// Cancel a closed event; equivalent to `set_outcome(.., 4)`.
    pub fn cancel_event(&mut self, caller: AccountId, event_id: EventId) -> Result<()> {
        self.set_outcome(caller, event_id, constants::OUTCOME_CODE_CANCELLED)
    }

    /// Change the fee applied to claims settled from now on.
    ///
    /// # Errors
    /// `Unauthorized`, or `InvalidFeePercentage` above the maximum.
    pub fn set_platform_fee(&mut self, caller: AccountId, pct: u8) -> Result<()> {
        self.authorize(caller)?;
        validate_fee_percentage(pct)?;
        let old_pct = self.config.platform_fee_percentage;
        self.config.platform_fee_percentage = pct;
        self.notices.push(Notice::PlatformFeeChanged {
            old_pct,
            new_pct: pct,
        });
        tracing::info!(old_pct, new_pct = pct, "Platform fee changed");
        Ok(())
    }

    pub fn set_fee_collector(&mut self, caller: AccountId, collector: AccountId) -> Result<()> {
        self.authorize(caller)?;
        let old = self.config.fee_collector;
        self.config.fee_collector = collector;
        self.notices.push(Notice::FeeCollectorChanged {
            old,
            new: collector,
        });
        tracing::info!(old = %old.short(), new = %collector.short(), "Fee collector changed");
        Ok(())
    }

    // ───────────────────────── Betting ─────────────────────────

    /// Stake `amount` on `side` and return the new stake's index in that
    /// side's vault.
    ///
    /// The bettor must have approved [`Self::operator`] for at least
    /// `amount`. Funds are pulled first; if recording or matching then
    /// fails, the pull is reversed and the vaults rolled back.
    ///
    /// # Errors
    /// - `ZeroAmount`, `EventNotFound`
    /// - `EventCancelled`, or `BettingNotOpen` outside `[opening, closing)`
    /// - `CustodyFailure` if the ledger refuses to pull the stake
    /// - `ArithmeticOverflow` if vault totals or the match plan overflow
    pub fn place_bet(
        &mut self,
        bettor: AccountId,
        event_id: EventId,
        side: Side,
        amount: Amount,
    ) -> Result<usize> {
        if amount == 0 {
            return Err(DuelbookError::ZeroAmount);
        }
        let now = self.clock.now()?;
        let operator = self.config.operator;
        self.registry.get(event_id)?.event.ensure_betting_open(now)?;

        let (index, matched) = self.transact(event_id, |book, ledger| {
            Self::stake_and_match(book, bettor, side, amount, operator, ledger)
        })?;

        self.notices.push(Notice::StakeRecorded {
            event: event_id,
            side,
            bettor,
            index,
            amount,
        });
        if let Some((matched_a, matched_b)) = matched {
            for (side, amount) in [(Side::A, matched_a), (Side::B, matched_b)] {
                self.notices.push(Notice::StakesMatched {
                    event: event_id,
                    side,
                    amount,
                });
            }
        }

        tracing::info!(
            event = %event_id,
            %side,
            bettor = %bettor.short(),
            index,
            amount,
            "Bet placed"
        );
        Ok(index)
    }

    fn stake_and_match<T: AssetLedger>(
        book: &mut EventBook,
        bettor: AccountId,
        side: Side,
        amount: Amount,
        operator: AccountId,
        ledger: &mut T,
    ) -> Result<(usize, Option<(Amount, Amount)>)> {
        let vault_account = book.vault(side).account();
        if !ledger.transfer_from(operator, bettor, vault_account, amount) {
            tracing::warn!(
                event = %book.event.id,
                %side,
                bettor = %bettor.short(),
                amount,
                "Stake pull refused by ledger"
            );
            return Err(DuelbookError::CustodyFailure {
                reason: format!("could not pull {amount} from {bettor} into {side} vault"),
            });
        }

        let odds = book.event.odds_for(side);
        let index = book.vault_mut(side).record_stake(bettor, amount, odds)?;
        let plan = duelbook_matchcore::try_match(&mut book.vault_a, &mut book.vault_b)?;
        Ok((index, plan.map(|plan| (plan.amount_a, plan.amount_b))))
    }

    // ───────────────────────── Internals ─────────────────────────

    pub(crate) fn authorize(&self, caller: AccountId) -> Result<()> {
        if self.authority.is_authorized(&caller) {
            Ok(())
        } else {
            tracing::warn!(caller = %caller.short(), "Unauthorized administrative call");
            Err(DuelbookError::Unauthorized(caller))
        }
    }

    /// Run `op` with the claim guard held for `event_id`.
    pub(crate) fn with_claim_guard<T>(
        &mut self,
        event_id: EventId,
        op: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.claim_guard.enter(event_id)?;
        let result = op(self);
        self.claim_guard.exit(event_id);
        result
    }

    /// Run `op` over `event_id`'s book with journaled custody. On error the
    /// vaults are rolled back to their checkpoint and every transfer `op`
    /// made is reversed. Cost is bounded by what `op` touches.
    pub(crate) fn transact<T>(
        &mut self,
        event_id: EventId,
        op: impl FnOnce(&mut EventBook, &mut JournaledLedger<'_, L>) -> Result<T>,
    ) -> Result<T> {
        let book = self.registry.get_mut(event_id)?;
        let checkpoint = book.checkpoint()?;
        let mut journal = JournaledLedger::new(&mut self.ledger);
        match op(book, &mut journal) {
            Ok(value) => {
                journal.commit();
                book.commit();
                Ok(value)
            }
            Err(err) => {
                book.rollback(checkpoint);
                let reversed = journal.transfers().len();
                journal.rollback()?;
                tracing::warn!(event = %event_id, reversed, error = %err, "Operation rolled back");
                Err(err)
            }
        }
    }

    // ───────────────────────── Accessors ─────────────────────────

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Account bettors approve as spender before placing bets.
    #[must_use]
    pub fn operator(&self) -> AccountId {
        self.config.operator
    }

    #[must_use]
    pub fn platform_fee_percentage(&self) -> u8 {
        self.config.platform_fee_percentage
    }

    #[must_use]
    pub fn fee_collector(&self) -> AccountId {
        self.config.fee_collector
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access for funding and approvals.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    #[must_use]
    pub fn notices(&self) -> &NoticeLog {
        &self.notices
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use duelbook_escrow::InMemoryLedger;
    use duelbook_types::{EventPhase, ManualClock};

    use super::*;

    type TestEngine = BettingEngine<InMemoryLedger, ManualClock, AdminSet>;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn setup() -> (TestEngine, ManualClock, AccountId) {
        let admin = AccountId::new();
        let clock = ManualClock::new(t0());
        let config = EngineConfig::new(AccountId::new(), AccountId::new(), vec![admin]);
        let engine = BettingEngine::from_config(config, InMemoryLedger::new(), clock.clone()).unwrap();
        (engine, clock, admin)
    }

    fn draft() -> EventDraft {
        EventDraft::dummy(t0() + Duration::hours(1), t0() + Duration::hours(2))
    }

    fn fund(engine: &mut TestEngine, amount: Amount) -> AccountId {
        let bettor = AccountId::new();
        let operator = engine.operator();
        engine.ledger_mut().mint(bettor, amount);
        engine.ledger_mut().approve(bettor, operator, amount);
        bettor
    }

    #[test]
    fn create_requires_admin() {
        let (mut engine, _, _) = setup();
        let outsider = AccountId::new();
        assert!(matches!(
            engine.create_event(outsider, draft()).unwrap_err(),
            DuelbookError::Unauthorized(id) if id == outsider
        ));
        assert!(engine.notices().is_empty());
    }

    #[test]
    fn create_validates_schedule() {
        let (mut engine, _, admin) = setup();
        let past = EventDraft::dummy(t0(), t0() + Duration::hours(1));
        assert!(matches!(
            engine.create_event(admin, past).unwrap_err(),
            DuelbookError::InvalidSchedule { .. }
        ));
        let zero_odds = draft().with_odds(0, 100);
        assert!(matches!(
            engine.create_event(admin, zero_odds).unwrap_err(),
            DuelbookError::InvalidOdds { .. }
        ));
        assert_eq!(engine.create_event(admin, draft()).unwrap(), EventId(1));
    }

    #[test]
    fn bets_only_inside_window() {
        let (mut engine, clock, admin) = setup();
        let id = engine.create_event(admin, draft()).unwrap();
        let bettor = fund(&mut engine, 100);

        let err = engine.place_bet(bettor, id, Side::A, 10).unwrap_err();
        assert!(matches!(
            err,
            DuelbookError::BettingNotOpen { phase: EventPhase::Scheduled, .. }
        ));

        clock.set(t0() + Duration::hours(1));
        assert_eq!(engine.place_bet(bettor, id, Side::A, 10).unwrap(), 0);

        clock.set(t0() + Duration::hours(2));
        let err = engine.place_bet(bettor, id, Side::A, 10).unwrap_err();
        assert!(matches!(
            err,
            DuelbookError::BettingNotOpen { phase: EventPhase::Closed, .. }
        ));
    }

    #[test]
    fn refused_pull_leaves_no_trace() {
        let (mut engine, clock, admin) = setup();
        let id = engine.create_event(admin, draft()).unwrap();
        clock.set(t0() + Duration::hours(1));
        let funded = fund(&mut engine, 100);
        engine.place_bet(funded, id, Side::B, 100).unwrap();

        // Unapproved bettor: stake would have matched, but the pull fails.
        let broke = AccountId::new();
        let err = engine.place_bet(broke, id, Side::A, 50).unwrap_err();
        assert!(matches!(err, DuelbookError::CustodyFailure { .. }));

        let book = engine.registry.get(id).unwrap();
        assert!(!book.vault_a.has_stakes());
        assert_eq!(book.vault_b.total_matched_amount(), 0);
        assert_eq!(book.vault_b.unmatched_amount(), 100);
    }

    #[test]
    fn failed_matching_returns_pulled_stake() {
        let (mut engine, clock, admin) = setup();
        let id = engine
            .create_event(admin, draft().with_odds(1, u64::MAX))
            .unwrap();
        clock.set(t0() + Duration::hours(1));
        let small = fund(&mut engine, 1);
        engine.place_bet(small, id, Side::B, 1).unwrap();

        // Required opposing stake for this bet does not fit in an Amount.
        let huge: Amount = 1 << 127;
        let whale = fund(&mut engine, huge);
        let err = engine.place_bet(whale, id, Side::A, huge).unwrap_err();
        assert!(matches!(err, DuelbookError::ArithmeticOverflow { .. }));

        assert_eq!(engine.ledger().balance_of(whale), huge);
        let book = engine.registry.get(id).unwrap();
        assert!(!book.vault_a.has_stakes());
        assert_eq!(book.vault_a.pending_undo(), 0);
        assert_eq!(engine.ledger().balance_of(book.vault_a.account()), 0);
        assert_eq!(book.vault_b.unmatched_amount(), 1);
        assert_eq!(engine.notices().len(), 2);
    }

    #[test]
    fn bets_leave_no_open_checkpoint() {
        let (mut engine, clock, admin) = setup();
        let id = engine.create_event(admin, draft()).unwrap();
        clock.set(t0() + Duration::hours(1));
        for side in [Side::A, Side::B, Side::A] {
            let bettor = fund(&mut engine, 10);
            engine.place_bet(bettor, id, side, 10).unwrap();
        }
        let book = engine.registry.get_mut(id).unwrap();
        assert_eq!(book.vault_a.pending_undo(), 0);
        // A stray open checkpoint would make this fail.
        assert!(book.checkpoint().is_ok());
    }

    #[test]
    fn odds_lock_after_first_stake() {
        let (mut engine, clock, admin) = setup();
        let id = engine.create_event(admin, draft()).unwrap();
        engine.update_odds(admin, id, 150, 100).unwrap();
        assert_eq!(engine.registry.get(id).unwrap().event.odds_a, 150);

        clock.set(t0() + Duration::hours(1));
        let bettor = fund(&mut engine, 10);
        engine.place_bet(bettor, id, Side::A, 10).unwrap();
        assert!(matches!(
            engine.update_odds(admin, id, 200, 100).unwrap_err(),
            DuelbookError::OddsLocked(_)
        ));
        assert!(matches!(
            engine.update_odds(admin, id, 0, 100).unwrap_err(),
            DuelbookError::InvalidOdds { .. }
        ));
    }

    #[test]
    fn outcome_rules() {
        let (mut engine, clock, admin) = setup();
        let id = engine.create_event(admin, draft()).unwrap();

        assert!(matches!(
            engine.set_outcome(admin, id, 1).unwrap_err(),
            DuelbookError::ClosingTimeNotReached(_)
        ));
        clock.set(t0() + Duration::hours(2));
        assert!(matches!(
            engine.set_outcome(admin, id, 5).unwrap_err(),
            DuelbookError::InvalidOutcomeCode(5)
        ));
        assert!(matches!(
            engine.set_outcome(admin, EventId(9), 1).unwrap_err(),
            DuelbookError::EventNotFound(EventId(9))
        ));

        assert_eq!(engine.registry.active_count(), 1);
        engine.cancel_event(admin, id).unwrap();
        assert_eq!(engine.registry.active_count(), 0);
        let event = &engine.registry.get(id).unwrap().event;
        assert!(event.cancelled && !event.concluded);

        assert!(matches!(
            engine.set_outcome(admin, id, 1).unwrap_err(),
            DuelbookError::EventAlreadySettled(_)
        ));
    }

    #[test]
    fn fee_and_collector_admin() {
        let (mut engine, _, admin) = setup();
        assert!(matches!(
            engine.set_platform_fee(admin, 11).unwrap_err(),
            DuelbookError::InvalidFeePercentage { pct: 11, max: 10 }
        ));
        engine.set_platform_fee(admin, 0).unwrap();
        assert_eq!(engine.platform_fee_percentage(), 0);

        let collector = AccountId::new();
        assert!(engine.set_fee_collector(AccountId::new(), collector).is_err());
        engine.set_fee_collector(admin, collector).unwrap();
        assert_eq!(engine.fee_collector(), collector);
        assert_eq!(engine.notices().len(), 2);
    }

    #[test]
    fn claim_guard_is_released_after_failure() {
        let (mut engine, _, _) = setup();
        let err = engine
            .with_claim_guard(EventId(1), |_| -> Result<()> { Err(DuelbookError::NoWinnings) })
            .unwrap_err();
        assert!(matches!(err, DuelbookError::NoWinnings));
        assert!(engine.claim_guard.is_empty());

        let nested = engine.with_claim_guard(EventId(1), |engine| {
            engine.with_claim_guard(EventId(1), |_| Ok(()))
        });
        assert!(matches!(nested.unwrap_err(), DuelbookError::ClaimInProgress(_)));
    }
}
