//! Notices: the append-only record of every state change the engine makes.
//!
//! The transport/persistence substrate that ships notices to callers is
//! external; the engine only appends. [`NoticeLog::journal_root`] commits to
//! the full ordered log so replicas fed the same calls can compare one hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AccountId, Amount, EventId, Odds, Outcome, Result, Side, constants};

/// A single state-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    EventCreated {
        event: EventId,
        name: String,
        opening_time: DateTime<Utc>,
        closing_time: DateTime<Utc>,
        odds_a: Odds,
        odds_b: Odds,
    },
    OddsUpdated {
        event: EventId,
        odds_a: Odds,
        odds_b: Odds,
    },
    StakeRecorded {
        event: EventId,
        side: Side,
        bettor: AccountId,
        index: usize,
        amount: Amount,
    },
    StakesMatched {
        event: EventId,
        side: Side,
        amount: Amount,
    },
    OutcomeDeclared {
        event: EventId,
        outcome: Outcome,
    },
    WinningsClaimed {
        event: EventId,
        bettor: AccountId,
        amount: Amount,
    },
    FeeCollected {
        event: EventId,
        collector: AccountId,
        amount: Amount,
    },
    UnmatchedRefunded {
        event: EventId,
        bettor: AccountId,
        amount: Amount,
    },
    PlatformFeeChanged {
        old_pct: u8,
        new_pct: u8,
    },
    FeeCollectorChanged {
        old: AccountId,
        new: AccountId,
    },
}

/// Append-only notice log.
#[derive(Debug, Clone, Default)]
pub struct NoticeLog {
    notices: Vec<Notice>,
}

impl NoticeLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Notice] {
        &self.notices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Notices appended at or after position `from`.
    #[must_use]
    pub fn since(&self, from: usize) -> &[Notice] {
        self.notices.get(from..).unwrap_or(&[])
    }

    /// SHA-256 over the domain tag, the notice count and each notice's
    /// canonical JSON encoding, in order.
    pub fn journal_root(&self) -> Result<[u8; 32]> {
        let mut hasher = Sha256::new();
        hasher.update(constants::NOTICE_JOURNAL_DOMAIN);
        hasher.update((self.notices.len() as u64).to_le_bytes());
        for notice in &self.notices {
            let bytes = serde_json::to_vec(notice)?;
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }
        let mut root = [0u8; 32];
        root.copy_from_slice(&hasher.finalize());
        Ok(root)
    }

    /// [`Self::journal_root`] as lowercase hex.
    pub fn journal_root_hex(&self) -> Result<String> {
        self.journal_root().map(hex::encode)
    }
}
