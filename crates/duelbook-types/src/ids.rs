//! Identifiers used throughout Duelbook.
//!
//! Events are numbered sequentially by the registry. Every party that can
//! hold assets (bettors, vaults, the fee collector, the engine operator) is
//! an [`AccountId`] backed by a UUID.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Side, constants};

// ---------------------------------------------------------------------------
// EventId
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier for a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl EventId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// An asset-holding party: a bettor, a vault, the fee collector or the
/// engine operator. Uses UUIDv7 for fresh accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Deterministic custody account for the vault of `side` in `event_id`.
    ///
    /// Every replica derives the **same** account for the same vault, so
    /// ledger balances can be cross-checked without sharing state.
    #[must_use]
    pub fn vault(event_id: EventId, side: Side) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(constants::VAULT_ACCOUNT_DOMAIN);
        hasher.update(event_id.0.to_le_bytes());
        hasher.update([side.index()]);
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(Uuid::from_bytes(bytes))
    }

    /// First four bytes as hex, for compact log fields.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_next() {
        assert_eq!(EventId(5).next(), EventId(6));
        assert_eq!(format!("{}", EventId(7)), "event:7");
    }

    #[test]
    fn account_id_uniqueness() {
        let a = AccountId::new();
        let b = AccountId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn vault_account_deterministic() {
        let a = AccountId::vault(EventId(1), Side::A);
        let b = AccountId::vault(EventId(1), Side::A);
        assert_eq!(a, b);
        assert_ne!(a, AccountId::vault(EventId(1), Side::B));
        assert_ne!(a, AccountId::vault(EventId(2), Side::A));
    }

    #[test]
    fn short_is_eight_hex_chars() {
        let id = AccountId::from_bytes([0xab; 16]);
        assert_eq!(id.short(), "abababab");
    }

    #[test]
    fn serde_roundtrips() {
        let id = AccountId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
